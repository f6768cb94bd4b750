//! Task lifecycle and progress audit engine.
//!
//! This module implements the workflow core: creating tasks, replacing
//! assignee sets while keeping exactly one main assignee, recording
//! per-assignee progress as a time series with tick-complete/revert
//! semantics, driving status transitions through a validated state machine,
//! and appending an immutable history row for every mutation. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
