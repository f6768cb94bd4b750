//! Identity context consumed by every task operation.
//!
//! The engine never authenticates. Callers supply an already-authenticated
//! [`Principal`] carrying the user identifier, role, and granted capability
//! set; services only check that the set contains the capability an
//! operation requires.

mod principal;

pub use principal::{Capability, ParseRoleError, Principal, Role, UserId};
