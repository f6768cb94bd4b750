//! Orchestration services for the task workflow engine.
//!
//! Each service checks the caller's capability at entry, snapshots the
//! task, validates the operation against the domain rules, and commits the
//! resulting writes together with their history rows in one atomic batch.
//! Transient store failures are retried a bounded number of times; domain
//! validation failures are surfaced immediately. Events are emitted only
//! after a successful commit.

mod assignment;
mod error;
mod lifecycle;
mod overdue;
mod progress;
mod retry;
mod status;

pub use assignment::AssignmentService;
pub use error::{WorkflowError, WorkflowResult};
pub use lifecycle::{CreateTaskRequest, TaskDetail, TaskLifecycleService};
pub use overdue::OverdueScanner;
pub use progress::ProgressService;
pub use status::StatusEngine;

use crate::identity::{Capability, Principal};
use crate::task::domain::TaskId;
use crate::task::ports::{TaskSnapshot, TaskStore, TaskStoreError};

/// Rejects the call when the principal lacks `capability`.
pub(crate) fn require(principal: &Principal, capability: Capability) -> WorkflowResult<()> {
    if principal.has(capability) {
        return Ok(());
    }
    Err(WorkflowError::Unauthorized {
        user_id: principal.user_id(),
        capability,
    })
}

/// Snapshots the task, turning absence into a not-found error.
pub(crate) async fn load_snapshot<S: TaskStore + ?Sized>(
    store: &S,
    task_id: TaskId,
) -> WorkflowResult<TaskSnapshot> {
    store
        .snapshot(task_id)
        .await?
        .ok_or_else(|| WorkflowError::Store(TaskStoreError::NotFound(task_id)))
}
