//! Domain model for the task workflow engine.
//!
//! The task domain models task creation, assignee-set replacement,
//! per-assignee progress accumulation, validated status transitions, and the
//! append-only history ledger while keeping all infrastructure concerns
//! outside of the domain boundary.

mod assignment;
mod error;
mod history;
mod ids;
mod progress;
mod status;
mod task;

pub use assignment::{AssignmentReplacement, TaskAssignment, main_assignee, plan_replacement};
pub use error::{
    AssignmentRejection, ParseActionError, ParsePriorityError, ParseStatusError, TaskDomainError,
};
pub use history::{HistoryAction, TaskHistory};
pub use ids::{HistoryId, PartId, ProgressId, StatusId, TaskId};
pub use progress::{
    TaskProgress, aggregate_percentage, effective_percentage, latest_for_user,
};
pub use status::{StatusName, TaskStatus};
pub use task::{PersistedTaskData, Priority, Task, TaskDraft};
