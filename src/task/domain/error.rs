//! Error types for task domain validation and parsing.

use super::{StatusName, TaskId};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while validating task domain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested assignee set is unusable.
    #[error("invalid assignment for task {task_id}: {reason}")]
    InvalidAssignment {
        /// Task whose assignment was rejected.
        task_id: TaskId,
        /// Why the assignee set was rejected.
        reason: AssignmentRejection,
    },

    /// The user has no assignment row on the task.
    #[error("user {user_id} is not assigned to task {task_id}")]
    NotAssigned {
        /// Task the user is not assigned to.
        task_id: TaskId,
        /// User lacking an assignment row.
        user_id: UserId,
    },

    /// The percentage is outside the accepted 0..=100 range.
    #[error("percentage {percentage} for user {user_id} on task {task_id} is out of range 0..=100")]
    OutOfRange {
        /// Task the update targeted.
        task_id: TaskId,
        /// User whose progress was being updated.
        user_id: UserId,
        /// Rejected percentage value.
        percentage: u8,
    },

    /// No un-reverted tick-complete row exists to revert.
    #[error("no active tick to revert for user {user_id} on task {task_id}")]
    NoActiveTick {
        /// Task the revert targeted.
        task_id: TaskId,
        /// User whose tick was being reverted.
        user_id: UserId,
    },

    /// The state machine forbids the requested transition.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Current status.
        from: StatusName,
        /// Requested status.
        to: StatusName,
    },

    /// The review-to-done guard is not satisfied.
    #[error(
        "cannot complete task {task_id}: aggregate {aggregate}%, \
         {attached} of {required} required files attached"
    )]
    IncompleteRequirements {
        /// Task that failed the completion guard.
        task_id: TaskId,
        /// Aggregate percentage at the time of the attempt.
        aggregate: u8,
        /// Number of files currently attached.
        attached: u32,
        /// Minimum number of files required.
        required: u32,
    },

    /// The requested status equals the current status.
    #[error("task {task_id} is already in status {status}")]
    NoOp {
        /// Task whose transition was redundant.
        task_id: TaskId,
        /// Current (and requested) status.
        status: StatusName,
    },

    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The start date falls after the due date.
    #[error("start date {start} must not be after due date {due}")]
    InvalidSchedule {
        /// Requested start date.
        start: DateTime<Utc>,
        /// Requested due date.
        due: DateTime<Utc>,
    },

    /// Direct-assignment flag and part reference disagree.
    #[error(
        "direct-assignment tasks must not reference a part \
         and part tasks must reference one (is_direct_assignment: {is_direct_assignment})"
    )]
    PartMismatch {
        /// Whether the draft was flagged as a direct assignment.
        is_direct_assignment: bool,
    },
}

/// Reasons an assignee-set replacement is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssignmentRejection {
    /// The assignee list is empty.
    #[error("assignee list is empty")]
    EmptyAssigneeSet,

    /// The designated main assignee is not in the assignee list.
    #[error("main assignee {0} is not in the assignee list")]
    MainAssigneeNotIncluded(UserId),
}

/// Error returned while parsing status names from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status name: {0}")]
pub struct ParseStatusError(pub String);

/// Error returned while parsing history actions from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown history action: {0}")]
pub struct ParseActionError(pub String);

/// Error returned while parsing priorities from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);
