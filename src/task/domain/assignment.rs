//! Task assignment rows and assignee-set replacement planning.

use super::{AssignmentRejection, TaskDomainError, TaskId};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Assignment of a user to a task.
///
/// Identified by `(task_id, user_id)`. For any task with at least one
/// assignment, exactly one row carries `is_main_assignee = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignment {
    /// Task the user is assigned to.
    pub task_id: TaskId,
    /// Assigned user.
    pub user_id: UserId,
    /// Whether this user is primarily responsible for the task.
    pub is_main_assignee: bool,
    /// Time the assignment was created.
    pub assigned_at: DateTime<Utc>,
}

impl TaskAssignment {
    /// Creates an assignment row.
    #[must_use]
    pub fn new(task_id: TaskId, user_id: UserId, is_main_assignee: bool, clock: &impl Clock) -> Self {
        Self {
            task_id,
            user_id,
            is_main_assignee,
            assigned_at: clock.utc(),
        }
    }
}

/// Returns the main assignee of an assignment set, when one exists.
#[must_use]
pub fn main_assignee(assignments: &[TaskAssignment]) -> Option<UserId> {
    assignments
        .iter()
        .find(|assignment| assignment.is_main_assignee)
        .map(|assignment| assignment.user_id)
}

/// Planned atomic replacement of a task's assignee set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentReplacement {
    /// Full replacement assignment rows, exactly one of them main.
    pub assignments: Vec<TaskAssignment>,
    /// Users gaining an assignment.
    pub added: Vec<UserId>,
    /// Users losing their assignment.
    pub removed: Vec<UserId>,
}

impl AssignmentReplacement {
    /// Returns whether applying the plan would change any row.
    #[must_use]
    pub fn changes_nothing(&self, current: &[TaskAssignment]) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && main_assignee(&self.assignments) == main_assignee(current)
    }
}

/// Plans the replacement of a task's assignee set.
///
/// Duplicate user ids are collapsed, keeping first-occurrence order.
/// Retained assignees keep their original `assigned_at`; newcomers are
/// stamped with the current clock time.
///
/// # Errors
///
/// Returns [`TaskDomainError::InvalidAssignment`] when the deduplicated
/// list is empty or does not contain `main_assignee_id`.
pub fn plan_replacement(
    task_id: TaskId,
    current: &[TaskAssignment],
    user_ids: &[UserId],
    main_assignee_id: UserId,
    clock: &impl Clock,
) -> Result<AssignmentReplacement, TaskDomainError> {
    let mut requested: Vec<UserId> = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        if !requested.contains(user_id) {
            requested.push(*user_id);
        }
    }

    if requested.is_empty() {
        return Err(TaskDomainError::InvalidAssignment {
            task_id,
            reason: AssignmentRejection::EmptyAssigneeSet,
        });
    }
    if !requested.contains(&main_assignee_id) {
        return Err(TaskDomainError::InvalidAssignment {
            task_id,
            reason: AssignmentRejection::MainAssigneeNotIncluded(main_assignee_id),
        });
    }

    let assignments = requested
        .iter()
        .map(|user_id| {
            let assigned_at = current
                .iter()
                .find(|assignment| assignment.user_id == *user_id)
                .map(|assignment| assignment.assigned_at);
            let mut row = TaskAssignment::new(
                task_id,
                *user_id,
                *user_id == main_assignee_id,
                clock,
            );
            if let Some(existing) = assigned_at {
                row.assigned_at = existing;
            }
            row
        })
        .collect();

    let added = requested
        .iter()
        .filter(|user_id| !current.iter().any(|a| a.user_id == **user_id))
        .copied()
        .collect();
    let removed = current
        .iter()
        .filter(|assignment| !requested.contains(&assignment.user_id))
        .map(|assignment| assignment.user_id)
        .collect();

    Ok(AssignmentReplacement {
        assignments,
        added,
        removed,
    })
}
