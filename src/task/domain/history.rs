//! Append-only history ledger rows.

use super::{HistoryId, ParseActionError, StatusId, StatusName, TaskId, TaskStatus};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of auditable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Task record created.
    TaskCreated,
    /// A user was added to or removed from the assignee set, or the main
    /// assignee changed.
    AssignmentChanged,
    /// An assignee recorded a progress percentage.
    ProgressUpdated,
    /// An assignee declared their portion finished.
    TickCompleted,
    /// A prior tick was undone.
    TickReverted,
    /// The task moved to a new lifecycle status.
    StatusChanged,
}

impl HistoryAction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskCreated => "task_created",
            Self::AssignmentChanged => "assignment_changed",
            Self::ProgressUpdated => "progress_updated",
            Self::TickCompleted => "tick_completed",
            Self::TickReverted => "tick_reverted",
            Self::StatusChanged => "status_changed",
        }
    }
}

impl TryFrom<&str> for HistoryAction {
    type Error = ParseActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "task_created" => Ok(Self::TaskCreated),
            "assignment_changed" => Ok(Self::AssignmentChanged),
            "progress_updated" => Ok(Self::ProgressUpdated),
            "tick_completed" => Ok(Self::TickCompleted),
            "tick_reverted" => Ok(Self::TickReverted),
            "status_changed" => Ok(Self::StatusChanged),
            _ => Err(ParseActionError(value.to_owned())),
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the audit ledger.
///
/// Rows are written in the same atomic commit as the mutation they record
/// and are never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHistory {
    /// Ledger row identifier.
    pub history_id: HistoryId,
    /// Task the row belongs to.
    pub task_id: TaskId,
    /// User who performed the operation.
    pub actor: UserId,
    /// Assignee the row refers to, for per-assignee actions.
    pub subject: Option<UserId>,
    /// Status snapshot produced by the operation, when one was.
    pub status_id: Option<StatusId>,
    /// What happened.
    pub action: HistoryAction,
    /// Effective percentage before the operation, for progress actions.
    pub old_percentage: Option<u8>,
    /// Recorded percentage after the operation, for progress actions.
    pub new_percentage: Option<u8>,
    /// Status name in force after the operation completed.
    pub status_after_update: Option<StatusName>,
    /// Time the row was appended.
    pub created_at: DateTime<Utc>,
}

impl TaskHistory {
    fn base(task_id: TaskId, actor: UserId, action: HistoryAction, clock: &impl Clock) -> Self {
        Self {
            history_id: HistoryId::new(),
            task_id,
            actor,
            subject: None,
            status_id: None,
            action,
            old_percentage: None,
            new_percentage: None,
            status_after_update: None,
            created_at: clock.utc(),
        }
    }

    /// Records task creation.
    #[must_use]
    pub fn task_created(task_id: TaskId, actor: UserId, clock: &impl Clock) -> Self {
        Self::base(task_id, actor, HistoryAction::TaskCreated, clock)
    }

    /// Records an assignment change affecting `subject`.
    #[must_use]
    pub fn assignment_changed(
        task_id: TaskId,
        actor: UserId,
        subject: UserId,
        clock: &impl Clock,
    ) -> Self {
        let mut row = Self::base(task_id, actor, HistoryAction::AssignmentChanged, clock);
        row.subject = Some(subject);
        row
    }

    /// Records a progress update for `subject` with percentage snapshots.
    #[must_use]
    pub fn progress_updated(
        task_id: TaskId,
        actor: UserId,
        subject: UserId,
        old_percentage: Option<u8>,
        new_percentage: u8,
        clock: &impl Clock,
    ) -> Self {
        let mut row = Self::base(task_id, actor, HistoryAction::ProgressUpdated, clock);
        row.subject = Some(subject);
        row.old_percentage = old_percentage;
        row.new_percentage = Some(new_percentage);
        row
    }

    /// Records a tick-complete declaration by `subject`.
    #[must_use]
    pub fn tick_completed(
        task_id: TaskId,
        actor: UserId,
        subject: UserId,
        clock: &impl Clock,
    ) -> Self {
        let mut row = Self::base(task_id, actor, HistoryAction::TickCompleted, clock);
        row.subject = Some(subject);
        row
    }

    /// Records an undone tick for `subject`.
    #[must_use]
    pub fn tick_reverted(
        task_id: TaskId,
        actor: UserId,
        subject: UserId,
        clock: &impl Clock,
    ) -> Self {
        let mut row = Self::base(task_id, actor, HistoryAction::TickReverted, clock);
        row.subject = Some(subject);
        row
    }

    /// Records a status transition producing `status`.
    #[must_use]
    pub fn status_changed(
        task_id: TaskId,
        actor: UserId,
        status: &TaskStatus,
        clock: &impl Clock,
    ) -> Self {
        let mut row = Self::base(task_id, actor, HistoryAction::StatusChanged, clock);
        row.status_id = Some(status.status_id);
        row.status_after_update = Some(status.name);
        row
    }
}
