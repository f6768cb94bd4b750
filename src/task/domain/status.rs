//! Task status snapshots and the lifecycle state machine.

use super::{ParseStatusError, StatusId, TaskId};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// # Examples
///
/// ```rust
/// use workstream::task::domain::StatusName;
///
/// assert!(StatusName::Pending.can_transition_to(StatusName::InProgress));
/// assert!(!StatusName::Archived.can_transition_to(StatusName::Pending));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusName {
    /// Task has been created but work has not started.
    Pending,
    /// At least one assignee is recording progress.
    InProgress,
    /// Work has been submitted and awaits review.
    Review,
    /// Task has been accepted as complete.
    Done,
    /// Task has been shelved by an explicit administrative action.
    Archived,
}

impl StatusName {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }

    /// Returns whether no automatic transition ever leaves this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Archived)
    }

    /// Returns whether the state machine permits `self -> to`.
    ///
    /// `Done -> InProgress` is included here but is only reachable through
    /// a tick revert or an explicit override; the status engine enforces
    /// that restriction.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending | Self::Review | Self::Done, Self::InProgress)
                | (Self::InProgress, Self::Review)
                | (Self::Review, Self::Done)
                | (Self::Pending | Self::InProgress | Self::Review, Self::Archived)
        )
    }

    /// Returns whether the transition is reserved for tick reverts and
    /// explicit overrides.
    #[must_use]
    pub const fn requires_override(self, to: Self) -> bool {
        matches!((self, to), (Self::Done, Self::InProgress))
    }
}

impl TryFrom<&str> for StatusName {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for StatusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-style status snapshot row.
///
/// Exactly one row per task carries `is_current = true`. Transitions insert
/// a new row and retire the previous current one; `name` is never rewritten
/// in place, so the sequence of rows preserves the full status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Snapshot row identifier.
    pub status_id: StatusId,
    /// Task this snapshot belongs to.
    pub task_id: TaskId,
    /// Lifecycle status recorded by this snapshot.
    pub name: StatusName,
    /// Optional free-form note attached to the transition.
    pub description: Option<String>,
    /// Whether this snapshot is the task's current status.
    pub is_current: bool,
    /// User who caused the transition, when one did.
    pub updated_by: Option<UserId>,
    /// Time the snapshot was recorded.
    pub updated_at: DateTime<Utc>,
}

impl TaskStatus {
    /// Creates a new current status snapshot.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        name: StatusName,
        updated_by: Option<UserId>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            status_id: StatusId::new(),
            task_id,
            name,
            description: None,
            is_current: true,
            updated_by,
            updated_at: clock.utc(),
        }
    }

    /// Attaches a free-form note to the snapshot.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
