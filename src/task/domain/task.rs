//! Task aggregate root and priority types.

use super::{ParsePriorityError, PartId, TaskDomainError, TaskId};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal scheduling.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Returns the numeric sort key; lower values sort first.
    #[must_use]
    pub const fn sort_order(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Medium => 2,
            Self::Low => 3,
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated task attributes supplied at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Scheduling priority.
    pub priority: Priority,
    /// Containing project part, absent for direct assignments.
    pub part_id: Option<PartId>,
    /// Whether the task was handed to a person outside any project part.
    pub is_direct_assignment: bool,
    /// Minimum number of attached files required before completion.
    pub required_file_count: u32,
    /// Optional planned start.
    pub start_date: Option<DateTime<Utc>>,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    priority: Priority,
    created_by: UserId,
    assigned_by: UserId,
    part_id: Option<PartId>,
    is_direct_assignment: bool,
    required_file_count: u32,
    start_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted creator.
    pub created_by: UserId,
    /// Persisted assigner.
    pub assigned_by: UserId,
    /// Persisted part reference, if any.
    pub part_id: Option<PartId>,
    /// Persisted direct-assignment flag.
    pub is_direct_assignment: bool,
    /// Persisted attachment requirement.
    pub required_file_count: u32,
    /// Persisted start date, if any.
    pub start_date: Option<DateTime<Utc>>,
    /// Persisted due date, if any.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title trims to
    /// nothing, [`TaskDomainError::PartMismatch`] when the part reference
    /// disagrees with the direct-assignment flag, and
    /// [`TaskDomainError::InvalidSchedule`] when the start date falls after
    /// the due date.
    pub fn new(draft: TaskDraft, created_by: UserId, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = draft.title.trim().to_owned();
        if title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if draft.is_direct_assignment == draft.part_id.is_some() {
            return Err(TaskDomainError::PartMismatch {
                is_direct_assignment: draft.is_direct_assignment,
            });
        }
        if let (Some(start), Some(due)) = (draft.start_date, draft.due_date)
            && start > due
        {
            return Err(TaskDomainError::InvalidSchedule { start, due });
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: draft.description,
            priority: draft.priority,
            created_by,
            assigned_by: created_by,
            part_id: draft.part_id,
            is_direct_assignment: draft.is_direct_assignment,
            required_file_count: draft.required_file_count,
            start_date: draft.start_date,
            due_date: draft.due_date,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            created_by: data.created_by,
            assigned_by: data.assigned_by,
            part_id: data.part_id,
            is_direct_assignment: data.is_direct_assignment,
            required_file_count: data.required_file_count,
            start_date: data.start_date,
            due_date: data.due_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the task description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the scheduling priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the numeric priority sort key; lower values sort first.
    #[must_use]
    pub const fn priority_order(&self) -> u8 {
        self.priority.sort_order()
    }

    /// Returns the creating user.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the assigning user.
    #[must_use]
    pub const fn assigned_by(&self) -> UserId {
        self.assigned_by
    }

    /// Returns the containing part, if any.
    #[must_use]
    pub const fn part_id(&self) -> Option<PartId> {
        self.part_id
    }

    /// Returns whether the task is a direct assignment.
    #[must_use]
    pub const fn is_direct_assignment(&self) -> bool {
        self.is_direct_assignment
    }

    /// Returns the minimum attachment count required before completion.
    #[must_use]
    pub const fn required_file_count(&self) -> u32 {
        self.required_file_count
    }

    /// Returns the planned start date, if any.
    #[must_use]
    pub const fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the deadline has passed at `now`.
    ///
    /// Status is not consulted here; callers decide whether an overdue
    /// terminal task is interesting.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now)
    }
}
