//! Domain event port for downstream notification subsystems.

use crate::identity::UserId;
use crate::task::domain::{StatusName, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Abstract event emitted by the engine after a successful mutation.
///
/// Delivery is fire-and-forget: emission happens only after the mutation
/// committed, and a lost event never rolls the mutation back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// The assignee set or main assignee changed.
    AssignmentChanged {
        /// Affected task.
        task_id: TaskId,
        /// Users gaining an assignment.
        added: Vec<UserId>,
        /// Users losing their assignment.
        removed: Vec<UserId>,
        /// Main assignee after the change.
        main_assignee: UserId,
    },
    /// The task moved to a new lifecycle status.
    StatusChanged {
        /// Affected task.
        task_id: TaskId,
        /// Status before the transition.
        from: StatusName,
        /// Status after the transition.
        to: StatusName,
    },
    /// A non-terminal task's due date has passed.
    TaskOverdue {
        /// Affected task.
        task_id: TaskId,
        /// The missed deadline.
        due_date: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Returns the event name consumed by subscribers.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AssignmentChanged { .. } => "assignment_changed",
            Self::StatusChanged { .. } => "status_changed",
            Self::TaskOverdue { .. } => "task_overdue",
        }
    }

    /// Returns the serialized payload handed to subscribers.
    #[must_use]
    pub fn payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Fire-and-forget sink for domain events.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Delivers an event to downstream subscribers, best effort.
    async fn emit(&self, event: DomainEvent);
}
