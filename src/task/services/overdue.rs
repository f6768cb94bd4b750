//! Scheduled overdue sweep emitting notification events.

use crate::task::ports::{DomainEvent, EventEmitter, TaskStore};
use crate::task::services::error::WorkflowResult;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Read-only sweep over open tasks with a missed deadline.
///
/// The embedding application decides the cadence (the original system runs
/// one sweep per hour); the engine only finds the candidates and emits one
/// `task_overdue` event each. No state is mutated and no history rows are
/// written.
#[derive(Clone)]
pub struct OverdueScanner<S, E>
where
    S: TaskStore,
    E: EventEmitter,
{
    store: Arc<S>,
    events: Arc<E>,
}

impl<S, E> OverdueScanner<S, E>
where
    S: TaskStore,
    E: EventEmitter,
{
    /// Creates a new overdue scanner.
    #[must_use]
    pub const fn new(store: Arc<S>, events: Arc<E>) -> Self {
        Self { store, events }
    }

    /// Emits a `task_overdue` event for every non-terminal task whose due
    /// date passed before `now`, returning how many were found.
    ///
    /// # Errors
    ///
    /// Returns a store error when the candidate scan fails.
    pub async fn scan(&self, now: DateTime<Utc>) -> WorkflowResult<usize> {
        let overdue = self.store.find_overdue(now).await?;
        for task in &overdue {
            if let Some(due_date) = task.due_date() {
                self.events
                    .emit(DomainEvent::TaskOverdue {
                        task_id: task.id(),
                        due_date,
                    })
                    .await;
            }
        }
        if !overdue.is_empty() {
            tracing::info!(count = overdue.len(), "overdue tasks found");
        }
        Ok(overdue.len())
    }
}
