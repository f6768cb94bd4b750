//! Task store port: atomic, versioned persistence for one task's state.

use crate::identity::UserId;
use crate::task::domain::{
    Task, TaskAssignment, TaskHistory, TaskId, TaskProgress, TaskStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Monotonic per-task version used for optimistic concurrency control.
///
/// Every successful [`TaskStore::commit`] advances the version; a commit
/// presented with a stale version fails with [`TaskStoreError::Conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreVersion(u64);

impl StoreVersion {
    /// Version assigned to a freshly inserted task.
    #[must_use]
    pub const fn initial() -> Self {
        Self(0)
    }

    /// Returns the version after one committed mutation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the underlying counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Reconstructs a version from its persisted counter value.
    #[must_use]
    pub const fn from_value(value: u64) -> Self {
        Self(value)
    }
}

/// Consistent read of one task's full state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSnapshot {
    /// The task aggregate.
    pub task: Task,
    /// All assignment rows.
    pub assignments: Vec<TaskAssignment>,
    /// All progress rows, ordered by `created_at` ascending.
    pub progress: Vec<TaskProgress>,
    /// The single current status snapshot.
    pub current_status: TaskStatus,
    /// Store version the snapshot was taken at.
    pub version: StoreVersion,
}

/// One write in a commit batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskWrite {
    /// Inserts an assignment row, or replaces the row with the same user.
    PutAssignment(TaskAssignment),
    /// Deletes the assignment row for the user.
    RemoveAssignment(UserId),
    /// Makes the user the sole main assignee, clearing the flag elsewhere.
    SetMainAssignee(UserId),
    /// Appends a progress row to the time series.
    AppendProgress(TaskProgress),
    /// Replaces the progress row sharing the same `progress_id`.
    ReplaceProgress(TaskProgress),
    /// Retires the current status row and installs this one as current.
    PushStatus(TaskStatus),
}

/// Task persistence contract.
///
/// All operations are bounded in time; a store that cannot answer within
/// its deadline fails with [`TaskStoreError::Unavailable`] rather than
/// blocking the caller indefinitely.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Atomically inserts a new task with its initial status, assignments,
    /// and history rows.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateTask`] when the task ID already
    /// exists and [`TaskStoreError::Unavailable`] on persistence failure.
    async fn insert_task(
        &self,
        task: &Task,
        initial_status: &TaskStatus,
        assignments: &[TaskAssignment],
        history: &[TaskHistory],
    ) -> TaskStoreResult<()>;

    /// Takes a consistent snapshot of the task's full state.
    ///
    /// Returns `None` when the task does not exist.
    async fn snapshot(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskSnapshot>>;

    /// Atomically applies a write batch and appends its history rows.
    ///
    /// Either every write and every history row commits, or none do. The
    /// batch is rejected with [`TaskStoreError::Conflict`] when the task's
    /// version no longer equals `expected`; callers re-read and re-validate.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] for unknown tasks,
    /// [`TaskStoreError::Conflict`] on a stale version, and
    /// [`TaskStoreError::Unavailable`] on persistence failure.
    async fn commit(
        &self,
        task_id: TaskId,
        expected: StoreVersion,
        writes: Vec<TaskWrite>,
        history: Vec<TaskHistory>,
    ) -> TaskStoreResult<()>;

    /// Returns the task's history ledger ordered by `created_at` ascending.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] for unknown tasks.
    async fn history(&self, task_id: TaskId) -> TaskStoreResult<Vec<TaskHistory>>;

    /// Returns tasks whose due date passed before `now` and whose current
    /// status is non-terminal.
    async fn find_overdue(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task's version moved between snapshot and commit.
    #[error("conflicting concurrent write on task {task_id}, retry with fresh state")]
    Conflict {
        /// Task whose version check failed.
        task_id: TaskId,
    },

    /// The storage backend could not complete the operation in time.
    #[error("storage unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a backend failure as a storage-unavailable error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
