//! Thread-safe in-memory task store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Task, TaskAssignment, TaskHistory, TaskId, TaskProgress, TaskStatus},
    ports::{StoreVersion, TaskSnapshot, TaskStore, TaskStoreError, TaskStoreResult, TaskWrite},
};

/// Thread-safe in-memory task store.
///
/// Commit batches apply under one write lock, giving the same atomicity
/// and optimistic-versioning behaviour as the database-backed store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    tasks: HashMap<TaskId, TaskEntry>,
}

#[derive(Debug)]
struct TaskEntry {
    task: Task,
    version: StoreVersion,
    assignments: Vec<TaskAssignment>,
    progress: Vec<TaskProgress>,
    statuses: Vec<TaskStatus>,
    history: Vec<TaskHistory>,
}

impl InMemoryTaskStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> TaskStoreError {
    TaskStoreError::unavailable(std::io::Error::other(err.to_string()))
}

fn apply_write(entry: &mut TaskEntry, write: TaskWrite) {
    match write {
        TaskWrite::PutAssignment(assignment) => {
            let existing = entry
                .assignments
                .iter_mut()
                .find(|row| row.user_id == assignment.user_id);
            if let Some(row) = existing {
                *row = assignment;
            } else {
                entry.assignments.push(assignment);
            }
        }
        TaskWrite::RemoveAssignment(user_id) => {
            entry.assignments.retain(|row| row.user_id != user_id);
        }
        TaskWrite::SetMainAssignee(user_id) => {
            for row in &mut entry.assignments {
                row.is_main_assignee = row.user_id == user_id;
            }
        }
        TaskWrite::AppendProgress(progress) => {
            entry.progress.push(progress);
        }
        TaskWrite::ReplaceProgress(progress) => {
            let existing = entry
                .progress
                .iter_mut()
                .find(|row| row.progress_id == progress.progress_id);
            if let Some(row) = existing {
                *row = progress;
            }
        }
        TaskWrite::PushStatus(status) => {
            for row in &mut entry.statuses {
                row.is_current = false;
            }
            entry.statuses.push(status);
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert_task(
        &self,
        task: &Task,
        initial_status: &TaskStatus,
        assignments: &[TaskAssignment],
        history: &[TaskHistory],
    ) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskStoreError::DuplicateTask(task.id()));
        }
        state.tasks.insert(
            task.id(),
            TaskEntry {
                task: task.clone(),
                version: StoreVersion::initial(),
                assignments: assignments.to_vec(),
                progress: Vec::new(),
                statuses: vec![initial_status.clone()],
                history: history.to_vec(),
            },
        );
        Ok(())
    }

    async fn snapshot(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskSnapshot>> {
        let state = self.state.read().map_err(lock_error)?;
        let Some(entry) = state.tasks.get(&task_id) else {
            return Ok(None);
        };
        let current_status = entry
            .statuses
            .iter()
            .find(|status| status.is_current)
            .cloned()
            .ok_or_else(|| lock_error(format!("task {task_id} has no current status row")))?;
        Ok(Some(TaskSnapshot {
            task: entry.task.clone(),
            assignments: entry.assignments.clone(),
            progress: entry.progress.clone(),
            current_status,
            version: entry.version,
        }))
    }

    async fn commit(
        &self,
        task_id: TaskId,
        expected: StoreVersion,
        writes: Vec<TaskWrite>,
        history: Vec<TaskHistory>,
    ) -> TaskStoreResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let entry = state
            .tasks
            .get_mut(&task_id)
            .ok_or(TaskStoreError::NotFound(task_id))?;
        if entry.version != expected {
            return Err(TaskStoreError::Conflict { task_id });
        }
        for write in writes {
            apply_write(entry, write);
        }
        entry.history.extend(history);
        entry.version = entry.version.next();
        Ok(())
    }

    async fn history(&self, task_id: TaskId) -> TaskStoreResult<Vec<TaskHistory>> {
        let state = self.state.read().map_err(lock_error)?;
        let entry = state
            .tasks
            .get(&task_id)
            .ok_or(TaskStoreError::NotFound(task_id))?;
        // Rows are appended in commit order, which follows created_at.
        Ok(entry.history.clone())
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let overdue = state
            .tasks
            .values()
            .filter(|entry| {
                entry.task.is_overdue(now)
                    && entry
                        .statuses
                        .iter()
                        .any(|status| status.is_current && !status.name.is_terminal())
            })
            .map(|entry| entry.task.clone())
            .collect();
        Ok(overdue)
    }
}
