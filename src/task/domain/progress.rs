//! Per-assignee progress rows and aggregate percentage derivation.

use super::{ProgressId, TaskAssignment, TaskDomainError, TaskId};
use crate::identity::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// One entry in an assignee's progress time series.
///
/// Percentage updates append new rows; only the tick flags of the latest
/// row are ever rewritten. A row with `tick_reverted = true` is excluded
/// from aggregation permanently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Progress row identifier.
    pub progress_id: ProgressId,
    /// Task the progress belongs to.
    pub task_id: TaskId,
    /// Assignee who owns this row.
    pub user_id: UserId,
    /// Reported completion percentage, 0..=100.
    pub percentage_complete: u8,
    /// Optional milestone note.
    pub milestone_description: Option<String>,
    /// Explicit per-assignee completion marker, independent of percentage.
    pub is_tick_complete: bool,
    /// Whether a prior tick on this row was undone.
    pub tick_reverted: bool,
    /// Time the row was first recorded.
    pub created_at: DateTime<Utc>,
    /// Time the row was last touched (tick or revert).
    pub updated_at: DateTime<Utc>,
}

impl TaskProgress {
    /// Creates a validated progress row.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OutOfRange`] when `percentage_complete`
    /// exceeds 100.
    pub fn new(
        task_id: TaskId,
        user_id: UserId,
        percentage_complete: u8,
        milestone_description: Option<String>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        if percentage_complete > 100 {
            return Err(TaskDomainError::OutOfRange {
                task_id,
                user_id,
                percentage: percentage_complete,
            });
        }
        let timestamp = clock.utc();
        Ok(Self {
            progress_id: ProgressId::new(),
            task_id,
            user_id,
            percentage_complete,
            milestone_description,
            is_tick_complete: false,
            tick_reverted: false,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Creates an already-ticked row carrying `percentage_complete`.
    ///
    /// Used when an assignee ticks without any prior progress row, or after
    /// a revert consumed their latest row.
    #[must_use]
    pub fn ticked(
        task_id: TaskId,
        user_id: UserId,
        percentage_complete: u8,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            progress_id: ProgressId::new(),
            task_id,
            user_id,
            percentage_complete,
            milestone_description: None,
            is_tick_complete: true,
            tick_reverted: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Marks the row tick-complete.
    pub fn mark_ticked(&mut self, clock: &impl Clock) {
        self.is_tick_complete = true;
        self.updated_at = clock.utc();
    }

    /// Undoes a tick, excluding the row from aggregation permanently.
    pub fn revert_tick(&mut self, clock: &impl Clock) {
        self.is_tick_complete = false;
        self.tick_reverted = true;
        self.updated_at = clock.utc();
    }
}

/// Returns the newest progress row recorded for `user_id`.
///
/// `entries` must be ordered by `created_at` ascending, the order every
/// store returns them in.
#[must_use]
pub fn latest_for_user(entries: &[TaskProgress], user_id: UserId) -> Option<&TaskProgress> {
    entries.iter().rev().find(|entry| entry.user_id == user_id)
}

/// Returns the authoritative percentage for `user_id`: the newest
/// non-reverted row, or 0 when none exists.
#[must_use]
pub fn effective_percentage(entries: &[TaskProgress], user_id: UserId) -> u8 {
    entries
        .iter()
        .rev()
        .find(|entry| entry.user_id == user_id && !entry.tick_reverted)
        .map_or(0, |entry| entry.percentage_complete)
}

/// Derives the task-level aggregate percentage: the floor of the arithmetic
/// mean of each assignee's effective percentage.
///
/// A task with zero assignees aggregates to 0 (and can therefore never
/// satisfy the completion guard).
#[must_use]
pub fn aggregate_percentage(assignments: &[TaskAssignment], entries: &[TaskProgress]) -> u8 {
    let total: u32 = assignments
        .iter()
        .map(|assignment| u32::from(effective_percentage(entries, assignment.user_id)))
        .sum();
    let count = u32::try_from(assignments.len()).unwrap_or(u32::MAX);
    let mean = total.checked_div(count).unwrap_or(0);
    u8::try_from(mean).unwrap_or(100)
}
