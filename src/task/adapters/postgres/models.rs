//! Diesel row models for task workflow persistence.

use super::schema::{task_assignments, task_history, task_progress, task_statuses, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row model for task records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Scheduling priority.
    pub priority: String,
    /// Numeric priority sort key.
    pub priority_order: i16,
    /// Creating user.
    pub created_by: i64,
    /// Assigning user.
    pub assigned_by: i64,
    /// Optional containing project part.
    pub part_id: Option<i64>,
    /// Whether the task bypasses project parts.
    pub is_direct_assignment: bool,
    /// Minimum attachment count required before completion.
    pub required_file_count: i32,
    /// Optional planned start.
    pub start_date: Option<DateTime<Utc>>,
    /// Optional deadline.
    pub due_date: Option<DateTime<Utc>>,
    /// Optimistic concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row model for assignment records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    /// Assigned task.
    pub task_id: uuid::Uuid,
    /// Assigned user.
    pub user_id: i64,
    /// Whether this user is primarily responsible.
    pub is_main_assignee: bool,
    /// Time the assignment was created.
    pub assigned_at: DateTime<Utc>,
}

/// Row model for status snapshots.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusRow {
    /// Snapshot row identifier.
    pub id: uuid::Uuid,
    /// Task the snapshot belongs to.
    pub task_id: uuid::Uuid,
    /// Lifecycle status name.
    pub status_name: String,
    /// Optional transition note.
    pub description: Option<String>,
    /// Whether this snapshot is the task's current status.
    pub is_current: bool,
    /// User who caused the transition, when one did.
    pub updated_by: Option<i64>,
    /// Time the snapshot was recorded.
    pub updated_at: DateTime<Utc>,
}

/// Row model for progress entries.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_progress)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProgressRow {
    /// Progress row identifier.
    pub id: uuid::Uuid,
    /// Task the progress belongs to.
    pub task_id: uuid::Uuid,
    /// Assignee who owns the row.
    pub user_id: i64,
    /// Reported completion percentage.
    pub percentage_complete: i16,
    /// Optional milestone note.
    pub milestone_description: Option<String>,
    /// Explicit per-assignee completion marker.
    pub is_tick_complete: bool,
    /// Whether a prior tick on this row was undone.
    pub tick_reverted: bool,
    /// Time the row was first recorded.
    pub created_at: DateTime<Utc>,
    /// Time the row was last touched.
    pub updated_at: DateTime<Utc>,
}

/// Row model for history ledger entries.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_history)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HistoryRow {
    /// Ledger row identifier.
    pub id: uuid::Uuid,
    /// Task the row belongs to.
    pub task_id: uuid::Uuid,
    /// User who performed the operation.
    pub actor: i64,
    /// Assignee the row refers to, for per-assignee actions.
    pub subject: Option<i64>,
    /// Status snapshot produced by the operation, when one was.
    pub status_id: Option<uuid::Uuid>,
    /// Audited action name.
    pub action: String,
    /// Effective percentage before the operation.
    pub old_percentage: Option<i16>,
    /// Recorded percentage after the operation.
    pub new_percentage: Option<i16>,
    /// Status name in force after the operation.
    pub status_after_update: Option<String>,
    /// Time the row was appended.
    pub created_at: DateTime<Utc>,
}
