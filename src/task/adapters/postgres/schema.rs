//! Diesel schema for task workflow persistence.

diesel::table! {
    /// Task records with workflow metadata and the optimistic-lock version.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Task title.
        #[max_length = 255]
        title -> Varchar,
        /// Optional longer description.
        description -> Nullable<Text>,
        /// Scheduling priority.
        #[max_length = 20]
        priority -> Varchar,
        /// Numeric priority sort key; lower sorts first.
        priority_order -> SmallInt,
        /// Creating user.
        created_by -> BigInt,
        /// Assigning user.
        assigned_by -> BigInt,
        /// Optional containing project part.
        part_id -> Nullable<BigInt>,
        /// Whether the task bypasses project parts.
        is_direct_assignment -> Bool,
        /// Minimum attachment count required before completion.
        required_file_count -> Integer,
        /// Optional planned start.
        start_date -> Nullable<Timestamptz>,
        /// Optional deadline.
        due_date -> Nullable<Timestamptz>,
        /// Optimistic concurrency version, bumped by every commit batch.
        version -> BigInt,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Assignment rows, one per `(task, user)` pair.
    task_assignments (task_id, user_id) {
        /// Assigned task.
        task_id -> Uuid,
        /// Assigned user.
        user_id -> BigInt,
        /// Whether this user is primarily responsible.
        is_main_assignee -> Bool,
        /// Time the assignment was created.
        assigned_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-style status snapshots; one current row per task.
    task_statuses (id) {
        /// Snapshot row identifier.
        id -> Uuid,
        /// Task the snapshot belongs to.
        task_id -> Uuid,
        /// Lifecycle status name.
        #[max_length = 20]
        status_name -> Varchar,
        /// Optional transition note.
        description -> Nullable<Text>,
        /// Whether this snapshot is the task's current status.
        is_current -> Bool,
        /// User who caused the transition, when one did.
        updated_by -> Nullable<BigInt>,
        /// Time the snapshot was recorded.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-assignee progress time series.
    task_progress (id) {
        /// Progress row identifier.
        id -> Uuid,
        /// Task the progress belongs to.
        task_id -> Uuid,
        /// Assignee who owns the row.
        user_id -> BigInt,
        /// Reported completion percentage.
        percentage_complete -> SmallInt,
        /// Optional milestone note.
        milestone_description -> Nullable<Text>,
        /// Explicit per-assignee completion marker.
        is_tick_complete -> Bool,
        /// Whether a prior tick on this row was undone.
        tick_reverted -> Bool,
        /// Time the row was first recorded.
        created_at -> Timestamptz,
        /// Time the row was last touched.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit ledger; rows are never updated or deleted.
    task_history (id) {
        /// Ledger row identifier.
        id -> Uuid,
        /// Task the row belongs to.
        task_id -> Uuid,
        /// User who performed the operation.
        actor -> BigInt,
        /// Assignee the row refers to, for per-assignee actions.
        subject -> Nullable<BigInt>,
        /// Status snapshot produced by the operation, when one was.
        status_id -> Nullable<Uuid>,
        /// Audited action name.
        #[max_length = 50]
        action -> Varchar,
        /// Effective percentage before the operation.
        old_percentage -> Nullable<SmallInt>,
        /// Recorded percentage after the operation.
        new_percentage -> Nullable<SmallInt>,
        /// Status name in force after the operation.
        #[max_length = 20]
        status_after_update -> Nullable<Varchar>,
        /// Time the row was appended.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    tasks,
    task_assignments,
    task_statuses,
    task_progress,
    task_history,
);
