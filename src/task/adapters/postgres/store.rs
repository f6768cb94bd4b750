//! `PostgreSQL` task store implementation.

use super::{
    models::{AssignmentRow, HistoryRow, ProgressRow, StatusRow, TaskRow},
    schema::{task_assignments, task_history, task_progress, task_statuses, tasks},
};
use crate::identity::UserId;
use crate::task::{
    domain::{
        HistoryAction, HistoryId, PartId, PersistedTaskData, Priority, ProgressId, StatusId,
        StatusName, Task, TaskAssignment, TaskHistory, TaskId, TaskProgress, TaskStatus,
    },
    ports::{StoreVersion, TaskSnapshot, TaskStore, TaskStoreError, TaskStoreResult, TaskWrite},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
///
/// The pool's checkout timeout bounds every store operation; exhaustion
/// surfaces as [`TaskStoreError::Unavailable`].
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task store.
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: TaskPgPool,
}

/// Error used inside Diesel transactions before mapping to the port error.
enum TxError {
    Store(TaskStoreError),
    Diesel(DieselError),
}

impl From<DieselError> for TxError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

impl From<TaskStoreError> for TxError {
    fn from(err: TaskStoreError) -> Self {
        Self::Store(err)
    }
}

impl TxError {
    fn into_store(self, task_id: TaskId) -> TaskStoreError {
        match self {
            Self::Store(err) => err,
            Self::Diesel(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                TaskStoreError::DuplicateTask(task_id)
            }
            Self::Diesel(err) => TaskStoreError::unavailable(err),
        }
    }
}

fn corrupt(message: String) -> TaskStoreError {
    TaskStoreError::unavailable(std::io::Error::other(message))
}

impl PgTaskStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskStoreError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskStoreError::unavailable)?
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn insert_task(
        &self,
        task: &Task,
        initial_status: &TaskStatus,
        assignments: &[TaskAssignment],
        history: &[TaskHistory],
    ) -> TaskStoreResult<()> {
        let task_id = task.id();
        let task_row = to_task_row(task, StoreVersion::initial());
        let status_row = to_status_row(initial_status);
        let assignment_rows: Vec<AssignmentRow> = assignments.iter().map(to_assignment_row).collect();
        let history_rows: Vec<HistoryRow> = history.iter().map(to_history_row).collect();

        self.run_blocking(move |connection| {
            connection
                .transaction::<_, TxError, _>(|tx| {
                    diesel::insert_into(tasks::table)
                        .values(&task_row)
                        .execute(tx)?;
                    diesel::insert_into(task_statuses::table)
                        .values(&status_row)
                        .execute(tx)?;
                    if !assignment_rows.is_empty() {
                        diesel::insert_into(task_assignments::table)
                            .values(&assignment_rows)
                            .execute(tx)?;
                    }
                    if !history_rows.is_empty() {
                        diesel::insert_into(task_history::table)
                            .values(&history_rows)
                            .execute(tx)?;
                    }
                    Ok(())
                })
                .map_err(|err| err.into_store(task_id))
        })
        .await
    }

    async fn snapshot(&self, task_id: TaskId) -> TaskStoreResult<Option<TaskSnapshot>> {
        self.run_blocking(move |connection| {
            connection
                .transaction::<_, TxError, _>(|tx| {
                    let Some(task_row) = tasks::table
                        .filter(tasks::id.eq(task_id.into_inner()))
                        .select(TaskRow::as_select())
                        .first::<TaskRow>(tx)
                        .optional()?
                    else {
                        return Ok(None);
                    };

                    let assignment_rows = task_assignments::table
                        .filter(task_assignments::task_id.eq(task_id.into_inner()))
                        .order(task_assignments::assigned_at.asc())
                        .select(AssignmentRow::as_select())
                        .load::<AssignmentRow>(tx)?;
                    let progress_rows = task_progress::table
                        .filter(task_progress::task_id.eq(task_id.into_inner()))
                        .order(task_progress::created_at.asc())
                        .select(ProgressRow::as_select())
                        .load::<ProgressRow>(tx)?;
                    let status_row = task_statuses::table
                        .filter(task_statuses::task_id.eq(task_id.into_inner()))
                        .filter(task_statuses::is_current.eq(true))
                        .select(StatusRow::as_select())
                        .first::<StatusRow>(tx)
                        .optional()?
                        .ok_or_else(|| {
                            TxError::Store(corrupt(format!(
                                "task {task_id} has no current status row"
                            )))
                        })?;

                    let version = StoreVersion::from_value(
                        u64::try_from(task_row.version).unwrap_or_default(),
                    );
                    let snapshot = TaskSnapshot {
                        task: row_to_task(task_row)?,
                        assignments: assignment_rows.iter().map(row_to_assignment).collect(),
                        progress: progress_rows
                            .into_iter()
                            .map(row_to_progress)
                            .collect::<Result<_, _>>()?,
                        current_status: row_to_status(status_row)?,
                        version,
                    };
                    Ok(Some(snapshot))
                })
                .map_err(|err| err.into_store(task_id))
        })
        .await
    }

    async fn commit(
        &self,
        task_id: TaskId,
        expected: StoreVersion,
        writes: Vec<TaskWrite>,
        history: Vec<TaskHistory>,
    ) -> TaskStoreResult<()> {
        let history_rows: Vec<HistoryRow> = history.iter().map(to_history_row).collect();

        self.run_blocking(move |connection| {
            connection
                .transaction::<_, TxError, _>(|tx| {
                    let expected_version = i64::try_from(expected.value()).unwrap_or(i64::MAX);
                    let updated = diesel::update(
                        tasks::table
                            .filter(tasks::id.eq(task_id.into_inner()))
                            .filter(tasks::version.eq(expected_version)),
                    )
                    .set(tasks::version.eq(expected_version.saturating_add(1)))
                    .execute(tx)?;

                    if updated == 0 {
                        let exists: i64 = tasks::table
                            .filter(tasks::id.eq(task_id.into_inner()))
                            .count()
                            .get_result(tx)?;
                        let err = if exists == 0 {
                            TaskStoreError::NotFound(task_id)
                        } else {
                            TaskStoreError::Conflict { task_id }
                        };
                        return Err(err.into());
                    }

                    for write in writes {
                        apply_write(tx, task_id, write)?;
                    }
                    if !history_rows.is_empty() {
                        diesel::insert_into(task_history::table)
                            .values(&history_rows)
                            .execute(tx)?;
                    }
                    Ok(())
                })
                .map_err(|err| err.into_store(task_id))
        })
        .await
    }

    async fn history(&self, task_id: TaskId) -> TaskStoreResult<Vec<TaskHistory>> {
        self.run_blocking(move |connection| {
            let exists: i64 = tasks::table
                .filter(tasks::id.eq(task_id.into_inner()))
                .count()
                .get_result(connection)
                .map_err(TaskStoreError::unavailable)?;
            if exists == 0 {
                return Err(TaskStoreError::NotFound(task_id));
            }

            let rows = task_history::table
                .filter(task_history::task_id.eq(task_id.into_inner()))
                .order(task_history::created_at.asc())
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)
                .map_err(TaskStoreError::unavailable)?;
            rows.into_iter().map(row_to_history).collect()
        })
        .await
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let open_ids: Vec<uuid::Uuid> = task_statuses::table
                .filter(task_statuses::is_current.eq(true))
                .filter(task_statuses::status_name.ne_all(vec![
                    StatusName::Done.as_str(),
                    StatusName::Archived.as_str(),
                ]))
                .select(task_statuses::task_id)
                .load(connection)
                .map_err(TaskStoreError::unavailable)?;

            let rows = tasks::table
                .filter(tasks::id.eq_any(open_ids))
                .filter(tasks::due_date.lt(now))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskStoreError::unavailable)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

fn apply_write(tx: &mut PgConnection, task_id: TaskId, write: TaskWrite) -> Result<(), TxError> {
    match write {
        TaskWrite::PutAssignment(assignment) => {
            let row = to_assignment_row(&assignment);
            diesel::delete(
                task_assignments::table
                    .filter(task_assignments::task_id.eq(task_id.into_inner()))
                    .filter(task_assignments::user_id.eq(row.user_id)),
            )
            .execute(tx)?;
            diesel::insert_into(task_assignments::table)
                .values(&row)
                .execute(tx)?;
        }
        TaskWrite::RemoveAssignment(user_id) => {
            diesel::delete(
                task_assignments::table
                    .filter(task_assignments::task_id.eq(task_id.into_inner()))
                    .filter(task_assignments::user_id.eq(user_id.value())),
            )
            .execute(tx)?;
        }
        TaskWrite::SetMainAssignee(user_id) => {
            diesel::update(
                task_assignments::table
                    .filter(task_assignments::task_id.eq(task_id.into_inner())),
            )
            .set(task_assignments::is_main_assignee.eq(false))
            .execute(tx)?;
            diesel::update(
                task_assignments::table
                    .filter(task_assignments::task_id.eq(task_id.into_inner()))
                    .filter(task_assignments::user_id.eq(user_id.value())),
            )
            .set(task_assignments::is_main_assignee.eq(true))
            .execute(tx)?;
        }
        TaskWrite::AppendProgress(progress) => {
            let row = to_progress_row(&progress);
            diesel::insert_into(task_progress::table)
                .values(&row)
                .execute(tx)?;
        }
        TaskWrite::ReplaceProgress(progress) => {
            let row = to_progress_row(&progress);
            diesel::update(task_progress::table.filter(task_progress::id.eq(row.id)))
                .set((
                    task_progress::percentage_complete.eq(row.percentage_complete),
                    task_progress::milestone_description.eq(row.milestone_description),
                    task_progress::is_tick_complete.eq(row.is_tick_complete),
                    task_progress::tick_reverted.eq(row.tick_reverted),
                    task_progress::updated_at.eq(row.updated_at),
                ))
                .execute(tx)?;
        }
        TaskWrite::PushStatus(status) => {
            let row = to_status_row(&status);
            diesel::update(
                task_statuses::table
                    .filter(task_statuses::task_id.eq(task_id.into_inner()))
                    .filter(task_statuses::is_current.eq(true)),
            )
            .set(task_statuses::is_current.eq(false))
            .execute(tx)?;
            diesel::insert_into(task_statuses::table)
                .values(&row)
                .execute(tx)?;
        }
    }
    Ok(())
}

fn to_task_row(task: &Task, version: StoreVersion) -> TaskRow {
    TaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(ToOwned::to_owned),
        priority: task.priority().as_str().to_owned(),
        priority_order: i16::from(task.priority_order()),
        created_by: task.created_by().value(),
        assigned_by: task.assigned_by().value(),
        part_id: task.part_id().map(PartId::value),
        is_direct_assignment: task.is_direct_assignment(),
        required_file_count: i32::try_from(task.required_file_count()).unwrap_or(i32::MAX),
        start_date: task.start_date(),
        due_date: task.due_date(),
        version: i64::try_from(version.value()).unwrap_or(i64::MAX),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> Result<Task, TaskStoreError> {
    let priority = Priority::try_from(row.priority.as_str())
        .map_err(TaskStoreError::unavailable)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        priority,
        created_by: UserId::new(row.created_by),
        assigned_by: UserId::new(row.assigned_by),
        part_id: row.part_id.map(PartId::new),
        is_direct_assignment: row.is_direct_assignment,
        required_file_count: u32::try_from(row.required_file_count).unwrap_or_default(),
        start_date: row.start_date,
        due_date: row.due_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn to_assignment_row(assignment: &TaskAssignment) -> AssignmentRow {
    AssignmentRow {
        task_id: assignment.task_id.into_inner(),
        user_id: assignment.user_id.value(),
        is_main_assignee: assignment.is_main_assignee,
        assigned_at: assignment.assigned_at,
    }
}

fn row_to_assignment(row: &AssignmentRow) -> TaskAssignment {
    TaskAssignment {
        task_id: TaskId::from_uuid(row.task_id),
        user_id: UserId::new(row.user_id),
        is_main_assignee: row.is_main_assignee,
        assigned_at: row.assigned_at,
    }
}

fn to_status_row(status: &TaskStatus) -> StatusRow {
    StatusRow {
        id: status.status_id.into_inner(),
        task_id: status.task_id.into_inner(),
        status_name: status.name.as_str().to_owned(),
        description: status.description.clone(),
        is_current: status.is_current,
        updated_by: status.updated_by.map(UserId::value),
        updated_at: status.updated_at,
    }
}

fn row_to_status(row: StatusRow) -> Result<TaskStatus, TaskStoreError> {
    let name = StatusName::try_from(row.status_name.as_str())
        .map_err(TaskStoreError::unavailable)?;
    Ok(TaskStatus {
        status_id: StatusId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        name,
        description: row.description,
        is_current: row.is_current,
        updated_by: row.updated_by.map(UserId::new),
        updated_at: row.updated_at,
    })
}

fn to_progress_row(progress: &TaskProgress) -> ProgressRow {
    ProgressRow {
        id: progress.progress_id.into_inner(),
        task_id: progress.task_id.into_inner(),
        user_id: progress.user_id.value(),
        percentage_complete: i16::from(progress.percentage_complete),
        milestone_description: progress.milestone_description.clone(),
        is_tick_complete: progress.is_tick_complete,
        tick_reverted: progress.tick_reverted,
        created_at: progress.created_at,
        updated_at: progress.updated_at,
    }
}

fn row_to_progress(row: ProgressRow) -> Result<TaskProgress, TaskStoreError> {
    let percentage_complete = u8::try_from(row.percentage_complete)
        .map_err(|_| corrupt(format!("percentage out of range: {}", row.percentage_complete)))?;
    Ok(TaskProgress {
        progress_id: ProgressId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        user_id: UserId::new(row.user_id),
        percentage_complete,
        milestone_description: row.milestone_description,
        is_tick_complete: row.is_tick_complete,
        tick_reverted: row.tick_reverted,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn to_history_row(history: &TaskHistory) -> HistoryRow {
    HistoryRow {
        id: history.history_id.into_inner(),
        task_id: history.task_id.into_inner(),
        actor: history.actor.value(),
        subject: history.subject.map(UserId::value),
        status_id: history.status_id.map(StatusId::into_inner),
        action: history.action.as_str().to_owned(),
        old_percentage: history.old_percentage.map(i16::from),
        new_percentage: history.new_percentage.map(i16::from),
        status_after_update: history
            .status_after_update
            .map(|name| name.as_str().to_owned()),
        created_at: history.created_at,
    }
}

fn row_to_history(row: HistoryRow) -> Result<TaskHistory, TaskStoreError> {
    let action = HistoryAction::try_from(row.action.as_str())
        .map_err(TaskStoreError::unavailable)?;
    let status_after_update = row
        .status_after_update
        .as_deref()
        .map(StatusName::try_from)
        .transpose()
        .map_err(TaskStoreError::unavailable)?;
    let old_percentage = row
        .old_percentage
        .map(|value| u8::try_from(value).map_err(|_| corrupt(format!("percentage out of range: {value}"))))
        .transpose()?;
    let new_percentage = row
        .new_percentage
        .map(|value| u8::try_from(value).map_err(|_| corrupt(format!("percentage out of range: {value}"))))
        .transpose()?;
    Ok(TaskHistory {
        history_id: HistoryId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        actor: UserId::new(row.actor),
        subject: row.subject.map(UserId::new),
        status_id: row.status_id.map(StatusId::from_uuid),
        action,
        old_percentage,
        new_percentage,
        status_after_update,
        created_at: row.created_at,
    })
}
