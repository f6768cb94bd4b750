//! Service layer for progress updates, tick completion, and tick reverts.

use super::retry::run_with_retry;
use super::{load_snapshot, require};
use crate::identity::{Capability, Principal, UserId};
use crate::task::{
    domain::{
        StatusName, TaskDomainError, TaskHistory, TaskId, TaskProgress, TaskStatus,
        aggregate_percentage, effective_percentage, latest_for_user,
    },
    ports::{AttachmentCounter, DomainEvent, EventEmitter, TaskSnapshot, TaskStore, TaskWrite},
    services::error::WorkflowResult,
};
use mockable::Clock;
use std::sync::Arc;

/// Status movement produced as a side effect of a progress operation.
type StatusShift = Option<(StatusName, StatusName)>;

/// Progress orchestration service.
///
/// Progress percentages form a per-assignee time series: updates append
/// rows, never overwrite them. Tick flags are the only mutable part of a
/// row, and only on the assignee's latest row. Status side effects (the
/// automatic `pending -> in_progress` start, the `review -> done`
/// completion, and the `done -> in_progress` fallback after a revert)
/// commit in the same batch as the progress write itself.
#[derive(Clone)]
pub struct ProgressService<S, C, E, A>
where
    S: TaskStore,
    C: Clock + Send + Sync,
    E: EventEmitter,
    A: AttachmentCounter,
{
    store: Arc<S>,
    clock: Arc<C>,
    events: Arc<E>,
    attachments: Arc<A>,
}

impl<S, C, E, A> ProgressService<S, C, E, A>
where
    S: TaskStore,
    C: Clock + Send + Sync,
    E: EventEmitter,
    A: AttachmentCounter,
{
    /// Creates a new progress service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, events: Arc<E>, attachments: Arc<A>) -> Self {
        Self {
            store,
            clock,
            events,
            attachments,
        }
    }

    /// Appends a progress row for `user_id`.
    ///
    /// The first percentage above zero on a `pending` task starts it: the
    /// automatic `pending -> in_progress` transition commits atomically
    /// with the progress row.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::OutOfRange`] for percentages above 100
    /// and [`TaskDomainError::NotAssigned`] when `user_id` has no
    /// assignment on the task.
    pub async fn update_progress(
        &self,
        task_id: TaskId,
        user_id: UserId,
        percentage: u8,
        milestone: Option<String>,
        actor: &Principal,
    ) -> WorkflowResult<()> {
        require(actor, Capability::UpdateProgress)?;
        if percentage > 100 {
            return Err(TaskDomainError::OutOfRange {
                task_id,
                user_id,
                percentage,
            }
            .into());
        }

        let shift = run_with_retry(|| {
            self.try_update(task_id, user_id, percentage, milestone.clone(), actor)
        })
        .await?;

        tracing::info!(%task_id, %user_id, percentage, "progress recorded");
        self.emit_shift(task_id, shift).await;
        Ok(())
    }

    async fn try_update(
        &self,
        task_id: TaskId,
        user_id: UserId,
        percentage: u8,
        milestone: Option<String>,
        actor: &Principal,
    ) -> WorkflowResult<StatusShift> {
        let snapshot = load_snapshot(&*self.store, task_id).await?;
        ensure_assigned(&snapshot, task_id, user_id)?;

        let old_percentage = snapshot
            .progress
            .iter()
            .rev()
            .find(|entry| entry.user_id == user_id && !entry.tick_reverted)
            .map(|entry| entry.percentage_complete);
        let row = TaskProgress::new(task_id, user_id, percentage, milestone, &*self.clock)?;

        let mut writes = vec![TaskWrite::AppendProgress(row)];
        let mut history = vec![TaskHistory::progress_updated(
            task_id,
            actor.user_id(),
            user_id,
            old_percentage,
            percentage,
            &*self.clock,
        )];

        let mut shift = None;
        if snapshot.current_status.name == StatusName::Pending && percentage > 0 {
            let status = TaskStatus::new(
                task_id,
                StatusName::InProgress,
                Some(actor.user_id()),
                &*self.clock,
            );
            history.push(TaskHistory::status_changed(
                task_id,
                actor.user_id(),
                &status,
                &*self.clock,
            ));
            writes.push(TaskWrite::PushStatus(status));
            shift = Some((StatusName::Pending, StatusName::InProgress));
        }

        self.store
            .commit(task_id, snapshot.version, writes, history)
            .await?;
        Ok(shift)
    }

    /// Declares `user_id`'s portion of the work finished.
    ///
    /// Marks the assignee's latest progress row tick-complete, creating a
    /// row when they have none. A second tick without an intervening
    /// revert is a no-effect success. While the task sits in `review`, a
    /// tick whose aggregate reaches 100 with enough attached files
    /// completes the task in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotAssigned`] when `user_id` has no
    /// assignment on the task.
    pub async fn tick_complete(
        &self,
        task_id: TaskId,
        user_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<()> {
        require(actor, Capability::UpdateProgress)?;

        let shift = run_with_retry(|| self.try_tick(task_id, user_id, actor)).await?;

        tracing::info!(%task_id, %user_id, "tick recorded");
        self.emit_shift(task_id, shift).await;
        Ok(())
    }

    async fn try_tick(
        &self,
        task_id: TaskId,
        user_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<StatusShift> {
        let snapshot = load_snapshot(&*self.store, task_id).await?;
        ensure_assigned(&snapshot, task_id, user_id)?;

        let write = match latest_for_user(&snapshot.progress, user_id) {
            Some(latest) if latest.is_tick_complete => {
                tracing::debug!(%task_id, %user_id, "tick already recorded");
                return Ok(None);
            }
            Some(latest) if !latest.tick_reverted => {
                let mut updated = latest.clone();
                updated.mark_ticked(&*self.clock);
                TaskWrite::ReplaceProgress(updated)
            }
            // A reverted row stays excluded from aggregation forever, so a
            // fresh tick starts a new row at the effective percentage.
            _ => TaskWrite::AppendProgress(TaskProgress::ticked(
                task_id,
                user_id,
                effective_percentage(&snapshot.progress, user_id),
                &*self.clock,
            )),
        };

        let mut writes = vec![write];
        let mut history = vec![TaskHistory::tick_completed(
            task_id,
            actor.user_id(),
            user_id,
            &*self.clock,
        )];

        let mut shift = None;
        if snapshot.current_status.name == StatusName::Review {
            let aggregate = aggregate_percentage(&snapshot.assignments, &snapshot.progress);
            if aggregate == 100 {
                let attached = self.attachments.attachment_count(task_id).await?;
                if attached >= snapshot.task.required_file_count() {
                    let status = TaskStatus::new(
                        task_id,
                        StatusName::Done,
                        Some(actor.user_id()),
                        &*self.clock,
                    );
                    history.push(TaskHistory::status_changed(
                        task_id,
                        actor.user_id(),
                        &status,
                        &*self.clock,
                    ));
                    writes.push(TaskWrite::PushStatus(status));
                    shift = Some((StatusName::Review, StatusName::Done));
                }
            }
        }

        self.store
            .commit(task_id, snapshot.version, writes, history)
            .await?;
        Ok(shift)
    }

    /// Undoes `user_id`'s most recent tick.
    ///
    /// The ticked row is marked reverted and drops out of aggregation. A
    /// `done` task whose aggregate falls below 100 drops back to
    /// `in_progress` in the same commit.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoActiveTick`] when no un-reverted tick
    /// exists and [`TaskDomainError::NotAssigned`] when `user_id` has no
    /// assignment on the task.
    pub async fn revert_tick(
        &self,
        task_id: TaskId,
        user_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<()> {
        require(actor, Capability::UpdateProgress)?;

        let shift = run_with_retry(|| self.try_revert(task_id, user_id, actor)).await?;

        tracing::info!(%task_id, %user_id, "tick reverted");
        self.emit_shift(task_id, shift).await;
        Ok(())
    }

    async fn try_revert(
        &self,
        task_id: TaskId,
        user_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<StatusShift> {
        let snapshot = load_snapshot(&*self.store, task_id).await?;
        ensure_assigned(&snapshot, task_id, user_id)?;

        let Some(ticked) = snapshot
            .progress
            .iter()
            .rev()
            .find(|entry| entry.user_id == user_id && entry.is_tick_complete)
        else {
            return Err(TaskDomainError::NoActiveTick { task_id, user_id }.into());
        };

        let mut reverted = ticked.clone();
        reverted.revert_tick(&*self.clock);

        let mut writes = vec![TaskWrite::ReplaceProgress(reverted.clone())];
        let mut history = vec![TaskHistory::tick_reverted(
            task_id,
            actor.user_id(),
            user_id,
            &*self.clock,
        )];

        let mut shift = None;
        if snapshot.current_status.name == StatusName::Done {
            let mut projected = snapshot.progress.clone();
            for entry in &mut projected {
                if entry.progress_id == reverted.progress_id {
                    *entry = reverted.clone();
                }
            }
            let aggregate = aggregate_percentage(&snapshot.assignments, &projected);
            if aggregate < 100 {
                let status = TaskStatus::new(
                    task_id,
                    StatusName::InProgress,
                    Some(actor.user_id()),
                    &*self.clock,
                );
                history.push(TaskHistory::status_changed(
                    task_id,
                    actor.user_id(),
                    &status,
                    &*self.clock,
                ));
                writes.push(TaskWrite::PushStatus(status));
                shift = Some((StatusName::Done, StatusName::InProgress));
            }
        }

        self.store
            .commit(task_id, snapshot.version, writes, history)
            .await?;
        Ok(shift)
    }

    async fn emit_shift(&self, task_id: TaskId, shift: StatusShift) {
        if let Some((from, to)) = shift {
            self.events
                .emit(DomainEvent::StatusChanged { task_id, from, to })
                .await;
        }
    }
}

/// Rejects the operation when the user has no assignment row.
fn ensure_assigned(
    snapshot: &TaskSnapshot,
    task_id: TaskId,
    user_id: UserId,
) -> Result<(), TaskDomainError> {
    if snapshot
        .assignments
        .iter()
        .any(|assignment| assignment.user_id == user_id)
    {
        return Ok(());
    }
    Err(TaskDomainError::NotAssigned { task_id, user_id })
}
