//! Explicit status transition engine.

use super::retry::run_with_retry;
use super::{load_snapshot, require};
use crate::identity::{Capability, Principal};
use crate::task::{
    domain::{
        StatusName, TaskDomainError, TaskHistory, TaskId, TaskStatus, aggregate_percentage,
    },
    ports::{AttachmentCounter, DomainEvent, EventEmitter, TaskSnapshot, TaskStore, TaskWrite},
    services::error::WorkflowResult,
};
use mockable::Clock;
use std::sync::Arc;

/// Status transition orchestration service.
///
/// Status derivation is this engine's sole responsibility: every status a
/// task ever holds is persisted as a snapshot row pushed here (or by the
/// progress service's automatic shifts, which reuse the same commit
/// primitive). Readers only ever report the persisted current status.
#[derive(Clone)]
pub struct StatusEngine<S, C, E, A>
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

impl<S, C, E, A> StatusEngine<S, C, E, A>
where
    S: TaskStore,
    C: Clock + Send + Sync,
    E: EventEmitter,
    A: AttachmentCounter,
{
    /// Creates a new status engine.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, events: Arc<E>, attachments: Arc<A>) -> Self {
        Self {
            store,
            clock,
            events,
            attachments,
        }
    }

    /// Moves the task to `target`.
    ///
    /// The transition must be permitted by the state machine, the caller
    /// must hold the capability the edge demands, and the `review -> done`
    /// edge additionally requires aggregate 100 with enough attached
    /// files. The new status row and its history row commit atomically
    /// against the snapshot the decision was made on.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NoOp`] when `target` equals the current
    /// status, [`TaskDomainError::InvalidTransition`] when the state
    /// machine forbids the edge, and
    /// [`TaskDomainError::IncompleteRequirements`] when the completion
    /// guard fails; the task stays in `review` in that case.
    pub async fn transition(
        &self,
        task_id: TaskId,
        target: StatusName,
        actor: &Principal,
    ) -> WorkflowResult<()> {
        let (from, to) = run_with_retry(|| self.try_transition(task_id, target, actor)).await?;

        tracing::info!(%task_id, %from, %to, "status changed");
        self.events
            .emit(DomainEvent::StatusChanged { task_id, from, to })
            .await;
        Ok(())
    }

    async fn try_transition(
        &self,
        task_id: TaskId,
        target: StatusName,
        actor: &Principal,
    ) -> WorkflowResult<(StatusName, StatusName)> {
        let snapshot = load_snapshot(&*self.store, task_id).await?;
        let current = snapshot.current_status.name;

        if current == target {
            return Err(TaskDomainError::NoOp {
                task_id,
                status: current,
            }
            .into());
        }
        if !current.can_transition_to(target) {
            return Err(TaskDomainError::InvalidTransition {
                task_id,
                from: current,
                to: target,
            }
            .into());
        }
        require(actor, edge_capability(current, target))?;

        if target == StatusName::Done {
            self.check_completion_guard(&snapshot).await?;
        }

        let status = TaskStatus::new(task_id, target, Some(actor.user_id()), &*self.clock);
        let history = vec![TaskHistory::status_changed(
            task_id,
            actor.user_id(),
            &status,
            &*self.clock,
        )];
        self.store
            .commit(
                task_id,
                snapshot.version,
                vec![TaskWrite::PushStatus(status)],
                history,
            )
            .await?;
        Ok((current, target))
    }

    async fn check_completion_guard(&self, snapshot: &TaskSnapshot) -> WorkflowResult<()> {
        let task_id = snapshot.task.id();
        let aggregate = aggregate_percentage(&snapshot.assignments, &snapshot.progress);
        let attached = self.attachments.attachment_count(task_id).await?;
        let required = snapshot.task.required_file_count();
        if aggregate < 100 || attached < required {
            return Err(TaskDomainError::IncompleteRequirements {
                task_id,
                aggregate,
                attached,
                required,
            }
            .into());
        }
        Ok(())
    }
}

/// Returns the capability an explicit transition edge demands.
const fn edge_capability(from: StatusName, to: StatusName) -> Capability {
    match (from, to) {
        _ if from.requires_override(to) => Capability::OverrideStatus,
        (_, StatusName::Archived) => Capability::ArchiveTasks,
        (StatusName::Review, _) => Capability::ReviewTasks,
        _ => Capability::UpdateProgress,
    }
}
