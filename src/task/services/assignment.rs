//! Service layer for assignee-set replacement and main-assignee changes.

use super::retry::run_with_retry;
use super::{load_snapshot, require};
use crate::identity::{Capability, Principal, UserId};
use crate::task::{
    domain::{TaskDomainError, TaskHistory, TaskId, main_assignee, plan_replacement},
    ports::{DomainEvent, EventEmitter, TaskStore, TaskWrite},
    services::error::WorkflowResult,
};
use mockable::Clock;
use std::sync::Arc;

/// Assignment orchestration service.
///
/// Replacements are planned against a snapshot and committed with its
/// version, so no interleaving ever exposes a task with zero or two main
/// assignees.
#[derive(Clone)]
pub struct AssignmentService<S, C, E>
where
    S: TaskStore,
    C: Clock + Send + Sync,
    E: EventEmitter,
{
    store: Arc<S>,
    clock: Arc<C>,
    events: Arc<E>,
}

impl<S, C, E> AssignmentService<S, C, E>
where
    S: TaskStore,
    C: Clock + Send + Sync,
    E: EventEmitter,
{
    /// Creates a new assignment service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, events: Arc<E>) -> Self {
        Self { store, clock, events }
    }

    /// Replaces the task's assignee set atomically.
    ///
    /// Assignments absent from `user_ids` are removed, newcomers inserted,
    /// and exactly `main_assignee_id` flagged main. One history row is
    /// appended per added or removed user. A replacement that changes
    /// nothing succeeds without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidAssignment`] when `user_ids` is
    /// empty or excludes `main_assignee_id`, and an unauthorized error
    /// without [`Capability::AssignTasks`].
    pub async fn assign(
        &self,
        task_id: TaskId,
        user_ids: &[UserId],
        main_assignee_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<()> {
        require(actor, Capability::AssignTasks)?;

        let delta =
            run_with_retry(|| self.try_assign(task_id, user_ids, main_assignee_id, actor)).await?;

        if let Some((added, removed)) = delta {
            tracing::info!(
                %task_id,
                added = added.len(),
                removed = removed.len(),
                "assignee set replaced"
            );
            self.events
                .emit(DomainEvent::AssignmentChanged {
                    task_id,
                    added,
                    removed,
                    main_assignee: main_assignee_id,
                })
                .await;
        } else {
            tracing::debug!(%task_id, "assignment replacement changed nothing");
        }
        Ok(())
    }

    async fn try_assign(
        &self,
        task_id: TaskId,
        user_ids: &[UserId],
        main_assignee_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<Option<(Vec<UserId>, Vec<UserId>)>> {
        let snapshot = load_snapshot(&*self.store, task_id).await?;
        let replacement = plan_replacement(
            task_id,
            &snapshot.assignments,
            user_ids,
            main_assignee_id,
            &*self.clock,
        )?;

        if replacement.changes_nothing(&snapshot.assignments) {
            return Ok(None);
        }

        let mut writes = Vec::with_capacity(replacement.removed.len() + replacement.assignments.len());
        for user_id in &replacement.removed {
            writes.push(TaskWrite::RemoveAssignment(*user_id));
        }
        for assignment in &replacement.assignments {
            writes.push(TaskWrite::PutAssignment(assignment.clone()));
        }

        let mut history: Vec<TaskHistory> = replacement
            .added
            .iter()
            .chain(replacement.removed.iter())
            .map(|user_id| {
                TaskHistory::assignment_changed(task_id, actor.user_id(), *user_id, &*self.clock)
            })
            .collect();
        if history.is_empty() {
            // Only the main flag moved; the new main is the affected user.
            history.push(TaskHistory::assignment_changed(
                task_id,
                actor.user_id(),
                main_assignee_id,
                &*self.clock,
            ));
        }

        self.store
            .commit(task_id, snapshot.version, writes, history)
            .await?;
        Ok(Some((replacement.added, replacement.removed)))
    }

    /// Moves the main-assignee flag to `new_main_user_id`.
    ///
    /// The flip is committed as one batch; observers never see zero or two
    /// main assignees. Naming the current main assignee succeeds without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotAssigned`] when the user has no
    /// assignment row on the task.
    pub async fn change_main_assignee(
        &self,
        task_id: TaskId,
        new_main_user_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<()> {
        require(actor, Capability::AssignTasks)?;

        let changed =
            run_with_retry(|| self.try_change_main(task_id, new_main_user_id, actor)).await?;

        if changed {
            tracing::info!(%task_id, new_main = %new_main_user_id, "main assignee changed");
            self.events
                .emit(DomainEvent::AssignmentChanged {
                    task_id,
                    added: Vec::new(),
                    removed: Vec::new(),
                    main_assignee: new_main_user_id,
                })
                .await;
        }
        Ok(())
    }

    async fn try_change_main(
        &self,
        task_id: TaskId,
        new_main_user_id: UserId,
        actor: &Principal,
    ) -> WorkflowResult<bool> {
        let snapshot = load_snapshot(&*self.store, task_id).await?;
        if !snapshot
            .assignments
            .iter()
            .any(|assignment| assignment.user_id == new_main_user_id)
        {
            return Err(TaskDomainError::NotAssigned {
                task_id,
                user_id: new_main_user_id,
            }
            .into());
        }
        if main_assignee(&snapshot.assignments) == Some(new_main_user_id) {
            return Ok(false);
        }

        let history = vec![TaskHistory::assignment_changed(
            task_id,
            actor.user_id(),
            new_main_user_id,
            &*self.clock,
        )];
        self.store
            .commit(
                task_id,
                snapshot.version,
                vec![TaskWrite::SetMainAssignee(new_main_user_id)],
                history,
            )
            .await?;
        Ok(true)
    }
}
