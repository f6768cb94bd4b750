//! Service layer for task creation, detail reads, and history queries.

use super::{load_snapshot, require};
use crate::identity::{Capability, Principal, UserId};
use crate::task::{
    domain::{
        PartId, Priority, StatusName, Task, TaskAssignment, TaskDraft, TaskHistory, TaskId,
        TaskProgress, TaskStatus, aggregate_percentage, plan_replacement,
    },
    ports::{DomainEvent, EventEmitter, TaskStore},
    services::error::WorkflowResult,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    priority: Priority,
    part_id: Option<PartId>,
    is_direct_assignment: bool,
    required_file_count: u32,
    start_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    assignees: Vec<UserId>,
    main_assignee: Option<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the scheduling priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Places the task inside a project part.
    #[must_use]
    pub const fn with_part(mut self, part_id: PartId) -> Self {
        self.part_id = Some(part_id);
        self
    }

    /// Flags the task as a direct assignment outside any project part.
    #[must_use]
    pub const fn direct_assignment(mut self) -> Self {
        self.is_direct_assignment = true;
        self
    }

    /// Sets the minimum attachment count required before completion.
    #[must_use]
    pub const fn with_required_file_count(mut self, count: u32) -> Self {
        self.required_file_count = count;
        self
    }

    /// Sets the planned start and due dates.
    #[must_use]
    pub const fn with_schedule(
        mut self,
        start_date: Option<DateTime<Utc>>,
        due_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.due_date = due_date;
        self
    }

    /// Sets the initial assignee set; the first user becomes main unless
    /// [`Self::with_main_assignee`] names another.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = UserId>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    /// Designates the main assignee among the initial assignees.
    #[must_use]
    pub const fn with_main_assignee(mut self, user_id: UserId) -> Self {
        self.main_assignee = Some(user_id);
        self
    }
}

/// Full read model for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    /// The task aggregate.
    pub task: Task,
    /// All assignment rows.
    pub assignments: Vec<TaskAssignment>,
    /// All progress rows, oldest first.
    pub progress: Vec<TaskProgress>,
    /// The current status snapshot.
    pub current_status: TaskStatus,
    /// The full history ledger, oldest first.
    pub history: Vec<TaskHistory>,
    /// Derived aggregate percentage across assignees.
    pub aggregate_percentage: u8,
}

/// Task creation, detail, and history orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<S, C, E>
where
    S: TaskStore,
    C: Clock + Send + Sync,
    E: EventEmitter,
{
    store: Arc<S>,
    clock: Arc<C>,
    events: Arc<E>,
}

impl<S, C, E> TaskLifecycleService<S, C, E>
where
    S: TaskStore,
    C: Clock + Send + Sync,
    E: EventEmitter,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, events: Arc<E>) -> Self {
        Self { store, clock, events }
    }

    /// Creates a task with its initial `pending` status, optional initial
    /// assignee set, and creation history, all in one atomic insert.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Unauthorized`] without
    /// [`Capability::CreateTasks`], a domain error when the request fails
    /// validation, and a store error when persistence rejects the insert.
    ///
    /// [`WorkflowError::Unauthorized`]: super::WorkflowError::Unauthorized
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
        actor: &Principal,
    ) -> WorkflowResult<TaskId> {
        require(actor, Capability::CreateTasks)?;

        let draft = TaskDraft {
            title: request.title,
            description: request.description,
            priority: request.priority,
            part_id: request.part_id,
            is_direct_assignment: request.is_direct_assignment,
            required_file_count: request.required_file_count,
            start_date: request.start_date,
            due_date: request.due_date,
        };
        let task = Task::new(draft, actor.user_id(), &*self.clock)?;
        let status = TaskStatus::new(
            task.id(),
            StatusName::Pending,
            Some(actor.user_id()),
            &*self.clock,
        );
        let mut history = vec![TaskHistory::task_created(task.id(), actor.user_id(), &*self.clock)];

        let mut assignments = Vec::new();
        let mut initial_assignment = None;
        if let Some(first) = request.assignees.first().copied() {
            let main_assignee = request.main_assignee.unwrap_or(first);
            let replacement = plan_replacement(
                task.id(),
                &[],
                &request.assignees,
                main_assignee,
                &*self.clock,
            )?;
            for user_id in &replacement.added {
                history.push(TaskHistory::assignment_changed(
                    task.id(),
                    actor.user_id(),
                    *user_id,
                    &*self.clock,
                ));
            }
            assignments = replacement.assignments;
            initial_assignment = Some((replacement.added, main_assignee));
        }

        self.store
            .insert_task(&task, &status, &assignments, &history)
            .await?;

        if let Some((added, main_assignee)) = initial_assignment {
            self.events
                .emit(DomainEvent::AssignmentChanged {
                    task_id: task.id(),
                    added,
                    removed: Vec::new(),
                    main_assignee,
                })
                .await;
        }
        tracing::info!(task_id = %task.id(), "task created");
        Ok(task.id())
    }

    /// Returns the task with its assignments, progress, current status,
    /// history, and derived aggregate percentage.
    ///
    /// # Errors
    ///
    /// Returns a not-found store error for unknown tasks.
    pub async fn task_detail(&self, task_id: TaskId) -> WorkflowResult<TaskDetail> {
        let snapshot = load_snapshot(&*self.store, task_id).await?;
        let history = self.store.history(task_id).await?;
        let aggregate = aggregate_percentage(&snapshot.assignments, &snapshot.progress);
        Ok(TaskDetail {
            task: snapshot.task,
            assignments: snapshot.assignments,
            progress: snapshot.progress,
            current_status: snapshot.current_status,
            history,
            aggregate_percentage: aggregate,
        })
    }

    /// Returns the task's history ledger ordered by creation time
    /// ascending.
    ///
    /// # Errors
    ///
    /// Returns a not-found store error for unknown tasks.
    pub async fn query_history(&self, task_id: TaskId) -> WorkflowResult<Vec<TaskHistory>> {
        Ok(self.store.history(task_id).await?)
    }
}
