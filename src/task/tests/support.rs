//! Shared fixtures for workflow service tests.

use std::sync::Arc;

use crate::identity::{Capability, Principal, Role, UserId};
use crate::task::{
    adapters::memory::{FixedAttachmentCounter, InMemoryTaskStore, RecordingEventEmitter},
    domain::{PartId, TaskId},
    services::{
        AssignmentService, CreateTaskRequest, ProgressService, StatusEngine, TaskLifecycleService,
    },
};
use mockable::DefaultClock;

pub type MemLifecycle = TaskLifecycleService<InMemoryTaskStore, DefaultClock, RecordingEventEmitter>;
pub type MemAssignments = AssignmentService<InMemoryTaskStore, DefaultClock, RecordingEventEmitter>;
pub type MemProgress =
    ProgressService<InMemoryTaskStore, DefaultClock, RecordingEventEmitter, FixedAttachmentCounter>;
pub type MemEngine =
    StatusEngine<InMemoryTaskStore, DefaultClock, RecordingEventEmitter, FixedAttachmentCounter>;

/// All services wired against one shared in-memory store.
pub struct Harness {
    pub store: Arc<InMemoryTaskStore>,
    pub events: Arc<RecordingEventEmitter>,
    pub attachments: Arc<FixedAttachmentCounter>,
    pub lifecycle: MemLifecycle,
    pub assignments: MemAssignments,
    pub progress: MemProgress,
    pub engine: MemEngine,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let clock = Arc::new(DefaultClock);
        let events = Arc::new(RecordingEventEmitter::new());
        let attachments = Arc::new(FixedAttachmentCounter::new());
        Self {
            lifecycle: TaskLifecycleService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&events),
            ),
            assignments: AssignmentService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&events),
            ),
            progress: ProgressService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&events),
                Arc::clone(&attachments),
            ),
            engine: StatusEngine::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&events),
                Arc::clone(&attachments),
            ),
            store,
            events,
            attachments,
        }
    }

    /// Creates a part task assigned to `assignees` with `main` as main
    /// assignee.
    pub async fn create_assigned_task(&self, assignees: &[i64], main: i64) -> TaskId {
        let request = CreateTaskRequest::new("Prepare quarterly report")
            .with_part(PartId::new(11))
            .with_assignees(assignees.iter().copied().map(UserId::new))
            .with_main_assignee(UserId::new(main));
        self.lifecycle
            .create_task(request, &manager())
            .await
            .expect("task creation should succeed")
    }
}

/// Manager principal holding every capability.
pub fn manager() -> Principal {
    Principal::new(
        UserId::new(1000),
        Role::Manager,
        [
            Capability::CreateTasks,
            Capability::AssignTasks,
            Capability::UpdateProgress,
            Capability::ReviewTasks,
            Capability::ArchiveTasks,
            Capability::OverrideStatus,
        ],
    )
}

/// Staff principal limited to recording progress.
pub fn staff(user_id: i64) -> Principal {
    Principal::new(
        UserId::new(user_id),
        Role::Staff,
        [Capability::UpdateProgress],
    )
}
