//! Shared world state for task workflow BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use workstream::identity::{Capability, Principal, Role, UserId};
use workstream::task::{
    adapters::memory::{FixedAttachmentCounter, InMemoryTaskStore, RecordingEventEmitter},
    domain::TaskId,
    services::{
        AssignmentService, ProgressService, StatusEngine, TaskLifecycleService, WorkflowError,
    },
};

/// Lifecycle service type used by the BDD world.
pub type TestLifecycle =
    TaskLifecycleService<InMemoryTaskStore, DefaultClock, RecordingEventEmitter>;
/// Assignment service type used by the BDD world.
pub type TestAssignments =
    AssignmentService<InMemoryTaskStore, DefaultClock, RecordingEventEmitter>;
/// Progress service type used by the BDD world.
pub type TestProgress = ProgressService<
    InMemoryTaskStore,
    DefaultClock,
    RecordingEventEmitter,
    FixedAttachmentCounter,
>;
/// Status engine type used by the BDD world.
pub type TestEngine = StatusEngine<
    InMemoryTaskStore,
    DefaultClock,
    RecordingEventEmitter,
    FixedAttachmentCounter,
>;

/// Scenario world for task workflow behaviour tests.
pub struct WorkflowWorld {
    pub lifecycle: TestLifecycle,
    pub assignments: TestAssignments,
    pub progress: TestProgress,
    pub engine: TestEngine,
    pub attachments: Arc<FixedAttachmentCounter>,
    pub events: Arc<RecordingEventEmitter>,
    pub task_id: Option<TaskId>,
    pub last_transition: Option<Result<(), WorkflowError>>,
}

impl WorkflowWorld {
    /// Creates a world wired against a fresh in-memory store.
    #[must_use]
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
            attachments,
            events,
            task_id: None,
            last_transition: None,
        }
    }

    /// Returns the scenario's task identifier.
    pub fn current_task(&self) -> Result<TaskId, eyre::Report> {
        self.task_id
            .ok_or_else(|| eyre::eyre!("no task created in scenario world"))
    }
}

impl Default for WorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Manager principal holding every capability.
#[must_use]
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
#[must_use]
pub fn staff(user_id: i64) -> Principal {
    Principal::new(
        UserId::new(user_id),
        Role::Staff,
        [Capability::UpdateProgress],
    )
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> WorkflowWorld {
    WorkflowWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
