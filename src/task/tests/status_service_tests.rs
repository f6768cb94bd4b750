//! Service tests for explicit status transitions and their guards.

use std::sync::Arc;

use super::support::{Harness, MemEngine, manager, staff};
use crate::identity::{Capability, UserId};
use crate::task::{
    domain::{StatusName, TaskDomainError},
    ports::{AttachmentCountError, MockAttachmentCounter},
    services::{StatusEngine, WorkflowError},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

async fn submit_for_review(harness: &Harness, assignees: &[i64], main: i64) -> crate::task::domain::TaskId {
    let task_id = harness.create_assigned_task(assignees, main).await;
    for user in assignees {
        harness
            .progress
            .update_progress(task_id, UserId::new(*user), 100, None, &staff(*user))
            .await
            .expect("progress should succeed");
    }
    harness
        .engine
        .transition(task_id, StatusName::Review, &staff(main))
        .await
        .expect("submit for review should succeed");
    task_id
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_to_current_status_is_rejected_as_noop(harness: Harness) {
    let task_id = harness.create_assigned_task(&[5], 5).await;

    let result = harness
        .engine
        .transition(task_id, StatusName::Pending, &manager())
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::NoOp {
            status: StatusName::Pending,
            ..
        }))
    ));
}

#[rstest]
#[case(StatusName::Review)]
#[case(StatusName::Done)]
#[tokio::test(flavor = "multi_thread")]
async fn pending_task_rejects_forward_jumps(harness: Harness, #[case] target: StatusName) {
    let task_id = harness.create_assigned_task(&[5], 5).await;

    let result = harness.engine.transition(task_id, target, &manager()).await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::InvalidTransition {
            from: StatusName::Pending,
            ..
        }))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn explicit_start_moves_pending_to_in_progress(harness: Harness) {
    let task_id = harness.create_assigned_task(&[5], 5).await;

    harness
        .engine
        .transition(task_id, StatusName::InProgress, &staff(5))
        .await
        .expect("explicit start should succeed");

    let detail = harness
        .lifecycle
        .task_detail(task_id)
        .await
        .expect("detail should succeed");
    assert_eq!(detail.current_status.name, StatusName::InProgress);
    assert_eq!(detail.current_status.updated_by, Some(UserId::new(5)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn incomplete_requirements_keep_the_task_in_review(harness: Harness) {
    // Aggregate 100 but zero of two required files attached.
    let request = crate::task::services::CreateTaskRequest::new("Deliver audited report")
        .with_part(crate::task::domain::PartId::new(11))
        .with_required_file_count(2)
        .with_assignees([UserId::new(5)])
        .with_main_assignee(UserId::new(5));
    let task_id = harness
        .lifecycle
        .create_task(request, &manager())
        .await
        .expect("task creation should succeed");
    harness
        .progress
        .update_progress(task_id, UserId::new(5), 100, None, &staff(5))
        .await
        .expect("progress should succeed");
    harness
        .engine
        .transition(task_id, StatusName::Review, &staff(5))
        .await
        .expect("submit for review should succeed");

    let result = harness
        .engine
        .transition(task_id, StatusName::Done, &manager())
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Domain(TaskDomainError::IncompleteRequirements {
            aggregate: 100,
            attached: 0,
            required: 2,
            ..
        }))
    ));
    let detail = harness
        .lifecycle
        .task_detail(task_id)
        .await
        .expect("detail should succeed");
    assert_eq!(detail.current_status.name, StatusName::Review);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_completes_when_requirements_are_met(harness: Harness) {
    let task_id = submit_for_review(&harness, &[5, 7], 5).await;
    harness.attachments.set_count(task_id, 3);

    harness
        .engine
        .transition(task_id, StatusName::Done, &manager())
        .await
        .expect("completion should succeed");

    let detail = harness
        .lifecycle
        .task_detail(task_id)
        .await
        .expect("detail should succeed");
    assert_eq!(detail.current_status.name, StatusName::Done);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reviewer_rejection_returns_the_task_to_in_progress(harness: Harness) {
    let task_id = submit_for_review(&harness, &[5], 5).await;

    harness
        .engine
        .transition(task_id, StatusName::InProgress, &manager())
        .await
        .expect("rejection should succeed");

    let detail = harness
        .lifecycle
        .task_detail(task_id)
        .await
        .expect("detail should succeed");
    assert_eq!(detail.current_status.name, StatusName::InProgress);
}

#[rstest]
#[case(StatusName::Pending)]
#[case(StatusName::InProgress)]
#[case(StatusName::Review)]
#[tokio::test(flavor = "multi_thread")]
async fn any_non_terminal_status_can_be_archived(harness: Harness, #[case] from: StatusName) {
    let task_id = harness.create_assigned_task(&[5], 5).await;
    if from != StatusName::Pending {
        harness
            .engine
            .transition(task_id, StatusName::InProgress, &staff(5))
            .await
            .expect("start should succeed");
    }
    if from == StatusName::Review {
        harness
            .engine
            .transition(task_id, StatusName::Review, &staff(5))
            .await
            .expect("submit should succeed");
    }

    harness
        .engine
        .transition(task_id, StatusName::Archived, &manager())
        .await
        .expect("archive should succeed");

    let detail = harness
        .lifecycle
        .task_detail(task_id)
        .await
        .expect("detail should succeed");
    assert_eq!(detail.current_status.name, StatusName::Archived);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archived_tasks_reject_every_transition(harness: Harness) {
    let task_id = harness.create_assigned_task(&[5], 5).await;
    harness
        .engine
        .transition(task_id, StatusName::Archived, &manager())
        .await
        .expect("archive should succeed");

    for target in [StatusName::Pending, StatusName::InProgress, StatusName::Review, StatusName::Done] {
        let result = harness.engine.transition(task_id, target, &manager()).await;
        assert!(matches!(
            result,
            Err(WorkflowError::Domain(TaskDomainError::InvalidTransition {
                from: StatusName::Archived,
                ..
            }))
        ));
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn archiving_requires_the_archive_capability(harness: Harness) {
    let task_id = harness.create_assigned_task(&[5], 5).await;

    let result = harness
        .engine
        .transition(task_id, StatusName::Archived, &staff(5))
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::Unauthorized {
            capability: Capability::ArchiveTasks,
            ..
        })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopening_done_requires_the_override_capability(harness: Harness) {
    let task_id = submit_for_review(&harness, &[5], 5).await;
    harness
        .engine
        .transition(task_id, StatusName::Done, &manager())
        .await
        .expect("completion should succeed");

    let denied = harness
        .engine
        .transition(task_id, StatusName::InProgress, &staff(5))
        .await;
    assert!(matches!(
        denied,
        Err(WorkflowError::Unauthorized {
            capability: Capability::OverrideStatus,
            ..
        })
    ));

    harness
        .engine
        .transition(task_id, StatusName::InProgress, &manager())
        .await
        .expect("override should succeed");
    let detail = harness
        .lifecycle
        .task_detail(task_id)
        .await
        .expect("detail should succeed");
    assert_eq!(detail.current_status.name, StatusName::InProgress);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_attachment_collaborator_fails_without_state_change(harness: Harness) {
    let task_id = submit_for_review(&harness, &[5], 5).await;

    let mut counter = MockAttachmentCounter::new();
    counter.expect_attachment_count().returning(|_| {
        Err(AttachmentCountError::new(std::io::Error::other(
            "attachment service offline",
        )))
    });
    let engine: MemEngine = StatusEngine::new(
        Arc::clone(&harness.store),
        Arc::new(DefaultClock),
        Arc::clone(&harness.events),
        Arc::clone(&harness.attachments),
    );
    let failing_engine = StatusEngine::new(
        Arc::clone(&harness.store),
        Arc::new(DefaultClock),
        Arc::clone(&harness.events),
        Arc::new(counter),
    );

    let result = failing_engine
        .transition(task_id, StatusName::Done, &manager())
        .await;
    assert!(matches!(result, Err(WorkflowError::Attachments(_))));

    // The task is untouched and completes once the collaborator answers.
    engine
        .transition(task_id, StatusName::Done, &manager())
        .await
        .expect("completion should succeed after recovery");
}
