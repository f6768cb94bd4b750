//! Tests for the overdue sweep.

use std::sync::Arc;

use super::support::{Harness, manager};
use crate::identity::UserId;
use crate::task::{
    domain::{PartId, StatusName},
    ports::DomainEvent,
    services::{CreateTaskRequest, OverdueScanner},
};
use chrono::{Duration, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

async fn create_due_task(harness: &Harness, days_from_now: i64) -> crate::task::domain::TaskId {
    let now = Utc::now();
    let request = CreateTaskRequest::new("Time-bound deliverable")
        .with_part(PartId::new(2))
        .with_schedule(
            Some(now - Duration::days(14)),
            Some(now + Duration::days(days_from_now)),
        )
        .with_assignees([UserId::new(5)]);
    harness
        .lifecycle
        .create_task(request, &manager())
        .await
        .expect("task creation should succeed")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overdue_open_tasks_are_reported(harness: Harness) {
    let task_id = create_due_task(&harness, -2).await;
    let scanner = OverdueScanner::new(Arc::clone(&harness.store), Arc::clone(&harness.events));

    let found = scanner.scan(Utc::now()).await.expect("scan should succeed");

    assert_eq!(found, 1);
    assert!(harness.events.events().iter().any(|event| matches!(
        event,
        DomainEvent::TaskOverdue { task_id: overdue, .. } if *overdue == task_id
    )));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn terminal_tasks_are_not_reported(harness: Harness) {
    let task_id = create_due_task(&harness, -2).await;
    harness
        .engine
        .transition(task_id, StatusName::Archived, &manager())
        .await
        .expect("archive should succeed");
    let scanner = OverdueScanner::new(Arc::clone(&harness.store), Arc::clone(&harness.events));

    let found = scanner.scan(Utc::now()).await.expect("scan should succeed");

    assert_eq!(found, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_due_in_the_future_are_not_reported(harness: Harness) {
    create_due_task(&harness, 3).await;
    let scanner = OverdueScanner::new(Arc::clone(&harness.store), Arc::clone(&harness.events));

    let found = scanner.scan(Utc::now()).await.expect("scan should succeed");

    assert_eq!(found, 0);
}
