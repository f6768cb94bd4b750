//! Then steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, run_async};
use rstest_bdd_macros::then;
use workstream::task::{
    domain::{HistoryAction, StatusName, TaskDomainError},
    services::WorkflowError,
};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &mut WorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    let detail = run_async(world.lifecycle.task_detail(task_id))
        .map_err(|err| eyre::eyre!("detail lookup failed: {err}"))?;
    if detail.current_status.name.as_str() != status {
        return Err(eyre::eyre!(
            "expected status {status}, found {}",
            detail.current_status.name
        ));
    }
    Ok(())
}

#[then("completion fails because requirements are incomplete")]
fn completion_fails_incomplete(world: &WorkflowWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_transition
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result in scenario world"))?;
    if !matches!(
        result,
        Err(WorkflowError::Domain(
            TaskDomainError::IncompleteRequirements { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected incomplete-requirements failure, got {result:?}"
        ));
    }
    Ok(())
}

#[then("the ledger records the full trail of the work")]
fn ledger_records_trail(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    let history = run_async(world.lifecycle.query_history(task_id))
        .map_err(|err| eyre::eyre!("history lookup failed: {err}"))?;

    let first_action = history
        .first()
        .map(|row| row.action)
        .ok_or_else(|| eyre::eyre!("history ledger is empty"))?;
    if first_action != HistoryAction::TaskCreated {
        return Err(eyre::eyre!("ledger does not start with task creation"));
    }
    if !history.iter().any(|row| {
        row.action == HistoryAction::StatusChanged
            && row.status_after_update == Some(StatusName::Done)
    }) {
        return Err(eyre::eyre!("ledger is missing the completion transition"));
    }
    let ordered = history
        .windows(2)
        .all(|pair| pair.first().map(|row| row.created_at) <= pair.last().map(|row| row.created_at));
    if !ordered {
        return Err(eyre::eyre!("ledger is not ordered by creation time"));
    }
    Ok(())
}
