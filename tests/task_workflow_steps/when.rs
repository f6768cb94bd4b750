//! When steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, manager, run_async, staff};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use workstream::identity::UserId;
use workstream::task::domain::StatusName;

#[when("the main assignee submits the task for review")]
fn main_assignee_submits(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    run_async(world.engine.transition(task_id, StatusName::Review, &staff(5)))
        .wrap_err("submit for review")?;
    Ok(())
}

#[when("the assignee submits the task for review")]
fn assignee_submits(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    run_async(world.engine.transition(task_id, StatusName::Review, &staff(5)))
        .wrap_err("submit for review")?;
    Ok(())
}

#[when("the reviewer approves completion")]
fn reviewer_approves(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    let result = run_async(world.engine.transition(task_id, StatusName::Done, &manager()));
    world.last_transition = Some(result);
    Ok(())
}

#[when("the assignee ticks their work complete")]
fn assignee_ticks(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    run_async(world.progress.tick_complete(task_id, UserId::new(5), &staff(5)))
        .wrap_err("tick complete")?;
    Ok(())
}

#[when("the assignee reverts their tick")]
fn assignee_reverts(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    run_async(world.progress.revert_tick(task_id, UserId::new(5), &staff(5)))
        .wrap_err("revert tick")?;
    Ok(())
}
