//! Given steps for task workflow BDD scenarios.

use super::world::{WorkflowWorld, manager, run_async, staff};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use workstream::identity::UserId;
use workstream::task::{domain::PartId, services::CreateTaskRequest};

#[given("a task assigned to two staff members requiring one attached file")]
fn task_with_two_assignees(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new("Deliver reviewed artefact")
        .with_part(PartId::new(1))
        .with_required_file_count(1)
        .with_assignees([UserId::new(5), UserId::new(7)])
        .with_main_assignee(UserId::new(5));
    let task_id = run_async(world.lifecycle.create_task(request, &manager()))
        .wrap_err("create task with two assignees")?;
    world.task_id = Some(task_id);
    Ok(())
}

#[given("a task assigned to one staff member")]
fn task_with_one_assignee(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let request = CreateTaskRequest::new("Tidy the import pipeline")
        .with_part(PartId::new(1))
        .with_assignees([UserId::new(5)]);
    let task_id = run_async(world.lifecycle.create_task(request, &manager()))
        .wrap_err("create task with one assignee")?;
    world.task_id = Some(task_id);
    Ok(())
}

#[given("both assignees have reported full progress")]
fn both_assignees_at_full_progress(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    for user in [5, 7] {
        run_async(world.progress.update_progress(
            task_id,
            UserId::new(user),
            100,
            None,
            &staff(user),
        ))
        .wrap_err("record full progress")?;
    }
    Ok(())
}

#[given("the assignee has reported full progress")]
fn assignee_at_full_progress(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    run_async(
        world
            .progress
            .update_progress(task_id, UserId::new(5), 100, None, &staff(5)),
    )
    .wrap_err("record full progress")?;
    Ok(())
}

#[given("one file is attached to the task")]
fn one_file_attached(world: &mut WorkflowWorld) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    world.attachments.set_count(task_id, 1);
    Ok(())
}
