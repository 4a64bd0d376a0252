use std::io::Read;

use serde::Deserialize;
use serde_json::json;

use crate::cli::commands::TaskCommands;
use crate::db::task_repo;
use crate::engine::catalog;
use crate::error::WorkpilotError;
use crate::graph::chain::{Flow, FlowEdge};
use crate::output;

use super::{finish, Context};

/// Stdin document for `task load`.
#[derive(Debug, Deserialize)]
struct TaskFlowInput {
    name: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    nodes: Vec<String>,
    #[serde(default)]
    edges: Vec<FlowEdge>,
}

pub fn run(cmd: TaskCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        TaskCommands::Create { name, note, stages } => run_create(&name, note.as_deref(), &stages, ctx),
        TaskCommands::Load => run_load(ctx),
        TaskCommands::Update { task, name, note, stages, clear_stages } => {
            let sequence = if clear_stages || !stages.is_empty() { Some(stages) } else { None };
            run_update(&task, name.as_deref(), note.as_deref(), sequence.as_deref(), ctx)
        }
        TaskCommands::List => run_list(ctx),
        TaskCommands::Show { task } => run_show(&task, ctx),
        TaskCommands::Delete { task } => run_delete(&task, ctx),
    };
    finish(result, ctx.json)
}

fn run_create(name: &str, note: Option<&str>, stages: &[String], ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let task = catalog::create_task(authed.conn(), &authed.user_id, name, note, stages)?;
    ctx.emit(
        || json!({ "task": output::json::task_json(&task) }),
        || println!("Created task: {} ({}) with {} stage(s)", task.name, task.id, task.stages.len()),
    );
    Ok(())
}

fn run_load(ctx: &Context) -> Result<(), WorkpilotError> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| WorkpilotError::validation(format!("Failed to read stdin: {e}")))?;
    let doc: TaskFlowInput = serde_json::from_str(&input)
        .map_err(|e| WorkpilotError::validation(format!("Invalid task flow JSON: {e}")))?;

    let authed = ctx.authorize()?;
    let flow = Flow { nodes: doc.nodes, edges: doc.edges };
    let task = catalog::create_task_from_flow(authed.conn(), &authed.user_id, &doc.name, doc.note.as_deref(), &flow)?;
    ctx.emit(
        || json!({ "task": output::json::task_json(&task) }),
        || {
            println!("Loaded task: {} ({})", task.name, task.id);
            output::text::print_task(&task);
        },
    );
    Ok(())
}

fn run_update(
    reference: &str,
    name: Option<&str>,
    note: Option<&str>,
    stages: Option<&[String]>,
    ctx: &Context,
) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let task = catalog::update_task(authed.conn(), &authed.user_id, reference, name, note, stages)?;
    ctx.emit(
        || json!({ "task": output::json::task_json(&task) }),
        || println!("Updated task: {} ({})", task.name, task.id),
    );
    Ok(())
}

fn run_list(ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let tasks = task_repo::list_tasks(authed.conn(), &authed.user_id)?;
    ctx.emit(
        || json!({ "tasks": tasks.iter().map(output::json::task_json).collect::<Vec<_>>() }),
        || output::text::print_task_list(&tasks),
    );
    Ok(())
}

fn run_show(reference: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let task = task_repo::resolve_task(authed.conn(), &authed.user_id, reference)?;
    ctx.emit(
        || json!({ "task": output::json::task_json(&task) }),
        || output::text::print_task(&task),
    );
    Ok(())
}

fn run_delete(reference: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let task = catalog::delete_task(authed.conn(), &authed.user_id, reference)?;
    ctx.emit(
        || json!({ "deleted": { "id": task.id, "name": task.name } }),
        || println!("Deleted task: {} ({})", task.name, task.id),
    );
    Ok(())
}
