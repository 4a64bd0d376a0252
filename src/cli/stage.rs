use serde_json::json;

use crate::cli::commands::StageCommands;
use crate::db::stage_repo;
use crate::engine::catalog;
use crate::error::WorkpilotError;
use crate::output;
use crate::query::filter;

use super::{finish, Context};

pub fn run(cmd: StageCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        StageCommands::Add { name, note } => run_add(&name, note.as_deref(), ctx),
        StageCommands::List { name } => run_list(name.as_deref(), ctx),
        StageCommands::Show { stage } => run_show(&stage, ctx),
        StageCommands::Update { stage, name, note } => run_update(&stage, name.as_deref(), note.as_deref(), ctx),
        StageCommands::Delete { stage, hard } => run_delete(&stage, hard, ctx),
    };
    finish(result, ctx.json)
}

fn run_add(name: &str, note: Option<&str>, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let stage = catalog::create_stage(authed.conn(), &authed.user_id, name, note)?;
    ctx.emit(
        || json!({ "stage": output::json::stage_json(&stage) }),
        || println!("Added stage: {} ({})", stage.name, stage.id),
    );
    Ok(())
}

fn run_list(name: Option<&str>, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let stages = filter::filter_stages_by_name(stage_repo::list_active_stages(authed.conn(), &authed.user_id)?, name);
    ctx.emit(
        || json!({ "stages": stages.iter().map(output::json::stage_json).collect::<Vec<_>>() }),
        || output::text::print_stage_list(&stages),
    );
    Ok(())
}

fn run_show(reference: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let stage = stage_repo::resolve_stage(authed.conn(), &authed.user_id, reference)?;
    ctx.emit(
        || json!({ "stage": output::json::stage_json(&stage) }),
        || output::text::print_stage(&stage),
    );
    Ok(())
}

fn run_update(reference: &str, name: Option<&str>, note: Option<&str>, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let stage = catalog::update_stage(authed.conn(), &authed.user_id, reference, name, note)?;
    ctx.emit(
        || json!({ "stage": output::json::stage_json(&stage) }),
        || println!("Updated stage: {} ({})", stage.name, stage.id),
    );
    Ok(())
}

fn run_delete(reference: &str, hard: bool, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let stage = if hard {
        catalog::hard_delete_stage(authed.conn(), &authed.user_id, reference)?
    } else {
        catalog::soft_delete_stage(authed.conn(), &authed.user_id, reference)?
    };
    ctx.emit(
        || json!({ "deleted": { "id": stage.id, "name": stage.name, "hard": hard } }),
        || {
            let kind = if hard { "Removed" } else { "Deleted" };
            println!("{kind} stage: {} ({})", stage.name, stage.id)
        },
    );
    Ok(())
}
