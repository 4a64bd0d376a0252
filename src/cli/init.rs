use serde_json::json;

use crate::config::Config;
use crate::db::Workspace;
use crate::error::WorkpilotError;

use super::{finish, Context};

pub fn run(ctx: &Context) -> i32 {
    finish(run_init(ctx), ctx.json)
}

fn run_init(ctx: &Context) -> Result<(), WorkpilotError> {
    let workspace = Workspace::for_init(ctx.home.as_deref())?;
    let db_path = workspace.init_db()?;
    let config_path = workspace.config_path();
    if !config_path.exists() {
        Config::default().save(&config_path)?;
    }
    ctx.emit(
        || json!({ "path": workspace.dir().to_string_lossy(), "db": db_path.to_string_lossy() }),
        || println!("Initialized workpilot at {}", workspace.dir().display()),
    );
    Ok(())
}
