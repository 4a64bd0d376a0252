use serde_json::json;

use crate::db::dashboard_repo;
use crate::error::WorkpilotError;
use crate::output;

use super::{finish, Context};

pub fn run(ctx: &Context) -> i32 {
    finish(run_dashboard(ctx), ctx.json)
}

fn run_dashboard(ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let summary = dashboard_repo::summary(authed.conn(), &authed.user_id)?;
    ctx.emit(
        || json!({ "summary": output::json::dashboard_json(&summary) }),
        || output::text::print_dashboard(&summary),
    );
    Ok(())
}
