use serde_json::json;

use crate::engine::tracking;
use crate::error::WorkpilotError;
use crate::output;

use super::{finish, Context};

pub fn run(token: &str, ctx: &Context) -> i32 {
    finish(run_track(token, ctx), ctx.json)
}

fn run_track(token: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let opened = ctx.open()?;
    let view = tracking::track(&opened.conn, token)?;
    ctx.emit(
        || json!({ "tracking": output::json::tracking_json(&view) }),
        || output::text::print_tracking(&view),
    );
    Ok(())
}
