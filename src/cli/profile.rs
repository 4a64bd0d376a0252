use serde_json::json;

use crate::auth;
use crate::cli::commands::ProfileCommands;
use crate::db::user_repo;
use crate::error::WorkpilotError;
use crate::models::ProfileUpdate;
use crate::output;
use crate::session::SessionStore;

use super::{finish, Context};

pub fn run(cmd: ProfileCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        ProfileCommands::Show => run_show(ctx),
        ProfileCommands::Update { email, first_name, last_name, company, phone, address } => {
            let update = ProfileUpdate {
                email,
                first_name,
                last_name,
                company_name: company,
                phone,
                address,
            };
            run_update(&update, ctx)
        }
        ProfileCommands::Password { current, new, confirm } => run_password(&current, &new, &confirm, ctx),
    };
    finish(result, ctx.json)
}

fn run_show(ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let user = user_repo::get_user(authed.conn(), &authed.user_id)?;
    ctx.emit(
        || json!({ "user": output::json::user_json(&user) }),
        || output::text::print_user(&user),
    );
    Ok(())
}

fn run_update(update: &ProfileUpdate, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let user = auth::update_profile(authed.conn(), &authed.user_id, update)?;
    ctx.emit(
        || json!({ "user": output::json::user_json(&user) }),
        || output::text::print_user(&user),
    );
    Ok(())
}

fn run_password(current: &str, new: &str, confirm: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let policy = authed.opened.policy();
    let session = auth::change_password(authed.conn(), &authed.user_id, current, new, confirm, policy)?;
    authed.opened.session_store().save(&session)?;
    ctx.emit(
        || json!({ "password_changed": true }),
        || println!("Password changed. Other sessions were logged out."),
    );
    Ok(())
}
