use serde_json::json;

use crate::auth;
use crate::cli::commands::AuthCommands;
use crate::error::WorkpilotError;
use crate::models::Registration;
use crate::output;
use crate::session::{self, SessionStore};

use super::{finish, Context};

pub fn run(cmd: AuthCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        AuthCommands::Register { email, password, first_name, last_name, company } => {
            let registration = Registration {
                email,
                password,
                first_name,
                last_name,
                company_name: company,
            };
            run_register(&registration, ctx)
        }
        AuthCommands::Login { email, password } => run_login(&email, &password, ctx),
        AuthCommands::Logout => run_logout(ctx),
        AuthCommands::Refresh => run_refresh(ctx),
    };
    finish(result, ctx.json)
}

fn run_register(registration: &Registration, ctx: &Context) -> Result<(), WorkpilotError> {
    let opened = ctx.open()?;
    let (user, session) = auth::register(&opened.conn, registration, opened.policy())?;
    opened.session_store().save(&session)?;
    ctx.emit(
        || json!({ "user": output::json::user_json(&user), "session": output::json::session_json(&session) }),
        || println!("Registered {} ({}) and logged in", user.email, user.id),
    );
    Ok(())
}

fn run_login(email: &str, password: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let opened = ctx.open()?;
    let (user, session) = auth::login(&opened.conn, email, password, opened.policy())?;
    opened.session_store().save(&session)?;
    ctx.emit(
        || json!({ "user": output::json::user_json(&user), "session": output::json::session_json(&session) }),
        || println!("Logged in as {}", user.email),
    );
    Ok(())
}

fn run_logout(ctx: &Context) -> Result<(), WorkpilotError> {
    let opened = ctx.open()?;
    let had_session = auth::logout(&opened.conn, &opened.session_store())?;
    ctx.emit(
        || json!({ "logged_out": had_session }),
        || {
            if had_session {
                println!("Logged out");
            } else {
                println!("No active session");
            }
        },
    );
    Ok(())
}

fn run_refresh(ctx: &Context) -> Result<(), WorkpilotError> {
    let opened = ctx.open()?;
    let store = opened.session_store();
    let current = store.load()?.ok_or_else(WorkpilotError::not_logged_in)?;
    let renewed = match session::refresh(&opened.conn, current.refresh_token(), opened.policy()) {
        Ok(renewed) => renewed,
        Err(e) => {
            store.clear()?;
            return Err(e);
        }
    };
    store.save(&renewed)?;
    ctx.emit(
        || json!({ "session": output::json::session_json(&renewed) }),
        || println!("Session refreshed"),
    );
    Ok(())
}
