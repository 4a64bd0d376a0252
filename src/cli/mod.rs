pub mod commands;
pub mod init;
pub mod auth;
pub mod profile;
pub mod stage;
pub mod task;
pub mod customer;
pub mod order;
pub mod track;
pub mod dashboard;

pub use commands::*;

use std::path::PathBuf;

use rusqlite::Connection;
use serde_json::Value;

use crate::config::{Config, ConfigSessionStore};
use crate::db::Workspace;
use crate::error::WorkpilotError;
use crate::output;
use crate::session::{self, TokenPolicy};

/// Global flags shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub home: Option<PathBuf>,
    pub json: bool,
}

/// An open workspace with its loaded config.
pub struct Opened {
    pub workspace: Workspace,
    pub conn: Connection,
    pub config: Config,
}

impl Opened {
    pub fn policy(&self) -> TokenPolicy {
        TokenPolicy::from_secs(self.config.access_token_ttl_secs, self.config.refresh_token_ttl_secs)
    }

    pub fn session_store(&self) -> ConfigSessionStore {
        ConfigSessionStore::new(self.workspace.config_path())
    }
}

/// An open workspace plus the user the stored session resolved to.
pub struct Authorized {
    pub opened: Opened,
    pub user_id: String,
}

impl Authorized {
    pub fn conn(&self) -> &Connection {
        &self.opened.conn
    }

    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.opened.config.page_size).max(1)
    }
}

impl Context {
    pub fn open(&self) -> Result<Opened, WorkpilotError> {
        let workspace = Workspace::locate(self.home.as_deref())?;
        let conn = workspace.open_db()?;
        let config = Config::load(&workspace.config_path())?;
        Ok(Opened { workspace, conn, config })
    }

    /// Open the workspace and resolve the stored session, refreshing once.
    pub fn authorize(&self) -> Result<Authorized, WorkpilotError> {
        let opened = self.open()?;
        let auth = session::authorize(&opened.conn, &opened.session_store(), opened.policy())?;
        Ok(Authorized {
            opened,
            user_id: auth.user_id,
        })
    }

    /// Print `data` in the success envelope, or run `text` for human output.
    pub fn emit(&self, data: impl FnOnce() -> Value, text: impl FnOnce()) {
        if self.json {
            println!("{}", pretty(&output::json::success(data())));
        } else {
            text();
        }
    }
}

/// Turn a command result into an exit code, reporting any error once.
pub fn finish(result: Result<(), WorkpilotError>, json_output: bool) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            if json_output {
                println!("{}", pretty(&output::json::error(&e)));
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
