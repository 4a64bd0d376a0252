use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::WorkpilotError;

use super::migrations;

pub const WORKSPACE_DIR: &str = ".workpilot";
pub const HOME_ENV: &str = "WORKPILOT_HOME";

/// The data directory holding the database and config file.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Locate an existing workspace: explicit dir → `WORKPILOT_HOME` → walk up from cwd.
    pub fn locate(home: Option<&Path>) -> Result<Self, WorkpilotError> {
        if let Some(dir) = explicit_home(home) {
            return Ok(Self::at(dir));
        }
        let mut dir = env::current_dir()?;
        loop {
            let candidate = dir.join(WORKSPACE_DIR);
            if candidate.is_dir() {
                return Ok(Self::at(candidate));
            }
            if !dir.pop() {
                return Err(WorkpilotError::not_initialized());
            }
        }
    }

    /// Where `init` should create a workspace.
    pub fn for_init(home: Option<&Path>) -> Result<Self, WorkpilotError> {
        match explicit_home(home) {
            Some(dir) => Ok(Self::at(dir)),
            None => Ok(Self::at(env::current_dir()?.join(WORKSPACE_DIR))),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.join("workpilot.db")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("config.json")
    }

    /// Open a connection to the database. Returns error if not initialized.
    pub fn open_db(&self) -> Result<Connection, WorkpilotError> {
        let path = self.db_path();
        if !path.exists() {
            return Err(WorkpilotError::not_initialized());
        }
        let conn = Connection::open(&path)?;
        configure_connection(&conn)?;
        Ok(conn)
    }

    /// Create the directory and database, then run migrations. Idempotent.
    pub fn init_db(&self) -> Result<PathBuf, WorkpilotError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.db_path();
        let conn = Connection::open(&path)?;
        configure_connection(&conn)?;
        migrations::run_migrations(&conn)?;
        Ok(path)
    }
}

fn explicit_home(home: Option<&Path>) -> Option<PathBuf> {
    home.map(Path::to_path_buf).or_else(|| {
        env::var_os(HOME_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Fresh migrated in-memory database.
pub fn open_in_memory() -> Result<Connection, WorkpilotError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<(), WorkpilotError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}
