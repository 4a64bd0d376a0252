//! Workspace configuration stored as `config.json` next to the database.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WorkpilotError;
use crate::session::{Session, SessionStore};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 3600;
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 7 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    pub page_size: usize,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            page_size: DEFAULT_PAGE_SIZE,
            access_token_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
            session: None,
        }
    }
}

impl Config {
    /// Read the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, WorkpilotError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkpilotError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Keeps the session token pair inside `config.json`.
pub struct ConfigSessionStore {
    path: PathBuf,
}

impl ConfigSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for ConfigSessionStore {
    fn load(&self) -> Result<Option<Session>, WorkpilotError> {
        Ok(Config::load(&self.path)?.session)
    }

    fn save(&self, session: &Session) -> Result<(), WorkpilotError> {
        let mut config = Config::load(&self.path)?;
        config.session = Some(session.clone());
        config.save(&self.path)
    }

    fn clear(&self) -> Result<(), WorkpilotError> {
        let mut config = Config::load(&self.path)?;
        if config.session.take().is_some() {
            config.save(&self.path)?;
        }
        Ok(())
    }
}
