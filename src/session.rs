//! Access/refresh token pairs and the authorised-command gate.
//!
//! A command that needs a user goes through [`authorize`]: the stored access
//! token is checked, and if it is unknown or expired exactly one refresh is
//! attempted. A failed refresh wipes the stored pair.

use std::cell::RefCell;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::db::{now_ms, session_repo, with_transaction};
use crate::error::WorkpilotError;

/// Token pair held by the client between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    access_token: String,
    refresh_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

/// Where the client keeps its session between commands.
pub trait SessionStore {
    fn load(&self) -> Result<Option<Session>, WorkpilotError>;
    fn save(&self, session: &Session) -> Result<(), WorkpilotError>;
    fn clear(&self) -> Result<(), WorkpilotError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RefCell<Option<Session>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, WorkpilotError> {
        Ok(self.inner.borrow().clone())
    }

    fn save(&self, session: &Session) -> Result<(), WorkpilotError> {
        *self.inner.borrow_mut() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), WorkpilotError> {
        self.inner.borrow_mut().take();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub access_ttl_ms: i64,
    pub refresh_ttl_ms: i64,
}

impl TokenPolicy {
    pub fn from_secs(access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            access_ttl_ms: access_ttl_secs.saturating_mul(1000),
            refresh_ttl_ms: refresh_ttl_secs.saturating_mul(1000),
        }
    }
}

/// The user an authorised command runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
}

/// Create a fresh session row for `user_id`.
pub fn issue(conn: &Connection, user_id: &str, policy: TokenPolicy) -> Result<Session, WorkpilotError> {
    let now = now_ms();
    let session = Session::new(new_token(), new_token());
    session_repo::insert_session(
        conn,
        user_id,
        &session.access_token,
        &session.refresh_token,
        now.saturating_add(policy.access_ttl_ms),
        now.saturating_add(policy.refresh_ttl_ms),
        now,
    )?;
    Ok(session)
}

/// Trade a live refresh token for a new pair, revoking the old session.
pub fn refresh(conn: &Connection, refresh_token: &str, policy: TokenPolicy) -> Result<Session, WorkpilotError> {
    rotate(conn, refresh_token, policy).map(|(_, session)| session)
}

fn rotate(conn: &Connection, refresh_token: &str, policy: TokenPolicy) -> Result<(String, Session), WorkpilotError> {
    with_transaction(conn, |conn| {
        let user_id = session_repo::user_for_refresh_token(conn, refresh_token, now_ms())?
            .ok_or_else(|| WorkpilotError::unauthorized("Session expired. Log in again."))?;
        session_repo::revoke_by_refresh_token(conn, refresh_token)?;
        let session = issue(conn, &user_id, policy)?;
        info!(user_id = %user_id, "session refreshed");
        Ok((user_id, session))
    })
}

/// Resolve the stored session to a user, refreshing once if needed.
pub fn authorize(
    conn: &Connection,
    store: &dyn SessionStore,
    policy: TokenPolicy,
) -> Result<AuthContext, WorkpilotError> {
    let session = store.load()?.ok_or_else(WorkpilotError::not_logged_in)?;

    if let Some(user_id) = session_repo::user_for_access_token(conn, &session.access_token, now_ms())? {
        return Ok(AuthContext { user_id });
    }

    debug!("access token rejected, attempting refresh");
    match rotate(conn, &session.refresh_token, policy) {
        Ok((user_id, renewed)) => {
            store.save(&renewed)?;
            Ok(AuthContext { user_id })
        }
        Err(e) => {
            warn!(code = e.code.as_str(), "refresh failed, clearing stored session");
            store.clear()?;
            Err(WorkpilotError::unauthorized("Session expired. Log in again."))
        }
    }
}

fn new_token() -> String {
    format!("{}{}", ulid::Ulid::new(), ulid::Ulid::new()).to_lowercase()
}
