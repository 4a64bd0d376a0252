use rusqlite::{params, Connection, OptionalExtension};

use crate::error::WorkpilotError;

pub fn insert_session(
    conn: &Connection,
    user_id: &str,
    access_token: &str,
    refresh_token: &str,
    access_expires_at: i64,
    refresh_expires_at: i64,
    now: i64,
) -> Result<(), WorkpilotError> {
    conn.execute(
        "INSERT INTO sessions (access_token, refresh_token, user_id, access_expires_at, refresh_expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![access_token, refresh_token, user_id, access_expires_at, refresh_expires_at, now],
    )?;
    Ok(())
}

/// User owning a live, unexpired access token.
pub fn user_for_access_token(conn: &Connection, access_token: &str, now: i64) -> Result<Option<String>, WorkpilotError> {
    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions
             WHERE access_token = ?1 AND revoked = 0 AND access_expires_at > ?2",
            params![access_token, now],
            |row| row.get(0),
        )
        .optional()?;
    Ok(user_id)
}

/// User owning a live, unexpired refresh token.
pub fn user_for_refresh_token(conn: &Connection, refresh_token: &str, now: i64) -> Result<Option<String>, WorkpilotError> {
    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions
             WHERE refresh_token = ?1 AND revoked = 0 AND refresh_expires_at > ?2",
            params![refresh_token, now],
            |row| row.get(0),
        )
        .optional()?;
    Ok(user_id)
}

pub fn revoke_by_refresh_token(conn: &Connection, refresh_token: &str) -> Result<usize, WorkpilotError> {
    let changed = conn.execute(
        "UPDATE sessions SET revoked = 1 WHERE refresh_token = ?1 AND revoked = 0",
        params![refresh_token],
    )?;
    Ok(changed)
}

pub fn revoke_all_for_user(conn: &Connection, user_id: &str) -> Result<usize, WorkpilotError> {
    let changed = conn.execute(
        "UPDATE sessions SET revoked = 1 WHERE user_id = ?1 AND revoked = 0",
        params![user_id],
    )?;
    Ok(changed)
}
