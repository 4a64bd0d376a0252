use rusqlite::{params, Connection, OptionalExtension};

use crate::error::WorkpilotError;
use crate::models::{ProfileUpdate, User};

use super::now_ms;

const USER_COLUMNS: &str = "id, email, first_name, last_name, company_name, phone, address,
                            password_hash, created_at, updated_at";

pub fn create_user(
    conn: &Connection,
    id: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    company_name: &str,
    password_hash: &str,
) -> Result<User, WorkpilotError> {
    if find_user_by_email(conn, email)?.is_some() {
        return Err(WorkpilotError::email_taken(email));
    }
    let now = now_ms();
    conn.execute(
        "INSERT INTO users (id, email, first_name, last_name, company_name, password_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![id, email, first_name, last_name, company_name, password_hash, now],
    )?;
    get_user(conn, id)
}

pub fn get_user(conn: &Connection, id: &str) -> Result<User, WorkpilotError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        row_to_user,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => WorkpilotError::user_not_found(id),
        _ => WorkpilotError::from(e),
    })
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, WorkpilotError> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn update_profile(conn: &Connection, id: &str, update: &ProfileUpdate) -> Result<User, WorkpilotError> {
    if let Some(ref email) = update.email {
        if let Some(other) = find_user_by_email(conn, email)? {
            if other.id != id {
                return Err(WorkpilotError::email_taken(email));
            }
        }
    }
    let changed = conn.execute(
        "UPDATE users SET
             email = COALESCE(?1, email),
             first_name = COALESCE(?2, first_name),
             last_name = COALESCE(?3, last_name),
             company_name = COALESCE(?4, company_name),
             phone = COALESCE(?5, phone),
             address = COALESCE(?6, address),
             updated_at = ?7
         WHERE id = ?8",
        params![
            update.email,
            update.first_name,
            update.last_name,
            update.company_name,
            update.phone,
            update.address,
            now_ms(),
            id
        ],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::user_not_found(id));
    }
    get_user(conn, id)
}

pub fn update_password_hash(conn: &Connection, id: &str, password_hash: &str) -> Result<(), WorkpilotError> {
    conn.execute(
        "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        params![password_hash, now_ms(), id],
    )?;
    Ok(())
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        company_name: row.get(4)?,
        phone: row.get(5)?,
        address: row.get(6)?,
        password_hash: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}
