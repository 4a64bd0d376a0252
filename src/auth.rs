//! Accounts: registration, login, logout and password management.

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::db::{new_id, session_repo, user_repo, with_transaction};
use crate::error::WorkpilotError;
use crate::models::{ProfileUpdate, Registration, User};
use crate::session::{self, Session, SessionStore, TokenPolicy};
use crate::validation;

pub fn register(
    conn: &Connection,
    registration: &Registration,
    policy: TokenPolicy,
) -> Result<(User, Session), WorkpilotError> {
    let email = validation::email(&registration.email)?;
    validation::password(&registration.password)?;
    let first_name = validation::required("First name", &registration.first_name)?;
    let last_name = validation::required("Last name", &registration.last_name)?;
    let company_name = validation::required("Company name", &registration.company_name)?;

    with_transaction(conn, |conn| {
        let user = user_repo::create_user(
            conn,
            &new_id(),
            &email,
            &first_name,
            &last_name,
            &company_name,
            &hash_password(&registration.password),
        )?;
        let session = session::issue(conn, &user.id, policy)?;
        info!(user_id = %user.id, "user registered");
        Ok((user, session))
    })
}

pub fn login(
    conn: &Connection,
    email: &str,
    password: &str,
    policy: TokenPolicy,
) -> Result<(User, Session), WorkpilotError> {
    let user = user_repo::find_user_by_email(conn, email.trim())?
        .filter(|u| verify_password(password, &u.password_hash))
        .ok_or_else(WorkpilotError::invalid_credentials)?;
    let session = session::issue(conn, &user.id, policy)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, session))
}

/// Revoke the stored session, if any, and forget it locally.
pub fn logout(conn: &Connection, store: &dyn SessionStore) -> Result<bool, WorkpilotError> {
    let Some(session) = store.load()? else {
        return Ok(false);
    };
    session_repo::revoke_by_refresh_token(conn, session.refresh_token())?;
    store.clear()?;
    Ok(true)
}

pub fn update_profile(conn: &Connection, user_id: &str, update: &ProfileUpdate) -> Result<User, WorkpilotError> {
    let mut update = update.clone();
    if let Some(ref email) = update.email {
        update.email = Some(validation::email(email)?);
    }
    for field in [&mut update.first_name, &mut update.last_name, &mut update.company_name] {
        if let Some(value) = field.as_deref() {
            *field = Some(validation::required("Profile field", value)?);
        }
    }
    user_repo::update_profile(conn, user_id, &update)
}

/// Replace the password, revoking every session of the user and issuing a
/// new one for the caller.
pub fn change_password(
    conn: &Connection,
    user_id: &str,
    current: &str,
    new: &str,
    confirmation: &str,
    policy: TokenPolicy,
) -> Result<Session, WorkpilotError> {
    if new != confirmation {
        return Err(WorkpilotError::validation("New password and confirmation do not match"));
    }
    validation::password(new)?;

    with_transaction(conn, |conn| {
        let user = user_repo::get_user(conn, user_id)?;
        if !verify_password(current, &user.password_hash) {
            return Err(WorkpilotError::invalid_credentials());
        }
        user_repo::update_password_hash(conn, user_id, &hash_password(new))?;
        let revoked = session_repo::revoke_all_for_user(conn, user_id)?;
        info!(user_id, revoked, "password changed");
        session::issue(conn, user_id, policy)
    })
}

/// `salt$hex(sha256(salt || password))`
pub fn hash_password(password: &str) -> String {
    let salt = ulid::Ulid::new().to_string();
    format!("{salt}${}", digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::error::ErrorCode;
    use crate::session::MemorySessionStore;

    const POLICY: TokenPolicy = TokenPolicy { access_ttl_ms: 60_000, refresh_ttl_ms: 600_000 };

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            password: "s3cret-pass".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            company_name: "Acme".into(),
        }
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("hunter22");
        let b = hash_password("hunter22");
        assert_ne!(a, b);
        assert!(verify_password("hunter22", &a));
        assert!(!verify_password("hunter23", &a));
        assert!(!verify_password("hunter22", "no-separator"));
    }

    #[test]
    fn test_register_then_login() {
        let conn = open_in_memory().unwrap();
        let (user, _) = register(&conn, &registration("ops@acme.io"), POLICY).unwrap();
        let (again, _) = login(&conn, "OPS@acme.io", "s3cret-pass", POLICY).unwrap();
        assert_eq!(user.id, again.id);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let conn = open_in_memory().unwrap();
        register(&conn, &registration("ops@acme.io"), POLICY).unwrap();
        let err = register(&conn, &registration("ops@acme.io"), POLICY).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmailTaken);
    }

    #[test]
    fn test_short_password_rejected() {
        let conn = open_in_memory().unwrap();
        let mut reg = registration("ops@acme.io");
        reg.password = "short".into();
        assert_eq!(register(&conn, &reg, POLICY).unwrap_err().code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_wrong_password_is_invalid_credentials() {
        let conn = open_in_memory().unwrap();
        register(&conn, &registration("ops@acme.io"), POLICY).unwrap();
        let err = login(&conn, "ops@acme.io", "wrong-pass", POLICY).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        let err = login(&conn, "nobody@acme.io", "s3cret-pass", POLICY).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[test]
    fn test_logout_revokes_and_clears() {
        let conn = open_in_memory().unwrap();
        let (_, session) = register(&conn, &registration("ops@acme.io"), POLICY).unwrap();
        let store = MemorySessionStore::default();
        store.save(&session).unwrap();

        assert!(logout(&conn, &store).unwrap());
        assert!(store.load().unwrap().is_none());
        assert!(!logout(&conn, &store).unwrap());
        assert!(session::refresh(&conn, session.refresh_token(), POLICY).is_err());
    }

    #[test]
    fn test_change_password_requires_matching_confirmation() {
        let conn = open_in_memory().unwrap();
        let (user, old) = register(&conn, &registration("ops@acme.io"), POLICY).unwrap();

        let err = change_password(&conn, &user.id, "s3cret-pass", "new-pass-1", "new-pass-2", POLICY).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let err = change_password(&conn, &user.id, "wrong", "new-pass-1", "new-pass-1", POLICY).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);

        change_password(&conn, &user.id, "s3cret-pass", "new-pass-1", "new-pass-1", POLICY).unwrap();
        assert!(login(&conn, "ops@acme.io", "new-pass-1", POLICY).is_ok());
        assert!(session::refresh(&conn, old.refresh_token(), POLICY).is_err());
    }

    #[test]
    fn test_profile_update_checks_email() {
        let conn = open_in_memory().unwrap();
        let (user, _) = register(&conn, &registration("ops@acme.io"), POLICY).unwrap();
        register(&conn, &registration("other@acme.io"), POLICY).unwrap();

        let taken = ProfileUpdate { email: Some("other@acme.io".into()), ..Default::default() };
        assert_eq!(update_profile(&conn, &user.id, &taken).unwrap_err().code, ErrorCode::EmailTaken);

        let ok = ProfileUpdate { phone: Some("+90 555".into()), ..Default::default() };
        let updated = update_profile(&conn, &user.id, &ok).unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+90 555"));
        assert_eq!(updated.first_name, "Ada");
    }
}
