//! Field checks run before any write reaches the database.

use crate::error::WorkpilotError;
use crate::models::{
    CustomerInput, NOTE_MAX_LENGTH, PASSWORD_MIN_LENGTH, STAGE_NAME_MAX_LENGTH, STAGE_NAME_MIN_LENGTH,
    TASK_NAME_MAX_LENGTH,
};

pub fn stage_name(name: &str) -> Result<String, WorkpilotError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(STAGE_NAME_MIN_LENGTH..=STAGE_NAME_MAX_LENGTH).contains(&len) {
        return Err(WorkpilotError::validation(format!(
            "Stage name must be between {STAGE_NAME_MIN_LENGTH} and {STAGE_NAME_MAX_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Blank notes are stored as absent.
pub fn note(note: Option<&str>) -> Result<Option<String>, WorkpilotError> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if note.chars().count() > NOTE_MAX_LENGTH {
        return Err(WorkpilotError::validation(format!(
            "Note must be at most {NOTE_MAX_LENGTH} characters"
        )));
    }
    Ok(Some(note.to_string()))
}

pub fn task_name(name: &str) -> Result<String, WorkpilotError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkpilotError::validation("Task name is required"));
    }
    if name.chars().count() > TASK_NAME_MAX_LENGTH {
        return Err(WorkpilotError::validation(format!(
            "Task name must be at most {TASK_NAME_MAX_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn email(email: &str) -> Result<String, WorkpilotError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(WorkpilotError::validation(format!("Invalid email address: '{email}'")));
    }
    Ok(email.to_string())
}

pub fn password(password: &str) -> Result<(), WorkpilotError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(WorkpilotError::validation(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> Result<String, WorkpilotError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(WorkpilotError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

pub fn customer(input: &CustomerInput) -> Result<CustomerInput, WorkpilotError> {
    let email_addr = match optional(input.email.as_deref()) {
        Some(e) => Some(email(&e)?),
        None => None,
    };
    Ok(CustomerInput {
        name: required("Customer name", &input.name)?,
        phone: optional(input.phone.as_deref()),
        email: email_addr,
        address: optional(input.address.as_deref()),
        note: note(input.note.as_deref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_name_bounds() {
        assert!(stage_name("ab").is_err());
        assert_eq!(stage_name("  Onay ").unwrap(), "Onay");
        assert!(stage_name(&"x".repeat(50)).is_ok());
        assert!(stage_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_stage_name_counts_characters_not_bytes() {
        assert!(stage_name("Üçü").is_ok());
        assert!(stage_name(&"ş".repeat(50)).is_ok());
    }

    #[test]
    fn test_note_limit() {
        assert_eq!(note(Some("   ")).unwrap(), None);
        assert!(note(Some(&"n".repeat(250))).is_ok());
        assert!(note(Some(&"n".repeat(251))).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(email("ops@workpilot.io").is_ok());
        assert!(email("ops@localhost").is_err());
        assert!(email("@workpilot.io").is_err());
        assert!(email("no-at-sign").is_err());
    }

    #[test]
    fn test_customer_blank_fields_become_none() {
        let input = CustomerInput {
            name: " Acme ".into(),
            phone: Some(" ".into()),
            email: Some("".into()),
            ..Default::default()
        };
        let clean = customer(&input).unwrap();
        assert_eq!(clean.name, "Acme");
        assert_eq!(clean.phone, None);
        assert_eq!(clean.email, None);
    }
}
