pub mod connection;
pub mod migrations;
pub mod user_repo;
pub mod session_repo;
pub mod stage_repo;
pub mod task_repo;
pub mod customer_repo;
pub mod order_repo;
pub mod dashboard_repo;

pub use connection::*;

use rusqlite::Connection;

use crate::error::WorkpilotError;

/// Current time as Unix epoch milliseconds, the only timestamp unit stored.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Run `f` inside `BEGIN IMMEDIATE`, committing on success and rolling back on error.
pub fn with_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T, WorkpilotError>,
) -> Result<T, WorkpilotError> {
    conn.execute_batch("BEGIN IMMEDIATE")?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Narrow a candidate list to a single match, reporting ambiguity.
pub(crate) fn pick_one<T>(
    reference: &str,
    mut candidates: Vec<T>,
    describe: impl Fn(&T) -> String,
) -> Result<Option<T>, WorkpilotError> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        _ => {
            let names: Vec<String> = candidates.iter().map(describe).collect();
            Err(WorkpilotError::ambiguous_ref(reference, &names))
        }
    }
}

/// SQL `LIKE` pattern matching ids that start with `reference`.
///
/// Ids are ULIDs, so only a non-empty alphanumeric reference can be a prefix.
pub(crate) fn id_prefix_pattern(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || !reference.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!("{}%", reference.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefix_pattern() {
        assert_eq!(id_prefix_pattern("01hx").as_deref(), Some("01HX%"));
        assert_eq!(id_prefix_pattern(" 01HX ").as_deref(), Some("01HX%"));
        for reference in ["", "  ", "-", "?", ".", "%", "01H_", "01H-X"] {
            assert_eq!(id_prefix_pattern(reference), None, "{reference:?}");
        }
    }
}
