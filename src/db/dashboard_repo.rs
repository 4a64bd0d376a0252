use rusqlite::{params, Connection};

use crate::error::WorkpilotError;
use crate::models::DashboardSummary;

pub fn summary(conn: &Connection, user_id: &str) -> Result<DashboardSummary, WorkpilotError> {
    let mut summary = DashboardSummary {
        customers: count(conn, "SELECT COUNT(*) FROM customers WHERE user_id = ?1", user_id)?,
        tasks: count(conn, "SELECT COUNT(*) FROM tasks WHERE user_id = ?1", user_id)?,
        active_stages: count(
            conn,
            "SELECT COUNT(*) FROM task_stages WHERE user_id = ?1 AND status = 'ACTIVE'",
            user_id,
        )?,
        ..DashboardSummary::default()
    };

    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*) FROM orders WHERE user_id = ?1 GROUP BY status",
    )?;
    let rows = stmt.query_map(params![user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (status, n) = row?;
        match status.as_str() {
            "CREATED" | "IN_PROGRESS" => summary.active_orders += n,
            "COMPLETED" => summary.completed_orders = n,
            "CANCELLED" => summary.cancelled_orders = n,
            _ => {}
        }
    }
    Ok(summary)
}

fn count(conn: &Connection, sql: &str, user_id: &str) -> Result<i64, WorkpilotError> {
    Ok(conn.query_row(sql, params![user_id], |row| row.get(0))?)
}
