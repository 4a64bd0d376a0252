use rusqlite::{params, Connection, OptionalExtension};

use crate::error::WorkpilotError;
use crate::models::{StageStatus, TaskStage};

use super::{id_prefix_pattern, now_ms, pick_one};

const STAGE_COLUMNS: &str = "id, user_id, name, note, status, created_at, updated_at";

pub fn create_stage(
    conn: &Connection,
    id: &str,
    user_id: &str,
    name: &str,
    note: Option<&str>,
) -> Result<TaskStage, WorkpilotError> {
    let now = now_ms();
    conn.execute(
        "INSERT INTO task_stages (id, user_id, name, note, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![id, user_id, name, note, StageStatus::Active.as_str(), now],
    )?;
    get_stage(conn, user_id, id)
}

/// Load a stage of any status owned by `user_id`.
pub fn get_stage(conn: &Connection, user_id: &str, id: &str) -> Result<TaskStage, WorkpilotError> {
    find_stage(conn, user_id, id)?.ok_or_else(|| WorkpilotError::stage_not_found(id))
}

pub fn find_stage(conn: &Connection, user_id: &str, id: &str) -> Result<Option<TaskStage>, WorkpilotError> {
    let stage = conn
        .query_row(
            &format!("SELECT {STAGE_COLUMNS} FROM task_stages WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            row_to_stage,
        )
        .optional()?;
    Ok(stage)
}

/// Resolve a stage reference: exact id → exact name (case-insensitive) → id prefix.
///
/// Name matches prefer ACTIVE stages over DELETED ones.
pub fn resolve_stage(conn: &Connection, user_id: &str, reference: &str) -> Result<TaskStage, WorkpilotError> {
    if let Some(stage) = find_stage(conn, user_id, reference)? {
        return Ok(stage);
    }

    let wanted = reference.trim().to_lowercase();
    let named: Vec<TaskStage> = list_all_stages(conn, user_id)?
        .into_iter()
        .filter(|s| s.name.to_lowercase() == wanted)
        .collect();
    let active: Vec<TaskStage> = named.iter().filter(|s| s.is_active()).cloned().collect();
    let by_name = if active.is_empty() { named } else { active };
    if let Some(stage) = pick_one(reference, by_name, describe)? {
        return Ok(stage);
    }

    let Some(pattern) = id_prefix_pattern(reference) else {
        return Err(WorkpilotError::stage_not_found(reference));
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {STAGE_COLUMNS} FROM task_stages WHERE user_id = ?1 AND id LIKE ?2"
    ))?;
    let by_prefix = stmt
        .query_map(params![user_id, pattern], row_to_stage)?
        .collect::<Result<Vec<_>, _>>()?;
    pick_one(reference, by_prefix, describe)?.ok_or_else(|| WorkpilotError::stage_not_found(reference))
}

/// ACTIVE stages of the user, ordered by name.
pub fn list_active_stages(conn: &Connection, user_id: &str) -> Result<Vec<TaskStage>, WorkpilotError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STAGE_COLUMNS} FROM task_stages
         WHERE user_id = ?1 AND status = 'ACTIVE'
         ORDER BY name COLLATE NOCASE ASC, created_at ASC"
    ))?;
    let stages = stmt
        .query_map(params![user_id], row_to_stage)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stages)
}

fn list_all_stages(conn: &Connection, user_id: &str) -> Result<Vec<TaskStage>, WorkpilotError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STAGE_COLUMNS} FROM task_stages WHERE user_id = ?1 ORDER BY created_at ASC"
    ))?;
    let stages = stmt
        .query_map(params![user_id], row_to_stage)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stages)
}

/// Rewrite name and note. The stage is (re)marked ACTIVE, matching the edit form.
pub fn update_stage(
    conn: &Connection,
    user_id: &str,
    id: &str,
    name: &str,
    note: Option<&str>,
) -> Result<TaskStage, WorkpilotError> {
    let changed = conn.execute(
        "UPDATE task_stages SET name = ?1, note = ?2, status = 'ACTIVE', updated_at = ?3
         WHERE id = ?4 AND user_id = ?5",
        params![name, note, now_ms(), id, user_id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::stage_not_found(id));
    }
    get_stage(conn, user_id, id)
}

pub fn update_stage_status(
    conn: &Connection,
    user_id: &str,
    id: &str,
    status: StageStatus,
) -> Result<TaskStage, WorkpilotError> {
    let changed = conn.execute(
        "UPDATE task_stages SET status = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
        params![status.as_str(), now_ms(), id, user_id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::stage_not_found(id));
    }
    get_stage(conn, user_id, id)
}

pub fn delete_stage_row(conn: &Connection, user_id: &str, id: &str) -> Result<(), WorkpilotError> {
    let changed = conn.execute(
        "DELETE FROM task_stages WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::stage_not_found(id));
    }
    Ok(())
}

fn describe(stage: &TaskStage) -> String {
    format!("{} ({})", stage.name, stage.id)
}

pub(crate) fn row_to_stage(row: &rusqlite::Row) -> rusqlite::Result<TaskStage> {
    Ok(TaskStage {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        note: row.get(3)?,
        status: StageStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(StageStatus::Active),
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
