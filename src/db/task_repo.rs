use rusqlite::{params, Connection, OptionalExtension};

use crate::error::WorkpilotError;
use crate::models::{Task, TaskStage};

use super::stage_repo::row_to_stage;
use super::{id_prefix_pattern, now_ms, pick_one};

struct TaskRow {
    id: String,
    user_id: String,
    name: String,
    note: Option<String>,
    created_at: i64,
    updated_at: i64,
}

pub fn create_task(
    conn: &Connection,
    id: &str,
    user_id: &str,
    name: &str,
    note: Option<&str>,
    stage_ids: &[String],
) -> Result<Task, WorkpilotError> {
    let now = now_ms();
    conn.execute(
        "INSERT INTO tasks (id, user_id, name, note, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![id, user_id, name, note, now],
    )?;
    replace_stage_links(conn, id, stage_ids)?;
    get_task(conn, user_id, id)
}

pub fn get_task(conn: &Connection, user_id: &str, id: &str) -> Result<Task, WorkpilotError> {
    find_task(conn, user_id, id)?.ok_or_else(|| WorkpilotError::task_not_found(id))
}

pub fn find_task(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Task>, WorkpilotError> {
    let row = conn
        .query_row(
            "SELECT id, user_id, name, note, created_at, updated_at FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            row_to_task_row,
        )
        .optional()?;
    match row {
        Some(row) => Ok(Some(hydrate(conn, row)?)),
        None => Ok(None),
    }
}

/// Resolve a task reference: exact id → exact name (case-insensitive) → id prefix.
pub fn resolve_task(conn: &Connection, user_id: &str, reference: &str) -> Result<Task, WorkpilotError> {
    if let Some(task) = find_task(conn, user_id, reference)? {
        return Ok(task);
    }

    let wanted = reference.trim().to_lowercase();
    let by_name: Vec<TaskRow> = list_task_rows(conn, user_id)?
        .into_iter()
        .filter(|t| t.name.to_lowercase() == wanted)
        .collect();
    if let Some(row) = pick_one(reference, by_name, describe)? {
        return hydrate(conn, row);
    }

    let Some(pattern) = id_prefix_pattern(reference) else {
        return Err(WorkpilotError::task_not_found(reference));
    };
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, note, created_at, updated_at FROM tasks WHERE user_id = ?1 AND id LIKE ?2",
    )?;
    let by_prefix = stmt
        .query_map(params![user_id, pattern], row_to_task_row)?
        .collect::<Result<Vec<_>, _>>()?;
    match pick_one(reference, by_prefix, describe)? {
        Some(row) => hydrate(conn, row),
        None => Err(WorkpilotError::task_not_found(reference)),
    }
}

/// All tasks of the user with their stage sequences, ordered by name.
pub fn list_tasks(conn: &Connection, user_id: &str) -> Result<Vec<Task>, WorkpilotError> {
    list_task_rows(conn, user_id)?
        .into_iter()
        .map(|row| hydrate(conn, row))
        .collect()
}

pub fn update_task(
    conn: &Connection,
    user_id: &str,
    id: &str,
    name: &str,
    note: Option<&str>,
    stage_ids: &[String],
) -> Result<Task, WorkpilotError> {
    let changed = conn.execute(
        "UPDATE tasks SET name = ?1, note = ?2, updated_at = ?3 WHERE id = ?4 AND user_id = ?5",
        params![name, note, now_ms(), id, user_id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::task_not_found(id));
    }
    replace_stage_links(conn, id, stage_ids)?;
    get_task(conn, user_id, id)
}

/// Replace the whole stage sequence of a task, positions packed from 0.
pub fn replace_stage_links(conn: &Connection, task_id: &str, stage_ids: &[String]) -> Result<(), WorkpilotError> {
    conn.execute("DELETE FROM task_stage_links WHERE task_id = ?1", params![task_id])?;
    let mut stmt = conn.prepare(
        "INSERT INTO task_stage_links (task_id, stage_id, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, stage_id) in stage_ids.iter().enumerate() {
        stmt.execute(params![task_id, stage_id, position as i64])?;
    }
    Ok(())
}

pub fn delete_task(conn: &Connection, user_id: &str, id: &str) -> Result<(), WorkpilotError> {
    let changed = conn.execute(
        "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::task_not_found(id));
    }
    Ok(())
}

/// Stage sequence of a task in position order, DELETED stages included.
pub fn stages_for_task(conn: &Connection, task_id: &str) -> Result<Vec<TaskStage>, WorkpilotError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.user_id, s.name, s.note, s.status, s.created_at, s.updated_at
         FROM task_stage_links l
         JOIN task_stages s ON s.id = l.stage_id
         WHERE l.task_id = ?1
         ORDER BY l.position ASC",
    )?;
    let stages = stmt
        .query_map(params![task_id], row_to_stage)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(stages)
}

/// Ids of tasks whose sequence contains `stage_id`.
pub fn tasks_containing_stage(conn: &Connection, stage_id: &str) -> Result<Vec<String>, WorkpilotError> {
    let mut stmt = conn.prepare("SELECT task_id FROM task_stage_links WHERE stage_id = ?1")?;
    let ids = stmt
        .query_map(params![stage_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn list_task_rows(conn: &Connection, user_id: &str) -> Result<Vec<TaskRow>, WorkpilotError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, note, created_at, updated_at FROM tasks
         WHERE user_id = ?1 ORDER BY name COLLATE NOCASE ASC, created_at ASC",
    )?;
    let rows = stmt
        .query_map(params![user_id], row_to_task_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn hydrate(conn: &Connection, row: TaskRow) -> Result<Task, WorkpilotError> {
    let stages = stages_for_task(conn, &row.id)?;
    Ok(Task {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        note: row.note,
        stages,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn describe(row: &TaskRow) -> String {
    format!("{} ({})", row.name, row.id)
}

fn row_to_task_row(row: &rusqlite::Row) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        note: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}
