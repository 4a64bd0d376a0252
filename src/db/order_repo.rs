use rusqlite::{params, Connection, OptionalExtension};

use crate::engine::transition;
use crate::error::WorkpilotError;
use crate::models::{NamedRef, Order, OrderDetail, OrderStatus, OrderSummary, StagePosition};
use crate::query::page::Page;

use super::{customer_repo, id_prefix_pattern, now_ms, pick_one, task_repo};

const ORDER_COLUMNS: &str =
    "id, user_id, customer_id, task_id, current_stage_id, status, token, created_at, updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSort {
    #[default]
    CreatedAt,
    UpdatedAt,
    Status,
}

impl OrderSort {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" | "created_at" => Some(Self::CreatedAt),
            "updated" | "updated_at" => Some(Self::UpdatedAt),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "o.created_at",
            Self::UpdatedAt => "o.updated_at",
            Self::Status => "o.status",
        }
    }
}

/// Server-side order search. Unset clauses match every row.
#[derive(Debug, Clone)]
pub struct OrderSearch {
    pub customer_id: Option<String>,
    pub task_id: Option<String>,
    pub current_stage_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub page: usize,
    pub page_size: usize,
    pub sort: OrderSort,
    pub ascending: bool,
}

impl Default for OrderSearch {
    fn default() -> Self {
        Self {
            customer_id: None,
            task_id: None,
            current_stage_id: None,
            status: None,
            page: 0,
            page_size: 10,
            sort: OrderSort::CreatedAt,
            ascending: false,
        }
    }
}

pub fn create_order(
    conn: &Connection,
    id: &str,
    user_id: &str,
    customer_id: &str,
    task_id: &str,
    token: &str,
) -> Result<Order, WorkpilotError> {
    let now = now_ms();
    conn.execute(
        "INSERT INTO orders (id, user_id, customer_id, task_id, current_stage_id, status, token, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7, ?7)",
        params![id, user_id, customer_id, task_id, OrderStatus::Created.as_str(), token, now],
    )?;
    get_order(conn, user_id, id)
}

pub fn get_order(conn: &Connection, user_id: &str, id: &str) -> Result<Order, WorkpilotError> {
    conn.query_row(
        &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND user_id = ?2"),
        params![id, user_id],
        row_to_order,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => WorkpilotError::order_not_found(id),
        _ => WorkpilotError::from(e),
    })
}

fn find_order(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Order>, WorkpilotError> {
    let order = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            row_to_order,
        )
        .optional()?;
    Ok(order)
}

/// Resolve an order by exact id or unique id prefix.
pub fn resolve_order(conn: &Connection, user_id: &str, reference: &str) -> Result<Order, WorkpilotError> {
    if let Some(order) = find_order(conn, user_id, reference)? {
        return Ok(order);
    }
    let Some(pattern) = id_prefix_pattern(reference) else {
        return Err(WorkpilotError::order_not_found(reference));
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 AND id LIKE ?2"
    ))?;
    let orders = stmt
        .query_map(params![user_id, pattern], row_to_order)?
        .collect::<Result<Vec<_>, _>>()?;
    pick_one(reference, orders, |o| o.id.clone())?.ok_or_else(|| WorkpilotError::order_not_found(reference))
}

/// Unscoped lookup used by public tracking.
pub fn find_order_by_token(conn: &Connection, token: &str) -> Result<Option<Order>, WorkpilotError> {
    let order = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE token = ?1"),
            params![token],
            row_to_order,
        )
        .optional()?;
    Ok(order)
}

/// Persist a new status and stage position, refreshing `updated_at`.
pub fn update_progress(
    conn: &Connection,
    id: &str,
    status: OrderStatus,
    current_stage_id: Option<&str>,
) -> Result<(), WorkpilotError> {
    let changed = conn.execute(
        "UPDATE orders SET status = ?1, current_stage_id = ?2, updated_at = ?3 WHERE id = ?4",
        params![status.as_str(), current_stage_id, now_ms(), id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::order_not_found(id));
    }
    Ok(())
}

/// Order joined with its customer, task and stage sequence.
pub fn get_order_detail(conn: &Connection, user_id: &str, id: &str) -> Result<OrderDetail, WorkpilotError> {
    let order = get_order(conn, user_id, id)?;
    let customer = customer_repo::get_customer(conn, user_id, &order.customer_id)?;
    let task = task_repo::get_task(conn, user_id, &order.task_id)?;

    let position = order
        .current_stage_id
        .as_deref()
        .and_then(|stage_id| task.position_of(stage_id));
    let current_stage = position.map(|pos| StagePosition {
        id: task.stages[pos].id.clone(),
        name: task.stages[pos].name.clone(),
        order: pos,
    });
    let has_next_stage = transition::has_next_stage(order.status, position, task.stages.len());

    Ok(OrderDetail {
        customer: NamedRef { id: customer.id, name: customer.name },
        task: NamedRef { id: task.id, name: task.name },
        current_stage,
        stages: task.stages,
        has_next_stage,
        order,
    })
}

pub fn search_orders(
    conn: &Connection,
    user_id: &str,
    search: &OrderSearch,
) -> Result<Page<OrderSummary>, WorkpilotError> {
    let filter = "o.user_id = ?1
         AND (?2 IS NULL OR o.customer_id = ?2)
         AND (?3 IS NULL OR o.task_id = ?3)
         AND (?4 IS NULL OR o.current_stage_id = ?4)
         AND (?5 IS NULL OR o.status = ?5)";
    let status = search.status.map(|s| s.as_str());

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM orders o WHERE {filter}"),
        params![user_id, search.customer_id, search.task_id, search.current_stage_id, status],
        |row| row.get(0),
    )?;

    let page_size = search.page_size.max(1);
    let direction = if search.ascending { "ASC" } else { "DESC" };
    let sql = format!(
        "{SUMMARY_SELECT} WHERE {filter}
         ORDER BY {} {direction}, o.rowid {direction}
         LIMIT ?6 OFFSET ?7",
        search.sort.column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let content = stmt
        .query_map(
            params![
                user_id,
                search.customer_id,
                search.task_id,
                search.current_stage_id,
                status,
                page_size as i64,
                i64::try_from(search.page.saturating_mul(page_size)).unwrap_or(i64::MAX)
            ],
            row_to_summary,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(content, total as usize, search.page, page_size))
}

/// Every order of the user as a summary, newest first.
pub fn list_order_summaries(conn: &Connection, user_id: &str) -> Result<Vec<OrderSummary>, WorkpilotError> {
    let mut stmt = conn.prepare(&format!(
        "{SUMMARY_SELECT} WHERE o.user_id = ?1 ORDER BY o.created_at DESC, o.rowid DESC"
    ))?;
    let orders = stmt
        .query_map(params![user_id], row_to_summary)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(orders)
}

/// Number of CREATED/IN_PROGRESS orders positioned on `stage_id`.
pub fn count_open_orders_on_stage(conn: &Connection, stage_id: &str) -> Result<i64, WorkpilotError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM orders
         WHERE current_stage_id = ?1 AND status IN ('CREATED', 'IN_PROGRESS')",
        params![stage_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Open orders of `task_id` that `kept_stage_ids` would leave without a valid
/// position: those on a stage outside it, and IN_PROGRESS orders with no
/// stage once the sequence is non-empty.
pub fn open_orders_off_sequence(
    conn: &Connection,
    task_id: &str,
    kept_stage_ids: &[String],
) -> Result<Vec<(String, Option<String>)>, WorkpilotError> {
    let mut stmt = conn.prepare(
        "SELECT id, current_stage_id FROM orders
         WHERE task_id = ?1
           AND ((current_stage_id IS NOT NULL AND status IN ('CREATED', 'IN_PROGRESS'))
             OR (current_stage_id IS NULL AND status = 'IN_PROGRESS'))",
    )?;
    let rows = stmt
        .query_map(params![task_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows
        .into_iter()
        .filter(|(_, stage_id)| match stage_id {
            Some(stage_id) => !kept_stage_ids.contains(stage_id),
            None => !kept_stage_ids.is_empty(),
        })
        .collect())
}

pub fn count_orders_for_task(conn: &Connection, task_id: &str) -> Result<i64, WorkpilotError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE task_id = ?1",
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_orders_for_customer(conn: &Connection, customer_id: &str) -> Result<i64, WorkpilotError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM orders WHERE customer_id = ?1",
        params![customer_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

const SUMMARY_SELECT: &str = "SELECT o.id, o.customer_id, c.name, o.task_id, t.name, o.current_stage_id, s.name,
            o.status, o.created_at, o.updated_at, l.position,
            (SELECT COUNT(*) FROM task_stage_links x WHERE x.task_id = o.task_id)
     FROM orders o
     JOIN customers c ON c.id = o.customer_id
     JOIN tasks t ON t.id = o.task_id
     LEFT JOIN task_stages s ON s.id = o.current_stage_id
     LEFT JOIN task_stage_links l ON l.task_id = o.task_id AND l.stage_id = o.current_stage_id";

fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<OrderSummary> {
    let status = OrderStatus::from_str(&row.get::<_, String>(7)?).unwrap_or(OrderStatus::Created);
    let position: Option<i64> = row.get(10)?;
    let stage_count: i64 = row.get(11)?;
    Ok(OrderSummary {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        customer_name: row.get(2)?,
        task_id: row.get(3)?,
        task_name: row.get(4)?,
        current_stage_id: row.get(5)?,
        current_stage_name: row.get(6)?,
        status,
        has_next_stage: transition::has_next_stage(
            status,
            position.map(|p| p as usize),
            stage_count as usize,
        ),
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_order(row: &rusqlite::Row) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        customer_id: row.get(2)?,
        task_id: row.get(3)?,
        current_stage_id: row.get(4)?,
        status: OrderStatus::from_str(&row.get::<_, String>(5)?).unwrap_or(OrderStatus::Created),
        token: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
