use rusqlite::{params, Connection, OptionalExtension};

use crate::error::WorkpilotError;
use crate::models::{Customer, CustomerInput};

use super::{id_prefix_pattern, now_ms, pick_one};

const CUSTOMER_COLUMNS: &str = "id, user_id, name, phone, email, address, note, created_at, updated_at";

pub fn create_customer(
    conn: &Connection,
    id: &str,
    user_id: &str,
    input: &CustomerInput,
) -> Result<Customer, WorkpilotError> {
    let now = now_ms();
    conn.execute(
        "INSERT INTO customers (id, user_id, name, phone, email, address, note, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![id, user_id, input.name, input.phone, input.email, input.address, input.note, now],
    )?;
    get_customer(conn, user_id, id)
}

pub fn get_customer(conn: &Connection, user_id: &str, id: &str) -> Result<Customer, WorkpilotError> {
    find_customer(conn, user_id, id)?.ok_or_else(|| WorkpilotError::customer_not_found(id))
}

pub fn find_customer(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Customer>, WorkpilotError> {
    let customer = conn
        .query_row(
            &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1 AND user_id = ?2"),
            params![id, user_id],
            row_to_customer,
        )
        .optional()?;
    Ok(customer)
}

/// Resolve a customer reference: exact id → exact name (case-insensitive) → id prefix.
pub fn resolve_customer(conn: &Connection, user_id: &str, reference: &str) -> Result<Customer, WorkpilotError> {
    if let Some(customer) = find_customer(conn, user_id, reference)? {
        return Ok(customer);
    }

    let wanted = reference.trim().to_lowercase();
    let by_name: Vec<Customer> = list_customers(conn, user_id)?
        .into_iter()
        .filter(|c| c.name.to_lowercase() == wanted)
        .collect();
    if let Some(customer) = pick_one(reference, by_name, describe)? {
        return Ok(customer);
    }

    let Some(pattern) = id_prefix_pattern(reference) else {
        return Err(WorkpilotError::customer_not_found(reference));
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE user_id = ?1 AND id LIKE ?2"
    ))?;
    let by_prefix = stmt
        .query_map(params![user_id, pattern], row_to_customer)?
        .collect::<Result<Vec<_>, _>>()?;
    pick_one(reference, by_prefix, describe)?.ok_or_else(|| WorkpilotError::customer_not_found(reference))
}

pub fn list_customers(conn: &Connection, user_id: &str) -> Result<Vec<Customer>, WorkpilotError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers
         WHERE user_id = ?1 ORDER BY name COLLATE NOCASE ASC, created_at ASC"
    ))?;
    let customers = stmt
        .query_map(params![user_id], row_to_customer)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(customers)
}

pub fn update_customer(
    conn: &Connection,
    user_id: &str,
    id: &str,
    input: &CustomerInput,
) -> Result<Customer, WorkpilotError> {
    let changed = conn.execute(
        "UPDATE customers SET name = ?1, phone = ?2, email = ?3, address = ?4, note = ?5, updated_at = ?6
         WHERE id = ?7 AND user_id = ?8",
        params![input.name, input.phone, input.email, input.address, input.note, now_ms(), id, user_id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::customer_not_found(id));
    }
    get_customer(conn, user_id, id)
}

pub fn delete_customer(conn: &Connection, user_id: &str, id: &str) -> Result<(), WorkpilotError> {
    let changed = conn.execute(
        "DELETE FROM customers WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;
    if changed == 0 {
        return Err(WorkpilotError::customer_not_found(id));
    }
    Ok(())
}

fn describe(customer: &Customer) -> String {
    format!("{} ({})", customer.name, customer.id)
}

fn row_to_customer(row: &rusqlite::Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        note: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
