use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::{customer_repo, new_id, order_repo, task_repo, with_transaction};
use crate::error::WorkpilotError;
use crate::models::OrderDetail;

use super::transition::{self, OrderAction, Progress};

/// Bind a customer to a task as a new CREATED order.
pub fn create_order(
    conn: &Connection,
    user_id: &str,
    customer_ref: &str,
    task_ref: &str,
) -> Result<OrderDetail, WorkpilotError> {
    let customer = customer_repo::resolve_customer(conn, user_id, customer_ref)?;
    let task = task_repo::resolve_task(conn, user_id, task_ref)?;

    let id = new_id();
    let token = tracking_token();
    order_repo::create_order(conn, &id, user_id, &customer.id, &task.id, &token)?;
    info!(order_id = %id, customer_id = %customer.id, task_id = %task.id, "order created");
    order_repo::get_order_detail(conn, user_id, &id)
}

/// Apply one state-machine action atomically and return the re-read order.
///
/// Read, validate and write happen under one `BEGIN IMMEDIATE` lock, so
/// concurrent transitions on the same order serialise and the second one is
/// validated against the first one's result.
pub fn transition(
    conn: &Connection,
    user_id: &str,
    order_ref: &str,
    action: OrderAction,
) -> Result<OrderDetail, WorkpilotError> {
    with_transaction(conn, |conn| {
        let order = order_repo::resolve_order(conn, user_id, order_ref)?;
        let stages: Vec<String> = task_repo::stages_for_task(conn, &order.task_id)?
            .into_iter()
            .map(|s| s.id)
            .collect();

        let current = Progress {
            status: order.status,
            current_stage: order.current_stage_id.clone(),
        };
        let next = transition::apply(&current, &stages, action).inspect_err(|e| {
            debug!(order_id = %order.id, action = action.as_str(), code = e.code.as_str(), "transition refused");
        })?;

        order_repo::update_progress(conn, &order.id, next.status, next.current_stage.as_deref())?;
        info!(
            order_id = %order.id,
            action = action.as_str(),
            from = current.status.as_str(),
            to = next.status.as_str(),
            stage = next.current_stage.as_deref().unwrap_or("-"),
            "order transition applied"
        );
        order_repo::get_order_detail(conn, user_id, &order.id)
    })
}

fn tracking_token() -> String {
    format!("{}{}", ulid::Ulid::new(), ulid::Ulid::new()).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, stage_repo, user_repo};
    use crate::error::ErrorCode;
    use crate::models::{CustomerInput, OrderStatus};

    struct Fixture {
        conn: Connection,
        user: String,
    }

    fn fixture() -> Fixture {
        let conn = open_in_memory().unwrap();
        let user = user_repo::create_user(&conn, "U1", "owner@example.com", "Ada", "Lovelace", "Acme", "x$y")
            .unwrap()
            .id;
        customer_repo::create_customer(
            &conn,
            "C1",
            &user,
            &CustomerInput { name: "Zeynep".into(), ..Default::default() },
        )
        .unwrap();
        Fixture { conn, user }
    }

    fn task_with(f: &Fixture, task_id: &str, names: &[&str]) -> Vec<String> {
        let ids: Vec<String> = names
            .iter()
            .map(|n| {
                let id = format!("{task_id}-{n}");
                stage_repo::create_stage(&f.conn, &id, &f.user, n, None).unwrap();
                id
            })
            .collect();
        task_repo::create_task(&f.conn, task_id, &f.user, task_id, None, &ids).unwrap();
        ids
    }

    #[test]
    fn test_full_lifecycle_persists_each_step() {
        let f = fixture();
        let ids = task_with(&f, "T1", &["Aaa", "Bbb", "Ccc"]);
        let order = create_order(&f.conn, &f.user, "C1", "T1").unwrap();
        assert_eq!(order.order.status, OrderStatus::Created);
        assert!(order.current_stage.is_none());
        assert!(!order.has_next_stage);

        let started = transition(&f.conn, &f.user, &order.order.id, OrderAction::Start).unwrap();
        assert_eq!(started.order.current_stage_id.as_deref(), Some(ids[0].as_str()));
        assert!(started.has_next_stage);
        assert_eq!(started.current_stage.as_ref().unwrap().order, 0);

        transition(&f.conn, &f.user, &order.order.id, OrderAction::NextStage).unwrap();
        let at_last = transition(&f.conn, &f.user, &order.order.id, OrderAction::NextStage).unwrap();
        assert_eq!(at_last.current_stage.as_ref().unwrap().name, "Ccc");
        assert!(!at_last.has_next_stage);

        let done = transition(&f.conn, &f.user, &order.order.id, OrderAction::Complete).unwrap();
        assert_eq!(done.order.status, OrderStatus::Completed);
        assert_eq!(done.order.created_at, order.order.created_at);
        assert!(done.order.updated_at >= order.order.updated_at);
    }

    #[test]
    fn test_refused_transition_leaves_row_unchanged() {
        let f = fixture();
        task_with(&f, "T1", &["Aaa", "Bbb"]);
        let order = create_order(&f.conn, &f.user, "C1", "T1").unwrap();
        transition(&f.conn, &f.user, &order.order.id, OrderAction::Start).unwrap();
        let cancelled = transition(&f.conn, &f.user, &order.order.id, OrderAction::Cancel).unwrap();

        let err = transition(&f.conn, &f.user, &order.order.id, OrderAction::NextStage).unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyTerminal);

        let reread = order_repo::get_order(&f.conn, &f.user, &order.order.id).unwrap();
        assert_eq!(reread.status, OrderStatus::Cancelled);
        assert_eq!(reread.current_stage_id, cancelled.order.current_stage_id);
        assert_eq!(reread.updated_at, cancelled.order.updated_at);
    }

    #[test]
    fn test_orders_are_scoped_to_their_owner() {
        let f = fixture();
        task_with(&f, "T1", &["Aaa"]);
        let order = create_order(&f.conn, &f.user, "C1", "T1").unwrap();
        let other = user_repo::create_user(&f.conn, "U2", "other@example.com", "B", "C", "Other", "x$y").unwrap();

        let err = transition(&f.conn, &other.id, &order.order.id, OrderAction::Start).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[test]
    fn test_create_order_requires_known_customer() {
        let f = fixture();
        task_with(&f, "T1", &["Aaa"]);
        let err = create_order(&f.conn, &f.user, "nobody", "T1").unwrap_err();
        assert_eq!(err.code, ErrorCode::CustomerNotFound);
    }

    #[test]
    fn test_tracking_tokens_are_unique() {
        let f = fixture();
        task_with(&f, "T1", &[]);
        let a = create_order(&f.conn, &f.user, "C1", "T1").unwrap();
        let b = create_order(&f.conn, &f.user, "C1", "T1").unwrap();
        assert_ne!(a.order.token, b.order.token);
    }
}
