use rusqlite::Connection;

use crate::db::{customer_repo, order_repo, task_repo, user_repo};
use crate::error::WorkpilotError;
use crate::models::TrackingView;

/// Look up an order by its tracking token without any session.
pub fn track(conn: &Connection, token: &str) -> Result<TrackingView, WorkpilotError> {
    let token = token.trim();
    let order = order_repo::find_order_by_token(conn, token)?
        .ok_or_else(|| WorkpilotError::order_not_found(token))?;

    let owner = user_repo::get_user(conn, &order.user_id)?;
    let customer = customer_repo::get_customer(conn, &order.user_id, &order.customer_id)?;
    let task = task_repo::get_task(conn, &order.user_id, &order.task_id)?;

    let current_stage = order
        .current_stage_id
        .as_deref()
        .and_then(|id| task.stages.iter().find(|s| s.id == id))
        .map(|s| s.name.clone());

    Ok(TrackingView {
        company_name: owner.company_name,
        owner_email: owner.email,
        customer_name: customer.name,
        task_name: task.name,
        stages: task.stages.into_iter().map(|s| s.name).collect(),
        current_stage,
        status: order.status,
        created_at: order.created_at,
        updated_at: order.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::engine::{catalog, orders, transition::OrderAction};
    use crate::error::ErrorCode;
    use crate::models::{CustomerInput, OrderStatus};

    #[test]
    fn test_track_reports_progress_without_owner_scope() {
        let conn = open_in_memory().unwrap();
        let user = user_repo::create_user(&conn, "U1", "ops@acme.io", "Ada", "L", "Acme Print", "x$y").unwrap();
        catalog::create_stage(&conn, &user.id, "Design", None).unwrap();
        catalog::create_stage(&conn, &user.id, "Print", None).unwrap();
        catalog::create_task(&conn, &user.id, "Poster", None, &["Design".to_string(), "Print".to_string()]).unwrap();
        catalog::create_customer(&conn, &user.id, &CustomerInput { name: "Zeynep".into(), ..Default::default() })
            .unwrap();
        let order = orders::create_order(&conn, &user.id, "Zeynep", "Poster").unwrap();

        let view = track(&conn, &order.order.token).unwrap();
        assert_eq!(view.status, OrderStatus::Created);
        assert_eq!(view.current_stage, None);
        assert_eq!(view.stages, ["Design", "Print"]);

        orders::transition(&conn, &user.id, &order.order.id, OrderAction::Start).unwrap();
        let view = track(&conn, &order.order.token).unwrap();
        assert_eq!(view.company_name, "Acme Print");
        assert_eq!(view.owner_email, "ops@acme.io");
        assert_eq!(view.customer_name, "Zeynep");
        assert_eq!(view.current_stage.as_deref(), Some("Design"));
    }

    #[test]
    fn test_unknown_token() {
        let conn = open_in_memory().unwrap();
        assert_eq!(track(&conn, "nope").unwrap_err().code, ErrorCode::OrderNotFound);
    }
}
