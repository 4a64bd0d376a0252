//! Stage catalog, workflow templates and customer records: the writes that
//! need more than one repository call or a cross-entity check.

use std::collections::HashSet;

use rusqlite::Connection;
use tracing::info;

use crate::db::{customer_repo, new_id, order_repo, stage_repo, task_repo, with_transaction};
use crate::error::WorkpilotError;
use crate::graph::chain::{self, Flow};
use crate::models::{Customer, CustomerInput, StageStatus, Task, TaskStage};
use crate::validation;

// ─── stages ────────────────────────────────────────────────────────

pub fn create_stage(
    conn: &Connection,
    user_id: &str,
    name: &str,
    note: Option<&str>,
) -> Result<TaskStage, WorkpilotError> {
    let name = validation::stage_name(name)?;
    let note = validation::note(note)?;
    stage_repo::create_stage(conn, &new_id(), user_id, &name, note.as_deref())
}

pub fn update_stage(
    conn: &Connection,
    user_id: &str,
    stage_ref: &str,
    name: Option<&str>,
    note: Option<&str>,
) -> Result<TaskStage, WorkpilotError> {
    let stage = stage_repo::resolve_stage(conn, user_id, stage_ref)?;
    let name = validation::stage_name(name.unwrap_or(&stage.name))?;
    let note = match note {
        Some(n) => validation::note(Some(n))?,
        None => stage.note.clone(),
    };
    stage_repo::update_stage(conn, user_id, &stage.id, &name, note.as_deref())
}

/// Mark a stage DELETED. Tasks and orders keep referencing it.
pub fn soft_delete_stage(conn: &Connection, user_id: &str, stage_ref: &str) -> Result<TaskStage, WorkpilotError> {
    let stage = stage_repo::resolve_stage(conn, user_id, stage_ref)?;
    let stage = stage_repo::update_stage_status(conn, user_id, &stage.id, StageStatus::Deleted)?;
    info!(stage_id = %stage.id, "stage soft-deleted");
    Ok(stage)
}

/// Remove a stage row for good.
///
/// The stage is cut out of every task sequence that contains it. Refused
/// while an open order sits on the stage; closed orders lose the reference.
pub fn hard_delete_stage(conn: &Connection, user_id: &str, stage_ref: &str) -> Result<TaskStage, WorkpilotError> {
    with_transaction(conn, |conn| {
        let stage = stage_repo::resolve_stage(conn, user_id, stage_ref)?;
        if order_repo::count_open_orders_on_stage(conn, &stage.id)? > 0 {
            return Err(WorkpilotError::stage_in_use(&stage.name));
        }

        let affected = task_repo::tasks_containing_stage(conn, &stage.id)?;
        for task_id in &affected {
            let remaining: Vec<String> = task_repo::stages_for_task(conn, task_id)?
                .into_iter()
                .map(|s| s.id)
                .filter(|id| id != &stage.id)
                .collect();
            task_repo::replace_stage_links(conn, task_id, &remaining)?;
        }

        stage_repo::delete_stage_row(conn, user_id, &stage.id)?;
        info!(stage_id = %stage.id, tasks_updated = affected.len(), "stage hard-deleted");
        Ok(stage)
    })
}

// ─── tasks ─────────────────────────────────────────────────────────

pub fn create_task(
    conn: &Connection,
    user_id: &str,
    name: &str,
    note: Option<&str>,
    stage_refs: &[String],
) -> Result<Task, WorkpilotError> {
    create_task_from_flow(conn, user_id, name, note, &Flow::chain(stage_refs.to_vec()))
}

/// Create a task whose stage order comes from a builder flow.
pub fn create_task_from_flow(
    conn: &Connection,
    user_id: &str,
    name: &str,
    note: Option<&str>,
    flow: &Flow,
) -> Result<Task, WorkpilotError> {
    let name = validation::task_name(name)?;
    let note = validation::note(note)?;
    let refs = chain::linearize(flow)?;

    with_transaction(conn, |conn| {
        let stage_ids = resolve_sequence(conn, user_id, &refs, &[])?;
        let task = task_repo::create_task(conn, &new_id(), user_id, &name, note.as_deref(), &stage_ids)?;
        info!(task_id = %task.id, stages = task.stages.len(), "task created");
        Ok(task)
    })
}

/// Rewrite a task. `None` keeps the current name, note or stage sequence.
pub fn update_task(
    conn: &Connection,
    user_id: &str,
    task_ref: &str,
    name: Option<&str>,
    note: Option<&str>,
    stage_refs: Option<&[String]>,
) -> Result<Task, WorkpilotError> {
    let flow = stage_refs.map(|refs| Flow::chain(refs.to_vec()));
    update_task_from_flow(conn, user_id, task_ref, name, note, flow.as_ref())
}

pub fn update_task_from_flow(
    conn: &Connection,
    user_id: &str,
    task_ref: &str,
    name: Option<&str>,
    note: Option<&str>,
    flow: Option<&Flow>,
) -> Result<Task, WorkpilotError> {
    let refs = flow.map(chain::linearize).transpose()?;

    with_transaction(conn, |conn| {
        let task = task_repo::resolve_task(conn, user_id, task_ref)?;
        let name = validation::task_name(name.unwrap_or(&task.name))?;
        let note = match note {
            Some(n) => validation::note(Some(n))?,
            None => task.note.clone(),
        };

        let existing = task.stage_ids();
        let stage_ids = match refs {
            Some(ref refs) => resolve_sequence(conn, user_id, refs, &existing)?,
            None => existing,
        };

        let stranded = order_repo::open_orders_off_sequence(conn, &task.id, &stage_ids)?;
        match stranded.first() {
            Some((_, Some(stage_id))) => {
                let stage = stage_repo::get_stage(conn, user_id, stage_id)?;
                return Err(WorkpilotError::stage_in_use(&stage.name));
            }
            Some((order_id, None)) => {
                return Err(WorkpilotError::validation(format!(
                    "Order {order_id} is in progress without a stage; cancel or revert it before adding stages"
                )));
            }
            None => {}
        }

        let updated = task_repo::update_task(conn, user_id, &task.id, &name, note.as_deref(), &stage_ids)?;
        info!(task_id = %updated.id, stages = updated.stages.len(), "task updated");
        Ok(updated)
    })
}

/// Delete a task that no order references.
pub fn delete_task(conn: &Connection, user_id: &str, task_ref: &str) -> Result<Task, WorkpilotError> {
    with_transaction(conn, |conn| {
        let task = task_repo::resolve_task(conn, user_id, task_ref)?;
        let orders = order_repo::count_orders_for_task(conn, &task.id)?;
        if orders > 0 {
            return Err(WorkpilotError::task_in_use(&task.name, orders));
        }
        task_repo::delete_task(conn, user_id, &task.id)?;
        info!(task_id = %task.id, "task deleted");
        Ok(task)
    })
}

/// Resolve stage references into ids, rejecting duplicates and newly added
/// DELETED stages. Stages already in `existing` may stay even if DELETED.
fn resolve_sequence(
    conn: &Connection,
    user_id: &str,
    refs: &[String],
    existing: &[String],
) -> Result<Vec<String>, WorkpilotError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(refs.len());
    for reference in refs {
        let stage = stage_repo::resolve_stage(conn, user_id, reference)?;
        if !stage.is_active() && !existing.contains(&stage.id) {
            return Err(WorkpilotError::validation(format!(
                "Stage '{}' is deleted and cannot be added to a task",
                stage.name
            )));
        }
        if !seen.insert(stage.id.clone()) {
            return Err(WorkpilotError::validation(format!(
                "Stage '{}' appears more than once in the task",
                stage.name
            )));
        }
        ids.push(stage.id);
    }
    Ok(ids)
}

// ─── customers ─────────────────────────────────────────────────────

pub fn create_customer(conn: &Connection, user_id: &str, input: &CustomerInput) -> Result<Customer, WorkpilotError> {
    let input = validation::customer(input)?;
    customer_repo::create_customer(conn, &new_id(), user_id, &input)
}

pub fn update_customer(
    conn: &Connection,
    user_id: &str,
    customer_ref: &str,
    input: &CustomerInput,
) -> Result<Customer, WorkpilotError> {
    let customer = customer_repo::resolve_customer(conn, user_id, customer_ref)?;
    let input = validation::customer(input)?;
    customer_repo::update_customer(conn, user_id, &customer.id, &input)
}

/// Delete a customer that no order references.
pub fn delete_customer(conn: &Connection, user_id: &str, customer_ref: &str) -> Result<Customer, WorkpilotError> {
    with_transaction(conn, |conn| {
        let customer = customer_repo::resolve_customer(conn, user_id, customer_ref)?;
        let orders = order_repo::count_orders_for_customer(conn, &customer.id)?;
        if orders > 0 {
            return Err(WorkpilotError::customer_in_use(&customer.name, orders));
        }
        customer_repo::delete_customer(conn, user_id, &customer.id)?;
        Ok(customer)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_in_memory, user_repo};
    use crate::engine::orders;
    use crate::engine::transition::OrderAction;
    use crate::error::ErrorCode;
    use crate::graph::chain::FlowEdge;

    fn setup() -> (Connection, String) {
        let conn = open_in_memory().unwrap();
        let user = user_repo::create_user(&conn, "U1", "owner@example.com", "Ada", "L", "Acme", "x$y")
            .unwrap()
            .id;
        (conn, user)
    }

    fn refs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_stage_validates_name() {
        let (conn, user) = setup();
        let err = create_stage(&conn, &user, "ab", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let stage = create_stage(&conn, &user, "Onay", Some("approval")).unwrap();
        assert_eq!(stage.status, StageStatus::Active);
    }

    #[test]
    fn test_soft_deleted_stage_hidden_but_still_referenced() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        create_stage(&conn, &user, "Beta", None).unwrap();
        let task = create_task(&conn, &user, "Flow", None, &refs(&["Alpha", "Beta"])).unwrap();

        soft_delete_stage(&conn, &user, "Alpha").unwrap();
        let listed = stage_repo::list_active_stages(&conn, &user).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Beta");

        let reread = task_repo::get_task(&conn, &user, &task.id).unwrap();
        assert_eq!(reread.stages.len(), 2);
        assert_eq!(reread.stages[0].status, StageStatus::Deleted);
    }

    #[test]
    fn test_deleted_stage_cannot_join_new_task() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        soft_delete_stage(&conn, &user, "Alpha").unwrap();
        let err = create_task(&conn, &user, "Flow", None, &refs(&["Alpha"])).unwrap_err();
        assert!(err.message.contains("deleted"));
    }

    #[test]
    fn test_update_may_keep_deleted_stage_already_present() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        create_stage(&conn, &user, "Beta", None).unwrap();
        create_task(&conn, &user, "Flow", None, &refs(&["Alpha"])).unwrap();
        soft_delete_stage(&conn, &user, "Alpha").unwrap();

        let updated = update_task(&conn, &user, "Flow", None, None, Some(&refs(&["Alpha", "Beta"]))).unwrap();
        assert_eq!(updated.stages.len(), 2);
    }

    #[test]
    fn test_duplicate_stage_in_task_rejected() {
        let (conn, user) = setup();
        let alpha = create_stage(&conn, &user, "Alpha", None).unwrap();
        let err = create_task(&conn, &user, "Flow", None, &refs(&["Alpha", alpha.id.as_str()])).unwrap_err();
        assert!(err.message.contains("more than once"));
    }

    #[test]
    fn test_task_from_flow_uses_edge_order() {
        let (conn, user) = setup();
        for n in ["Alpha", "Beta", "Gamma"] {
            create_stage(&conn, &user, n, None).unwrap();
        }
        let flow = Flow {
            nodes: refs(&["Gamma", "Alpha", "Beta"]),
            edges: vec![
                FlowEdge { source: "Alpha".into(), target: "Beta".into() },
                FlowEdge { source: "Beta".into(), target: "Gamma".into() },
            ],
        };
        let task = create_task_from_flow(&conn, &user, "Flow", None, &flow).unwrap();
        let names: Vec<_> = task.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_hard_delete_repacks_task_sequence() {
        let (conn, user) = setup();
        for n in ["Alpha", "Beta", "Gamma"] {
            create_stage(&conn, &user, n, None).unwrap();
        }
        let task = create_task(&conn, &user, "Flow", None, &refs(&["Alpha", "Beta", "Gamma"])).unwrap();
        hard_delete_stage(&conn, &user, "Beta").unwrap();

        let reread = task_repo::get_task(&conn, &user, &task.id).unwrap();
        let names: Vec<_> = reread.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Gamma"]);
        assert_eq!(
            stage_repo::resolve_stage(&conn, &user, "Beta").unwrap_err().code,
            ErrorCode::StageNotFound
        );
    }

    #[test]
    fn test_hard_delete_refused_under_open_order() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        create_task(&conn, &user, "Flow", None, &refs(&["Alpha"])).unwrap();
        create_customer(&conn, &user, &CustomerInput { name: "Zeynep".into(), ..Default::default() }).unwrap();
        let order = orders::create_order(&conn, &user, "Zeynep", "Flow").unwrap();
        orders::transition(&conn, &user, &order.order.id, OrderAction::Start).unwrap();

        let err = hard_delete_stage(&conn, &user, "Alpha").unwrap_err();
        assert_eq!(err.code, ErrorCode::StageInUse);
    }

    #[test]
    fn test_update_cannot_strand_open_order() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        create_stage(&conn, &user, "Beta", None).unwrap();
        create_task(&conn, &user, "Flow", None, &refs(&["Alpha", "Beta"])).unwrap();
        create_customer(&conn, &user, &CustomerInput { name: "Zeynep".into(), ..Default::default() }).unwrap();
        let order = orders::create_order(&conn, &user, "Zeynep", "Flow").unwrap();
        orders::transition(&conn, &user, &order.order.id, OrderAction::Start).unwrap();

        let err = update_task(&conn, &user, "Flow", None, None, Some(&refs(&["Beta"]))).unwrap_err();
        assert_eq!(err.code, ErrorCode::StageInUse);
        let ok = update_task(&conn, &user, "Flow", Some("Renamed"), None, Some(&refs(&["Alpha"]))).unwrap();
        assert_eq!(ok.name, "Renamed");
    }

    #[test]
    fn test_stages_cannot_be_added_under_stageless_order() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        create_stage(&conn, &user, "Beta", None).unwrap();
        create_task(&conn, &user, "Flow", None, &[]).unwrap();
        create_customer(&conn, &user, &CustomerInput { name: "Zeynep".into(), ..Default::default() }).unwrap();
        let order = orders::create_order(&conn, &user, "Zeynep", "Flow").unwrap();
        orders::transition(&conn, &user, &order.order.id, OrderAction::Start).unwrap();

        let err = update_task(&conn, &user, "Flow", None, None, Some(&refs(&["Alpha", "Beta"]))).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains(&order.order.id));
        assert!(task_repo::resolve_task(&conn, &user, "Flow").unwrap().stages.is_empty());

        // Renaming keeps the empty sequence and is still allowed.
        update_task(&conn, &user, "Flow", Some("Renamed"), None, None).unwrap();

        orders::transition(&conn, &user, &order.order.id, OrderAction::Revert).unwrap();
        let task = update_task(&conn, &user, "Renamed", None, None, Some(&refs(&["Alpha", "Beta"]))).unwrap();
        assert_eq!(task.stages.len(), 2);
        let started = orders::transition(&conn, &user, &order.order.id, OrderAction::Start).unwrap();
        assert_eq!(started.current_stage.unwrap().name, "Alpha");
        assert!(started.has_next_stage);
    }

    #[test]
    fn test_stages_may_be_added_under_created_order() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        create_task(&conn, &user, "Flow", None, &[]).unwrap();
        create_customer(&conn, &user, &CustomerInput { name: "Zeynep".into(), ..Default::default() }).unwrap();
        orders::create_order(&conn, &user, "Zeynep", "Flow").unwrap();

        let task = update_task(&conn, &user, "Flow", None, None, Some(&refs(&["Alpha"]))).unwrap();
        assert_eq!(task.stages.len(), 1);
    }

    #[test]
    fn test_punctuation_reference_matches_nothing() {
        let (conn, user) = setup();
        create_stage(&conn, &user, "Alpha", None).unwrap();
        create_task(&conn, &user, "Flow", None, &refs(&["Alpha"])).unwrap();
        create_customer(&conn, &user, &CustomerInput { name: "Zeynep".into(), ..Default::default() }).unwrap();

        for reference in ["-", "?", "."] {
            assert_eq!(hard_delete_stage(&conn, &user, reference).unwrap_err().code, ErrorCode::StageNotFound);
            assert_eq!(delete_task(&conn, &user, reference).unwrap_err().code, ErrorCode::TaskNotFound);
            assert_eq!(delete_customer(&conn, &user, reference).unwrap_err().code, ErrorCode::CustomerNotFound);
        }
        assert!(stage_repo::resolve_stage(&conn, &user, "Alpha").is_ok());
    }

    #[test]
    fn test_delete_task_restricted_by_orders() {
        let (conn, user) = setup();
        create_task(&conn, &user, "Flow", None, &[]).unwrap();
        create_customer(&conn, &user, &CustomerInput { name: "Zeynep".into(), ..Default::default() }).unwrap();
        orders::create_order(&conn, &user, "Zeynep", "Flow").unwrap();

        assert_eq!(delete_task(&conn, &user, "Flow").unwrap_err().code, ErrorCode::TaskInUse);
        assert_eq!(delete_customer(&conn, &user, "Zeynep").unwrap_err().code, ErrorCode::CustomerInUse);
    }

    #[test]
    fn test_zero_stage_task_allowed() {
        let (conn, user) = setup();
        let task = create_task(&conn, &user, "Instant", Some("no steps"), &[]).unwrap();
        assert!(task.stages.is_empty());
        assert_eq!(task.note.as_deref(), Some("no steps"));
    }
}
