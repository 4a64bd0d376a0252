use serde_json::{json, Value};

use crate::error::WorkpilotError;
use crate::models::{
    Customer, DashboardSummary, OrderDetail, OrderSummary, Task, TaskStage, TrackingView, User,
};
use crate::query::page::Page;
use crate::session::Session;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &WorkpilotError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn page_json<T>(page: &Page<T>, item: impl Fn(&T) -> Value) -> Value {
    json!({
        "content": page.content.iter().map(item).collect::<Vec<_>>(),
        "total_elements": page.total_elements,
        "total_pages": page.total_pages,
        "size": page.size,
        "number": page.number,
        "first": page.first,
        "last": page.last
    })
}

pub fn user_json(u: &User) -> Value {
    json!({
        "id": u.id,
        "email": u.email,
        "first_name": u.first_name,
        "last_name": u.last_name,
        "company_name": u.company_name,
        "phone": u.phone,
        "address": u.address,
        "created_at": u.created_at,
        "updated_at": u.updated_at
    })
}

pub fn session_json(s: &Session) -> Value {
    json!({
        "access_token": s.access_token(),
        "refresh_token": s.refresh_token()
    })
}

pub fn stage_json(s: &TaskStage) -> Value {
    json!({
        "id": s.id,
        "name": s.name,
        "note": s.note,
        "status": s.status.as_str(),
        "created_at": s.created_at,
        "updated_at": s.updated_at
    })
}

pub fn task_json(t: &Task) -> Value {
    json!({
        "id": t.id,
        "name": t.name,
        "note": t.note,
        "stages": t.stages.iter().map(stage_json).collect::<Vec<_>>(),
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

pub fn customer_json(c: &Customer) -> Value {
    json!({
        "id": c.id,
        "name": c.name,
        "phone": c.phone,
        "email": c.email,
        "address": c.address,
        "note": c.note,
        "created_at": c.created_at,
        "updated_at": c.updated_at
    })
}

pub fn order_detail_json(d: &OrderDetail) -> Value {
    let current_stage = d.current_stage.as_ref().map(|s| {
        json!({
            "id": s.id,
            "name": s.name,
            "order": s.order
        })
    });
    json!({
        "id": d.order.id,
        "status": d.order.status.as_str(),
        "customer": { "id": d.customer.id, "name": d.customer.name },
        "task": { "id": d.task.id, "name": d.task.name },
        "current_stage": current_stage,
        "stages": d.stages.iter().map(stage_json).collect::<Vec<_>>(),
        "has_next_stage": d.has_next_stage,
        "token": d.order.token,
        "created_at": d.order.created_at,
        "updated_at": d.order.updated_at
    })
}

pub fn order_summary_json(o: &OrderSummary) -> Value {
    json!({
        "id": o.id,
        "status": o.status.as_str(),
        "customer_id": o.customer_id,
        "customer_name": o.customer_name,
        "task_id": o.task_id,
        "task_name": o.task_name,
        "current_stage_id": o.current_stage_id,
        "current_stage_name": o.current_stage_name,
        "has_next_stage": o.has_next_stage,
        "created_at": o.created_at,
        "updated_at": o.updated_at
    })
}

pub fn tracking_json(t: &TrackingView) -> Value {
    json!({
        "company_name": t.company_name,
        "owner_email": t.owner_email,
        "customer_name": t.customer_name,
        "task_name": t.task_name,
        "stages": t.stages,
        "current_stage": t.current_stage,
        "status": t.status.as_str(),
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

pub fn dashboard_json(d: &DashboardSummary) -> Value {
    json!({
        "customers": d.customers,
        "tasks": d.tasks,
        "active_stages": d.active_stages,
        "active_orders": d.active_orders,
        "completed_orders": d.completed_orders,
        "cancelled_orders": d.cancelled_orders
    })
}
