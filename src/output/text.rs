use chrono::{TimeZone, Utc};

use crate::models::{
    Customer, DashboardSummary, OrderDetail, OrderSummary, Task, TaskStage, TrackingView, User,
};
use crate::query::page::Page;

fn ts(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_else(|| ms.to_string())
}

fn short(id: &str) -> &str {
    &id[..std::cmp::min(8, id.len())]
}

pub fn print_user(u: &User) {
    println!("User: {} {} <{}> ({})", u.first_name, u.last_name, u.email, u.id);
    println!("  Company: {}", u.company_name);
    if let Some(ref phone) = u.phone {
        println!("  Phone: {phone}");
    }
    if let Some(ref address) = u.address {
        println!("  Address: {address}");
    }
    println!("  Created: {}", ts(u.created_at));
}

pub fn print_stage(s: &TaskStage) {
    println!("Stage: {} ({})", s.name, s.id);
    if let Some(ref note) = s.note {
        println!("  Note: {note}");
    }
    println!("  Status: {}", s.status.as_str());
    println!("  Updated: {}", ts(s.updated_at));
}

pub fn print_stage_list(stages: &[TaskStage]) {
    if stages.is_empty() {
        println!("No stages found.");
        return;
    }
    for s in stages {
        println!("  {} ({}){}", s.name, short(&s.id), s.note.as_deref().map(|n| format!(" - {n}")).unwrap_or_default());
    }
}

pub fn print_task(t: &Task) {
    println!("Task: {} ({})", t.name, t.id);
    if let Some(ref note) = t.note {
        println!("  Note: {note}");
    }
    if t.stages.is_empty() {
        println!("  Stages: (none)");
    }
    for (i, s) in t.stages.iter().enumerate() {
        let flag = if s.is_active() { "" } else { " [DELETED]" };
        println!("  {}. {}{flag}", i + 1, s.name);
    }
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        let names: Vec<&str> = t.stages.iter().map(|s| s.name.as_str()).collect();
        println!("  {} ({}) {}", t.name, short(&t.id), names.join(" → "));
    }
}

pub fn print_customer(c: &Customer) {
    println!("Customer: {} ({})", c.name, c.id);
    for (label, value) in [("Phone", &c.phone), ("Email", &c.email), ("Address", &c.address), ("Note", &c.note)] {
        if let Some(v) = value {
            println!("  {label}: {v}");
        }
    }
}

pub fn print_customer_list(customers: &[Customer]) {
    if customers.is_empty() {
        println!("No customers found.");
        return;
    }
    for c in customers {
        println!("  {} ({}) {}", c.name, short(&c.id), c.phone.as_deref().unwrap_or(""));
    }
}

pub fn print_customer_page(page: &Page<Customer>) {
    print_customer_list(&page.content);
    print_page_footer(page);
}

pub fn print_order(d: &OrderDetail) {
    println!("Order: {}", d.order.id);
    println!("  Customer: {}", d.customer.name);
    println!("  Task: {}", d.task.name);
    println!("  Status: {}", d.order.status.as_str());
    match d.current_stage {
        Some(ref s) => println!("  Stage: {} ({}/{})", s.name, s.order + 1, d.stages.len()),
        None => println!("  Stage: -"),
    }
    println!("  Next stage available: {}", if d.has_next_stage { "yes" } else { "no" });
    println!("  Tracking token: {}", d.order.token);
    println!("  Created: {}", ts(d.order.created_at));
    println!("  Updated: {}", ts(d.order.updated_at));
}

pub fn print_order_page(page: &Page<OrderSummary>) {
    if page.content.is_empty() {
        println!("No orders found.");
    }
    for o in &page.content {
        println!(
            "  [{}] {} {} / {} @ {}",
            o.status.as_str(),
            short(&o.id),
            o.customer_name,
            o.task_name,
            o.current_stage_name.as_deref().unwrap_or("-")
        );
    }
    print_page_footer(page);
}

fn print_page_footer<T>(page: &Page<T>) {
    println!(
        "Page {}/{} ({} total)",
        page.number + 1,
        page.total_pages,
        page.total_elements
    );
}

pub fn print_tracking(t: &TrackingView) {
    println!("{} <{}>", t.company_name, t.owner_email);
    println!("  Customer: {}", t.customer_name);
    println!("  Task: {}", t.task_name);
    println!("  Status: {}", t.status.as_str());
    for s in &t.stages {
        let marker = if t.current_stage.as_deref() == Some(s.as_str()) { "→" } else { " " };
        println!("  {marker} {s}");
    }
    println!("  Updated: {}", ts(t.updated_at));
}

pub fn print_dashboard(d: &DashboardSummary) {
    println!("Customers: {}", d.customers);
    println!("Tasks: {}", d.tasks);
    println!("Active stages: {}", d.active_stages);
    println!(
        "Orders: active={} completed={} cancelled={}",
        d.active_orders, d.completed_orders, d.cancelled_orders
    );
}
