use serde_json::json;

use crate::cli::commands::CustomerCommands;
use crate::db::customer_repo;
use crate::engine::catalog;
use crate::error::WorkpilotError;
use crate::models::CustomerInput;
use crate::output;
use crate::query::filter::CustomerFilter;
use crate::query::page;

use super::{finish, Context};

pub fn run(cmd: CustomerCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        CustomerCommands::Add { name, phone, email, address, note } => {
            run_add(&CustomerInput { name, phone, email, address, note }, ctx)
        }
        CustomerCommands::List => run_list(ctx),
        CustomerCommands::Show { customer } => run_show(&customer, ctx),
        CustomerCommands::Update { customer, name, phone, email, address, note } => {
            let patch = CustomerPatch { name, phone, email, address, note };
            run_update(&customer, patch, ctx)
        }
        CustomerCommands::Delete { customer } => run_delete(&customer, ctx),
        CustomerCommands::Search { q, name, phone, email, page, size } => {
            run_search(CustomerFilter { q, name, phone, email }, page, size, ctx)
        }
    };
    finish(result, ctx.json)
}

/// Flags given to `customer update`; absent ones keep the stored value.
struct CustomerPatch {
    name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    note: Option<String>,
}

fn run_add(input: &CustomerInput, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let customer = catalog::create_customer(authed.conn(), &authed.user_id, input)?;
    ctx.emit(
        || json!({ "customer": output::json::customer_json(&customer) }),
        || println!("Added customer: {} ({})", customer.name, customer.id),
    );
    Ok(())
}

fn run_list(ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let customers = customer_repo::list_customers(authed.conn(), &authed.user_id)?;
    ctx.emit(
        || json!({ "customers": customers.iter().map(output::json::customer_json).collect::<Vec<_>>() }),
        || output::text::print_customer_list(&customers),
    );
    Ok(())
}

fn run_show(reference: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let customer = customer_repo::resolve_customer(authed.conn(), &authed.user_id, reference)?;
    ctx.emit(
        || json!({ "customer": output::json::customer_json(&customer) }),
        || output::text::print_customer(&customer),
    );
    Ok(())
}

fn run_update(reference: &str, patch: CustomerPatch, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let current = customer_repo::resolve_customer(authed.conn(), &authed.user_id, reference)?;
    let input = CustomerInput {
        name: patch.name.unwrap_or(current.name),
        phone: patch.phone.or(current.phone),
        email: patch.email.or(current.email),
        address: patch.address.or(current.address),
        note: patch.note.or(current.note),
    };
    let customer = catalog::update_customer(authed.conn(), &authed.user_id, &current.id, &input)?;
    ctx.emit(
        || json!({ "customer": output::json::customer_json(&customer) }),
        || println!("Updated customer: {} ({})", customer.name, customer.id),
    );
    Ok(())
}

fn run_delete(reference: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let customer = catalog::delete_customer(authed.conn(), &authed.user_id, reference)?;
    ctx.emit(
        || json!({ "deleted": { "id": customer.id, "name": customer.name } }),
        || println!("Deleted customer: {} ({})", customer.name, customer.id),
    );
    Ok(())
}

fn run_search(filter: CustomerFilter, number: usize, size: Option<usize>, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let customers = filter.apply(customer_repo::list_customers(authed.conn(), &authed.user_id)?);
    let result = page::paginate(customers, number, authed.page_size(size));
    ctx.emit(
        || json!({ "page": output::json::page_json(&result, output::json::customer_json) }),
        || output::text::print_customer_page(&result),
    );
    Ok(())
}
