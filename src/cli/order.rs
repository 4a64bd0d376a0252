use serde_json::json;

use crate::cli::commands::OrderCommands;
use crate::db::order_repo::{self, OrderSearch, OrderSort};
use crate::db::{customer_repo, stage_repo, task_repo};
use crate::engine::orders;
use crate::engine::transition::OrderAction;
use crate::error::WorkpilotError;
use crate::models::{OrderDetail, OrderStatus};
use crate::output;
use crate::query::filter::{OrderFilter, OrderTab};
use crate::query::page;

use super::{finish, Authorized, Context};

pub fn run(cmd: OrderCommands, ctx: &Context) -> i32 {
    let result = match cmd {
        OrderCommands::Create { customer, task } => run_create(&customer, &task, ctx),
        OrderCommands::Show { order } => run_show(&order, ctx),
        OrderCommands::Search { customer, task, stage, status, page, size, sort, asc } => {
            let refs = SearchRefs { customer, task, stage, status };
            run_search(refs, page, size, &sort, asc, ctx)
        }
        OrderCommands::List { query, status, customer_name, task_name, stage_name, tab, page, size } => {
            build_filter(query, &status, customer_name, task_name, stage_name, &tab)
                .and_then(|filter| run_list(filter, page, size, ctx))
        }
        OrderCommands::Start { order } => run_transition(&order, OrderAction::Start, ctx),
        OrderCommands::Next { order } => run_transition(&order, OrderAction::NextStage, ctx),
        OrderCommands::Prev { order } => run_transition(&order, OrderAction::PreviousStage, ctx),
        OrderCommands::Complete { order } => run_transition(&order, OrderAction::Complete, ctx),
        OrderCommands::Cancel { order } => run_transition(&order, OrderAction::Cancel, ctx),
        OrderCommands::Revert { order } => run_transition(&order, OrderAction::Revert, ctx),
    };
    finish(result, ctx.json)
}

struct SearchRefs {
    customer: Option<String>,
    task: Option<String>,
    stage: Option<String>,
    status: Option<String>,
}

fn parse_status(s: &str) -> Result<OrderStatus, WorkpilotError> {
    OrderStatus::from_str(s).ok_or_else(|| {
        WorkpilotError::validation(format!(
            "Unknown order status '{s}'. Expected CREATED, IN_PROGRESS, COMPLETED or CANCELLED"
        ))
    })
}

fn build_filter(
    query: Option<String>,
    statuses: &[String],
    customer_name: Option<String>,
    task_name: Option<String>,
    stage_name: Option<String>,
    tab: &str,
) -> Result<OrderFilter, WorkpilotError> {
    let tab = OrderTab::from_str(tab)
        .ok_or_else(|| WorkpilotError::validation(format!("Unknown tab '{tab}'. Expected all, active or passive")))?;
    Ok(OrderFilter {
        query,
        statuses: statuses.iter().map(|s| parse_status(s)).collect::<Result<_, _>>()?,
        customer_name,
        task_name,
        stage_name,
        tab,
    })
}

fn emit_detail(detail: &OrderDetail, ctx: &Context, headline: impl FnOnce()) {
    ctx.emit(
        || json!({ "order": output::json::order_detail_json(detail) }),
        || {
            headline();
            output::text::print_order(detail);
        },
    );
}

fn run_create(customer: &str, task: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let detail = orders::create_order(authed.conn(), &authed.user_id, customer, task)?;
    emit_detail(&detail, ctx, || println!("Created order {}", detail.order.id));
    Ok(())
}

fn run_show(reference: &str, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let order = order_repo::resolve_order(authed.conn(), &authed.user_id, reference)?;
    let detail = order_repo::get_order_detail(authed.conn(), &authed.user_id, &order.id)?;
    emit_detail(&detail, ctx, || {});
    Ok(())
}

fn run_transition(reference: &str, action: OrderAction, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let detail = orders::transition(authed.conn(), &authed.user_id, reference, action)?;
    emit_detail(&detail, ctx, || println!("Applied {} to order {}", action.as_str(), detail.order.id));
    Ok(())
}

fn resolve_search(authed: &Authorized, refs: SearchRefs) -> Result<OrderSearch, WorkpilotError> {
    let conn = authed.conn();
    let user_id = authed.user_id.as_str();
    Ok(OrderSearch {
        customer_id: refs
            .customer
            .map(|r| customer_repo::resolve_customer(conn, user_id, &r).map(|c| c.id))
            .transpose()?,
        task_id: refs
            .task
            .map(|r| task_repo::resolve_task(conn, user_id, &r).map(|t| t.id))
            .transpose()?,
        current_stage_id: refs
            .stage
            .map(|r| stage_repo::resolve_stage(conn, user_id, &r).map(|s| s.id))
            .transpose()?,
        status: refs.status.as_deref().map(parse_status).transpose()?,
        ..OrderSearch::default()
    })
}

fn run_search(
    refs: SearchRefs,
    number: usize,
    size: Option<usize>,
    sort: &str,
    ascending: bool,
    ctx: &Context,
) -> Result<(), WorkpilotError> {
    let sort = OrderSort::from_str(sort)
        .ok_or_else(|| WorkpilotError::validation(format!("Unknown sort '{sort}'. Expected created, updated or status")))?;
    let authed = ctx.authorize()?;
    let search = OrderSearch {
        page: number,
        page_size: authed.page_size(size),
        sort,
        ascending,
        ..resolve_search(&authed, refs)?
    };
    let result = order_repo::search_orders(authed.conn(), &authed.user_id, &search)?;
    ctx.emit(
        || json!({ "page": output::json::page_json(&result, output::json::order_summary_json) }),
        || output::text::print_order_page(&result),
    );
    Ok(())
}

fn run_list(filter: OrderFilter, number: usize, size: Option<usize>, ctx: &Context) -> Result<(), WorkpilotError> {
    let authed = ctx.authorize()?;
    let orders = filter.apply(order_repo::list_order_summaries(authed.conn(), &authed.user_id)?);
    let result = page::paginate(orders, number, authed.page_size(size));
    ctx.emit(
        || json!({ "page": output::json::page_json(&result, output::json::order_summary_json) }),
        || output::text::print_order_page(&result),
    );
    Ok(())
}
