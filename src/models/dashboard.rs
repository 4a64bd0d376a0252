use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub customers: i64,
    pub tasks: i64,
    pub active_stages: i64,
    pub active_orders: i64,
    pub completed_orders: i64,
    pub cancelled_orders: i64,
}
