//! In-memory refinement of listings. Every clause must match; unset or
//! empty clauses match everything. Text matching ignores case.

use crate::models::{Customer, OrderStatus, OrderSummary, TaskStage};

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn clause_matches(value: Option<&str>, clause: Option<&str>) -> bool {
    match clause.map(str::trim).filter(|c| !c.is_empty()) {
        None => true,
        Some(needle) => contains_ci(value.unwrap_or(""), needle),
    }
}

pub fn filter_stages_by_name(stages: Vec<TaskStage>, name: Option<&str>) -> Vec<TaskStage> {
    stages
        .into_iter()
        .filter(|s| clause_matches(Some(&s.name), name))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderTab {
    #[default]
    All,
    /// CREATED or IN_PROGRESS.
    Active,
    /// COMPLETED or CANCELLED.
    Passive,
}

impl OrderTab {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "active" => Some(Self::Active),
            "passive" => Some(Self::Passive),
            _ => None,
        }
    }

    fn admits(&self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Active => !status.is_terminal(),
            Self::Passive => status.is_terminal(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Matches order id, customer name, task name, customer id or task id.
    pub query: Option<String>,
    pub statuses: Vec<OrderStatus>,
    pub customer_name: Option<String>,
    pub task_name: Option<String>,
    pub stage_name: Option<String>,
    pub tab: OrderTab,
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderSummary) -> bool {
        if !self.tab.admits(order.status) {
            return false;
        }
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let hit = [
                order.id.as_str(),
                order.customer_name.as_str(),
                order.task_name.as_str(),
                order.customer_id.as_str(),
                order.task_id.as_str(),
            ]
            .iter()
            .any(|field| contains_ci(field, query));
            if !hit {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&order.status) {
            return false;
        }
        clause_matches(Some(&order.customer_name), self.customer_name.as_deref())
            && clause_matches(Some(&order.task_name), self.task_name.as_deref())
            && clause_matches(order.current_stage_name.as_deref(), self.stage_name.as_deref())
    }

    pub fn apply(&self, orders: Vec<OrderSummary>) -> Vec<OrderSummary> {
        orders.into_iter().filter(|o| self.matches(o)).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Matches any of name, phone, email, address or note.
    pub q: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let hit = [
                Some(customer.name.as_str()),
                customer.phone.as_deref(),
                customer.email.as_deref(),
                customer.address.as_deref(),
                customer.note.as_deref(),
            ]
            .iter()
            .flatten()
            .any(|field| contains_ci(field, q));
            if !hit {
                return false;
            }
        }
        clause_matches(Some(&customer.name), self.name.as_deref())
            && clause_matches(customer.phone.as_deref(), self.phone.as_deref())
            && clause_matches(customer.email.as_deref(), self.email.as_deref())
    }

    pub fn apply(&self, customers: Vec<Customer>) -> Vec<Customer> {
        customers.into_iter().filter(|c| self.matches(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageStatus;

    fn stage(name: &str) -> TaskStage {
        TaskStage {
            id: name.to_uppercase(),
            user_id: "u".into(),
            name: name.into(),
            note: None,
            status: StageStatus::Active,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn summary(id: &str, customer: &str, task: &str, stage: Option<&str>, status: OrderStatus) -> OrderSummary {
        OrderSummary {
            id: id.into(),
            customer_id: format!("C-{id}"),
            customer_name: customer.into(),
            task_id: format!("T-{id}"),
            task_name: task.into(),
            current_stage_id: stage.map(|s| s.to_uppercase()),
            current_stage_name: stage.map(String::from),
            status,
            has_next_stage: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_stage_name_filter_is_case_insensitive() {
        let stages = vec![stage("Onay"), stage("Red"), stage("Kargo")];
        let hits = filter_stages_by_name(stages, Some("onay"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Onay");
    }

    #[test]
    fn test_empty_stage_filter_matches_all() {
        let stages = vec![stage("Onay"), stage("Red")];
        assert_eq!(filter_stages_by_name(stages.clone(), None).len(), 2);
        assert_eq!(filter_stages_by_name(stages, Some("  ")).len(), 2);
    }

    #[test]
    fn test_order_filter_clauses_are_anded() {
        let orders = vec![
            summary("1", "Ayşe", "Onboarding", Some("Review"), OrderStatus::InProgress),
            summary("2", "Ayşe", "Repair", Some("Review"), OrderStatus::InProgress),
            summary("3", "Mehmet", "Onboarding", Some("Review"), OrderStatus::InProgress),
        ];
        let filter = OrderFilter {
            customer_name: Some("ayşe".into()),
            task_name: Some("onboard".into()),
            ..Default::default()
        };
        let hits = filter.apply(orders);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn test_stage_clause_excludes_unstarted_orders() {
        let orders = vec![
            summary("1", "A", "T", None, OrderStatus::Created),
            summary("2", "A", "T", Some("Review"), OrderStatus::InProgress),
        ];
        let filter = OrderFilter { stage_name: Some("rev".into()), ..Default::default() };
        let hits = filter.apply(orders);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
    }

    #[test]
    fn test_tabs_split_terminal_orders() {
        let orders = vec![
            summary("1", "A", "T", None, OrderStatus::Created),
            summary("2", "A", "T", None, OrderStatus::Completed),
            summary("3", "A", "T", None, OrderStatus::Cancelled),
        ];
        let active = OrderFilter { tab: OrderTab::Active, ..Default::default() }.apply(orders.clone());
        let passive = OrderFilter { tab: OrderTab::Passive, ..Default::default() }.apply(orders);
        assert_eq!(active.len(), 1);
        assert_eq!(passive.len(), 2);
    }

    #[test]
    fn test_query_matches_any_identifier_field() {
        let orders = vec![
            summary("1", "Ali", "Repair", None, OrderStatus::Created),
            summary("2", "Veli", "Onboarding", None, OrderStatus::Created),
        ];
        let filter = OrderFilter { query: Some("T-2".into()), ..Default::default() };
        let hits = filter.apply(orders);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
    }

    #[test]
    fn test_status_set_filter() {
        let orders = vec![
            summary("1", "A", "T", None, OrderStatus::Created),
            summary("2", "A", "T", None, OrderStatus::Cancelled),
        ];
        let filter = OrderFilter { statuses: vec![OrderStatus::Cancelled], ..Default::default() };
        assert_eq!(filter.apply(orders)[0].id, "2");
    }

    #[test]
    fn test_customer_filter_q_and_fields() {
        let customer = Customer {
            id: "c1".into(),
            user_id: "u".into(),
            name: "Zeynep Kaya".into(),
            phone: Some("555-0100".into()),
            email: Some("zeynep@example.com".into()),
            address: Some("Izmir".into()),
            note: None,
            created_at: 0,
            updated_at: 0,
        };
        assert!(CustomerFilter { q: Some("izmir".into()), ..Default::default() }.matches(&customer));
        assert!(!CustomerFilter { q: Some("ankara".into()), ..Default::default() }.matches(&customer));
        assert!(!CustomerFilter {
            q: Some("zeynep".into()),
            phone: Some("999".into()),
            ..Default::default()
        }
        .matches(&customer));
    }
}
