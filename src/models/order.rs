use serde::{Deserialize, Serialize};

use super::TaskStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CREATED" => Some(Self::Created),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Stored order row. `has_next_stage` is never stored; see [`OrderDetail`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub customer_id: String,
    pub task_id: String,
    pub current_stage_id: Option<String>,
    pub status: OrderStatus,
    pub token: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// The current stage of an order together with its zero-based position.
#[derive(Debug, Clone, Serialize)]
pub struct StagePosition {
    pub id: String,
    pub name: String,
    pub order: usize,
}

/// Full projection of one order, re-read after every mutation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub customer: NamedRef,
    pub task: NamedRef,
    pub current_stage: Option<StagePosition>,
    pub stages: Vec<TaskStage>,
    pub has_next_stage: bool,
}

/// Denormalised row used by order listings.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub task_id: String,
    pub task_name: String,
    pub current_stage_id: Option<String>,
    pub current_stage_name: Option<String>,
    pub status: OrderStatus,
    pub has_next_stage: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Reduced view served to unauthenticated tracking lookups.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingView {
    pub company_name: String,
    pub owner_email: String,
    pub customer_name: String,
    pub task_name: String,
    pub stages: Vec<String>,
    pub current_stage: Option<String>,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}
