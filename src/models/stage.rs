use serde::{Deserialize, Serialize};

pub const STAGE_NAME_MIN_LENGTH: usize = 3;
pub const STAGE_NAME_MAX_LENGTH: usize = 50;
pub const NOTE_MAX_LENGTH: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Active,
    Deleted,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Deleted => "DELETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "DELETED" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// A reusable, user-scoped step that tasks arrange into a sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStage {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub note: Option<String>,
    pub status: StageStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskStage {
    pub fn is_active(&self) -> bool {
        self.status == StageStatus::Active
    }
}
