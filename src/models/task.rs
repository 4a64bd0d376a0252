use serde::{Deserialize, Serialize};

use super::TaskStage;

pub const TASK_NAME_MAX_LENGTH: usize = 100;

/// A workflow template: a named, strictly linear sequence of stages.
///
/// Position in `stages` is the only source of next/previous semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub note: Option<String>,
    pub stages: Vec<TaskStage>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn stage_ids(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.id.clone()).collect()
    }

    pub fn position_of(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == stage_id)
    }
}
