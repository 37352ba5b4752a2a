use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentName;

/// How a task execution ended
///
/// Execution never surfaces as an error; failures become `Blocked`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed {
        task_id: Uuid,
        agent: AgentName,
        content: String,
        tokens_used: u64,
        cost: Decimal,
    },
    Blocked {
        task_id: Uuid,
        agent: AgentName,
        reason: String,
    },
}

impl TaskOutcome {
    pub fn task_id(&self) -> Uuid {
        match self {
            TaskOutcome::Completed { task_id, .. } | TaskOutcome::Blocked { task_id, .. } => *task_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. })
    }
}
