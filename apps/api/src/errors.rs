use thiserror::Error;

/// Errors raised by the orchestration core
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Agent {agent} is not idle (status: {status})")]
    AgentBusy { agent: String, status: String },

    #[error("No agents available for task assignment in project {project_id}")]
    NoAgentsAvailable { project_id: String },

    #[error("Stale context version: expected {expected}, current is {actual}")]
    StaleVersion { expected: u64, actual: u64 },

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Unknown conflict type: {0}")]
    UnknownConflictType(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Task {task_id} is not ready: {reason}")]
    TaskNotReady { task_id: String, reason: String },

    #[error("Conflict {0} already has a recorded resolution")]
    ConflictAlreadyResolved(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
