use serde::{Deserialize, Serialize};

/// Lifecycle status of a task
///
/// # Status Transitions
/// ```text
/// Pending -> InProgress -> Completed
///    |            \-----> Blocked -> Pending
///    \-------------------> Blocked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - Pending -> InProgress
    /// - Pending -> Blocked
    /// - InProgress -> Completed
    /// - InProgress -> Blocked
    /// - Blocked -> Pending
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Blocked)
                | (InProgress, Completed)
                | (InProgress, Blocked)
                | (Blocked, Pending)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// How hard a task is expected to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    Expert,
}

impl Complexity {
    /// Baseline estimate in minutes for work of this complexity
    pub fn baseline_minutes(&self) -> u32 {
        match self {
            Complexity::Simple => 60,
            Complexity::Moderate => 120,
            Complexity::Complex => 240,
            Complexity::Expert => 480,
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Simple => write!(f, "simple"),
            Complexity::Moderate => write!(f, "moderate"),
            Complexity::Complex => write!(f, "complex"),
            Complexity::Expert => write!(f, "expert"),
        }
    }
}
