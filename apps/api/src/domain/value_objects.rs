use serde::{Deserialize, Serialize};

/// Shared four-level ranking used for task priority, requirement priority,
/// blocker severity and conflict severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Whether an unattended polling cycle may resolve something of this
    /// severity without an explicit decision
    pub fn allows_unattended_resolution(&self) -> bool {
        matches!(self, Priority::Medium | Priority::Low)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}
