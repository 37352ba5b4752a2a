use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Pending,
    InProgress,
    Completed,
    Deferred,
}

impl std::fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequirementStatus::Pending => write!(f, "pending"),
            RequirementStatus::InProgress => write!(f, "in_progress"),
            RequirementStatus::Completed => write!(f, "completed"),
            RequirementStatus::Deferred => write!(f, "deferred"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignCategory {
    Architecture,
    TechStack,
    Pattern,
    Library,
    Approach,
}

impl std::fmt::Display for DesignCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesignCategory::Architecture => write!(f, "architecture"),
            DesignCategory::TechStack => write!(f, "tech_stack"),
            DesignCategory::Pattern => write!(f, "pattern"),
            DesignCategory::Library => write!(f, "library"),
            DesignCategory::Approach => write!(f, "approach"),
        }
    }
}
