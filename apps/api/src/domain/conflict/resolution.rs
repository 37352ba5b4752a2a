use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    AutoMerge,
    ManualIntervention,
    AgentConsensus,
    UserDecision,
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionStrategy::AutoMerge => write!(f, "auto_merge"),
            ResolutionStrategy::ManualIntervention => write!(f, "manual_intervention"),
            ResolutionStrategy::AgentConsensus => write!(f, "agent_consensus"),
            ResolutionStrategy::UserDecision => write!(f, "user_decision"),
        }
    }
}

/// Recorded outcome of handling a conflict
///
/// Once attached to a conflict it is never replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub strategy: ResolutionStrategy,
    pub resolved_content: Option<String>,
    #[serde(default)]
    pub requires_user_input: bool,
    pub resolution_notes: Option<String>,
    pub applied_by: String,
    pub timestamp: DateTime<Utc>,
}

impl Resolution {
    pub fn new(strategy: ResolutionStrategy, applied_by: impl Into<String>) -> Self {
        Self {
            strategy,
            resolved_content: None,
            requires_user_input: false,
            resolution_notes: None,
            applied_by: applied_by.into(),
            timestamp: Utc::now(),
        }
    }

    /// Escalation that hands the decision to a human
    pub fn manual(applied_by: impl Into<String>, notes: impl Into<String>) -> Self {
        Self::new(ResolutionStrategy::ManualIntervention, applied_by)
            .requiring_user_input()
            .with_notes(notes)
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.resolved_content = Some(content.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.resolution_notes = Some(notes.into());
        self
    }

    pub fn requiring_user_input(mut self) -> Self {
        self.requires_user_input = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_resolution_requires_user_input() {
        let resolution = Resolution::manual("runtime", "overlapping edits");

        assert_eq!(resolution.strategy, ResolutionStrategy::ManualIntervention);
        assert!(resolution.requires_user_input);
        assert_eq!(resolution.resolution_notes.as_deref(), Some("overlapping edits"));
        assert!(resolution.resolved_content.is_none());
    }

    #[test]
    fn strategy_serializes_snake_case() {
        let json = serde_json::to_string(&ResolutionStrategy::AgentConsensus).unwrap();
        assert_eq!(json, "\"agent_consensus\"");
        assert_eq!(ResolutionStrategy::UserDecision.to_string(), "user_decision");
    }
}
