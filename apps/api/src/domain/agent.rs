use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Fixed roster of agents that can be spawned for a project
///
/// Enumeration order is the roster order and is used to break assignment ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentName {
    Zola,
    Jabari,
    Kofi,
    Abeni,
    Nexus,
}

impl AgentName {
    pub const ROSTER: [AgentName; 5] = [
        AgentName::Zola,
        AgentName::Jabari,
        AgentName::Kofi,
        AgentName::Abeni,
        AgentName::Nexus,
    ];

    /// Capability tags the agent was built with
    pub fn capabilities(&self) -> &'static [&'static str] {
        match self {
            AgentName::Zola => &[
                "backend_development",
                "api_design",
                "database_design",
                "system_architecture",
            ],
            AgentName::Jabari => &[
                "security_analysis",
                "code_review",
                "penetration_testing",
                "compliance",
            ],
            AgentName::Kofi => &["devops", "infrastructure", "deployment", "monitoring"],
            AgentName::Abeni => &[
                "ui_design",
                "frontend_development",
                "ux_research",
                "accessibility",
            ],
            AgentName::Nexus => &["full_stack", "integration", "testing", "documentation"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Zola => "Zola",
            AgentName::Jabari => "Jabari",
            AgentName::Kofi => "Kofi",
            AgentName::Abeni => "Abeni",
            AgentName::Nexus => "Nexus",
        }
    }
}

impl std::fmt::Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentName::ROSTER
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::not_found("Agent", s))
    }
}

/// Session status of an agent
///
/// # Status Transitions
/// ```text
/// Idle -> Thinking -> Coding  -> Idle
///                 \-> Testing -> Idle
/// Idle <-> Blocked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Coding,
    Testing,
    Blocked,
}

impl AgentStatus {
    pub fn can_transition_to(&self, next: AgentStatus) -> bool {
        use AgentStatus::*;
        matches!(
            (self, next),
            (Idle, Thinking)
                | (Thinking, Coding)
                | (Thinking, Testing)
                | (Thinking, Idle)
                | (Coding, Idle)
                | (Testing, Idle)
                | (Idle, Blocked)
                | (Blocked, Idle)
        )
    }

    /// Statuses in which the agent holds a task
    pub fn is_working(&self) -> bool {
        matches!(self, AgentStatus::Thinking | AgentStatus::Coding | AgentStatus::Testing)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Idle => write!(f, "idle"),
            AgentStatus::Thinking => write!(f, "thinking"),
            AgentStatus::Coding => write!(f, "coding"),
            AgentStatus::Testing => write!(f, "testing"),
            AgentStatus::Blocked => write!(f, "blocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_names_parse_case_insensitively() {
        assert_eq!("zola".parse::<AgentName>().unwrap(), AgentName::Zola);
        assert_eq!(" NEXUS ".parse::<AgentName>().unwrap(), AgentName::Nexus);
        assert!("Elara".parse::<AgentName>().is_err());
    }

    #[test]
    fn every_agent_has_four_capabilities() {
        for name in AgentName::ROSTER {
            assert_eq!(name.capabilities().len(), 4, "{name}");
        }
    }

    #[test]
    fn working_cycle_transitions() {
        assert!(AgentStatus::Idle.can_transition_to(AgentStatus::Thinking));
        assert!(AgentStatus::Thinking.can_transition_to(AgentStatus::Coding));
        assert!(AgentStatus::Thinking.can_transition_to(AgentStatus::Testing));
        assert!(AgentStatus::Coding.can_transition_to(AgentStatus::Idle));
        assert!(AgentStatus::Testing.can_transition_to(AgentStatus::Idle));
    }

    #[test]
    fn busy_agents_cannot_be_reassigned() {
        assert!(!AgentStatus::Thinking.can_transition_to(AgentStatus::Thinking));
        assert!(!AgentStatus::Coding.can_transition_to(AgentStatus::Thinking));
        assert!(!AgentStatus::Blocked.can_transition_to(AgentStatus::Thinking));
        assert!(!AgentStatus::Coding.can_transition_to(AgentStatus::Blocked));
    }

    #[test]
    fn status_display() {
        assert_eq!(AgentStatus::Idle.to_string(), "idle");
        assert_eq!(AgentStatus::Testing.to_string(), "testing");
        assert!(AgentStatus::Coding.is_working());
        assert!(!AgentStatus::Blocked.is_working());
    }
}
