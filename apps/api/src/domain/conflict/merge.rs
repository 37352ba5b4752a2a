use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Replacement of an inclusive, 1-based line range by one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentChange {
    pub agent: String,
    pub content: String,
    pub line_start: usize,
    pub line_end: usize,
}

impl AgentChange {
    pub fn overlaps(&self, other: &AgentChange) -> bool {
        !(self.line_end < other.line_start || other.line_end < self.line_start)
    }
}

/// Concurrent edits by several agents to the same file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub id: Uuid,
    pub file: String,
    pub agent_changes: Vec<AgentChange>,
    pub base_version: String,
    pub timestamp: DateTime<Utc>,
}

impl MergeConflict {
    /// Distinct agents that touched the file, in first-seen order
    pub fn involved_agents(&self) -> Vec<String> {
        let mut agents: Vec<String> = Vec::new();
        for change in &self.agent_changes {
            if !agents.contains(&change.agent) {
                agents.push(change.agent.clone());
            }
        }
        agents
    }

    /// Whether any two changes touch a common line
    pub fn has_overlap(&self) -> bool {
        self.agent_changes.iter().enumerate().any(|(i, a)| {
            self.agent_changes[i + 1..].iter().any(|b| a.overlaps(b))
        })
    }
}
