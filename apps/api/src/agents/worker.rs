use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::{AgentName, AgentStatus};
use crate::errors::{CoreError, CoreResult};

/// Live session of one roster agent within a project
///
/// # Invariants
/// - `current_task` is set exactly while the status is a working status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSession {
    pub id: Uuid,
    pub project_id: String,
    pub name: AgentName,
    pub capabilities: Vec<String>,
    pub status: AgentStatus,
    pub current_task: Option<Uuid>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AgentSession {
    /// Spawns an idle session with the agent's built-in capabilities
    pub fn new(project_id: impl Into<String>, name: AgentName) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            name,
            capabilities: name.capabilities().iter().map(|c| c.to_string()).collect(),
            status: AgentStatus::Idle,
            current_task: None,
            last_activity: now,
            created_at: now,
        }
    }

    /// Claims a task for this agent: idle -> thinking
    ///
    /// # Returns
    /// * `Err(CoreError::AgentBusy)` - If the agent is not idle
    pub fn assign_task(&mut self, task_id: Uuid) -> CoreResult<()> {
        if self.status != AgentStatus::Idle {
            return Err(CoreError::AgentBusy {
                agent: self.name.to_string(),
                status: self.status.to_string(),
            });
        }

        self.status = AgentStatus::Thinking;
        self.current_task = Some(task_id);
        self.last_activity = Utc::now();
        Ok(())
    }

    /// Moves from thinking into coding or testing
    pub fn begin(&mut self, work: AgentStatus) -> CoreResult<()> {
        if !matches!(work, AgentStatus::Coding | AgentStatus::Testing) {
            return Err(CoreError::InvalidInput(format!("{} is not a work status", work)));
        }
        self.transition(work)
    }

    /// Returns the agent to idle, dropping its task
    pub fn finish(&mut self) -> CoreResult<()> {
        self.transition(AgentStatus::Idle)?;
        self.current_task = None;
        Ok(())
    }

    pub fn block(&mut self) -> CoreResult<()> {
        self.transition(AgentStatus::Blocked)
    }

    pub fn unblock(&mut self) -> CoreResult<()> {
        if self.status != AgentStatus::Blocked {
            return Err(CoreError::InvalidStateTransition {
                from: self.status.to_string(),
                to: AgentStatus::Idle.to_string(),
            });
        }
        self.transition(AgentStatus::Idle)
    }

    pub fn is_holding(&self, task_id: Uuid) -> bool {
        self.status.is_working() && self.current_task == Some(task_id)
    }

    /// Capabilities that show up in a task's text
    pub fn matching_capabilities(&self, task_text: &str) -> Vec<&str> {
        let text = task_text.to_lowercase();
        self.capabilities
            .iter()
            .filter(|capability| capability_matches(capability, &text))
            .map(String::as_str)
            .collect()
    }

    /// Check if this agent can handle a task based on its text
    pub fn can_handle_task(&self, task_text: &str) -> bool {
        !self.matching_capabilities(task_text).is_empty()
    }

    fn transition(&mut self, next: AgentStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.last_activity = Utc::now();
        Ok(())
    }
}

/// A capability matches when one of its meaningful words appears in the text
pub fn capability_matches(capability: &str, lowercase_text: &str) -> bool {
    capability
        .split('_')
        .filter(|word| word.len() >= 4)
        .any(|word| lowercase_text.contains(word))
}
