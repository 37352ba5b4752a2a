use super::value_objects::{Complexity, TaskStatus};
use crate::domain::agent::AgentName;
use crate::domain::value_objects::Priority;
use crate::errors::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A unit of work produced by goal decomposition
///
/// # Invariants
/// - `status == InProgress` implies `assigned_to` is set
/// - Status transitions follow [`TaskStatus::can_transition_to`]
/// - `updated_at` never precedes `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assigned_to: Option<AgentName>,
    pub dependencies: BTreeSet<Uuid>,
    #[serde(default)]
    pub requirement_ids: Vec<String>,
    /// Minutes
    pub estimated_duration: u32,
    pub complexity: Complexity,
    #[serde(default)]
    pub guidance: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new pending task
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        complexity: Complexity,
        estimated_duration: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            priority,
            status: TaskStatus::Pending,
            assigned_to: None,
            dependencies: BTreeSet::new(),
            requirement_ids: Vec::new(),
            estimated_duration,
            complexity,
            guidance: Vec::new(),
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.dependencies.extend(ids);
        self
    }

    pub fn with_requirement(mut self, requirement_id: impl Into<String>) -> Self {
        self.requirement_ids.push(requirement_id.into());
        self
    }

    /// Marks the task as picked up by an agent
    pub fn start(&mut self, agent: AgentName) -> CoreResult<()> {
        self.transition(TaskStatus::InProgress)?;
        self.assigned_to = Some(agent);
        self.started_at = Some(self.updated_at);
        Ok(())
    }

    pub fn complete(&mut self) -> CoreResult<()> {
        self.transition(TaskStatus::Completed)?;
        self.completed_at = Some(self.updated_at);
        Ok(())
    }

    /// Blocks the task. The assignee is kept so the failure stays attributable.
    pub fn block(&mut self) -> CoreResult<()> {
        self.transition(TaskStatus::Blocked)
    }

    /// Returns a blocked task to the pending pool
    pub fn reopen(&mut self) -> CoreResult<()> {
        self.transition(TaskStatus::Pending)?;
        self.assigned_to = None;
        self.started_at = None;
        Ok(())
    }

    /// Free text searched by capability matching
    pub fn keywords(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }

    /// Whether this task holds the given agent
    pub fn is_held_by(&self, agent: AgentName) -> bool {
        self.status == TaskStatus::InProgress && self.assigned_to == Some(agent)
    }

    fn transition(&mut self, next: TaskStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Task {
        Task::new("Build API", "Create endpoints", Priority::High, Complexity::Moderate, 120)
    }

    #[test]
    fn new_task_is_pending_and_unassigned() {
        let task = sample();

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.assigned_to.is_none());
        assert!(task.dependencies.is_empty());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn start_assigns_agent() {
        let mut task = sample();
        task.start(AgentName::Zola).unwrap();

        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.assigned_to, Some(AgentName::Zola));
        assert!(task.started_at.is_some());
        assert!(task.is_held_by(AgentName::Zola));
        assert!(!task.is_held_by(AgentName::Kofi));
    }

    #[test]
    fn complete_requires_in_progress() {
        let mut task = sample();
        let result = task.complete();

        assert!(matches!(result, Err(CoreError::InvalidStateTransition { .. })));
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn block_keeps_assignee_and_releases_hold() {
        let mut task = sample();
        task.start(AgentName::Nexus).unwrap();
        task.block().unwrap();

        assert_eq!(task.status, TaskStatus::Blocked);
        assert_eq!(task.assigned_to, Some(AgentName::Nexus));
        assert!(!task.is_held_by(AgentName::Nexus));
    }

    #[test]
    fn reopen_clears_assignment() {
        let mut task = sample();
        task.start(AgentName::Nexus).unwrap();
        task.block().unwrap();
        task.reopen().unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.assigned_to.is_none());
        assert!(task.started_at.is_none());
    }

    #[test]
    fn dependencies_are_a_set() {
        let dep = Uuid::new_v4();
        let task = sample().depends_on([dep, dep]);

        assert_eq!(task.dependencies.len(), 1);
        assert!(task.dependencies.contains(&dep));
    }
}
