use super::merge::{AgentChange, MergeConflict};
use super::resolution::Resolution;
use super::value_objects::{ConflictStatus, ConflictType};
use crate::domain::value_objects::Priority;
use crate::errors::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One option offered to whoever decides a conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedResolution {
    pub strategy: String,
    pub description: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    /// 0-100
    pub confidence: u8,
}

/// Type-specific payload carried by a conflict
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictContext {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub changes: Vec<AgentChange>,
    #[serde(default)]
    pub base_version: Option<String>,
    #[serde(default)]
    pub design_issue: Option<String>,
    #[serde(default)]
    pub requirement_ids: Vec<Uuid>,
    #[serde(default)]
    pub resource: Option<String>,
}

/// A detected incompatibility between concurrent agent actions or decisions
///
/// # Invariants
/// - At least one involved agent
/// - `resolution` is set exactly once, when the conflict becomes `Resolved`
/// - Escalated conflicts only leave escalation through an explicit resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub id: Uuid,
    pub project_id: String,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Priority,
    pub involved_agents: Vec<String>,
    pub description: String,
    pub status: ConflictStatus,
    #[serde(default)]
    pub context: ConflictContext,
    #[serde(default)]
    pub suggested_resolutions: Vec<SuggestedResolution>,
    pub resolution: Option<Resolution>,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conflict {
    /// Creates a new pending conflict
    ///
    /// # Returns
    /// * `Err(CoreError::InvalidInput)` - If no agent is involved
    pub fn new(
        project_id: impl Into<String>,
        conflict_type: ConflictType,
        severity: Priority,
        involved_agents: Vec<String>,
        description: impl Into<String>,
        context: ConflictContext,
    ) -> CoreResult<Self> {
        if involved_agents.is_empty() {
            return Err(CoreError::InvalidInput(
                "A conflict must involve at least one agent".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            project_id: project_id.into(),
            conflict_type,
            severity,
            involved_agents,
            description: description.into(),
            status: ConflictStatus::Pending,
            context,
            suggested_resolutions: Vec::new(),
            resolution: None,
            detected_at: now,
            updated_at: now,
        })
    }

    pub fn with_suggestions(mut self, suggestions: Vec<SuggestedResolution>) -> Self {
        self.suggested_resolutions = suggestions;
        self
    }

    /// Builds the merge view of a file conflict, if the payload carries one
    pub fn merge_conflict(&self) -> Option<MergeConflict> {
        let file = self.context.file.clone()?;
        if self.context.changes.is_empty() {
            return None;
        }
        Some(MergeConflict {
            id: self.id,
            file,
            agent_changes: self.context.changes.clone(),
            base_version: self.context.base_version.clone().unwrap_or_default(),
            timestamp: self.detected_at,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status != ConflictStatus::Resolved
    }

    pub fn begin_resolving(&mut self) -> CoreResult<()> {
        if self.resolution.is_some() {
            return Err(CoreError::ConflictAlreadyResolved(self.id.to_string()));
        }
        self.transition(ConflictStatus::Resolving)
    }

    /// Attaches the final resolution
    pub fn record_resolution(&mut self, resolution: Resolution) -> CoreResult<()> {
        if self.resolution.is_some() {
            return Err(CoreError::ConflictAlreadyResolved(self.id.to_string()));
        }
        self.transition(ConflictStatus::Resolved)?;
        self.resolution = Some(resolution);
        Ok(())
    }

    /// Escalates the conflict, raising it to critical severity
    pub fn escalate(&mut self) -> CoreResult<()> {
        self.transition(ConflictStatus::Escalated)?;
        self.severity = Priority::Critical;
        Ok(())
    }

    /// Returns a conflict that failed to resolve to the pending pool
    pub fn reopen(&mut self) -> CoreResult<()> {
        self.transition(ConflictStatus::Pending)
    }

    fn transition(&mut self, next: ConflictStatus) -> CoreResult<()> {
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
    use crate::domain::conflict::ResolutionStrategy;

    fn sample(severity: Priority) -> Conflict {
        Conflict::new(
            "proj-1",
            ConflictType::ResourceConflict,
            severity,
            vec!["Kofi".to_string()],
            "Both agents need the staging database",
            ConflictContext::default(),
        )
        .unwrap()
    }

    #[test]
    fn conflict_requires_an_agent() {
        let result = Conflict::new(
            "proj-1",
            ConflictType::DesignConflict,
            Priority::Low,
            vec![],
            "nobody",
            ConflictContext::default(),
        );

        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn resolution_is_recorded_once() {
        let mut conflict = sample(Priority::Low);
        conflict.begin_resolving().unwrap();
        conflict
            .record_resolution(Resolution::new(ResolutionStrategy::AutoMerge, "test"))
            .unwrap();

        assert_eq!(conflict.status, ConflictStatus::Resolved);
        assert!(!conflict.is_open());

        let second = conflict.record_resolution(Resolution::new(ResolutionStrategy::UserDecision, "user"));
        assert!(matches!(second, Err(CoreError::ConflictAlreadyResolved(_))));
        assert_eq!(
            conflict.resolution.as_ref().map(|r| r.strategy),
            Some(ResolutionStrategy::AutoMerge)
        );
    }

    #[test]
    fn pending_conflict_cannot_be_resolved_directly() {
        let mut conflict = sample(Priority::Low);
        let result = conflict.record_resolution(Resolution::new(ResolutionStrategy::AutoMerge, "test"));

        assert!(result.is_err());
        assert!(conflict.resolution.is_none());
    }

    #[test]
    fn escalation_raises_severity() {
        let mut conflict = sample(Priority::Medium);
        conflict.escalate().unwrap();

        assert_eq!(conflict.status, ConflictStatus::Escalated);
        assert_eq!(conflict.severity, Priority::Critical);
    }

    #[test]
    fn merge_view_requires_file_and_changes() {
        let mut conflict = sample(Priority::Low);
        assert!(conflict.merge_conflict().is_none());

        conflict.context.file = Some("src/main.rs".to_string());
        conflict.context.changes.push(AgentChange {
            agent: "Zola".to_string(),
            content: "fn main() {}".to_string(),
            line_start: 1,
            line_end: 1,
        });

        let merge = conflict.merge_conflict().unwrap();
        assert_eq!(merge.file, "src/main.rs");
        assert_eq!(merge.base_version, "");
    }
}
