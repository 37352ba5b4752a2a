use super::instruction::InstructionRecord;
use super::value_objects::{DesignCategory, RequirementStatus};
use crate::domain::conflict::{ConflictType, Resolution};
use crate::domain::task::Task;
use crate::domain::value_objects::Priority;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectVision {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl ProjectVision {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            goals: Vec::new(),
            success_criteria: Vec::new(),
            constraints: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,
    pub description: String,
    pub priority: Priority,
    pub status: RequirementStatus,
    pub assigned_to: Option<String>,
    pub implementation_notes: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Requirement {
    pub fn new(description: impl Into<String>, priority: Priority) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            priority,
            status: RequirementStatus::Pending,
            assigned_to: None,
            implementation_notes: None,
            dependencies: Vec::new(),
            tags: Vec::new(),
            acceptance_criteria: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Requirements about qualities rather than behavior
    pub fn is_non_functional(&self) -> bool {
        let description = self.description.to_lowercase();
        ["performance", "security", "scalability"]
            .iter()
            .any(|keyword| description.contains(keyword))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub functional: Vec<Requirement>,
    #[serde(default)]
    pub non_functional: Vec<Requirement>,
}

impl Requirements {
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.functional.iter().chain(self.non_functional.iter())
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Requirement> {
        self.functional
            .iter_mut()
            .chain(self.non_functional.iter_mut())
            .find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.functional.len() + self.non_functional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignAlternative {
    pub option: String,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub rejected_reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignChoice {
    pub category: DesignCategory,
    pub decision: String,
    pub reasoning: String,
    #[serde(default)]
    pub alternatives: Vec<DesignAlternative>,
    #[serde(default)]
    pub impact: String,
    /// 0-100
    pub confidence: u8,
    pub last_reviewed: DateTime<Utc>,
    /// Agent name or `user`
    pub reviewed_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechStack {
    #[serde(default)]
    pub frontend: Vec<String>,
    #[serde(default)]
    pub backend: Vec<String>,
    #[serde(default)]
    pub database: Vec<String>,
    #[serde(default)]
    pub infrastructure: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignChoices {
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub tech_stack: TechStack,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub reasoning: BTreeMap<String, String>,
    #[serde(default)]
    pub detailed_choices: Vec<DesignChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub code_quality: Option<f32>,
    pub test_coverage: Option<f32>,
    pub performance_score: Option<f32>,
    pub security_score: Option<f32>,
}

/// Append-only record of a decision taken while building the project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationLogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub task: Option<Uuid>,
    pub decision: String,
    pub impact: String,
    #[serde(default)]
    pub files_changed: Vec<String>,
    #[serde(default)]
    pub requirements_updated: Vec<Uuid>,
    #[serde(default)]
    pub design_choices_updated: Vec<String>,
    #[serde(default)]
    pub quality_metrics: QualityMetrics,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl ImplementationLogEntry {
    pub fn new(agent: impl Into<String>, decision: impl Into<String>, impact: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent: agent.into(),
            task: None,
            decision: decision.into(),
            impact: impact.into(),
            files_changed: Vec::new(),
            requirements_updated: Vec::new(),
            design_choices_updated: Vec::new(),
            quality_metrics: QualityMetrics::default(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_task(mut self, task_id: Uuid) -> Self {
        self.task = Some(task_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files_changed = files;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeStyle {
    pub language: String,
    pub conventions: Vec<String>,
    pub formatting: String,
    pub linting: Vec<String>,
}

/// Relative weights (1-10) an agent gives to competing qualities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePriorities {
    pub performance: u8,
    pub readability: u8,
    pub security: u8,
    pub test_coverage: u8,
    pub maintainability: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryPreferences {
    pub preferred: Vec<String>,
    pub forbidden: Vec<String>,
}

/// Per-agent behavior instructions for one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBehaviorProfile {
    pub agent_name: String,
    pub project_id: String,
    pub code_style: CodeStyle,
    pub priorities: ProfilePriorities,
    pub constraints: Vec<String>,
    pub libraries: LibraryPreferences,
    pub custom_instructions: String,
    pub last_updated: DateTime<Utc>,
    pub updated_by: String,
}

impl AgentBehaviorProfile {
    /// Fresh profile with every priority populated
    pub fn new(
        agent_name: impl Into<String>,
        project_id: impl Into<String>,
        instruction: impl Into<String>,
        updated_by: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            project_id: project_id.into(),
            code_style: CodeStyle {
                language: "typescript".to_string(),
                conventions: Vec::new(),
                formatting: "prettier".to_string(),
                linting: vec!["eslint".to_string()],
            },
            priorities: ProfilePriorities {
                performance: 7,
                readability: 8,
                security: 9,
                test_coverage: 7,
                maintainability: 8,
            },
            constraints: Vec::new(),
            libraries: LibraryPreferences::default(),
            custom_instructions: instruction.into(),
            last_updated: Utc::now(),
            updated_by: updated_by.into(),
        }
    }

    /// Replaces the custom instructions, leaving every other field untouched
    pub fn apply_instruction(&mut self, instruction: impl Into<String>, updated_by: impl Into<String>) {
        self.custom_instructions = instruction.into();
        self.updated_by = updated_by.into();
        self.last_updated = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    pub id: Uuid,
    pub description: String,
    pub severity: Priority,
    #[serde(default)]
    pub blocked_tasks: Vec<Uuid>,
    #[serde(default)]
    pub blocked_agents: Vec<String>,
    pub resolution_plan: Option<String>,
    pub estimated_resolution: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Blocker {
    pub fn new(description: impl Into<String>, severity: Priority) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            severity,
            blocked_tasks: Vec::new(),
            blocked_agents: Vec::new(),
            resolution_plan: None,
            estimated_resolution: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveContext {
    pub current_phase: String,
    #[serde(default)]
    pub active_tasks: Vec<Task>,
    #[serde(default)]
    pub blockers: Vec<Blocker>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl Default for ActiveContext {
    fn default() -> Self {
        Self {
            current_phase: "planning".to_string(),
            active_tasks: Vec::new(),
            blockers: Vec::new(),
            last_sync: None,
        }
    }
}

/// Final resolution of a conflict, kept with the project for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub conflict_id: Uuid,
    pub conflict_type: ConflictType,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    /// Incremented exactly once per accepted write
    pub version: u64,
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Versioned source of truth for one project
///
/// # Invariants
/// - `metadata.version` never decreases and changes on every write
/// - The implementation log only grows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_id: String,
    pub vision: ProjectVision,
    #[serde(default)]
    pub requirements: Requirements,
    #[serde(default)]
    pub design_choices: DesignChoices,
    #[serde(default)]
    pub implementation_log: Vec<ImplementationLogEntry>,
    #[serde(default)]
    pub agent_profiles: BTreeMap<String, AgentBehaviorProfile>,
    #[serde(default)]
    pub active_context: ActiveContext,
    #[serde(default)]
    pub instruction_log: Vec<InstructionRecord>,
    #[serde(default)]
    pub resolution_log: Vec<ResolutionRecord>,
    pub metadata: ContextMetadata,
}

impl ProjectContext {
    /// Creates the first version of a project's context
    pub fn new(project_id: impl Into<String>, vision: ProjectVision, collaborators: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            project_id: project_id.into(),
            vision,
            requirements: Requirements::default(),
            design_choices: DesignChoices::default(),
            implementation_log: Vec::new(),
            agent_profiles: BTreeMap::new(),
            active_context: ActiveContext::default(),
            instruction_log: Vec::new(),
            resolution_log: Vec::new(),
            metadata: ContextMetadata {
                created_at: now,
                last_updated: now,
                version: 1,
                collaborators,
                tags: Vec::new(),
            },
        }
    }

    pub fn version(&self) -> u64 {
        self.metadata.version
    }

    /// Stamps an accepted write
    pub fn bump_version(&mut self) {
        self.metadata.version += 1;
        self.metadata.last_updated = Utc::now();
    }

    pub fn tasks(&self) -> &[Task] {
        &self.active_context.active_tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.active_context.active_tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.active_context.active_tasks.iter_mut().find(|t| t.id == id)
    }
}
