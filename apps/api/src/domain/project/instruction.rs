use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionType {
    TaskGuidance,
    AgentBehavior,
    PriorityChange,
    DesignFeedback,
}

impl std::fmt::Display for InstructionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructionType::TaskGuidance => write!(f, "task_guidance"),
            InstructionType::AgentBehavior => write!(f, "agent_behavior"),
            InstructionType::PriorityChange => write!(f, "priority_change"),
            InstructionType::DesignFeedback => write!(f, "design_feedback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// Free-form guidance from a user
///
/// Type and priority are optional; when absent they are inferred by the
/// orchestrator's classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInstruction {
    pub instruction: String,
    #[serde(default, rename = "type")]
    pub instruction_type: Option<InstructionType>,
    /// Agent name or task id the instruction is aimed at
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub priority: Option<InstructionPriority>,
    #[serde(default)]
    pub issued_by: Option<String>,
}

impl UserInstruction {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            instruction_type: None,
            target: None,
            priority: None,
            issued_by: None,
        }
    }

    pub fn targeting(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum InstructionOutcome {
    Applied(String),
    Ignored(String),
    Failed(String),
}

/// Audit entry kept for every instruction, whatever its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionRecord {
    pub id: Uuid,
    pub instruction: String,
    #[serde(rename = "type")]
    pub instruction_type: InstructionType,
    pub priority: InstructionPriority,
    pub target: Option<String>,
    pub issued_by: String,
    pub outcome: InstructionOutcome,
    pub received_at: DateTime<Utc>,
}
