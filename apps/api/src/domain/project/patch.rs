use super::context::{ActiveContext, AgentBehaviorProfile, DesignChoices, ProjectContext, ProjectVision, Requirements};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partial replacement of a project's context
///
/// The implementation, instruction and resolution logs are append-only and
/// cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPatch {
    /// Version the caller read. `None` writes unconditionally.
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(default)]
    pub vision: Option<ProjectVision>,
    #[serde(default)]
    pub requirements: Option<Requirements>,
    #[serde(default)]
    pub design_choices: Option<DesignChoices>,
    #[serde(default)]
    pub agent_profiles: Option<BTreeMap<String, AgentBehaviorProfile>>,
    #[serde(default)]
    pub active_context: Option<ActiveContext>,
    #[serde(default)]
    pub collaborators: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ContextPatch {
    pub fn expecting(version: u64) -> Self {
        Self {
            expected_version: Some(version),
            ..Self::default()
        }
    }

    pub fn apply_to(self, context: &mut ProjectContext) {
        if let Some(vision) = self.vision {
            context.vision = vision;
        }
        if let Some(requirements) = self.requirements {
            context.requirements = requirements;
        }
        if let Some(design_choices) = self.design_choices {
            context.design_choices = design_choices;
        }
        if let Some(agent_profiles) = self.agent_profiles {
            context.agent_profiles = agent_profiles;
        }
        if let Some(active_context) = self.active_context {
            context.active_context = active_context;
        }
        if let Some(collaborators) = self.collaborators {
            context.metadata.collaborators = collaborators;
        }
        if let Some(tags) = self.tags {
            context.metadata.tags = tags;
        }
    }
}
