use std::sync::Arc;

use tracing::{debug, warn};

use super::ports::{DesignAuthority, MergeHandler};
use crate::domain::conflict::{Conflict, ConflictType, Resolution, ResolutionStrategy};
use crate::errors::{CoreError, CoreResult};

const RESOLVER: &str = "conflict_resolver";

/// Maps a conflict to a resolution by its type
///
/// Holds no state of its own. Anything it cannot settle comes back as
/// manual intervention requiring user input.
pub struct ConflictResolver {
    merges: Arc<dyn MergeHandler>,
    design: Arc<dyn DesignAuthority>,
}

impl ConflictResolver {
    pub fn new(merges: Arc<dyn MergeHandler>, design: Arc<dyn DesignAuthority>) -> Self {
        Self { merges, design }
    }

    pub async fn resolve(&self, conflict: &Conflict) -> CoreResult<Resolution> {
        debug!(conflict_id = %conflict.id, conflict_type = %conflict.conflict_type, "Dispatching conflict");

        match conflict.conflict_type {
            ConflictType::FileConflict => self.resolve_file(conflict).await,
            ConflictType::DesignConflict => self.resolve_design(conflict).await,
            ConflictType::RequirementConflict => self.resolve_requirements(conflict).await,
            ConflictType::ResourceConflict => {
                let resource = conflict
                    .context
                    .resource
                    .clone()
                    .unwrap_or_else(|| "the resource".to_string());
                Ok(Resolution::manual(
                    RESOLVER,
                    format!("Contention for {} needs scheduling by hand", resource),
                ))
            }
            ConflictType::Unrecognized => {
                warn!(conflict_id = %conflict.id, "Unrecognized conflict type, failing closed");
                Ok(Resolution::manual(RESOLVER, "Unrecognized conflict type"))
            }
        }
    }

    async fn resolve_file(&self, conflict: &Conflict) -> CoreResult<Resolution> {
        match conflict.merge_conflict() {
            Some(merge) => {
                self.merges
                    .handle_merge_conflict(&conflict.project_id, &merge)
                    .await
            }
            None => Ok(Resolution::manual(
                RESOLVER,
                "File conflict carries no changes to merge",
            )),
        }
    }

    async fn resolve_design(&self, conflict: &Conflict) -> CoreResult<Resolution> {
        let issue = conflict
            .context
            .design_issue
            .as_deref()
            .unwrap_or(&conflict.description);

        match self.design.design_guidance(&conflict.project_id, issue).await? {
            Some(choice) => Ok(Resolution::new(ResolutionStrategy::AgentConsensus, RESOLVER)
                .with_content(choice.decision.clone())
                .with_notes(format!(
                    "Follows the recorded {} decision by {} ({}% confidence)",
                    choice.category, choice.reviewed_by, choice.confidence
                ))),
            None => Ok(Resolution::manual(
                RESOLVER,
                "No authoritative design guidance recorded for this issue",
            )),
        }
    }

    async fn resolve_requirements(&self, conflict: &Conflict) -> CoreResult<Resolution> {
        let ids = conflict.context.requirement_ids.clone();
        if ids.is_empty() {
            return Ok(Resolution::manual(
                RESOLVER,
                "Requirement conflict names no requirements",
            ));
        }

        match self.design.merge_requirements(&conflict.project_id, ids).await {
            Ok(survivor) => Ok(Resolution::new(ResolutionStrategy::AutoMerge, RESOLVER)
                .with_content(survivor.description.clone())
                .with_notes(format!("Requirements merged into {}", survivor.id))),
            Err(e @ (CoreError::NotFound { .. } | CoreError::InvalidInput(_))) => {
                Ok(Resolution::manual(RESOLVER, format!("Could not merge requirements: {}", e)))
            }
            Err(e) => Err(e),
        }
    }
}
