use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::conflict::{MergeConflict, Resolution};
use crate::domain::project::{DesignChoice, Requirement};
use crate::errors::CoreResult;

/// Runs the merge ladder for file conflicts
#[async_trait]
pub trait MergeHandler: Send + Sync {
    async fn handle_merge_conflict(&self, project_id: &str, conflict: &MergeConflict) -> CoreResult<Resolution>;
}

/// Recorded design decisions and requirements of a project
#[async_trait]
pub trait DesignAuthority: Send + Sync {
    /// Authoritative design choice that settles an issue, if any
    async fn design_guidance(&self, project_id: &str, issue: &str) -> CoreResult<Option<DesignChoice>>;

    /// Merges conflicting requirements, returning the survivor
    async fn merge_requirements(&self, project_id: &str, requirement_ids: Vec<Uuid>) -> CoreResult<Requirement>;
}
