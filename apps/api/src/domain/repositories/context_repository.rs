use async_trait::async_trait;

use crate::domain::project::ProjectContext;

/// Local storage port for project contexts
///
/// The Context Store serializes writers per project before calling `store`,
/// so implementations only need to be safe for concurrent access across projects.
#[async_trait]
pub trait ContextRepository: Send + Sync {
    /// Load a project's context
    async fn load(&self, project_id: &str) -> Result<Option<ProjectContext>, String>;

    /// Save a project's context (insert or replace)
    async fn store(&self, context: &ProjectContext) -> Result<(), String>;

    /// Ids of every stored project
    async fn list_projects(&self) -> Result<Vec<String>, String>;
}

/// Remote collaborator store the local context is reconciled against
#[async_trait]
pub trait RemoteContextStore: Send + Sync {
    /// Fetch the remote copy, `None` if the remote has never seen the project
    async fn pull(&self, project_id: &str) -> Result<Option<ProjectContext>, String>;

    /// Replace the remote copy
    async fn push(&self, context: &ProjectContext) -> Result<(), String>;
}
