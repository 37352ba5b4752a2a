use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::conflict::Conflict;

/// Repository trait for detected conflicts
#[async_trait]
pub trait ConflictRepository: Send + Sync {
    /// Save a conflict (insert or update)
    async fn save(&self, conflict: &Conflict) -> Result<(), String>;

    /// Find a conflict by its ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conflict>, String>;

    /// All conflicts of a project, oldest first
    async fn find_by_project(&self, project_id: &str) -> Result<Vec<Conflict>, String>;

    /// Every conflict still waiting in `pending`, oldest first
    async fn find_pending(&self) -> Result<Vec<Conflict>, String>;
}
