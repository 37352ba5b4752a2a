use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::project::ProjectContext;
use crate::domain::repositories::RemoteContextStore;

/// In-memory remote collaborator store
///
/// Stands in for the PostgreSQL store in tests and database-less runs.
/// `push` stamps `last_sync` the way a server would.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    contexts: DashMap<String, ProjectContext>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a write by another collaborator
    pub fn put(&self, context: ProjectContext) {
        self.contexts.insert(context.project_id.clone(), context);
    }
}

#[async_trait]
impl RemoteContextStore for InMemoryRemoteStore {
    async fn pull(&self, project_id: &str) -> Result<Option<ProjectContext>, String> {
        Ok(self.contexts.get(project_id).map(|entry| entry.value().clone()))
    }

    async fn push(&self, context: &ProjectContext) -> Result<(), String> {
        let mut stored = context.clone();
        stored.active_context.last_sync = Some(Utc::now());
        self.contexts.insert(stored.project_id.clone(), stored);
        Ok(())
    }
}
