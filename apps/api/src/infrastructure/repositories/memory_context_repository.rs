use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::project::ProjectContext;
use crate::domain::repositories::ContextRepository;

/// In-memory implementation of ContextRepository
///
/// The default local cache of the Context Store.
#[derive(Default)]
pub struct InMemoryContextRepository {
    contexts: DashMap<String, ProjectContext>,
}

impl InMemoryContextRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextRepository for InMemoryContextRepository {
    async fn load(&self, project_id: &str) -> Result<Option<ProjectContext>, String> {
        Ok(self.contexts.get(project_id).map(|entry| entry.value().clone()))
    }

    async fn store(&self, context: &ProjectContext) -> Result<(), String> {
        self.contexts
            .insert(context.project_id.clone(), context.clone());
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<String>, String> {
        let mut ids: Vec<String> = self.contexts.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}
