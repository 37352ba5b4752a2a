use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::conflict::{Conflict, ConflictStatus};
use crate::domain::repositories::ConflictRepository;

/// In-memory implementation of ConflictRepository
#[derive(Default)]
pub struct InMemoryConflictRepository {
    conflicts: DashMap<Uuid, Conflict>,
}

impl InMemoryConflictRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<F>(&self, filter: F) -> Vec<Conflict>
    where
        F: Fn(&Conflict) -> bool,
    {
        let mut conflicts: Vec<Conflict> = self
            .conflicts
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        conflicts.sort_by_key(|c| c.detected_at);
        conflicts
    }
}

#[async_trait]
impl ConflictRepository for InMemoryConflictRepository {
    async fn save(&self, conflict: &Conflict) -> Result<(), String> {
        self.conflicts.insert(conflict.id, conflict.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conflict>, String> {
        Ok(self.conflicts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_project(&self, project_id: &str) -> Result<Vec<Conflict>, String> {
        Ok(self.collect(|c| c.project_id == project_id))
    }

    async fn find_pending(&self) -> Result<Vec<Conflict>, String> {
        Ok(self.collect(|c| c.status == ConflictStatus::Pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conflict::{ConflictContext, ConflictType};
    use crate::domain::value_objects::Priority;

    fn conflict(project: &str) -> Conflict {
        Conflict::new(
            project,
            ConflictType::DesignConflict,
            Priority::Low,
            vec!["Zola".to_string()],
            "REST or GraphQL",
            ConflictContext::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn pending_filter_skips_escalated() {
        let repo = InMemoryConflictRepository::new();
        let open = conflict("p1");
        let mut escalated = conflict("p2");
        escalated.escalate().unwrap();

        repo.save(&open).await.unwrap();
        repo.save(&escalated).await.unwrap();

        let pending = repo.find_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, open.id);
        assert_eq!(repo.find_by_project("p2").await.unwrap().len(), 1);
    }
}
