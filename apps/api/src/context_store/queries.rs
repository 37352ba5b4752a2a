// Read-only views over a project context

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::store::ContextStore;
use crate::domain::project::{ProjectContext, RequirementStatus};
use crate::errors::CoreResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSummary {
    pub project_id: String,
    pub title: String,
    pub version: u64,
    pub current_phase: String,
    pub total_requirements: usize,
    pub completed_requirements: usize,
    /// 0-100
    pub requirement_progress: f64,
    pub open_blockers: usize,
    pub active_tasks: usize,
    pub agent_profiles: usize,
    pub implementation_entries: usize,
    pub last_updated: DateTime<Utc>,
}

impl From<&ProjectContext> for ContextSummary {
    fn from(context: &ProjectContext) -> Self {
        let total = context.requirements.len();
        let completed = context
            .requirements
            .iter()
            .filter(|r| r.status == RequirementStatus::Completed)
            .count();

        Self {
            project_id: context.project_id.clone(),
            title: context.vision.title.clone(),
            version: context.version(),
            current_phase: context.active_context.current_phase.clone(),
            total_requirements: total,
            completed_requirements: completed,
            requirement_progress: percentage(completed, total),
            open_blockers: context.active_context.blockers.len(),
            active_tasks: context.tasks().len(),
            agent_profiles: context.agent_profiles.len(),
            implementation_entries: context.implementation_log.len(),
            last_updated: context.metadata.last_updated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// `vision`, `requirement` or `implementation`
    pub kind: &'static str,
    pub id: Option<String>,
    pub excerpt: String,
    pub relevance: Relevance,
}

pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

impl ContextStore {
    pub async fn summary(&self, project_id: &str) -> CoreResult<ContextSummary> {
        let context = self.get(project_id).await?;
        Ok(ContextSummary::from(&context))
    }

    /// Case-insensitive substring search
    ///
    /// Vision and requirement hits rank high, implementation log hits medium.
    pub async fn search(&self, project_id: &str, query: &str) -> CoreResult<Vec<SearchHit>> {
        let context = self.get(project_id).await?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        let vision = &context.vision;
        let vision_text = std::iter::once(vision.title.as_str())
            .chain(std::iter::once(vision.description.as_str()))
            .chain(vision.goals.iter().map(String::as_str));
        for text in vision_text {
            if text.to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    kind: "vision",
                    id: None,
                    excerpt: text.to_string(),
                    relevance: Relevance::High,
                });
            }
        }

        for requirement in context.requirements.iter() {
            if requirement.description.to_lowercase().contains(&needle) {
                hits.push(SearchHit {
                    kind: "requirement",
                    id: Some(requirement.id.to_string()),
                    excerpt: requirement.description.clone(),
                    relevance: Relevance::High,
                });
            }
        }

        for entry in &context.implementation_log {
            let matched = entry.decision.to_lowercase().contains(&needle)
                || entry.impact.to_lowercase().contains(&needle);
            if matched {
                hits.push(SearchHit {
                    kind: "implementation",
                    id: Some(entry.id.to_string()),
                    excerpt: entry.decision.clone(),
                    relevance: Relevance::Medium,
                });
            }
        }

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::{ImplementationLogEntry, ProjectVision, Requirement};
    use crate::domain::value_objects::Priority;
    use crate::infrastructure::repositories::InMemoryContextRepository;
    use crate::infrastructure::EventBus;
    use std::sync::Arc;

    async fn store() -> ContextStore {
        let store = ContextStore::new(Arc::new(InMemoryContextRepository::new()), None, EventBus::new(8));
        store
            .create_project("p1", ProjectVision::new("Payments portal", "Card payments"), vec![])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn summary_counts_requirement_progress() {
        let store = store().await;
        let mut done = Requirement::new("Refunds", Priority::Medium);
        done.status = RequirementStatus::Completed;
        store.add_requirement("p1", done).await.unwrap();
        store.add_requirement("p1", Requirement::new("Invoices", Priority::Low)).await.unwrap();

        let summary = store.summary("p1").await.unwrap();

        assert_eq!(summary.total_requirements, 2);
        assert_eq!(summary.completed_requirements, 1);
        assert_eq!(summary.requirement_progress, 50.0);
        assert_eq!(summary.version, 3);
        assert_eq!(summary.current_phase, "planning");
    }

    #[tokio::test]
    async fn search_ranks_by_source() {
        let store = store().await;
        store
            .add_requirement("p1", Requirement::new("Card tokenization", Priority::High))
            .await
            .unwrap();
        store
            .log_implementation("p1", ImplementationLogEntry::new("Zola", "Store card tokens in vault", ""))
            .await
            .unwrap();

        let hits = store.search("p1", "CARD").await.unwrap();
        let kinds: Vec<&str> = hits.iter().map(|h| h.kind).collect();

        assert_eq!(kinds, vec!["vision", "requirement", "implementation"]);
        assert_eq!(hits[2].relevance, Relevance::Medium);
        assert!(store.search("p1", "  ").await.unwrap().is_empty());
    }
}
