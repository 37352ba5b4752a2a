use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::events::DomainEvent;
use crate::domain::project::{
    AgentBehaviorProfile, Blocker, ContextPatch, DesignChoice, ImplementationLogEntry,
    InstructionRecord, ProjectContext, ProjectVision, Requirement, RequirementStatus,
    ResolutionRecord,
};
use crate::domain::repositories::{ContextRepository, RemoteContextStore};
use crate::domain::task::Task;
use crate::domain::value_objects::Priority;
use crate::errors::{CoreError, CoreResult};
use crate::infrastructure::EventBus;
use crate::resolver::DesignAuthority;

/// Choices at or above this confidence settle design conflicts on their own
pub const AUTHORITATIVE_CONFIDENCE: u8 = 70;

/// Partial update of one requirement
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementUpdate {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<RequirementStatus>,
    pub assigned_to: Option<String>,
    pub implementation_notes: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Option<Vec<String>>,
}

/// Versioned store of project contexts
///
/// Concurrency model: optimistic. [`ContextStore::update`] rejects a patch
/// whose `expected_version` no longer matches with `StaleVersion`. The named
/// write helpers read, modify and store while holding the project lock, so
/// they never lose concurrent updates.
pub struct ContextStore {
    pub(super) repository: Arc<dyn ContextRepository>,
    pub(super) remote: Option<Arc<dyn RemoteContextStore>>,
    pub(super) events: EventBus,
    locks: DashMap<String, Arc<Mutex<()>>>,
    pub(super) sync_loops: DashMap<String, CancellationToken>,
    pub(super) sweep_started: AtomicBool,
    pub(super) shutdown: CancellationToken,
    pub(super) tracker: TaskTracker,
}

impl ContextStore {
    pub fn new(
        repository: Arc<dyn ContextRepository>,
        remote: Option<Arc<dyn RemoteContextStore>>,
        events: EventBus,
    ) -> Self {
        Self {
            repository,
            remote,
            events,
            locks: DashMap::new(),
            sync_loops: DashMap::new(),
            sweep_started: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub(super) fn lock_for(&self, project_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(project_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    pub(super) async fn load_local(&self, project_id: &str) -> CoreResult<Option<ProjectContext>> {
        self.repository.load(project_id).await.map_err(CoreError::Storage)
    }

    pub(super) async fn store_local(&self, context: &ProjectContext) -> CoreResult<()> {
        self.repository.store(context).await.map_err(CoreError::Storage)
    }

    pub(super) fn emit_updated(&self, context: &ProjectContext) {
        self.events.publish(DomainEvent::ContextUpdated {
            project_id: context.project_id.clone(),
            context: Box::new(context.clone()),
        });
    }

    /// Returns the current context of a project
    ///
    /// Falls back to the remote store when the project is not cached locally.
    pub async fn get(&self, project_id: &str) -> CoreResult<ProjectContext> {
        if let Some(context) = self.load_local(project_id).await? {
            return Ok(context);
        }

        let Some(remote) = &self.remote else {
            return Err(CoreError::not_found("Project", project_id));
        };

        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;
        if let Some(context) = self.load_local(project_id).await? {
            return Ok(context);
        }

        let context = remote
            .pull(project_id)
            .await
            .map_err(CoreError::Storage)?
            .ok_or_else(|| CoreError::not_found("Project", project_id))?;
        self.store_local(&context).await?;
        debug!(project_id, version = context.version(), "Cached project context from remote");
        Ok(context)
    }

    pub async fn list_projects(&self) -> CoreResult<Vec<String>> {
        self.repository.list_projects().await.map_err(CoreError::Storage)
    }

    /// Creates the first version of a project's context
    pub async fn create_project(
        &self,
        project_id: &str,
        vision: ProjectVision,
        collaborators: Vec<String>,
    ) -> CoreResult<ProjectContext> {
        if project_id.trim().is_empty() {
            return Err(CoreError::InvalidInput("Project id must not be empty".to_string()));
        }

        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        if self.load_local(project_id).await?.is_some() {
            return Err(CoreError::InvalidInput(format!(
                "Project {} already exists",
                project_id
            )));
        }

        let context = ProjectContext::new(project_id, vision, collaborators);
        self.store_local(&context).await?;
        self.emit_updated(&context);

        info!(project_id, "Project context created");
        Ok(context)
    }

    /// Read-modify-write under the project lock
    ///
    /// The closure's error aborts the write and leaves the stored context
    /// untouched. On success the version is bumped once and
    /// `context_updated` is emitted.
    pub async fn write<T, F>(&self, project_id: &str, mutate: F) -> CoreResult<T>
    where
        F: FnOnce(&mut ProjectContext) -> CoreResult<T> + Send,
        T: Send,
    {
        let (value, _) = self.write_returning(project_id, mutate).await?;
        Ok(value)
    }

    /// Like [`ContextStore::write`], also returning the stored context
    async fn write_returning<T, F>(&self, project_id: &str, mutate: F) -> CoreResult<(T, ProjectContext)>
    where
        F: FnOnce(&mut ProjectContext) -> CoreResult<T> + Send,
        T: Send,
    {
        let lock = self.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut context = match self.load_local(project_id).await? {
            Some(context) => context,
            None => self.pull_into_cache(project_id).await?,
        };

        let value = mutate(&mut context)?;
        context.bump_version();
        self.store_local(&context).await?;
        self.emit_updated(&context);

        debug!(project_id, version = context.version(), "Context write accepted");
        Ok((value, context))
    }

    async fn pull_into_cache(&self, project_id: &str) -> CoreResult<ProjectContext> {
        let Some(remote) = &self.remote else {
            return Err(CoreError::not_found("Project", project_id));
        };
        let context = remote
            .pull(project_id)
            .await
            .map_err(CoreError::Storage)?
            .ok_or_else(|| CoreError::not_found("Project", project_id))?;
        self.store_local(&context).await?;
        Ok(context)
    }

    /// Applies a caller-built patch
    ///
    /// # Returns
    /// * `Err(CoreError::StaleVersion)` - If `expected_version` is set and the
    ///   stored version has moved on
    pub async fn update(&self, project_id: &str, patch: ContextPatch) -> CoreResult<ProjectContext> {
        let (_, context) = self
            .write_returning(project_id, move |context| {
                if let Some(expected) = patch.expected_version {
                    if expected != context.version() {
                        return Err(CoreError::StaleVersion {
                            expected,
                            actual: context.version(),
                        });
                    }
                }
                patch.apply_to(context);
                Ok(())
            })
            .await?;
        Ok(context)
    }

    pub async fn update_vision(&self, project_id: &str, mut vision: ProjectVision) -> CoreResult<ProjectContext> {
        let (_, context) = self
            .write_returning(project_id, move |context| {
                vision.last_updated = chrono::Utc::now();
                context.vision = vision;
                Ok(())
            })
            .await?;
        Ok(context)
    }

    /// Files a requirement as functional or non-functional by its wording
    pub async fn add_requirement(&self, project_id: &str, requirement: Requirement) -> CoreResult<Requirement> {
        self.write(project_id, move |context| {
            if requirement.is_non_functional() {
                context.requirements.non_functional.push(requirement.clone());
            } else {
                context.requirements.functional.push(requirement.clone());
            }
            Ok(requirement)
        })
        .await
    }

    pub async fn update_requirement(
        &self,
        project_id: &str,
        requirement_id: Uuid,
        update: RequirementUpdate,
    ) -> CoreResult<Requirement> {
        self.write(project_id, move |context| {
            let requirement = context
                .requirements
                .find_mut(requirement_id)
                .ok_or_else(|| CoreError::not_found("Requirement", requirement_id))?;

            if let Some(description) = update.description {
                requirement.description = description;
            }
            if let Some(priority) = update.priority {
                requirement.priority = priority;
            }
            if let Some(status) = update.status {
                requirement.status = status;
            }
            if let Some(assigned_to) = update.assigned_to {
                requirement.assigned_to = Some(assigned_to);
            }
            if let Some(notes) = update.implementation_notes {
                requirement.implementation_notes = Some(notes);
            }
            if let Some(criteria) = update.acceptance_criteria {
                requirement.acceptance_criteria = criteria;
            }
            requirement.updated_at = chrono::Utc::now();
            Ok(requirement.clone())
        })
        .await
    }

    /// Merges requirements that contradict or duplicate each other
    ///
    /// The highest-priority requirement survives and absorbs the others'
    /// acceptance criteria, tags and dependencies. The rest are deferred with
    /// a note pointing at the survivor.
    pub async fn merge_requirements(&self, project_id: &str, requirement_ids: Vec<Uuid>) -> CoreResult<Requirement> {
        if requirement_ids.is_empty() {
            return Err(CoreError::InvalidInput("No requirements to merge".to_string()));
        }

        self.write(project_id, move |context| {
            let mut found: Vec<Requirement> = Vec::with_capacity(requirement_ids.len());
            for id in &requirement_ids {
                let requirement = context
                    .requirements
                    .iter()
                    .find(|r| r.id == *id)
                    .cloned()
                    .ok_or_else(|| CoreError::not_found("Requirement", id))?;
                found.push(requirement);
            }

            // Priority orders Critical first; ties keep request order
            let survivor_id = found
                .iter()
                .min_by_key(|r| r.priority)
                .map(|r| r.id)
                .ok_or_else(|| CoreError::InvalidInput("No requirements to merge".to_string()))?;

            let now = chrono::Utc::now();
            let absorbed: Vec<Requirement> = found.into_iter().filter(|r| r.id != survivor_id).collect();

            for other in &absorbed {
                if let Some(requirement) = context.requirements.find_mut(other.id) {
                    requirement.status = RequirementStatus::Deferred;
                    requirement.implementation_notes = Some(format!("merged into {}", survivor_id));
                    requirement.updated_at = now;
                }
            }

            let survivor = context
                .requirements
                .find_mut(survivor_id)
                .ok_or_else(|| CoreError::not_found("Requirement", survivor_id))?;
            for other in absorbed {
                for criterion in other.acceptance_criteria {
                    if !survivor.acceptance_criteria.contains(&criterion) {
                        survivor.acceptance_criteria.push(criterion);
                    }
                }
                for tag in other.tags {
                    if !survivor.tags.contains(&tag) {
                        survivor.tags.push(tag);
                    }
                }
                for dependency in other.dependencies {
                    if dependency != survivor_id && !survivor.dependencies.contains(&dependency) {
                        survivor.dependencies.push(dependency);
                    }
                }
            }
            survivor.updated_at = now;
            Ok(survivor.clone())
        })
        .await
    }

    pub async fn add_design_choice(&self, project_id: &str, choice: DesignChoice) -> CoreResult<DesignChoice> {
        self.write(project_id, move |context| {
            context
                .design_choices
                .reasoning
                .insert(choice.decision.clone(), choice.reasoning.clone());
            context.design_choices.detailed_choices.push(choice.clone());
            Ok(choice)
        })
        .await
    }

    /// Best recorded design choice that speaks to an issue with authority
    pub async fn design_guidance(&self, project_id: &str, issue: &str) -> CoreResult<Option<DesignChoice>> {
        let context = self.get(project_id).await?;
        let terms = significant_terms(issue);
        if terms.is_empty() {
            return Ok(None);
        }

        let guidance = context
            .design_choices
            .detailed_choices
            .iter()
            .filter(|choice| choice.confidence >= AUTHORITATIVE_CONFIDENCE)
            .filter(|choice| {
                let haystack = format!(
                    "{} {} {}",
                    choice.category, choice.decision, choice.reasoning
                )
                .to_lowercase();
                terms.iter().any(|term| haystack.contains(term.as_str()))
            })
            .max_by_key(|choice| (choice.confidence, choice.last_reviewed))
            .cloned();

        Ok(guidance)
    }

    /// Appends to the implementation log
    pub async fn log_implementation(&self, project_id: &str, entry: ImplementationLogEntry) -> CoreResult<ImplementationLogEntry> {
        self.write(project_id, move |context| {
            context.implementation_log.push(entry.clone());
            Ok(entry)
        })
        .await
    }

    /// Creates or updates an agent's behavior profile
    ///
    /// A new profile gets every priority populated with defaults. An existing
    /// one only has its custom instructions, author and timestamp replaced.
    pub async fn upsert_agent_profile(
        &self,
        project_id: &str,
        agent_name: &str,
        instruction: &str,
        updated_by: &str,
    ) -> CoreResult<AgentBehaviorProfile> {
        let agent_name = agent_name.to_string();
        let instruction = instruction.to_string();
        let updated_by = updated_by.to_string();

        self.write(project_id, move |context| {
            let project = context.project_id.clone();
            let profile = context
                .agent_profiles
                .entry(agent_name.clone())
                .and_modify(|profile| profile.apply_instruction(instruction.clone(), updated_by.clone()))
                .or_insert_with(|| AgentBehaviorProfile::new(agent_name, project, instruction, updated_by));
            Ok(profile.clone())
        })
        .await
    }

    pub async fn get_agent_profile(&self, project_id: &str, agent_name: &str) -> CoreResult<Option<AgentBehaviorProfile>> {
        let context = self.get(project_id).await?;
        Ok(context.agent_profiles.get(agent_name).cloned())
    }

    pub async fn add_blocker(&self, project_id: &str, blocker: Blocker) -> CoreResult<Blocker> {
        self.write(project_id, move |context| {
            context.active_context.blockers.push(blocker.clone());
            Ok(blocker)
        })
        .await
    }

    /// Removes an open blocker, returning it
    pub async fn resolve_blocker(&self, project_id: &str, blocker_id: Uuid) -> CoreResult<Blocker> {
        self.write(project_id, move |context| {
            let blockers = &mut context.active_context.blockers;
            let index = blockers
                .iter()
                .position(|b| b.id == blocker_id)
                .ok_or_else(|| CoreError::not_found("Blocker", blocker_id))?;
            Ok(blockers.remove(index))
        })
        .await
    }

    pub async fn record_instruction(&self, project_id: &str, record: InstructionRecord) -> CoreResult<()> {
        self.write(project_id, move |context| {
            context.instruction_log.push(record);
            Ok(())
        })
        .await
    }

    pub async fn record_resolution(&self, project_id: &str, record: ResolutionRecord) -> CoreResult<()> {
        self.write(project_id, move |context| {
            context.resolution_log.push(record);
            Ok(())
        })
        .await
    }

    /// Inserts tasks into the active task list, replacing any with the same id
    pub async fn upsert_tasks(&self, project_id: &str, tasks: Vec<Task>) -> CoreResult<Vec<Task>> {
        self.write(project_id, move |context| {
            for task in &tasks {
                match context.task_mut(task.id) {
                    Some(existing) => *existing = task.clone(),
                    None => context.active_context.active_tasks.push(task.clone()),
                }
            }
            Ok(tasks)
        })
        .await
    }

    /// Mutates one task in place
    pub async fn update_task<F>(&self, project_id: &str, task_id: Uuid, mutate: F) -> CoreResult<Task>
    where
        F: FnOnce(&mut Task) -> CoreResult<()> + Send,
    {
        self.write(project_id, move |context| {
            let task = context
                .task_mut(task_id)
                .ok_or_else(|| CoreError::not_found("Task", task_id))?;
            mutate(task)?;
            Ok(task.clone())
        })
        .await
    }
}

#[async_trait]
impl DesignAuthority for ContextStore {
    async fn design_guidance(&self, project_id: &str, issue: &str) -> CoreResult<Option<DesignChoice>> {
        ContextStore::design_guidance(self, project_id, issue).await
    }

    async fn merge_requirements(&self, project_id: &str, requirement_ids: Vec<Uuid>) -> CoreResult<Requirement> {
        ContextStore::merge_requirements(self, project_id, requirement_ids).await
    }
}

/// Lowercased words long enough to carry meaning
pub(crate) fn significant_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= 4)
        .map(|word| word.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::DesignCategory;
    use crate::infrastructure::repositories::{InMemoryContextRepository, InMemoryRemoteStore};
    use chrono::Utc;

    fn store() -> ContextStore {
        ContextStore::new(Arc::new(InMemoryContextRepository::new()), None, EventBus::new(64))
    }

    async fn seeded() -> ContextStore {
        let store = store();
        store
            .create_project("p1", ProjectVision::new("Shop", "Online shop"), vec![])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn get_unknown_project_is_not_found() {
        let result = store().get("nope").await;
        assert!(matches!(result, Err(CoreError::NotFound { kind: "Project", .. })));
    }

    #[tokio::test]
    async fn get_is_idempotent() {
        let store = seeded().await;
        let first = store.get("p1").await.unwrap();
        let second = store.get("p1").await.unwrap();

        assert_eq!(first.version(), second.version());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn duplicate_project_is_rejected() {
        let store = seeded().await;
        let result = store.create_project("p1", ProjectVision::new("Again", ""), vec![]).await;
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn update_rejects_stale_version() {
        let store = seeded().await;
        let read = store.get("p1").await.unwrap();

        let mut patch = ContextPatch::expecting(read.version());
        patch.tags = Some(vec!["retail".to_string()]);
        let updated = store.update("p1", patch).await.unwrap();
        assert_eq!(updated.version(), read.version() + 1);

        let mut stale = ContextPatch::expecting(read.version());
        stale.tags = Some(vec!["lost".to_string()]);
        let result = store.update("p1", stale).await;

        assert!(matches!(
            result,
            Err(CoreError::StaleVersion { expected: 1, actual: 2 })
        ));
        assert_eq!(store.get("p1").await.unwrap().metadata.tags, vec!["retail".to_string()]);
    }

    #[tokio::test]
    async fn every_write_bumps_version_once_and_emits() {
        let store = seeded().await;
        let mut events = store.events.subscribe();

        store
            .log_implementation("p1", ImplementationLogEntry::new("Zola", "use axum", "api layer"))
            .await
            .unwrap();
        store
            .add_blocker("p1", Blocker::new("CI is down", Priority::High))
            .await
            .unwrap();

        assert_eq!(store.get("p1").await.unwrap().version(), 3);
        let versions: Vec<u64> = events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                DomainEvent::ContextUpdated { context, .. } => Some(context.version()),
                _ => None,
            })
            .collect();
        assert_eq!(versions, vec![2, 3]);
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_updates() {
        let store = Arc::new(seeded().await);
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .log_implementation("p1", ImplementationLogEntry::new("Nexus", format!("step {i}"), ""))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let context = store.get("p1").await.unwrap();
        assert_eq!(context.implementation_log.len(), 20);
        assert_eq!(context.version(), 21);
    }

    #[tokio::test]
    async fn failed_write_leaves_context_untouched() {
        let store = seeded().await;
        let result = store
            .update_requirement("p1", Uuid::new_v4(), RequirementUpdate::default())
            .await;

        assert!(matches!(result, Err(CoreError::NotFound { kind: "Requirement", .. })));
        assert_eq!(store.get("p1").await.unwrap().version(), 1);
    }

    #[tokio::test]
    async fn requirements_are_filed_by_wording() {
        let store = seeded().await;
        store
            .add_requirement("p1", Requirement::new("Checkout with saved cards", Priority::High))
            .await
            .unwrap();
        store
            .add_requirement("p1", Requirement::new("Security review of payment flow", Priority::Critical))
            .await
            .unwrap();

        let context = store.get("p1").await.unwrap();
        assert_eq!(context.requirements.functional.len(), 1);
        assert_eq!(context.requirements.non_functional.len(), 1);
    }

    #[tokio::test]
    async fn merge_keeps_highest_priority_requirement() {
        let store = seeded().await;
        let mut low = Requirement::new("Export orders as CSV", Priority::Low);
        low.acceptance_criteria.push("CSV has header row".to_string());
        let high = Requirement::new("Export orders", Priority::High);
        store.add_requirement("p1", low.clone()).await.unwrap();
        store.add_requirement("p1", high.clone()).await.unwrap();

        let survivor = store.merge_requirements("p1", vec![low.id, high.id]).await.unwrap();

        assert_eq!(survivor.id, high.id);
        assert_eq!(survivor.acceptance_criteria, vec!["CSV has header row".to_string()]);
        let context = store.get("p1").await.unwrap();
        let deferred = context.requirements.iter().find(|r| r.id == low.id).unwrap();
        assert_eq!(deferred.status, RequirementStatus::Deferred);
        assert_eq!(deferred.implementation_notes.as_deref(), Some(format!("merged into {}", high.id).as_str()));
    }

    #[tokio::test]
    async fn upsert_profile_creates_then_updates_instructions_only() {
        let store = seeded().await;
        let created = store
            .upsert_agent_profile("p1", "Zola", "Prefer small modules", "user")
            .await
            .unwrap();
        assert_eq!(created.priorities.security, 9);

        let updated = store
            .upsert_agent_profile("p1", "Zola", "Document every endpoint", "Elara")
            .await
            .unwrap();

        assert_eq!(updated.custom_instructions, "Document every endpoint");
        assert_eq!(updated.updated_by, "Elara");
        assert_eq!(updated.priorities, created.priorities);
        assert_eq!(updated.code_style, created.code_style);
        assert_eq!(updated.libraries, created.libraries);
    }

    #[tokio::test]
    async fn resolve_unknown_blocker_is_not_found() {
        let store = seeded().await;
        let blocker = store.add_blocker("p1", Blocker::new("Waiting on keys", Priority::Medium)).await.unwrap();

        assert_eq!(store.resolve_blocker("p1", blocker.id).await.unwrap().id, blocker.id);
        assert!(store.resolve_blocker("p1", blocker.id).await.is_err());
    }

    #[tokio::test]
    async fn design_guidance_requires_confident_match() {
        let store = seeded().await;
        let choice = |decision: &str, confidence: u8| DesignChoice {
            category: DesignCategory::Architecture,
            decision: decision.to_string(),
            reasoning: "team knows it".to_string(),
            alternatives: vec![],
            impact: String::new(),
            confidence,
            last_reviewed: Utc::now(),
            reviewed_by: "user".to_string(),
        };
        store.add_design_choice("p1", choice("Use GraphQL gateway", 40)).await.unwrap();
        assert!(store.design_guidance("p1", "graphql or rest").await.unwrap().is_none());

        store.add_design_choice("p1", choice("Use GraphQL gateway", 90)).await.unwrap();
        let guidance = store.design_guidance("p1", "graphql or rest").await.unwrap().unwrap();
        assert_eq!(guidance.confidence, 90);
    }

    #[tokio::test]
    async fn get_falls_back_to_remote_and_caches() {
        let remote = Arc::new(InMemoryRemoteStore::new());
        remote.put(ProjectContext::new("shared", ProjectVision::new("Shared", ""), vec![]));
        let local = Arc::new(InMemoryContextRepository::new());
        let store = ContextStore::new(
            local.clone(),
            Some(remote as Arc<dyn RemoteContextStore>),
            EventBus::new(8),
        );

        let context = store.get("shared").await.unwrap();

        assert_eq!(context.vision.title, "Shared");
        assert!(local.load("shared").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_task_applies_in_place() {
        let store = seeded().await;
        let task = Task::new("Write docs", "", Priority::Low, crate::domain::task::Complexity::Simple, 60);
        store.upsert_tasks("p1", vec![task.clone()]).await.unwrap();

        let updated = store
            .update_task("p1", task.id, |t| {
                t.guidance.push("keep it short".to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(updated.guidance, vec!["keep it short".to_string()]);
        assert_eq!(store.get("p1").await.unwrap().tasks().len(), 1);
    }
}
