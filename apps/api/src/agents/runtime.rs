use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::json;
use tokio::sync::{broadcast, mpsc};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::generation::{GenerationOutput, GenerationProvider};
use super::merge::{self, MergeRefusal};
use super::messages::{AgentMessage, DirectDelivery, MessageBus, MessageType};
use super::performance::PerformanceHistory;
use super::prompts::library;
use super::types::TaskOutcome;
use super::worker::AgentSession;
use crate::context_store::ContextStore;
use crate::domain::agent::{AgentName, AgentStatus};
use crate::domain::conflict::{MergeConflict, Resolution, ResolutionStrategy};
use crate::domain::events::DomainEvent;
use crate::domain::project::ImplementationLogEntry;
use crate::domain::task::{Complexity, Task};
use crate::errors::{CoreError, CoreResult};
use crate::infrastructure::EventBus;
use crate::resolver::MergeHandler;

const RUNTIME: &str = "agent_runtime";

type SessionKey = (String, AgentName);

/// Manages agent sessions, task execution and agent messaging
///
/// Session state is only mutated through this type. A session is changed
/// under its map entry's write lock, which makes the idle -> thinking claim
/// an atomic check-and-set.
pub struct AgentRuntime {
    context: Arc<ContextStore>,
    generator: Arc<dyn GenerationProvider>,
    events: EventBus,
    sessions: DashMap<SessionKey, AgentSession>,
    /// Only locked for non-blocking drains, never across an await
    inboxes: DashMap<SessionKey, Arc<Mutex<mpsc::UnboundedReceiver<AgentMessage>>>>,
    buses: DashMap<String, Arc<MessageBus>>,
    performance: PerformanceHistory,
    tracker: TaskTracker,
    replay_capacity: usize,
}

impl AgentRuntime {
    pub fn new(
        context: Arc<ContextStore>,
        generator: Arc<dyn GenerationProvider>,
        events: EventBus,
        replay_capacity: usize,
    ) -> Self {
        Self {
            context,
            generator,
            events,
            sessions: DashMap::new(),
            inboxes: DashMap::new(),
            buses: DashMap::new(),
            performance: PerformanceHistory::new(),
            tracker: TaskTracker::new(),
            replay_capacity,
        }
    }

    fn bus(&self, project_id: &str) -> Arc<MessageBus> {
        self.buses
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(MessageBus::new(project_id, self.replay_capacity)))
            .value()
            .clone()
    }

    fn key(project_id: &str, name: AgentName) -> SessionKey {
        (project_id.to_string(), name)
    }

    // ---- lifecycle ----

    /// Spawns sessions for the given agents, or the whole roster when empty
    ///
    /// Agents that already have a session keep it unchanged.
    pub async fn initialize_agents(&self, project_id: &str, names: &[AgentName]) -> CoreResult<Vec<AgentSession>> {
        self.context.get(project_id).await?;

        let names: Vec<AgentName> = if names.is_empty() {
            AgentName::ROSTER.to_vec()
        } else {
            names.to_vec()
        };

        let bus = self.bus(project_id);
        for name in names {
            let key = Self::key(project_id, name);
            match self.sessions.entry(key.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    vacant.insert(AgentSession::new(project_id, name));
                }
            }
            let inbox = bus.register_inbox(name.as_str());
            self.inboxes.insert(key, Arc::new(Mutex::new(inbox)));
            info!(project_id, agent = %name, "Agent session started");
        }

        Ok(self.sessions(project_id))
    }

    /// Ends an agent's session
    ///
    /// # Returns
    /// * `Err(CoreError::AgentBusy)` - If the agent still holds a task
    pub fn terminate_agent(&self, project_id: &str, name: AgentName) -> CoreResult<AgentSession> {
        let key = Self::key(project_id, name);
        if let Some((_, session)) = self.sessions.remove_if(&key, |_, s| !s.status.is_working()) {
            self.bus(project_id).unregister_inbox(name.as_str());
            self.inboxes.remove(&key);
            info!(project_id, agent = %name, "Agent session terminated");
            return Ok(session);
        }

        match self.sessions.get(&key) {
            Some(session) => Err(CoreError::AgentBusy {
                agent: name.to_string(),
                status: session.status.to_string(),
            }),
            None => Err(CoreError::not_found("Agent session", name)),
        }
    }

    pub fn session(&self, project_id: &str, name: AgentName) -> CoreResult<AgentSession> {
        self.sessions
            .get(&Self::key(project_id, name))
            .map(|s| s.value().clone())
            .ok_or_else(|| CoreError::not_found("Agent session", name))
    }

    pub fn agent_status(&self, project_id: &str, name: AgentName) -> CoreResult<AgentStatus> {
        self.session(project_id, name).map(|s| s.status)
    }

    pub fn has_live_session(&self, project_id: &str, name: AgentName) -> bool {
        self.sessions.contains_key(&Self::key(project_id, name))
    }

    /// Sessions of a project in roster order
    pub fn sessions(&self, project_id: &str) -> Vec<AgentSession> {
        let mut sessions: Vec<AgentSession> = self
            .sessions
            .iter()
            .filter(|entry| entry.key().0 == project_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by_key(|s| s.name);
        sessions
    }

    pub fn idle_agents(&self, project_id: &str) -> Vec<AgentName> {
        self.sessions(project_id)
            .into_iter()
            .filter(|s| s.status == AgentStatus::Idle)
            .map(|s| s.name)
            .collect()
    }

    /// Mutates one session under its entry lock and reports the status change
    fn update_session<T, F>(&self, project_id: &str, name: AgentName, mutate: F) -> CoreResult<T>
    where
        F: FnOnce(&mut AgentSession) -> CoreResult<T>,
    {
        let (value, from, to) = {
            let mut session = self
                .sessions
                .get_mut(&Self::key(project_id, name))
                .ok_or_else(|| CoreError::not_found("Agent session", name))?;
            let from = session.status;
            let value = mutate(session.value_mut())?;
            (value, from, session.status)
        };

        if from != to {
            debug!(project_id, agent = %name, %from, %to, "Agent status changed");
            self.events.publish(DomainEvent::AgentStatusChange {
                project_id: project_id.to_string(),
                agent: name,
                from,
                to,
            });
        }
        Ok(value)
    }

    /// Atomically moves an idle agent to thinking on a task
    ///
    /// # Returns
    /// * `Err(CoreError::AgentBusy)` - If the agent is not idle. Never retried.
    pub fn claim(&self, project_id: &str, name: AgentName, task_id: Uuid) -> CoreResult<()> {
        self.update_session(project_id, name, |session| session.assign_task(task_id))
    }

    /// Returns a working agent to idle
    pub fn release(&self, project_id: &str, name: AgentName) -> CoreResult<()> {
        self.update_session(project_id, name, |session| session.finish())
    }

    pub fn block_agent(&self, project_id: &str, name: AgentName) -> CoreResult<()> {
        self.update_session(project_id, name, |session| session.block())
    }

    pub fn unblock_agent(&self, project_id: &str, name: AgentName) -> CoreResult<()> {
        self.update_session(project_id, name, |session| session.unblock())
    }

    pub fn performance(&self) -> &PerformanceHistory {
        &self.performance
    }

    pub fn performance_score(&self, name: AgentName, complexity: Complexity) -> f64 {
        self.performance.score(name, complexity)
    }

    // ---- execution ----

    /// Runs a claimed task to completion
    ///
    /// Generation failures are converted into a blocked task and an idle agent.
    /// Only a call for a task the agent does not hold is an error.
    pub async fn execute_task(&self, project_id: &str, agent: AgentName, task: Task) -> CoreResult<TaskOutcome> {
        let work = if is_verification(&task) {
            AgentStatus::Testing
        } else {
            AgentStatus::Coding
        };
        self.update_session(project_id, agent, |session| {
            if !session.is_holding(task.id) {
                return Err(CoreError::InvalidInput(format!(
                    "{} does not hold task {}",
                    agent, task.id
                )));
            }
            session.begin(work)
        })?;

        let (prompt, context_slice) = self.task_prompt(project_id, agent, &task).await;
        debug!(project_id, agent = %agent, task_id = %task.id, "Requesting generation");

        let outcome = match self.generator.generate(&prompt, &context_slice).await {
            Ok(output) => self.complete_task(project_id, agent, &task, output).await,
            Err(e) => {
                self.fail_task(project_id, agent, task.id, task.complexity, e.to_string())
                    .await
            }
        };
        Ok(outcome)
    }

    /// Fire-and-forget execution under supervision
    ///
    /// The outcome is published on the event bus as `task_completed` or
    /// `task_blocked`. A panicking execution is turned into a blocked task.
    pub fn spawn_execution(self: &Arc<Self>, project_id: &str, agent: AgentName, task: Task) {
        let runtime = Arc::clone(self);
        let project_id = project_id.to_string();

        self.tracker.spawn(async move {
            let task_id = task.id;
            let complexity = task.complexity;

            let worker = Arc::clone(&runtime);
            let worker_project = project_id.clone();
            let handle =
                tokio::spawn(async move { worker.execute_task(&worker_project, agent, task).await });

            match handle.await {
                Ok(Ok(outcome)) => {
                    debug!(project_id = %project_id, %task_id, completed = outcome.is_completed(), "Execution finished")
                }
                Ok(Err(e)) => {
                    warn!(project_id = %project_id, agent = %agent, %task_id, error = %e, "Execution refused")
                }
                Err(join_error) => {
                    error!(project_id = %project_id, agent = %agent, %task_id, error = %join_error, "Execution aborted");
                    runtime
                        .fail_task(
                            &project_id,
                            agent,
                            task_id,
                            complexity,
                            format!("Execution aborted: {}", join_error),
                        )
                        .await;
                }
            }
        });
    }

    /// Waits until every spawned execution has finished
    pub async fn wait_for_executions(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    async fn task_prompt(&self, project_id: &str, agent: AgentName, task: &Task) -> (String, String) {
        let context = self.context.get(project_id).await.ok();

        let mut variables: HashMap<String, String> = HashMap::new();
        variables.insert("agent".into(), agent.to_string());
        variables.insert("capabilities".into(), agent.capabilities().join(", "));
        variables.insert("title".into(), task.title.clone());
        variables.insert("description".into(), task.description.clone());
        variables.insert("priority".into(), task.priority.to_string());
        variables.insert("complexity".into(), task.complexity.to_string());
        variables.insert(
            "guidance".into(),
            if task.guidance.is_empty() {
                "none".to_string()
            } else {
                task.guidance.join("; ")
            },
        );

        let profile = context
            .as_ref()
            .and_then(|c| c.agent_profiles.get(agent.as_str()))
            .map(|p| p.custom_instructions.clone())
            .unwrap_or_else(|| "default".to_string());
        variables.insert("profile".into(), profile);
        variables.insert(
            "project".into(),
            context
                .as_ref()
                .map(|c| c.vision.title.clone())
                .unwrap_or_else(|| project_id.to_string()),
        );

        let slice = context
            .map(|c| json!({ "vision": c.vision, "requirements": c.requirements }).to_string())
            .unwrap_or_default();

        (library::task_execution().render_full(&variables), slice)
    }

    async fn complete_task(
        &self,
        project_id: &str,
        agent: AgentName,
        task: &Task,
        output: GenerationOutput,
    ) -> TaskOutcome {
        let task_id = task.id;
        let tokens_used = output.tokens_used;
        let cost = output.cost;
        let template = library::task_execution();

        // The task leaves in_progress before the agent goes idle
        let recorded = self
            .context
            .write(project_id, move |context| {
                let stored = context
                    .task_mut(task_id)
                    .ok_or_else(|| CoreError::not_found("Task", task_id))?;
                stored.complete()?;
                let minutes = minutes_between(stored.started_at, stored.completed_at);
                let entry = ImplementationLogEntry::new(
                    agent.as_str(),
                    format!("Completed task: {}", stored.title),
                    format!("{} tokens", tokens_used),
                )
                .with_task(task_id)
                .with_details(json!({
                    "tokens_used": tokens_used,
                    "cost": cost.to_string(),
                    "prompt": format!("{}@{}", template.name, template.version),
                }));
                context.implementation_log.push(entry);
                Ok(minutes)
            })
            .await;

        let minutes = match recorded {
            Ok(minutes) => minutes,
            Err(e) => {
                return self
                    .fail_task(
                        project_id,
                        agent,
                        task_id,
                        task.complexity,
                        format!("Could not record completion: {}", e),
                    )
                    .await;
            }
        };

        self.finish_session(project_id, agent);
        self.performance.record_success(agent, task.complexity, minutes);

        self.bus(project_id)
            .broadcast(
                agent.as_str(),
                MessageType::TaskComplete,
                json!({ "task_id": task_id, "title": task.title, "tokens_used": tokens_used }),
            )
            .await;
        self.events.publish(DomainEvent::TaskCompleted {
            project_id: project_id.to_string(),
            task_id,
            agent,
            tokens_used,
            cost,
        });

        info!(project_id, agent = %agent, %task_id, tokens_used, "Task completed");
        TaskOutcome::Completed {
            task_id,
            agent,
            content: output.content,
            tokens_used,
            cost,
        }
    }

    async fn fail_task(
        &self,
        project_id: &str,
        agent: AgentName,
        task_id: Uuid,
        complexity: Complexity,
        reason: String,
    ) -> TaskOutcome {
        warn!(project_id, agent = %agent, %task_id, reason = %reason, "Task blocked");

        if let Err(e) = self.context.update_task(project_id, task_id, |task| task.block()).await {
            warn!(project_id, %task_id, error = %e, "Could not mark task blocked");
        }
        self.finish_session(project_id, agent);
        self.performance.record_failure(agent, complexity);

        self.bus(project_id)
            .broadcast(
                agent.as_str(),
                MessageType::StatusUpdate,
                json!({ "status": "failed", "task_id": task_id, "reason": reason }),
            )
            .await;
        self.events.publish(DomainEvent::TaskBlocked {
            project_id: project_id.to_string(),
            task_id,
            agent,
            reason: reason.clone(),
        });

        TaskOutcome::Blocked {
            task_id,
            agent,
            reason,
        }
    }

    fn finish_session(&self, project_id: &str, agent: AgentName) {
        if let Err(e) = self.release(project_id, agent) {
            warn!(project_id, agent = %agent, error = %e, "Could not return agent to idle");
        }
    }

    // ---- messaging ----

    pub async fn broadcast_message(
        &self,
        project_id: &str,
        from: &str,
        message_type: MessageType,
        content: serde_json::Value,
    ) -> AgentMessage {
        self.bus(project_id).broadcast(from, message_type, content).await
    }

    pub async fn send_direct_message(
        &self,
        project_id: &str,
        from: &str,
        to: &str,
        message_type: MessageType,
        content: serde_json::Value,
    ) -> DirectDelivery {
        self.bus(project_id)
            .send_direct(from, to, message_type, content)
            .await
    }

    pub async fn recent_messages(&self, project_id: &str) -> Vec<AgentMessage> {
        self.bus(project_id).recent().await
    }

    pub fn subscribe_messages(&self, project_id: &str) -> broadcast::Receiver<AgentMessage> {
        self.bus(project_id).subscribe()
    }

    /// Hands the agent's inbox to a consumer; later reads through the runtime see nothing
    pub fn take_inbox(&self, project_id: &str, name: AgentName) -> Option<mpsc::UnboundedReceiver<AgentMessage>> {
        let (_, inbox) = self.inboxes.remove(&Self::key(project_id, name))?;
        let mut receiver = inbox.lock().unwrap_or_else(PoisonError::into_inner);
        let (_, placeholder) = mpsc::unbounded_channel();
        Some(std::mem::replace(&mut *receiver, placeholder))
    }

    /// Drains whatever is queued in the agent's inbox
    ///
    /// A concurrent drain of the same inbox is waited out, so an empty result
    /// means nothing was queued.
    pub fn drain_inbox(&self, project_id: &str, name: AgentName) -> Vec<AgentMessage> {
        let Some(inbox) = self
            .inboxes
            .get(&Self::key(project_id, name))
            .map(|entry| Arc::clone(entry.value()))
        else {
            debug!(project_id, agent = %name, "No inbox registered");
            return Vec::new();
        };

        let mut receiver = inbox.lock().unwrap_or_else(PoisonError::into_inner);
        let mut messages = Vec::new();
        while let Ok(message) = receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    // ---- merge ladder ----

    /// Auto-merge, then agent consensus, then manual intervention
    pub async fn resolve_merge(&self, project_id: &str, conflict: &MergeConflict) -> Resolution {
        match merge::auto_merge(conflict) {
            Ok(content) => {
                debug!(project_id, conflict_id = %conflict.id, "Merged without overlap");
                return Resolution::new(ResolutionStrategy::AutoMerge, RUNTIME)
                    .with_content(content)
                    .with_notes(format!("Merged {} change(s) to {}", conflict.agent_changes.len(), conflict.file));
            }
            Err(MergeRefusal::InvalidRange { agent, line_start, line_end }) => {
                return Resolution::manual(
                    RUNTIME,
                    format!("{} submitted an invalid range {}-{}", agent, line_start, line_end),
                );
            }
            Err(MergeRefusal::Overlap) => {}
        }

        let involved = conflict.involved_agents();
        let mut variables = HashMap::new();
        variables.insert("file".to_string(), conflict.file.clone());
        variables.insert("agents".to_string(), involved.join(", "));
        variables.insert("base".to_string(), conflict.base_version.clone());
        let review = library::conflict_review().render(&variables);

        let bus = self.bus(project_id);
        let mut unreachable = Vec::new();
        for agent in &involved {
            bus.send_direct(
                RUNTIME,
                agent,
                MessageType::Conflict,
                json!({ "conflict_id": conflict.id, "file": conflict.file, "review": review }),
            )
            .await;

            let live = agent
                .parse::<AgentName>()
                .map(|name| self.has_live_session(project_id, name))
                .unwrap_or(false);
            if !live {
                unreachable.push(agent.clone());
            }
        }

        if unreachable.is_empty() && !involved.is_empty() {
            info!(project_id, conflict_id = %conflict.id, "Agents settled on the base version");
            return Resolution::new(ResolutionStrategy::AgentConsensus, RUNTIME)
                .with_content(conflict.base_version.clone())
                .with_notes(format!("{} accepted the base version", involved.join(", ")));
        }

        Resolution::manual(
            RUNTIME,
            format!(
                "Overlapping edits to {}; no session for {}",
                conflict.file,
                unreachable.join(", ")
            ),
        )
    }
}

#[async_trait]
impl MergeHandler for AgentRuntime {
    async fn handle_merge_conflict(&self, project_id: &str, conflict: &MergeConflict) -> CoreResult<Resolution> {
        Ok(self.resolve_merge(project_id, conflict).await)
    }
}

/// Review, audit and test tasks are worked in the testing status
fn is_verification(task: &Task) -> bool {
    let text = task.keywords();
    ["test", "audit", "review"].iter().any(|word| text.contains(word))
}

fn minutes_between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> f64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_milliseconds().max(0) as f64 / 60_000.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conflict::AgentChange;
    use crate::domain::project::ProjectVision;
    use crate::domain::task::TaskStatus;
    use crate::domain::value_objects::Priority;
    use crate::infrastructure::repositories::InMemoryContextRepository;
    use crate::infrastructure::OfflineGenerator;

    struct FailingGenerator;

    #[async_trait]
    impl GenerationProvider for FailingGenerator {
        async fn generate(&self, _prompt: &str, _context: &str) -> CoreResult<GenerationOutput> {
            Err(CoreError::GenerationFailure("provider timed out".to_string()))
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl GenerationProvider for PanickingGenerator {
        async fn generate(&self, _prompt: &str, _context: &str) -> CoreResult<GenerationOutput> {
            panic!("provider crashed")
        }
    }

    async fn runtime_with(generator: Arc<dyn GenerationProvider>) -> (Arc<AgentRuntime>, Arc<ContextStore>) {
        let events = EventBus::new(256);
        let store = Arc::new(ContextStore::new(
            Arc::new(InMemoryContextRepository::new()),
            None,
            events.clone(),
        ));
        store
            .create_project("p1", ProjectVision::new("Shop", ""), vec![])
            .await
            .unwrap();
        let runtime = Arc::new(AgentRuntime::new(store.clone(), generator, events, 50));
        runtime.initialize_agents("p1", &[]).await.unwrap();
        (runtime, store)
    }

    /// Claims the agent and stores the task as in progress, like assignment does
    async fn assigned(runtime: &AgentRuntime, store: &ContextStore, agent: AgentName, title: &str) -> Task {
        let task = Task::new(title, "", Priority::High, Complexity::Moderate, 120);
        store.upsert_tasks("p1", vec![task.clone()]).await.unwrap();
        runtime.claim("p1", agent, task.id).unwrap();
        store
            .update_task("p1", task.id, move |t| t.start(agent))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn initialize_spawns_roster_once() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;
        runtime.claim("p1", AgentName::Kofi, Uuid::new_v4()).unwrap();

        let sessions = runtime.initialize_agents("p1", &[AgentName::Kofi]).await.unwrap();

        assert_eq!(sessions.len(), 5);
        assert_eq!(sessions[0].name, AgentName::Zola);
        assert_eq!(runtime.agent_status("p1", AgentName::Kofi).unwrap(), AgentStatus::Thinking);
    }

    #[tokio::test]
    async fn initialize_requires_known_project() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;
        assert!(matches!(
            runtime.initialize_agents("ghost", &[]).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;

        runtime.claim("p1", AgentName::Zola, Uuid::new_v4()).unwrap();
        let second = runtime.claim("p1", AgentName::Zola, Uuid::new_v4());

        assert!(matches!(second, Err(CoreError::AgentBusy { .. })));
    }

    #[tokio::test]
    async fn concurrent_claims_book_an_agent_once() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;
        let mut handles = Vec::new();
        for _ in 0..16 {
            let runtime = Arc::clone(&runtime);
            handles.push(tokio::spawn(async move {
                runtime.claim("p1", AgentName::Nexus, Uuid::new_v4()).is_ok()
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn successful_execution_completes_task_before_idling_agent() {
        let (runtime, store) = runtime_with(Arc::new(OfflineGenerator::new())).await;
        let task = assigned(&runtime, &store, AgentName::Zola, "Build API").await;
        let mut messages = runtime.subscribe_messages("p1");

        let outcome = runtime.execute_task("p1", AgentName::Zola, task.clone()).await.unwrap();

        assert!(outcome.is_completed());
        let context = store.get("p1").await.unwrap();
        let stored = context.task(task.id).unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert!(stored.completed_at.is_some());
        assert_eq!(context.implementation_log.len(), 1);
        assert_eq!(runtime.agent_status("p1", AgentName::Zola).unwrap(), AgentStatus::Idle);
        assert_eq!(messages.recv().await.unwrap().message_type, MessageType::TaskComplete);
        assert_eq!(runtime.performance().record(AgentName::Zola, Complexity::Moderate).completed, 1);
    }

    #[tokio::test]
    async fn generation_failure_blocks_task_and_frees_agent() {
        let (runtime, store) = runtime_with(Arc::new(FailingGenerator)).await;
        let task = assigned(&runtime, &store, AgentName::Jabari, "Security audit").await;
        let mut events = store_events(&runtime);

        let outcome = runtime.execute_task("p1", AgentName::Jabari, task.clone()).await.unwrap();

        assert!(matches!(outcome, TaskOutcome::Blocked { ref reason, .. } if reason.contains("timed out")));
        assert_eq!(store.get("p1").await.unwrap().task(task.id).unwrap().status, TaskStatus::Blocked);
        assert_eq!(runtime.agent_status("p1", AgentName::Jabari).unwrap(), AgentStatus::Idle);

        let recent = runtime.recent_messages("p1").await;
        assert_eq!(recent.last().unwrap().content["status"], "failed");
        assert!(events.drain().iter().any(|e| e.topic() == "task_blocked"));
    }

    fn store_events(runtime: &AgentRuntime) -> crate::infrastructure::EventReceiver {
        runtime.events.subscribe()
    }

    #[tokio::test]
    async fn panicking_execution_is_contained() {
        let (runtime, store) = runtime_with(Arc::new(PanickingGenerator)).await;
        let task = assigned(&runtime, &store, AgentName::Kofi, "Deploy staging").await;

        runtime.spawn_execution("p1", AgentName::Kofi, task.clone());
        runtime.wait_for_executions().await;

        assert_eq!(store.get("p1").await.unwrap().task(task.id).unwrap().status, TaskStatus::Blocked);
        assert_eq!(runtime.agent_status("p1", AgentName::Kofi).unwrap(), AgentStatus::Idle);
    }

    #[tokio::test]
    async fn execution_requires_the_claim() {
        let (runtime, store) = runtime_with(Arc::new(OfflineGenerator::new())).await;
        let task = Task::new("Docs", "", Priority::Low, Complexity::Simple, 60);
        store.upsert_tasks("p1", vec![task.clone()]).await.unwrap();

        let result = runtime.execute_task("p1", AgentName::Nexus, task).await;
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn busy_agent_cannot_be_terminated() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;
        runtime.claim("p1", AgentName::Abeni, Uuid::new_v4()).unwrap();

        assert!(matches!(
            runtime.terminate_agent("p1", AgentName::Abeni),
            Err(CoreError::AgentBusy { .. })
        ));
        assert!(runtime.terminate_agent("p1", AgentName::Zola).is_ok());
        assert!(!runtime.has_live_session("p1", AgentName::Zola));
    }

    #[tokio::test]
    async fn direct_message_reaches_session_inbox() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;

        let delivery = runtime
            .send_direct_message("p1", "Zola", "Jabari", MessageType::RequestHelp, json!("review"))
            .await;

        assert!(delivery.delivered);
        assert_eq!(runtime.drain_inbox("p1", AgentName::Jabari).len(), 1);
        assert!(runtime.drain_inbox("p1", AgentName::Jabari).is_empty());
    }

    #[tokio::test]
    async fn contended_drain_waits_for_the_inbox() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;
        runtime
            .send_direct_message("p1", "Zola", "Jabari", MessageType::RequestHelp, json!("review"))
            .await;

        let inbox = runtime
            .inboxes
            .get(&AgentRuntime::key("p1", AgentName::Jabari))
            .map(|entry| Arc::clone(entry.value()))
            .unwrap();
        let locked = Arc::new(std::sync::Barrier::new(2));
        let holder = {
            let locked = Arc::clone(&locked);
            std::thread::spawn(move || {
                let _guard = inbox.lock().unwrap();
                locked.wait();
                std::thread::sleep(std::time::Duration::from_millis(50));
            })
        };
        locked.wait();

        let drained = runtime.drain_inbox("p1", AgentName::Jabari);
        holder.join().unwrap();

        assert_eq!(drained.len(), 1);
    }

    fn file_conflict(changes: Vec<(&str, usize, usize)>) -> MergeConflict {
        MergeConflict {
            id: Uuid::new_v4(),
            file: "src/routes.ts".to_string(),
            agent_changes: changes
                .into_iter()
                .map(|(agent, start, end)| AgentChange {
                    agent: agent.to_string(),
                    content: format!("// {agent}"),
                    line_start: start,
                    line_end: end,
                })
                .collect(),
            base_version: "a\nb\nc\nd".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn merge_ladder_tiers() {
        let (runtime, _) = runtime_with(Arc::new(OfflineGenerator::new())).await;

        let merged = runtime
            .resolve_merge("p1", &file_conflict(vec![("Zola", 1, 1), ("Abeni", 3, 4)]))
            .await;
        assert_eq!(merged.strategy, ResolutionStrategy::AutoMerge);
        assert_eq!(merged.resolved_content.as_deref(), Some("// Zola\nb\n// Abeni"));

        let consensus = runtime
            .resolve_merge("p1", &file_conflict(vec![("Zola", 1, 2), ("Abeni", 2, 3)]))
            .await;
        assert_eq!(consensus.strategy, ResolutionStrategy::AgentConsensus);
        assert_eq!(consensus.resolved_content.as_deref(), Some("a\nb\nc\nd"));

        runtime.terminate_agent("p1", AgentName::Abeni).unwrap();
        let manual = runtime
            .resolve_merge("p1", &file_conflict(vec![("Zola", 1, 2), ("Abeni", 2, 3)]))
            .await;
        assert_eq!(manual.strategy, ResolutionStrategy::ManualIntervention);
        assert!(manual.requires_user_input);
    }

    #[test]
    fn verification_tasks_are_detected() {
        let audit = Task::new("Security audit", "", Priority::High, Complexity::Moderate, 60);
        let build = Task::new("Build login", "", Priority::High, Complexity::Moderate, 60);
        assert!(is_verification(&audit));
        assert!(!is_verification(&build));
        assert_eq!(minutes_between(None, Some(Utc::now())), 0.0);
    }
}
