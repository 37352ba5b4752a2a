use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::assignment::{best_candidate, Assignment};
use super::classifier::Classifier;
use super::decomposition::decompose;
use super::progress::build_report;
use crate::agents::{AgentRuntime, MessageType};
use crate::context_store::ContextStore;
use crate::domain::agent::{AgentName, AgentStatus};
use crate::domain::conflict::{
    Conflict, ConflictContext, ConflictStatus, ConflictType, Resolution, ResolutionStrategy,
    SuggestedResolution,
};
use crate::domain::events::DomainEvent;
use crate::domain::progress::ProgressReport;
use crate::domain::project::{Blocker, ImplementationLogEntry, ResolutionRecord};
use crate::domain::repositories::ConflictRepository;
use crate::domain::task::{Task, TaskStatus};
use crate::domain::value_objects::Priority;
use crate::errors::{CoreError, CoreResult};
use crate::infrastructure::EventBus;
use crate::resolver::{default_suggestions, ConflictResolver, DesignAuthority, MergeHandler};

pub(super) const ORCHESTRATOR: &str = "orchestrator";

/// A conflict reported by an agent or a collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct NewConflict {
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    pub severity: Priority,
    pub involved_agents: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub context: ConflictContext,
    /// Left empty to get the default list for the type
    #[serde(default)]
    pub suggested_resolutions: Vec<SuggestedResolution>,
}

/// An explicit human decision on a conflict
#[derive(Debug, Clone, Deserialize)]
pub struct UserDecision {
    pub decision: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub decided_by: Option<String>,
}

/// Coordinates goal decomposition, task assignment, progress and conflicts
///
/// Owns no project state itself: project contexts are changed through the
/// [`ContextStore`] and agent sessions through the [`AgentRuntime`].
pub struct Orchestrator {
    pub(super) context: Arc<ContextStore>,
    pub(super) runtime: Arc<AgentRuntime>,
    resolver: ConflictResolver,
    conflicts: Arc<dyn ConflictRepository>,
    /// Serializes the lifecycle of each conflict from read to save
    conflict_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    pub(super) classifier: Arc<dyn Classifier>,
    events: EventBus,
}

impl Orchestrator {
    pub fn new(
        context: Arc<ContextStore>,
        runtime: Arc<AgentRuntime>,
        conflicts: Arc<dyn ConflictRepository>,
        classifier: Arc<dyn Classifier>,
        events: EventBus,
    ) -> Self {
        let merges: Arc<dyn MergeHandler> = runtime.clone();
        let design: Arc<dyn DesignAuthority> = context.clone();
        Self {
            context,
            runtime,
            resolver: ConflictResolver::new(merges, design),
            conflicts,
            conflict_locks: DashMap::new(),
            classifier,
            events,
        }
    }

    pub fn context(&self) -> &Arc<ContextStore> {
        &self.context
    }

    pub fn runtime(&self) -> &Arc<AgentRuntime> {
        &self.runtime
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ---- goals and tasks ----

    /// Breaks a goal into dependency-ordered tasks and stores them
    ///
    /// The tasks and the implementation-log entry naming them land in one write.
    pub async fn decompose_goal(&self, project_id: &str, goal: &str) -> CoreResult<Vec<Task>> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(CoreError::InvalidInput("Goal must not be empty".to_string()));
        }

        let archetype = self.classifier.classify_goal(goal);
        let complexity = self.classifier.estimate_complexity(goal);
        let tasks = decompose(archetype, goal, complexity);

        let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
        let entry = ImplementationLogEntry::new(
            ORCHESTRATOR,
            "task_decomposition",
            format!("Planned {} tasks", tasks.len()),
        )
        .with_details(json!({
            "original_goal": goal,
            "archetype": archetype.to_string(),
            "task_ids": task_ids,
        }));

        let stored = tasks.clone();
        self.context
            .write(project_id, move |context| {
                context.active_context.active_tasks.extend(stored);
                context.implementation_log.push(entry);
                Ok(())
            })
            .await?;

        info!(project_id, %archetype, %complexity, tasks = tasks.len(), "Goal decomposed");
        Ok(tasks)
    }

    /// Pending tasks whose dependencies have all completed
    pub async fn ready_tasks(&self, project_id: &str) -> CoreResult<Vec<Task>> {
        let context = self.context.get(project_id).await?;
        Ok(context
            .tasks()
            .iter()
            .filter(|task| task.status == TaskStatus::Pending && unmet_dependency(task, context.tasks()).is_none())
            .cloned()
            .collect())
    }

    /// Picks the best idle agent for a task and starts it working
    ///
    /// # Returns
    /// * `Err(CoreError::TaskNotReady)` - If the task is not pending or waits on other tasks
    /// * `Err(CoreError::NoAgentsAvailable)` - If no agent is idle. Nothing is changed.
    /// * `Err(CoreError::AgentBusy)` - If the chosen agent was claimed concurrently
    pub async fn assign_task_to_agent(&self, project_id: &str, task_id: Uuid) -> CoreResult<Assignment> {
        let context = self.context.get(project_id).await?;
        let task = context
            .task(task_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Task", task_id))?;

        if task.status != TaskStatus::Pending {
            return Err(CoreError::TaskNotReady {
                task_id: task_id.to_string(),
                reason: format!("task is {}", task.status),
            });
        }
        if let Some(waiting_on) = unmet_dependency(&task, context.tasks()) {
            return Err(CoreError::TaskNotReady {
                task_id: task_id.to_string(),
                reason: format!("waiting on {}", waiting_on),
            });
        }

        let sessions = self.runtime.sessions(project_id);
        let candidate = best_candidate(&sessions, &task, self.runtime.performance()).ok_or_else(|| {
            CoreError::NoAgentsAvailable {
                project_id: project_id.to_string(),
            }
        })?;
        let agent = candidate.agent;

        self.runtime.claim(project_id, agent, task_id)?;
        let started = match self
            .context
            .update_task(project_id, task_id, move |task| task.start(agent))
            .await
        {
            Ok(task) => task,
            Err(e) => {
                if let Err(release_error) = self.runtime.release(project_id, agent) {
                    warn!(project_id, agent = %agent, error = %release_error, "Could not release agent");
                }
                return Err(e);
            }
        };

        let assignment = Assignment {
            task_id,
            agent,
            reasoning: candidate.reasoning(&started),
            confidence: candidate.confidence(),
        };

        self.events.publish(DomainEvent::TaskAssigned {
            project_id: project_id.to_string(),
            task_id,
            agent,
            confidence: assignment.confidence,
        });
        self.runtime
            .send_direct_message(
                project_id,
                ORCHESTRATOR,
                agent.as_str(),
                MessageType::StatusUpdate,
                json!({ "assigned_task": task_id, "title": started.title }),
            )
            .await;

        info!(project_id, agent = %agent, %task_id, confidence = assignment.confidence, "Task assigned");
        self.runtime.spawn_execution(project_id, agent, started);
        Ok(assignment)
    }

    /// Assigns ready tasks, most urgent first, until no agent is idle
    pub async fn dispatch_ready_tasks(&self, project_id: &str) -> CoreResult<Vec<Assignment>> {
        let mut ready = self.ready_tasks(project_id).await?;
        ready.sort_by_key(|t| (t.priority, t.created_at));

        let mut assignments = Vec::new();
        for task in ready {
            match self.assign_task_to_agent(project_id, task.id).await {
                Ok(assignment) => assignments.push(assignment),
                Err(CoreError::NoAgentsAvailable { .. }) => break,
                Err(e @ (CoreError::AgentBusy { .. } | CoreError::TaskNotReady { .. })) => {
                    debug!(project_id, task_id = %task.id, error = %e, "Skipping task");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(assignments)
    }

    /// Builds a progress report and publishes it as `progress_update`
    pub async fn monitor_progress(&self, project_id: &str) -> CoreResult<ProgressReport> {
        let context = self.context.get(project_id).await?;
        let sessions = self.runtime.sessions(project_id);
        let report = build_report(&context, &sessions, Utc::now());

        self.events.publish(DomainEvent::ProgressUpdate {
            report: Box::new(report.clone()),
        });
        Ok(report)
    }

    // ---- conflicts ----

    /// Stores a new pending conflict and announces it with its suggestions
    pub async fn report_conflict(&self, project_id: &str, new: NewConflict) -> CoreResult<Conflict> {
        self.context.get(project_id).await?;

        let suggestions = if new.suggested_resolutions.is_empty() {
            default_suggestions(new.conflict_type)
        } else {
            new.suggested_resolutions
        };
        let conflict = Conflict::new(
            project_id,
            new.conflict_type,
            new.severity,
            new.involved_agents,
            new.description,
            new.context,
        )?
        .with_suggestions(suggestions);

        self.save_conflict(&conflict).await?;
        warn!(
            project_id,
            conflict_id = %conflict.id,
            conflict_type = %conflict.conflict_type,
            severity = %conflict.severity,
            "Conflict detected"
        );
        self.events.publish(DomainEvent::ConflictDetected {
            conflict: Box::new(conflict.clone()),
        });
        Ok(conflict)
    }

    pub async fn conflict(&self, conflict_id: Uuid) -> CoreResult<Conflict> {
        self.conflicts
            .find_by_id(conflict_id)
            .await
            .map_err(CoreError::Storage)?
            .ok_or_else(|| CoreError::not_found("Conflict", conflict_id))
    }

    pub async fn conflicts(&self, project_id: &str) -> CoreResult<Vec<Conflict>> {
        self.conflicts
            .find_by_project(project_id)
            .await
            .map_err(CoreError::Storage)
    }

    pub(super) async fn pending_conflicts(&self) -> CoreResult<Vec<Conflict>> {
        self.conflicts.find_pending().await.map_err(CoreError::Storage)
    }

    /// Runs a conflict through the resolver
    ///
    /// A resolution that needs user input escalates the conflict instead of
    /// resolving it. If the resolver errors the conflict goes back to the
    /// status it had before. Calls on the same conflict run one at a time,
    /// so a conflict is resolved at most once.
    pub async fn resolve_conflict(&self, conflict_id: Uuid) -> CoreResult<Conflict> {
        let lock = self.conflict_lock(conflict_id);
        let _guard = lock.lock().await;

        let mut conflict = self.conflict(conflict_id).await?;
        let previous = conflict.status;
        conflict.begin_resolving()?;
        self.save_conflict(&conflict).await?;

        let resolution = match self.resolver.resolve(&conflict).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(conflict_id = %conflict_id, error = %e, "Conflict resolution failed");
                if previous == ConflictStatus::Escalated {
                    conflict.escalate()?;
                } else {
                    conflict.reopen()?;
                }
                self.save_conflict(&conflict).await?;
                return Err(e);
            }
        };

        if resolution.requires_user_input {
            let reason = resolution
                .resolution_notes
                .clone()
                .unwrap_or_else(|| "Needs a user decision".to_string());
            return self.escalate(conflict, reason).await;
        }
        self.finalize(conflict, resolution).await
    }

    /// Records an explicit decision, the only way out of escalation
    pub async fn decide_conflict(&self, conflict_id: Uuid, decision: UserDecision) -> CoreResult<Conflict> {
        let lock = self.conflict_lock(conflict_id);
        let _guard = lock.lock().await;

        let mut conflict = self.conflict(conflict_id).await?;
        conflict.begin_resolving()?;

        let mut resolution = Resolution::new(
            ResolutionStrategy::UserDecision,
            decision.decided_by.unwrap_or_else(|| "user".to_string()),
        )
        .with_notes(decision.decision);
        if let Some(content) = decision.content {
            resolution = resolution.with_content(content);
        }
        self.finalize(conflict, resolution).await
    }

    pub async fn escalate_conflict(&self, conflict_id: Uuid, reason: &str) -> CoreResult<Conflict> {
        let lock = self.conflict_lock(conflict_id);
        let _guard = lock.lock().await;

        let conflict = self.conflict(conflict_id).await?;
        self.escalate(conflict, reason.to_string()).await
    }

    async fn escalate(&self, mut conflict: Conflict, reason: String) -> CoreResult<Conflict> {
        conflict.escalate()?;
        self.save_conflict(&conflict).await?;

        let entry = ImplementationLogEntry::new(ORCHESTRATOR, "conflict_escalated", reason.clone()).with_details(json!({
            "conflict_id": conflict.id,
            "type": conflict.conflict_type,
            "involved_agents": conflict.involved_agents,
        }));
        self.context.log_implementation(&conflict.project_id, entry).await?;

        warn!(project_id = %conflict.project_id, conflict_id = %conflict.id, reason = %reason, "Conflict escalated");
        self.events.publish(DomainEvent::ConflictEscalated {
            project_id: conflict.project_id.clone(),
            conflict_id: conflict.id,
            reason,
        });
        Ok(conflict)
    }

    async fn finalize(&self, mut conflict: Conflict, resolution: Resolution) -> CoreResult<Conflict> {
        conflict.record_resolution(resolution.clone())?;
        self.save_conflict(&conflict).await?;

        self.context
            .record_resolution(
                &conflict.project_id,
                ResolutionRecord {
                    conflict_id: conflict.id,
                    conflict_type: conflict.conflict_type,
                    resolution: resolution.clone(),
                },
            )
            .await?;

        info!(
            project_id = %conflict.project_id,
            conflict_id = %conflict.id,
            strategy = %resolution.strategy,
            "Conflict resolved"
        );
        self.events.publish(DomainEvent::ConflictResolved {
            project_id: conflict.project_id.clone(),
            conflict_id: conflict.id,
            resolution,
        });
        Ok(conflict)
    }

    fn conflict_lock(&self, conflict_id: Uuid) -> Arc<Mutex<()>> {
        self.conflict_locks
            .entry(conflict_id)
            .or_default()
            .value()
            .clone()
    }

    async fn save_conflict(&self, conflict: &Conflict) -> CoreResult<()> {
        self.conflicts.save(conflict).await.map_err(CoreError::Storage)
    }

    // ---- blockers ----

    /// Records a blocker and parks the idle agents it names
    pub async fn add_blocker(&self, project_id: &str, blocker: Blocker) -> CoreResult<Blocker> {
        let blocker = self.context.add_blocker(project_id, blocker).await?;
        for agent in named_agents(&blocker) {
            match self.runtime.agent_status(project_id, agent) {
                Ok(AgentStatus::Idle) => self.runtime.block_agent(project_id, agent)?,
                Ok(status) => debug!(project_id, agent = %agent, %status, "Agent not idle, left running"),
                Err(e) => debug!(project_id, agent = %agent, error = %e, "No session to block"),
            }
        }
        info!(project_id, blocker_id = %blocker.id, severity = %blocker.severity, "Blocker added");
        Ok(blocker)
    }

    /// Removes a blocker and returns its agents to idle
    pub async fn resolve_blocker(&self, project_id: &str, blocker_id: Uuid) -> CoreResult<Blocker> {
        let blocker = self.context.resolve_blocker(project_id, blocker_id).await?;
        let still_blocking: HashSet<AgentName> = self
            .context
            .get(project_id)
            .await?
            .active_context
            .blockers
            .iter()
            .flat_map(named_agents)
            .collect();

        for agent in named_agents(&blocker) {
            if still_blocking.contains(&agent) {
                continue;
            }
            if let Ok(AgentStatus::Blocked) = self.runtime.agent_status(project_id, agent) {
                self.runtime.unblock_agent(project_id, agent)?;
            }
        }
        info!(project_id, %blocker_id, "Blocker resolved");
        Ok(blocker)
    }
}

/// First dependency of the task that has not completed
fn unmet_dependency(task: &Task, tasks: &[Task]) -> Option<Uuid> {
    task.dependencies.iter().copied().find(|dependency| {
        !tasks
            .iter()
            .any(|t| t.id == *dependency && t.status == TaskStatus::Completed)
    })
}

fn named_agents(blocker: &Blocker) -> Vec<AgentName> {
    blocker
        .blocked_agents
        .iter()
        .filter_map(|name| name.parse().ok())
        .collect()
}
