// Background monitoring
//
// Conflict scanning and progress refresh run on fixed intervals under one
// cancellation token, so shutdown stops both.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::manager::Orchestrator;
use crate::domain::conflict::ConflictStatus;
use crate::domain::events::DomainEvent;
use crate::errors::{CoreError, CoreResult};

/// What one conflict scan did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub resolved: usize,
    pub escalated: usize,
    pub surfaced: usize,
    pub failed: usize,
}

/// Polls pending conflicts
///
/// With auto-resolution enabled, low and medium severity conflicts are run
/// through the resolver. High and critical conflicts are announced once with
/// their suggestions and stay pending until someone decides them.
pub struct ConflictMonitor {
    orchestrator: Arc<Orchestrator>,
    auto_resolve: bool,
    surfaced: DashSet<Uuid>,
}

impl ConflictMonitor {
    pub fn new(orchestrator: Arc<Orchestrator>, auto_resolve: bool) -> Self {
        Self {
            orchestrator,
            auto_resolve,
            surfaced: DashSet::new(),
        }
    }

    pub async fn tick(&self) -> CoreResult<ScanSummary> {
        let mut summary = ScanSummary::default();

        for conflict in self.orchestrator.pending_conflicts().await? {
            if self.auto_resolve && conflict.severity.allows_unattended_resolution() {
                match self.orchestrator.resolve_conflict(conflict.id).await {
                    Ok(updated) if updated.status == ConflictStatus::Resolved => summary.resolved += 1,
                    Ok(_) => summary.escalated += 1,
                    Err(CoreError::ConflictAlreadyResolved(_)) => {
                        debug!(conflict_id = %conflict.id, "Conflict resolved elsewhere during the scan");
                    }
                    Err(e) => {
                        warn!(conflict_id = %conflict.id, error = %e, "Unattended resolution failed");
                        summary.failed += 1;
                    }
                }
                continue;
            }

            if self.surfaced.insert(conflict.id) {
                info!(
                    project_id = %conflict.project_id,
                    conflict_id = %conflict.id,
                    severity = %conflict.severity,
                    "Conflict awaits a decision"
                );
                self.orchestrator.events().publish(DomainEvent::ConflictDetected {
                    conflict: Box::new(conflict),
                });
                summary.surfaced += 1;
            }
        }

        if summary != ScanSummary::default() {
            debug!(?summary, "Conflict scan finished");
        }
        Ok(summary)
    }
}

/// Publishes a progress report for every known project, returning how many were sent
pub async fn refresh_progress(orchestrator: &Orchestrator) -> CoreResult<usize> {
    let mut published = 0;
    for project_id in orchestrator.context().list_projects().await? {
        match orchestrator.monitor_progress(&project_id).await {
            Ok(_) => published += 1,
            Err(e) => warn!(project_id = %project_id, error = %e, "Progress refresh failed"),
        }
    }
    Ok(published)
}

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub conflict_interval: Duration,
    pub progress_interval: Duration,
    pub auto_resolve: bool,
}

/// Handle to the running background loops
pub struct Monitors {
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl Monitors {
    pub fn start(orchestrator: Arc<Orchestrator>, settings: MonitorSettings) -> Self {
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();

        let monitor = ConflictMonitor::new(Arc::clone(&orchestrator), settings.auto_resolve);
        let token = shutdown.clone();
        tracker.spawn(async move {
            let mut ticker = tokio::time::interval(settings.conflict_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval = ?settings.conflict_interval, auto_resolve = settings.auto_resolve, "Conflict monitor started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = monitor.tick().await {
                            warn!(error = %e, "Conflict scan failed");
                        }
                    }
                }
            }
            debug!("Conflict monitor stopped");
        });

        let token = shutdown.clone();
        tracker.spawn(async move {
            let mut ticker = tokio::time::interval(settings.progress_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            info!(interval = ?settings.progress_interval, "Progress refresh started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = refresh_progress(&orchestrator).await {
                            warn!(error = %e, "Progress refresh failed");
                        }
                    }
                }
            }
            debug!("Progress refresh stopped");
        });

        tracker.close();
        Self { shutdown, tracker }
    }

    /// Cancels both loops and waits for them to exit
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRuntime;
    use crate::context_store::ContextStore;
    use crate::domain::conflict::{AgentChange, ConflictContext, ConflictType};
    use crate::domain::project::ProjectVision;
    use crate::domain::value_objects::Priority;
    use crate::infrastructure::repositories::{InMemoryConflictRepository, InMemoryContextRepository};
    use crate::infrastructure::{EventBus, OfflineGenerator};
    use crate::orchestrator::{KeywordClassifier, NewConflict};

    async fn orchestrator() -> Arc<Orchestrator> {
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
        let runtime = Arc::new(AgentRuntime::new(
            store.clone(),
            Arc::new(OfflineGenerator::new()),
            events.clone(),
            50,
        ));
        runtime.initialize_agents("p1", &[]).await.unwrap();
        Arc::new(Orchestrator::new(
            store,
            runtime,
            Arc::new(InMemoryConflictRepository::new()),
            Arc::new(KeywordClassifier::new()),
            events,
        ))
    }

    fn disjoint_edits(severity: Priority) -> NewConflict {
        let change = |agent: &str, line: usize| AgentChange {
            agent: agent.to_string(),
            content: format!("edited by {}", agent),
            line_start: line,
            line_end: line,
        };
        NewConflict {
            conflict_type: ConflictType::FileConflict,
            severity,
            involved_agents: vec!["Zola".to_string(), "Nexus".to_string()],
            description: "Parallel edits".to_string(),
            context: ConflictContext {
                file: Some("src/lib.rs".to_string()),
                base_version: Some("a\nb\nc".to_string()),
                changes: vec![change("Zola", 1), change("Nexus", 3)],
                ..ConflictContext::default()
            },
            suggested_resolutions: vec![],
        }
    }

    #[tokio::test]
    async fn low_severity_is_resolved_in_one_tick() {
        let orchestrator = orchestrator().await;
        let conflict = orchestrator
            .report_conflict("p1", disjoint_edits(Priority::Low))
            .await
            .unwrap();
        let monitor = ConflictMonitor::new(Arc::clone(&orchestrator), true);

        let summary = monitor.tick().await.unwrap();

        assert_eq!(summary.resolved, 1);
        let stored = orchestrator.conflict(conflict.id).await.unwrap();
        assert_eq!(stored.status, ConflictStatus::Resolved);
        assert!(stored.resolution.is_some());
    }

    #[tokio::test]
    async fn critical_conflicts_surface_once_and_stay_pending() {
        let orchestrator = orchestrator().await;
        let conflict = orchestrator
            .report_conflict("p1", disjoint_edits(Priority::Critical))
            .await
            .unwrap();
        let monitor = ConflictMonitor::new(Arc::clone(&orchestrator), true);
        let mut events = orchestrator.events().subscribe();

        let first = monitor.tick().await.unwrap();
        let second = monitor.tick().await.unwrap();

        assert_eq!(first.surfaced, 1);
        assert_eq!(second, ScanSummary::default());
        let stored = orchestrator.conflict(conflict.id).await.unwrap();
        assert_eq!(stored.status, ConflictStatus::Pending);
        assert!(stored.resolution.is_none());

        let announced: Vec<DomainEvent> = events.drain();
        assert_eq!(announced.len(), 1);
        match &announced[0] {
            DomainEvent::ConflictDetected { conflict } => assert!(!conflict.suggested_resolutions.is_empty()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn disabled_policy_resolves_nothing() {
        let orchestrator = orchestrator().await;
        orchestrator
            .report_conflict("p1", disjoint_edits(Priority::Low))
            .await
            .unwrap();
        let monitor = ConflictMonitor::new(Arc::clone(&orchestrator), false);

        let summary = monitor.tick().await.unwrap();

        assert_eq!(summary.resolved, 0);
        assert_eq!(summary.surfaced, 1);
    }

    #[tokio::test]
    async fn progress_refresh_covers_every_project() {
        let orchestrator = orchestrator().await;
        orchestrator
            .context()
            .create_project("p2", ProjectVision::new("Blog", ""), vec![])
            .await
            .unwrap();

        assert_eq!(refresh_progress(&orchestrator).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn monitors_stop_on_shutdown() {
        let orchestrator = orchestrator().await;
        let monitors = Monitors::start(
            orchestrator,
            MonitorSettings {
                conflict_interval: Duration::from_millis(10),
                progress_interval: Duration::from_millis(10),
                auto_resolve: true,
            },
        );

        tokio::time::timeout(Duration::from_secs(1), monitors.shutdown())
            .await
            .unwrap();
    }
}
