// Component wiring shared by the binary and the integration tests

use std::sync::Arc;

use crate::agents::{AgentRuntime, GenerationProvider};
use crate::config::Config;
use crate::context_store::ContextStore;
use crate::domain::repositories::{ConflictRepository, ContextRepository, RemoteContextStore};
use crate::infrastructure::repositories::{InMemoryConflictRepository, InMemoryContextRepository};
use crate::infrastructure::EventBus;
use crate::orchestrator::{KeywordClassifier, MonitorSettings, Orchestrator};

/// Storage and generation adapters the core is assembled from
pub struct Adapters {
    pub contexts: Arc<dyn ContextRepository>,
    pub remote: Option<Arc<dyn RemoteContextStore>>,
    pub conflicts: Arc<dyn ConflictRepository>,
    pub generator: Arc<dyn GenerationProvider>,
}

impl Adapters {
    /// In-memory storage around the given generator, with no remote store
    pub fn in_memory(generator: Arc<dyn GenerationProvider>) -> Self {
        Self {
            contexts: Arc::new(InMemoryContextRepository::new()),
            remote: None,
            conflicts: Arc::new(InMemoryConflictRepository::new()),
            generator,
        }
    }
}

/// Builds the context store, agent runtime and orchestrator on one event bus
pub fn assemble(config: &Config, adapters: Adapters) -> Arc<Orchestrator> {
    let events = EventBus::new(config.event_bus_capacity);
    let context = Arc::new(ContextStore::new(adapters.contexts, adapters.remote, events.clone()));
    let runtime = Arc::new(AgentRuntime::new(
        context.clone(),
        adapters.generator,
        events.clone(),
        config.message_replay_capacity,
    ));

    Arc::new(Orchestrator::new(
        context,
        runtime,
        adapters.conflicts,
        Arc::new(KeywordClassifier::new()),
        events,
    ))
}

pub fn monitor_settings(config: &Config) -> MonitorSettings {
    MonitorSettings {
        conflict_interval: config.conflict_scan_interval,
        progress_interval: config.progress_interval,
        auto_resolve: config.auto_resolve_conflicts,
    }
}

/// Stops background work in dependency order
pub async fn shutdown(orchestrator: &Orchestrator) {
    orchestrator.runtime().shutdown().await;
    orchestrator.context().shutdown().await;
}
