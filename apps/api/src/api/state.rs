use std::sync::Arc;
use std::time::Duration;

use crate::orchestrator::Orchestrator;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Reconciliation interval for projects created over HTTP
    pub sync_interval: Duration,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, sync_interval: Duration) -> Self {
        Self {
            orchestrator,
            sync_interval,
        }
    }
}
