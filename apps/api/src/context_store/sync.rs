// Reconciliation against the remote collaborator store
//
// Failures are logged and retried on the next tick. The local copy stays
// authoritative until a sync succeeds.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::store::ContextStore;
use crate::domain::events::{DomainEvent, SyncDirection};
use crate::domain::project::ProjectContext;
use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "version", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Remote was newer and replaced the local copy
    Pulled(u64),
    /// Local was newer and was pushed
    Pushed(u64),
    InSync(u64),
    /// No remote store is configured
    Disabled,
}

/// What is left to do once versions were compared under the lock
enum Step {
    Push(ProjectContext),
    Settled(SyncOutcome),
}

impl ContextStore {
    /// Reconciles one project with the remote store
    ///
    /// The strictly greater version wins; equal versions are left alone.
    /// Remote I/O happens outside the project lock, which is only held to
    /// compare versions and to store a newer remote copy.
    pub async fn sync_with_remote(&self, project_id: &str) -> CoreResult<SyncOutcome> {
        let Some(remote) = self.remote.clone() else {
            return Ok(SyncOutcome::Disabled);
        };

        let theirs = remote.pull(project_id).await.map_err(CoreError::Storage)?;

        let step = {
            let lock = self.lock_for(project_id);
            let _guard = lock.lock().await;

            match (self.load_local(project_id).await?, theirs) {
                (None, None) => return Err(CoreError::not_found("Project", project_id)),
                (None, Some(remote_context)) => {
                    self.store_local(&remote_context).await?;
                    self.emit_updated(&remote_context);
                    Step::Settled(SyncOutcome::Pulled(remote_context.version()))
                }
                (Some(local_context), None) => Step::Push(local_context),
                (Some(local_context), Some(remote_context)) => {
                    if remote_context.version() > local_context.version() {
                        self.store_local(&remote_context).await?;
                        self.emit_updated(&remote_context);
                        Step::Settled(SyncOutcome::Pulled(remote_context.version()))
                    } else if local_context.version() > remote_context.version() {
                        Step::Push(local_context)
                    } else {
                        Step::Settled(SyncOutcome::InSync(local_context.version()))
                    }
                }
            }
        };

        let outcome = match step {
            Step::Push(snapshot) => {
                remote.push(&snapshot).await.map_err(CoreError::Storage)?;
                SyncOutcome::Pushed(snapshot.version())
            }
            Step::Settled(outcome) => outcome,
        };

        match outcome {
            SyncOutcome::Pulled(version) => {
                info!(project_id, version, "Context replaced by newer remote copy");
                self.events.publish(DomainEvent::ContextSynced {
                    project_id: project_id.to_string(),
                    direction: SyncDirection::FromRemote,
                    version,
                });
            }
            SyncOutcome::Pushed(version) => {
                info!(project_id, version, "Context pushed to remote");
                self.events.publish(DomainEvent::ContextSynced {
                    project_id: project_id.to_string(),
                    direction: SyncDirection::ToRemote,
                    version,
                });
            }
            SyncOutcome::InSync(version) => debug!(project_id, version, "Context already in sync"),
            SyncOutcome::Disabled => {}
        }

        Ok(outcome)
    }

    /// Starts the reconciliation loop for a project, replacing any running one
    pub fn start_periodic_sync(self: &Arc<Self>, project_id: &str, interval: Duration) {
        if self.remote.is_none() {
            debug!(project_id, "No remote store configured, periodic sync not started");
            return;
        }

        let token = self.shutdown.child_token();
        if let Some(previous) = self.sync_loops.insert(project_id.to_string(), token.clone()) {
            previous.cancel();
        }

        let store = Arc::clone(self);
        let project_id = project_id.to_string();
        self.tracker.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            info!(project_id = %project_id, ?interval, "Periodic context sync started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = store.sync_with_remote(&project_id).await {
                            warn!(project_id = %project_id, error = %e, "Context sync failed, retrying next tick");
                        }
                    }
                }
            }
            debug!(project_id = %project_id, "Periodic context sync stopped");
        });
    }

    /// Reconciles every cached project that has no loop of its own
    ///
    /// Covers projects that reached the local cache through the remote
    /// fallback in [`ContextStore::get`]. Returns how many projects synced.
    pub async fn sync_all(&self) -> CoreResult<usize> {
        if self.remote.is_none() {
            return Ok(0);
        }

        let mut synced = 0;
        for project_id in self.list_projects().await? {
            if self.sync_loops.contains_key(&project_id) {
                continue;
            }
            match self.sync_with_remote(&project_id).await {
                Ok(_) => synced += 1,
                Err(e) => warn!(project_id = %project_id, error = %e, "Context sync failed, retrying next sweep"),
            }
        }
        Ok(synced)
    }

    /// Starts the store-wide reconciliation sweep
    ///
    /// Only the first call starts a loop; it runs until [`ContextStore::shutdown`].
    pub fn start_sync_sweep(self: &Arc<Self>, interval: Duration) {
        if self.remote.is_none() {
            debug!("No remote store configured, sync sweep not started");
            return;
        }
        if self.sweep_started.swap(true, Ordering::SeqCst) {
            debug!("Sync sweep already running");
            return;
        }

        let token = self.shutdown.child_token();
        let store = Arc::clone(self);
        self.tracker.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            info!(?interval, "Context sync sweep started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = store.sync_all().await {
                            warn!(error = %e, "Context sync sweep failed");
                        }
                    }
                }
            }
            debug!("Context sync sweep stopped");
        });
    }

    /// Stops a project's reconciliation loop, returning whether one was running
    pub fn stop_periodic_sync(&self, project_id: &str) -> bool {
        match self.sync_loops.remove(project_id) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancels every reconciliation loop and waits for them to finish
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.sync_loops.clear();
        self.tracker.close();
        self.tracker.wait().await;
    }
}
