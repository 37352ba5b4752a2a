use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::agent::{AgentName, AgentStatus};
use super::conflict::{Conflict, Resolution};
use super::progress::ProgressReport;
use super::project::ProjectContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    FromRemote,
    ToRemote,
}

/// Events emitted by the core to its subscribers
///
/// These are the outbound half of the presentation boundary:
/// - Streaming to dashboards
/// - Completion signalling for fire-and-forget task execution
/// - Auditing agent activity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A write to a project's context was accepted
    ContextUpdated {
        project_id: String,
        context: Box<ProjectContext>,
    },
    /// Reconciliation moved a context between local and remote stores
    ContextSynced {
        project_id: String,
        direction: SyncDirection,
        version: u64,
    },
    AgentStatusChange {
        project_id: String,
        agent: AgentName,
        from: AgentStatus,
        to: AgentStatus,
    },
    TaskAssigned {
        project_id: String,
        task_id: Uuid,
        agent: AgentName,
        confidence: u8,
    },
    TaskCompleted {
        project_id: String,
        task_id: Uuid,
        agent: AgentName,
        tokens_used: u64,
        cost: Decimal,
    },
    TaskBlocked {
        project_id: String,
        task_id: Uuid,
        agent: AgentName,
        reason: String,
    },
    /// Carries the full suggestion list for the presentation layer
    ConflictDetected { conflict: Box<Conflict> },
    ConflictResolved {
        project_id: String,
        conflict_id: Uuid,
        resolution: Resolution,
    },
    ConflictEscalated {
        project_id: String,
        conflict_id: Uuid,
        reason: String,
    },
    ProgressUpdate { report: Box<ProgressReport> },
}

impl DomainEvent {
    /// Returns the project this event belongs to
    pub fn project_id(&self) -> &str {
        match self {
            DomainEvent::ContextUpdated { project_id, .. }
            | DomainEvent::ContextSynced { project_id, .. }
            | DomainEvent::AgentStatusChange { project_id, .. }
            | DomainEvent::TaskAssigned { project_id, .. }
            | DomainEvent::TaskCompleted { project_id, .. }
            | DomainEvent::TaskBlocked { project_id, .. }
            | DomainEvent::ConflictResolved { project_id, .. }
            | DomainEvent::ConflictEscalated { project_id, .. } => project_id,
            DomainEvent::ConflictDetected { conflict } => &conflict.project_id,
            DomainEvent::ProgressUpdate { report } => &report.project_id,
        }
    }

    /// Topic name used on the wire
    pub fn topic(&self) -> &'static str {
        match self {
            DomainEvent::ContextUpdated { .. } => "context_updated",
            DomainEvent::ContextSynced { .. } => "context_synced",
            DomainEvent::AgentStatusChange { .. } => "agent_status_change",
            DomainEvent::TaskAssigned { .. } => "task_assigned",
            DomainEvent::TaskCompleted { .. } => "task_completed",
            DomainEvent::TaskBlocked { .. } => "task_blocked",
            DomainEvent::ConflictDetected { .. } => "conflict_detected",
            DomainEvent::ConflictResolved { .. } => "conflict_resolved",
            DomainEvent::ConflictEscalated { .. } => "conflict_escalated",
            DomainEvent::ProgressUpdate { .. } => "progress_update",
        }
    }
}
