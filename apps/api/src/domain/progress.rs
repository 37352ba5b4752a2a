use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::agent::AgentStatus;
use super::task::Task;
use super::value_objects::Priority;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub tasks_completed: usize,
    /// Minutes
    pub average_completion_time: f64,
    /// 0-100
    pub quality_score: f64,
    pub current_status: AgentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressBlocker {
    pub id: String,
    pub description: String,
    pub severity: Priority,
    pub blocked_tasks: Vec<Uuid>,
    pub resolution_plan: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub estimated_completion: DateTime<Utc>,
    pub dependencies: Vec<Uuid>,
}

/// Snapshot of a project's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub project_id: String,
    /// 0-100
    pub overall_progress: f64,
    pub phase_progress: BTreeMap<String, f64>,
    pub active_tasks: Vec<Task>,
    pub completed_tasks: Vec<Task>,
    pub blocked_tasks: Vec<Task>,
    pub agent_performance: BTreeMap<String, AgentPerformance>,
    pub blockers: Vec<ProgressBlocker>,
    pub next_milestones: Vec<Milestone>,
    pub last_updated: DateTime<Utc>,
}
