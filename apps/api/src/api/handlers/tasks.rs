use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::task::Task;
use crate::orchestrator::Assignment;

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub goal: String,
}

/// Decompose a goal into tasks
///
/// POST /api/projects/:id/goals
pub async fn decompose_goal(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<GoalRequest>,
) -> Result<(StatusCode, Json<Vec<Task>>), ApiError> {
    let tasks = state
        .orchestrator
        .decompose_goal(&project_id, &req.goal)
        .await?;
    Ok((StatusCode::CREATED, Json(tasks)))
}

/// Assign one task; execution continues in the background
///
/// POST /api/projects/:id/tasks/:task_id/assign
pub async fn assign_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(String, Uuid)>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    let assignment = state
        .orchestrator
        .assign_task_to_agent(&project_id, task_id)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(assignment)))
}

/// POST /api/projects/:id/dispatch
pub async fn dispatch_ready(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<(StatusCode, Json<Vec<Assignment>>), ApiError> {
    let assignments = state.orchestrator.dispatch_ready_tasks(&project_id).await?;
    Ok((StatusCode::ACCEPTED, Json(assignments)))
}
