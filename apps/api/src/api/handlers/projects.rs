use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::context_store::{ContextSummary, SearchHit};
use crate::domain::progress::ProgressReport;
use crate::domain::project::{
    Blocker, InstructionRecord, ProjectContext, ProjectVision, Requirement, UserInstruction,
};
use crate::domain::value_objects::Priority;

/// Request body for creating a project
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub collaborators: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct AddRequirementRequest {
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddBlockerRequest {
    pub description: String,
    pub severity: Priority,
    #[serde(default)]
    pub blocked_tasks: Vec<Uuid>,
    #[serde(default)]
    pub blocked_agents: Vec<String>,
    #[serde(default)]
    pub resolution_plan: Option<String>,
}

/// Create a project context and start reconciling it
///
/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectContext>), ApiError> {
    let mut vision = ProjectVision::new(req.title, req.description);
    vision.goals = req.goals;
    vision.success_criteria = req.success_criteria;
    vision.constraints = req.constraints;

    let context = state.orchestrator.context();
    let created = context
        .create_project(&req.project_id, vision, req.collaborators)
        .await?;
    context.start_periodic_sync(&created.project_id, state.sync_interval);

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectContext>, ApiError> {
    Ok(Json(state.orchestrator.context().get(&project_id).await?))
}

/// GET /api/projects/:id/summary
pub async fn get_summary(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ContextSummary>, ApiError> {
    Ok(Json(state.orchestrator.context().summary(&project_id).await?))
}

/// GET /api/projects/:id/search?q=
pub async fn search(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::bad_request("Query must not be empty"));
    }
    Ok(Json(
        state
            .orchestrator
            .context()
            .search(&project_id, &query.q)
            .await?,
    ))
}

/// POST /api/projects/:id/requirements
pub async fn add_requirement(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<AddRequirementRequest>,
) -> Result<(StatusCode, Json<Requirement>), ApiError> {
    let mut requirement = Requirement::new(req.description, req.priority);
    requirement.acceptance_criteria = req.acceptance_criteria;
    requirement.tags = req.tags;

    let requirement = state
        .orchestrator
        .context()
        .add_requirement(&project_id, requirement)
        .await?;
    Ok((StatusCode::CREATED, Json(requirement)))
}

/// POST /api/projects/:id/blockers
pub async fn add_blocker(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<AddBlockerRequest>,
) -> Result<(StatusCode, Json<Blocker>), ApiError> {
    let mut blocker = Blocker::new(req.description, req.severity);
    blocker.blocked_tasks = req.blocked_tasks;
    blocker.blocked_agents = req.blocked_agents;
    blocker.resolution_plan = req.resolution_plan;

    let blocker = state.orchestrator.add_blocker(&project_id, blocker).await?;
    Ok((StatusCode::CREATED, Json(blocker)))
}

/// DELETE /api/projects/:id/blockers/:blocker_id
pub async fn resolve_blocker(
    State(state): State<AppState>,
    Path((project_id, blocker_id)): Path<(String, Uuid)>,
) -> Result<Json<Blocker>, ApiError> {
    Ok(Json(
        state
            .orchestrator
            .resolve_blocker(&project_id, blocker_id)
            .await?,
    ))
}

/// POST /api/projects/:id/guidance
pub async fn receive_guidance(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(instruction): Json<UserInstruction>,
) -> Result<(StatusCode, Json<InstructionRecord>), ApiError> {
    let record = state
        .orchestrator
        .receive_user_guidance(&project_id, instruction)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/projects/:id/progress
pub async fn get_progress(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ProgressReport>, ApiError> {
    Ok(Json(state.orchestrator.monitor_progress(&project_id).await?))
}
