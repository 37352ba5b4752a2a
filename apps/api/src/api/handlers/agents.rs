use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::agents::{AgentMessage, AgentSession};
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::agent::AgentName;

/// Request body for spawning agents; an empty list spawns the whole roster
#[derive(Debug, Default, Deserialize)]
pub struct InitializeAgentsRequest {
    #[serde(default)]
    pub agents: Vec<AgentName>,
}

/// POST /api/projects/:id/agents
pub async fn initialize_agents(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<InitializeAgentsRequest>,
) -> Result<(StatusCode, Json<Vec<AgentSession>>), ApiError> {
    let sessions = state
        .orchestrator
        .runtime()
        .initialize_agents(&project_id, &req.agents)
        .await?;
    Ok((StatusCode::CREATED, Json(sessions)))
}

/// GET /api/projects/:id/agents
pub async fn list_agents(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<AgentSession>>, ApiError> {
    state.orchestrator.context().get(&project_id).await?;
    Ok(Json(state.orchestrator.runtime().sessions(&project_id)))
}

/// Replay log of the project's broadcast channel
///
/// GET /api/projects/:id/messages
pub async fn recent_messages(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<AgentMessage>>, ApiError> {
    state.orchestrator.context().get(&project_id).await?;
    Ok(Json(
        state.orchestrator.runtime().recent_messages(&project_id).await,
    ))
}
