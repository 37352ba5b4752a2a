use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::conflict::Conflict;
use crate::orchestrator::{NewConflict, UserDecision};

#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    pub reason: String,
}

/// POST /api/projects/:id/conflicts
pub async fn report_conflict(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<NewConflict>,
) -> Result<(StatusCode, Json<Conflict>), ApiError> {
    let conflict = state.orchestrator.report_conflict(&project_id, req).await?;
    Ok((StatusCode::CREATED, Json(conflict)))
}

/// GET /api/projects/:id/conflicts
pub async fn list_conflicts(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<Conflict>>, ApiError> {
    state.orchestrator.context().get(&project_id).await?;
    Ok(Json(state.orchestrator.conflicts(&project_id).await?))
}

/// Run a conflict through the resolver
///
/// POST /api/conflicts/:id/resolve
pub async fn resolve_conflict(
    State(state): State<AppState>,
    Path(conflict_id): Path<Uuid>,
) -> Result<Json<Conflict>, ApiError> {
    Ok(Json(state.orchestrator.resolve_conflict(conflict_id).await?))
}

/// POST /api/conflicts/:id/decision
pub async fn decide_conflict(
    State(state): State<AppState>,
    Path(conflict_id): Path<Uuid>,
    Json(decision): Json<UserDecision>,
) -> Result<Json<Conflict>, ApiError> {
    if decision.decision.trim().is_empty() {
        return Err(ApiError::bad_request("Decision must not be empty"));
    }
    Ok(Json(
        state
            .orchestrator
            .decide_conflict(conflict_id, decision)
            .await?,
    ))
}

/// POST /api/conflicts/:id/escalate
pub async fn escalate_conflict(
    State(state): State<AppState>,
    Path(conflict_id): Path<Uuid>,
    Json(req): Json<EscalateRequest>,
) -> Result<Json<Conflict>, ApiError> {
    Ok(Json(
        state
            .orchestrator
            .escalate_conflict(conflict_id, &req.reason)
            .await?,
    ))
}
