use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{agents, conflicts, events, health, projects, tasks};
use super::state::AppState;

/// Builds the HTTP router over the orchestration core
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Projects
        .route("/api/projects", post(projects::create_project))
        .route("/api/projects/:id", get(projects::get_project))
        .route("/api/projects/:id/summary", get(projects::get_summary))
        .route("/api/projects/:id/search", get(projects::search))
        .route("/api/projects/:id/progress", get(projects::get_progress))
        .route("/api/projects/:id/guidance", post(projects::receive_guidance))
        .route("/api/projects/:id/requirements", post(projects::add_requirement))
        .route("/api/projects/:id/blockers", post(projects::add_blocker))
        .route(
            "/api/projects/:id/blockers/:blocker_id",
            delete(projects::resolve_blocker),
        )
        // Agents
        .route(
            "/api/projects/:id/agents",
            post(agents::initialize_agents).get(agents::list_agents),
        )
        .route("/api/projects/:id/messages", get(agents::recent_messages))
        // Tasks
        .route("/api/projects/:id/goals", post(tasks::decompose_goal))
        .route(
            "/api/projects/:id/tasks/:task_id/assign",
            post(tasks::assign_task),
        )
        .route("/api/projects/:id/dispatch", post(tasks::dispatch_ready))
        // Conflicts
        .route(
            "/api/projects/:id/conflicts",
            post(conflicts::report_conflict).get(conflicts::list_conflicts),
        )
        .route("/api/conflicts/:id/resolve", post(conflicts::resolve_conflict))
        .route("/api/conflicts/:id/decision", post(conflicts::decide_conflict))
        .route("/api/conflicts/:id/escalate", post(conflicts::escalate_conflict))
        // Events
        .route("/api/events", get(events::stream_events))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
