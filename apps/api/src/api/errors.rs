use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::CoreError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        let status = match &error {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::AgentBusy { .. }
            | CoreError::StaleVersion { .. }
            | CoreError::ConflictAlreadyResolved(_)
            | CoreError::TaskNotReady { .. } => StatusCode::CONFLICT,
            CoreError::NoAgentsAvailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::InvalidInput(_)
            | CoreError::UnknownConflictType(_)
            | CoreError::InvalidStateTransition { .. } => StatusCode::BAD_REQUEST,
            CoreError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
            CoreError::Storage(_) | CoreError::Json(_) => {
                tracing::error!(error = %error, "Request failed on storage");
                return Self::internal_server_error("Internal storage error");
            }
        };
        Self::new(status, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::not_found("Project", "p1"), StatusCode::NOT_FOUND),
            (
                CoreError::AgentBusy {
                    agent: "Zola".into(),
                    status: "coding".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                CoreError::NoAgentsAvailable {
                    project_id: "p1".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (CoreError::StaleVersion { expected: 2, actual: 3 }, StatusCode::CONFLICT),
            (CoreError::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (CoreError::GenerationFailure("timeout".into()), StatusCode::BAD_GATEWAY),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let error = ApiError::from(CoreError::Storage("connection refused to 10.0.0.3".into()));

        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.message.contains("10.0.0.3"));
    }
}
