use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::api::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    /// Only stream events of this project
    pub project_id: Option<String>,
}

/// Stream domain events as Server-Sent Events
///
/// GET /api/events
pub async fn stream_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.orchestrator.events().receiver();

    let stream = BroadcastStream::new(receiver).filter_map(move |item| {
        let event = match item {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event stream subscriber lagged, events dropped");
                return None;
            }
        };
        if let Some(project_id) = &filter.project_id {
            if event.project_id() != project_id {
                return None;
            }
        }
        match Event::default().event(event.topic()).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::warn!(error = %e, "Could not encode event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
