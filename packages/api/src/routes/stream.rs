use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use crawler::ProgressEvent;
use futures::stream::{self, Stream};
use tokio::sync::mpsc;
use tracing::error;
use uuid::Uuid;

use crate::app::AppState;

fn sse_event(event: &ProgressEvent) -> Event {
    let value = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
    let event_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("message")
        .to_string();
    Event::default().event(event_type).data(value.to_string())
}

/// Drain a live session channel, closing after the terminal `end` event.
fn event_stream(
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    // State goes to None once the terminal event has been yielded.
    stream::unfold(Some(rx), |receiver| async move {
        let mut rx = receiver?;
        let event = rx.recv().await?;
        let next = if matches!(event, ProgressEvent::End { .. }) {
            None
        } else {
            Some(rx)
        };
        Some((Ok(sse_event(&event)), next))
    })
}

/// SSE progress stream for one session.
///
/// The live channel is single-consumer. A session that exists in storage
/// but has no channel (finished, or the server restarted) gets a single
/// synthetic `end` event rather than an error.
pub async fn stream_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if let Some(rx) = state.registry.claim(id).await {
        return Sse::new(event_stream(rx))
            .keep_alive(KeepAlive::default())
            .into_response();
    }

    match state.store.get_session(id).await {
        Ok(Some(_)) => {
            let event = ProgressEvent::End {
                message: "Session finished or connection lost".to_string(),
            };
            let stream = stream::once(async move { Ok::<_, Infallible>(sse_event(&event)) });
            Sse::new(stream).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(session_id = %id, error = %e, "Failed to check session for stream");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
