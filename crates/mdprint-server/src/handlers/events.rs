//! Server-sent change events.
//!
//! Each change becomes one SSE message whose event name is the change type
//! and whose data is the JSON-encoded [`ChangeEvent`](crate::session::ChangeEvent).
//! The stream ends when the session closes.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::session::ChangeEvent;
use crate::state::AppState;

/// Client reconnect delay.
const RETRY: Duration = Duration::from_secs(5);

/// Interval between keep-alive comments.
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Handle GET /api/v1/events.
pub(crate) async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.session.subscribe()).filter_map(|result| match result {
        Ok(change) => Some(Ok(to_sse(&change))),
        Err(err) => {
            tracing::debug!(error = %err, "Subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}

fn to_sse(change: &ChangeEvent) -> Event {
    let data = serde_json::to_string(change).unwrap_or_default();
    Event::default()
        .event(change.kind.as_str())
        .data(data)
        .retry(RETRY)
}
