//! Preview endpoint.
//!
//! Rendering shells out for diagrams, so it runs on the blocking pool.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};

use crate::error::ServerError;
use crate::handlers::PathQuery;
use crate::session::Preview;
use crate::state::AppState;

/// Handle GET /api/v1/preview?path=.
pub(crate) async fn get_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PathQuery>,
) -> Result<Json<Preview>, ServerError> {
    render_preview(state, query.path).await.map(Json)
}

/// Render `path` off the async runtime.
pub(crate) async fn render_preview(
    state: Arc<AppState>,
    path: String,
) -> Result<Preview, ServerError> {
    tokio::task::spawn_blocking(move || state.session.preview(&path))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
}
