//! Image endpoint for pictures referenced by previewed documents.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET /api/v1/image/{*path}.
pub(crate) async fn get_image(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ServerError> {
    let (bytes, content_type) = tokio::task::spawn_blocking(move || {
        let (file, content_type) = state.session.resolve_image(&path)?;
        let bytes = std::fs::read(&file).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ServerError::NotFound(path.clone())
            } else {
                ServerError::Io(e)
            }
        })?;
        Ok::<_, ServerError>((bytes, content_type))
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
