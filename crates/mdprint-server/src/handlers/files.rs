//! File listing endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::session::FileEntry;
use crate::state::AppState;

/// Response for GET /api/v1/files.
#[derive(Serialize)]
pub(crate) struct FilesResponse {
    root: String,
    files: Vec<FileEntry>,
}

/// Handle GET /api/v1/files.
pub(crate) async fn list_files(State(state): State<Arc<AppState>>) -> Json<FilesResponse> {
    Json(FilesResponse {
        root: state.session.root().display().to_string(),
        files: state.session.list_files(),
    })
}
