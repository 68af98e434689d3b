//! Server error type and its HTTP mapping.

use std::path::PathBuf;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mdprint_storage::{ScanError, WatchError};
use serde::Serialize;

/// Error serving a directory.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The served root does not exist.
    #[error("path not found: {}", .0.display())]
    RootNotFound(PathBuf),
    /// The served root is a file.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// The requested path escapes the served root.
    #[error("access denied: {0}")]
    Forbidden(String),
    /// The requested file does not exist.
    #[error("file not found: {0}")]
    NotFound(String),
    /// The request is malformed or names a non-Markdown file.
    #[error("{0}")]
    BadRequest(String),
    /// The file could not be parsed.
    #[error("cannot parse {path}: {message}")]
    Parse { path: String, message: String },
    /// Scanning the root failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// Watching the root failed.
    #[error(transparent)]
    Watch(#[from] WatchError),
    /// The listener could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A background task failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::RootNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::NotADirectory(_) => StatusCode::BAD_REQUEST,
            Self::Parse { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Scan(_) | Self::Watch(_) | Self::Bind { .. } | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
