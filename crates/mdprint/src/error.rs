//! CLI error types.

use std::path::PathBuf;

use mdprint_config::ConfigError;
use mdprint_pipeline::ConvertError;
use mdprint_server::ServerError;
use mdprint_storage::{ScanError, WatchError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Watch(#[from] WatchError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0}")]
    Validation(String),

    #[error("{0} file(s) failed to convert")]
    Failed(usize),
}
