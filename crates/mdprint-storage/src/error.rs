//! Storage error types.

use std::path::PathBuf;

/// Error scanning for Markdown files.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The root does not exist.
    #[error("path not found: {}", .0.display())]
    RootNotFound(PathBuf),
    /// The root could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error starting a watch.
///
/// Fatal to the watch invocation; never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The root does not exist.
    #[error("cannot watch {}: path not found", .0.display())]
    RootNotFound(PathBuf),
    /// The filesystem notification backend could not be set up.
    #[error("cannot watch {}: {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}
