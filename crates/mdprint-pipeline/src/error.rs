//! Conversion error types.

use std::path::PathBuf;

use mdprint_diagrams::CommandError;

/// PDF rendering engine failure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine process failed, timed out, or is missing.
    #[error(transparent)]
    Tool(#[from] CommandError),
    /// The engine exited cleanly but wrote no PDF.
    #[error("`{program}` produced no PDF")]
    NoOutput { program: String },
    /// Temporary file handling failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reason a single file failed to convert.
///
/// Reported per file; a batch continues past it.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The source could not be parsed.
    #[error("cannot parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    /// The PDF engine failed.
    #[error("cannot render {}: {source}", .path.display())]
    Render {
        path: PathBuf,
        #[source]
        source: EngineError,
    },
    /// Reading the source or writing the output failed.
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Parse { path, .. } | Self::Render { path, .. } | Self::Io { path, .. } => path,
        }
    }
}
