//! Output path derivation and mtime-based staleness.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The PDF written for a Markdown source: same directory, `.pdf` extension.
#[must_use]
pub fn target_path(source: &Path) -> PathBuf {
    source.with_extension("pdf")
}

/// Result of a staleness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Conversion requested regardless of timestamps.
    Forced,
    /// No output exists yet.
    MissingTarget,
    /// Source modified after the output was written.
    SourceNewer,
    /// Output is at least as new as the source.
    UpToDate,
}

impl Freshness {
    /// Whether the source must be converted.
    #[must_use]
    pub fn needs_conversion(self) -> bool {
        !matches!(self, Self::UpToDate)
    }
}

/// Compare source and target modification times.
///
/// Only file metadata is read. The source is always stat'ed, even when
/// `force` is set, so a vanished source surfaces as `NotFound`.
///
/// # Errors
///
/// Returns the I/O error from stat'ing the source. A missing target is not
/// an error.
pub fn check(source: &Path, target: &Path, force: bool) -> io::Result<Freshness> {
    let source_mtime = fs::metadata(source)?.modified()?;
    if force {
        return Ok(Freshness::Forced);
    }

    let target_mtime = match fs::metadata(target) {
        Ok(metadata) => metadata.modified()?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Freshness::MissingTarget),
        Err(e) => return Err(e),
    };

    Ok(if target_mtime >= source_mtime {
        Freshness::UpToDate
    } else {
        Freshness::SourceNewer
    })
}
