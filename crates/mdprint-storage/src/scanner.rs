//! Markdown file discovery by filesystem walking.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ScanError;

/// Whether `path` names a Markdown source file.
#[must_use]
pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

/// Whether a file or directory name is hidden.
#[must_use]
pub fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Discovers Markdown files under a root.
///
/// Hidden files and directories are skipped, as is anything without an `.md`
/// extension (which excludes generated PDFs and debug HTML). Symlinked
/// directories are not followed.
#[derive(Debug, Clone)]
pub struct Scanner {
    recursive: bool,
}

impl Default for Scanner {
    fn default() -> Self {
        Self { recursive: true }
    }
}

impl Scanner {
    /// Create a recursive scanner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable descending into subdirectories.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Scan `root` and return Markdown paths in lexicographic order.
    ///
    /// A root that is itself a Markdown file yields just that file.
    /// Unreadable subdirectories are logged and skipped.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let metadata = fs::metadata(root).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ScanError::RootNotFound(root.to_path_buf())
            } else {
                ScanError::Io {
                    path: root.to_path_buf(),
                    source,
                }
            }
        })?;

        if metadata.is_file() {
            return Ok(if is_markdown(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let entries = fs::read_dir(root).map_err(|source| ScanError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        self.collect(root, entries, &mut files);
        files.sort();
        Ok(files)
    }

    fn collect(&self, dir: &Path, entries: fs::ReadDir, files: &mut Vec<PathBuf>) {
        for entry in entries.filter_map(Result::ok) {
            if is_hidden(&entry.file_name()) {
                continue;
            }
            let path = entry.path();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());

            if is_dir {
                if !self.recursive {
                    continue;
                }
                match fs::read_dir(&path) {
                    Ok(children) => self.collect(&path, children, files),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable directory");
                    }
                }
            } else if is_markdown(&path) && path.is_file() {
                files.push(path);
            }
        }
        tracing::trace!(dir = %dir.display(), "Scanned directory");
    }
}

/// Scan `root` recursively with the default [`Scanner`].
pub fn scan(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    Scanner::new().scan(root)
}
