//! Known Markdown files and their last observed modification times.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::ScanError;
use crate::event::{WatchEvent, WatchEventKind};
use crate::scanner::Scanner;

/// Files under one tracked root, ordered by path.
pub type TrackedFiles = BTreeMap<PathBuf, SystemTime>;

/// State shared by watch and serve modes for the lifetime of the process.
///
/// Each tracked root maps to its known Markdown files and their last observed
/// mtimes. A root is populated by a full scan when first tracked and kept
/// current by [`observe`](Self::observe).
#[derive(Debug, Default)]
pub struct WatchState {
    scanner: Scanner,
    roots: HashMap<PathBuf, TrackedFiles>,
}

impl WatchState {
    /// Create empty state using a recursive scanner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty state that scans with `scanner`.
    #[must_use]
    pub fn with_scanner(scanner: Scanner) -> Self {
        Self {
            scanner,
            roots: HashMap::new(),
        }
    }

    /// Scan `root` and start tracking it, replacing any previous entry.
    ///
    /// Returns the number of files found.
    pub fn track(&mut self, root: &Path) -> Result<usize, ScanError> {
        let files: TrackedFiles = self
            .scanner
            .scan(root)?
            .into_iter()
            .filter_map(|path| {
                let mtime = modified(&path)?;
                Some((path, mtime))
            })
            .collect();
        let count = files.len();
        tracing::debug!(root = %root.display(), files = count, "Tracking root");
        self.roots.insert(root.to_path_buf(), files);
        Ok(count)
    }

    /// Whether `root` is tracked.
    #[must_use]
    pub fn is_tracked(&self, root: &Path) -> bool {
        self.roots.contains_key(root)
    }

    /// Stop tracking `root`.
    pub fn untrack(&mut self, root: &Path) -> Option<TrackedFiles> {
        self.roots.remove(root)
    }

    /// Known files under `root`.
    #[must_use]
    pub fn files(&self, root: &Path) -> Option<&TrackedFiles> {
        self.roots.get(root)
    }

    /// Reconcile a raw event against the filesystem and the known state.
    ///
    /// Returns the effective change, or `None` when nothing observable
    /// happened (the mtime is unchanged, or an unknown file was removed).
    /// Events outside every tracked root pass through unchanged.
    pub fn observe(&mut self, event: &WatchEvent) -> Option<WatchEvent> {
        let Some(files) = self.files_containing(&event.path) else {
            return Some(event.clone());
        };

        let kind = match modified(&event.path) {
            Some(mtime) => match files.insert(event.path.clone(), mtime) {
                None => WatchEventKind::Created,
                Some(previous) if previous == mtime => return None,
                Some(_) => WatchEventKind::Modified,
            },
            None => {
                files.remove(&event.path)?;
                WatchEventKind::Removed
            }
        };
        Some(WatchEvent::new(event.path.clone(), kind))
    }

    /// Files of the most specific tracked root containing `path`.
    fn files_containing(&mut self, path: &Path) -> Option<&mut TrackedFiles> {
        self.roots
            .iter_mut()
            .filter(|(root, _)| path.starts_with(root))
            .max_by_key(|(root, _)| root.components().count())
            .map(|(_, files)| files)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path)
        .ok()
        .filter(fs::Metadata::is_file)
        .and_then(|m| m.modified().ok())
}
