//! Filesystem watching for Markdown sources.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{RecursiveMode, Watcher as _};

use crate::debouncer::EventDebouncer;
use crate::error::WatchError;
use crate::event::{WatchEvent, WatchEventKind, WatchEventReceiver, WatchHandle};
use crate::scanner::{is_hidden, is_markdown};
use crate::state::WatchState;

/// Default quiet window before a change fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// How often the drain thread checks for ready events.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Map a notify event kind to ours. Access events are irrelevant.
fn event_kind(kind: notify::EventKind) -> Option<WatchEventKind> {
    match kind {
        notify::EventKind::Create(_) | notify::EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            Some(WatchEventKind::Created)
        }
        notify::EventKind::Modify(ModifyKind::Name(RenameMode::From))
        | notify::EventKind::Remove(_) => Some(WatchEventKind::Removed),
        notify::EventKind::Modify(_) => Some(WatchEventKind::Modified),
        _ => None,
    }
}

/// Which paths under a watch root are of interest.
#[derive(Debug, Clone)]
enum Filter {
    /// A single file.
    File(PathBuf),
    /// Markdown files under a directory, outside hidden directories.
    Tree { root: PathBuf, recursive: bool },
}

impl Filter {
    fn accepts(&self, path: &Path) -> bool {
        match self {
            Self::File(file) => path == file,
            Self::Tree { root, recursive } => {
                let Ok(relative) = path.strip_prefix(root) else {
                    return false;
                };
                let mut components = relative.components().peekable();
                let mut depth = 0;
                while let Some(component) = components.next() {
                    let Component::Normal(name) = component else {
                        return false;
                    };
                    if is_hidden(name) {
                        return false;
                    }
                    if components.peek().is_some() {
                        depth += 1;
                    }
                }
                (*recursive || depth == 0) && is_markdown(path)
            }
        }
    }
}

/// Watches a Markdown file or directory tree for changes.
///
/// Raw notifications are debounced per path; each path fires once after it
/// has been quiet for the debounce window.
///
/// # Example
///
/// ```ignore
/// let (events, handle) = Watcher::new("docs").start()?;
/// for event in events.iter() {
///     println!("{} {}", event.kind, event.path.display());
/// }
/// drop(handle);
/// ```
#[derive(Debug, Clone)]
pub struct Watcher {
    root: PathBuf,
    debounce: Duration,
    recursive: bool,
}

impl Watcher {
    /// Create a watcher for `root` (a Markdown file or a directory).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            debounce: DEFAULT_DEBOUNCE,
            recursive: true,
        }
    }

    /// Set the debounce window.
    #[must_use]
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Enable or disable watching subdirectories.
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Canonical root as used in emitted event paths.
    pub fn canonical_root(&self) -> Result<PathBuf, WatchError> {
        fs::canonicalize(&self.root).map_err(|_| WatchError::RootNotFound(self.root.clone()))
    }

    /// Subscribe to OS notifications and start delivering events.
    ///
    /// Events carry absolute paths. The subscription lives until the returned
    /// [`WatchHandle`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::RootNotFound`] if the root does not exist and
    /// [`WatchError::Setup`] if the notification backend fails.
    pub fn start(&self) -> Result<(WatchEventReceiver, WatchHandle), WatchError> {
        let root = self.canonical_root()?;

        let (watch_path, mode, filter) = if root.is_file() {
            let parent = root
                .parent()
                .map_or_else(|| root.clone(), Path::to_path_buf);
            (parent, RecursiveMode::NonRecursive, Filter::File(root.clone()))
        } else {
            let mode = if self.recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            let filter = Filter::Tree {
                root: root.clone(),
                recursive: self.recursive,
            };
            (root.clone(), mode, filter)
        };

        let (event_tx, event_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let debouncer = Arc::new(EventDebouncer::new(self.debounce));
        let watcher_debouncer = Arc::clone(&debouncer);

        let setup_error = |source| WatchError::Setup {
            path: root.clone(),
            source,
        };

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "Filesystem notification error");
                        return;
                    }
                };
                let Some(kind) = event_kind(event.kind) else {
                    return;
                };
                for path in event.paths {
                    if filter.accepts(&path) {
                        watcher_debouncer.record(path, kind);
                    }
                }
            })
            .map_err(setup_error)?;

        watcher.watch(&watch_path, mode).map_err(setup_error)?;
        tracing::info!(root = %root.display(), debounce_ms = self.debounce.as_millis(), "Watching for changes");

        // The notify watcher moves into the drain thread and is dropped with it,
        // which unsubscribes from the OS.
        std::thread::spawn(move || {
            let _watcher = watcher;
            loop {
                match shutdown_rx.recv_timeout(DRAIN_INTERVAL) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }
                for event in debouncer.drain_ready() {
                    tracing::debug!(path = %event.path.display(), kind = %event.kind, "Change detected");
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
            tracing::debug!("Watch stopped");
        });

        Ok((
            WatchEventReceiver::new(event_rx),
            WatchHandle::new(shutdown_tx),
        ))
    }
}

/// Run the watch loop until the watch stops.
///
/// Each event is checked against `state` so notifications that did not change
/// a file's modification time are dropped. `on_change` is called for created
/// and modified files only, one at a time, so a path is never handled twice
/// concurrently.
pub fn run_watch_loop<F>(receiver: &WatchEventReceiver, state: &mut WatchState, mut on_change: F)
where
    F: FnMut(&WatchEvent),
{
    for event in receiver.iter() {
        let Some(event) = state.observe(&event) else {
            tracing::trace!(path = %event.path.display(), "Ignoring redundant event");
            continue;
        };
        if event.kind.is_content_change() {
            on_change(&event);
        } else {
            tracing::debug!(path = %event.path.display(), "Source removed");
        }
    }
}
