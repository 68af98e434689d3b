//! Serve-mode session state.
//!
//! A [`ServeSession`] owns everything serve mode knows about one root: the
//! tracked files and their mtimes, cached titles, and the broadcast channel
//! that fans change events out to subscribers. It is created when serving
//! starts and dropped when the server stops.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use mdprint_pipeline::Converter;
use mdprint_renderer::extract_title;
use mdprint_storage::{WatchEvent, WatchEventKind, WatchState, is_hidden, is_markdown};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::assets;
use crate::error::ServerError;

/// Capacity of the change event channel; slow subscribers skip ahead.
const EVENT_CAPACITY: usize = 100;

/// A Markdown file under the served root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path relative to the root, `/`-separated.
    pub path: String,
    /// Front matter title, first H1, or file stem.
    pub title: String,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Kind of change pushed to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    FileCreated,
    FileModified,
    FileDeleted,
}

impl ChangeKind {
    /// Event name used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FileCreated => "file_created",
            Self::FileModified => "file_modified",
            Self::FileDeleted => "file_deleted",
        }
    }
}

impl From<WatchEventKind> for ChangeKind {
    fn from(kind: WatchEventKind) -> Self {
        match kind {
            WatchEventKind::Created => Self::FileCreated,
            WatchEventKind::Modified => Self::FileModified,
            WatchEventKind::Removed => Self::FileDeleted,
        }
    }
}

/// A change to a file under the served root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Path relative to the root, `/`-separated.
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// A rendered preview of one file.
#[derive(Clone, Debug, Serialize)]
pub struct Preview {
    /// Path relative to the root, `/`-separated.
    pub path: String,
    pub title: String,
    /// Laid-out body.
    pub html: String,
    pub modified: DateTime<Utc>,
}

/// State of one served root.
pub struct ServeSession {
    root: PathBuf,
    converter: Arc<Converter>,
    state: Mutex<WatchState>,
    titles: Mutex<HashMap<PathBuf, (SystemTime, String)>>,
    events: Mutex<Option<broadcast::Sender<ChangeEvent>>>,
}

impl ServeSession {
    /// Open a session for `root`, populating state from a full scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing, not a directory, or cannot
    /// be scanned.
    pub fn open(root: &Path, converter: Arc<Converter>) -> Result<Self, ServerError> {
        Self::with_state(root, converter, WatchState::new())
    }

    /// Open a session using pre-configured (still empty) state.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn with_state(
        root: &Path,
        converter: Arc<Converter>,
        mut state: WatchState,
    ) -> Result<Self, ServerError> {
        let root =
            fs::canonicalize(root).map_err(|_| ServerError::RootNotFound(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(ServerError::NotADirectory(root));
        }
        let count = state.track(&root)?;
        tracing::info!(root = %root.display(), files = count, "Serving directory");

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            root,
            converter,
            state: Mutex::new(state),
            titles: Mutex::new(HashMap::new()),
            events: Mutex::new(Some(events)),
        })
    }

    /// Canonical served root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Print stylesheet used for previews.
    #[must_use]
    pub fn stylesheet(&self) -> &str {
        self.converter.stylesheet()
    }

    /// Known Markdown files, ordered by path.
    #[must_use]
    pub fn list_files(&self) -> Vec<FileEntry> {
        let files: Vec<(PathBuf, SystemTime)> = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .files(&self.root)
            .map(|files| files.iter().map(|(p, m)| (p.clone(), *m)).collect())
            .unwrap_or_default();

        files
            .into_iter()
            .map(|(path, modified)| FileEntry {
                path: self.relative(&path),
                title: self.title(&path, modified),
                modified: modified.into(),
            })
            .collect()
    }

    /// Subscribe to change events.
    ///
    /// After [`close`](Self::close) the receiver reports the channel closed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        match &*self.events.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Close the event channel, ending every subscription.
    pub fn close(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Apply a watch event, broadcasting the resulting change if any.
    pub fn apply(&self, event: &WatchEvent) -> Option<ChangeEvent> {
        let observed = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(event)?;
        if !observed.path.starts_with(&self.root) {
            return None;
        }
        self.titles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&observed.path);

        let change = ChangeEvent {
            kind: observed.kind.into(),
            path: self.relative(&observed.path),
            timestamp: Utc::now(),
        };
        tracing::info!(path = %change.path, kind = change.kind.as_str(), "File changed");

        if let Some(sender) = &*self.events.lock().unwrap_or_else(PoisonError::into_inner) {
            // No subscribers is fine.
            let _ = sender.send(change.clone());
        }
        Some(change)
    }

    /// Resolve a request path to a Markdown file inside the root.
    ///
    /// # Errors
    ///
    /// [`ServerError::Forbidden`] for paths escaping the root,
    /// [`ServerError::NotFound`] for missing or hidden files, and
    /// [`ServerError::BadRequest`] for non-Markdown files.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ServerError> {
        let resolved = self.resolve_file(relative)?;
        if !is_markdown(&resolved) {
            return Err(ServerError::BadRequest(format!(
                "not a Markdown file: {relative}"
            )));
        }
        Ok(resolved)
    }

    /// Resolve a request path to an image inside the root, with its content
    /// type.
    ///
    /// # Errors
    ///
    /// As for [`resolve`](Self::resolve), except that files which are not
    /// images are [`ServerError::NotFound`].
    pub fn resolve_image(&self, relative: &str) -> Result<(PathBuf, &'static str), ServerError> {
        let resolved = self.resolve_file(relative)?;
        let content_type = assets::image_content_type(&resolved)
            .ok_or_else(|| ServerError::NotFound(relative.to_owned()))?;
        Ok((resolved, content_type))
    }

    /// Resolve a request path to a visible regular file inside the root.
    fn resolve_file(&self, relative: &str) -> Result<PathBuf, ServerError> {
        if relative.is_empty() {
            return Err(ServerError::BadRequest("path is required".to_owned()));
        }
        let requested = Path::new(relative);
        if requested
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(ServerError::Forbidden(relative.to_owned()));
        }
        if has_hidden_component(requested) {
            return Err(ServerError::NotFound(relative.to_owned()));
        }

        let resolved = fs::canonicalize(self.root.join(requested))
            .map_err(|_| ServerError::NotFound(relative.to_owned()))?;
        let Ok(inside) = resolved.strip_prefix(&self.root) else {
            return Err(ServerError::Forbidden(relative.to_owned()));
        };
        // A visible symlink may still point into a hidden directory.
        if has_hidden_component(inside) || !resolved.is_file() {
            return Err(ServerError::NotFound(relative.to_owned()));
        }
        Ok(resolved)
    }

    /// Render a file for preview.
    ///
    /// # Errors
    ///
    /// Path errors as for [`resolve`](Self::resolve), and
    /// [`ServerError::Parse`] for undecodable or malformed sources.
    pub fn preview(&self, relative: &str) -> Result<Preview, ServerError> {
        let path = self.resolve(relative)?;
        let bytes = fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ServerError::NotFound(relative.to_owned())
            } else {
                ServerError::Io(e)
            }
        })?;
        let modified = fs::metadata(&path)?.modified()?;

        let parse_error = |message: String| ServerError::Parse {
            path: relative.to_owned(),
            message,
        };
        let markdown =
            String::from_utf8(bytes).map_err(|e| parse_error(format!("not valid UTF-8 ({e})")))?;
        let document = self
            .converter
            .render_html(&path, &markdown)
            .map_err(|e| parse_error(e.to_string()))?;

        let doc_dir = path.parent().map(|dir| self.relative(dir)).unwrap_or_default();
        Ok(Preview {
            path: self.relative(&path),
            title: document.title,
            html: assets::rewrite_image_sources(&document.body, &doc_dir),
            modified: modified.into(),
        })
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Title for `path`, re-read only when its mtime changed.
    fn title(&self, path: &Path, modified: SystemTime) -> String {
        let mut titles = self.titles.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_at, title)) = titles.get(path)
            && *cached_at == modified
        {
            return title.clone();
        }

        let title = fs::read_to_string(path)
            .ok()
            .and_then(|markdown| extract_title(&markdown))
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        titles.insert(path.to_path_buf(), (modified, title.clone()));
        title
    }
}

fn has_hidden_component(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if is_hidden(name)))
}
