//! Per-path debouncing of filesystem notifications.
//!
//! Editors typically emit several events per save (truncate, write, chmod,
//! rename-over). The debouncer keeps one pending entry per path and pushes
//! its deadline back on every new event, so a path fires only after it has
//! been quiet for the whole window.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::event::{WatchEvent, WatchEventKind};

struct PendingEvent {
    kind: WatchEventKind,
    deadline: Instant,
}

/// Thread-safe event debouncer.
///
/// [`record`](Self::record) is called from the notification callback and
/// [`drain_ready`](Self::drain_ready) from the drain thread.
pub struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingEvent>>,
    window: Duration,
}

impl EventDebouncer {
    /// Create a debouncer with the given quiet window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            window,
        }
    }

    /// Quiet window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an event, rescheduling any pending one for the same path.
    pub fn record(&self, path: PathBuf, kind: WatchEventKind) {
        self.record_at(path, kind, Instant::now());
    }

    pub(crate) fn record_at(&self, path: PathBuf, kind: WatchEventKind, now: Instant) {
        use std::collections::hash_map::Entry;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let deadline = now + self.window;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(PendingEvent { kind, deadline });
            }
            Entry::Occupied(mut entry) => {
                if let Some(kind) = Self::coalesce(entry.get().kind, kind) {
                    let event = entry.get_mut();
                    event.kind = kind;
                    event.deadline = deadline;
                } else {
                    // Created then removed inside one window: nothing happened.
                    entry.remove();
                }
            }
        }
    }

    /// Combine a pending kind with a newly observed one.
    ///
    /// Returns `None` when both cancel out.
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: WatchEventKind, new: WatchEventKind) -> Option<WatchEventKind> {
        use WatchEventKind::{Created, Modified, Removed};

        match (existing, new) {
            (Created, Created) => Some(Created),
            (Created, Modified) => Some(Created),
            (Created, Removed) => None,

            (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified, Removed) => Some(Removed),

            // Replaced by rename-over, the common editor save pattern.
            (Removed, Created) => Some(Modified),
            (Removed, Modified) => Some(Removed),
            (Removed, Removed) => Some(Removed),
        }
    }

    /// Take every event whose window has elapsed, sorted by path.
    pub fn drain_ready(&self) -> Vec<WatchEvent> {
        self.drain_ready_at(Instant::now())
    }

    pub(crate) fn drain_ready_at(&self, now: Instant) -> Vec<WatchEvent> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);

        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, event)| event.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        let mut events: Vec<WatchEvent> = ready
            .into_iter()
            .filter_map(|path| {
                pending
                    .remove(&path)
                    .map(|event| WatchEvent::new(path, event.kind))
            })
            .collect();
        events.sort_by(|a, b| a.path.cmp(&b.path));
        events
    }

    /// Number of paths waiting for their window to elapse.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
