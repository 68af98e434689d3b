//! Change events delivered by [`Watcher`](crate::Watcher).

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

/// Kind of change observed for a Markdown file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    /// File appeared.
    Created,
    /// File content changed.
    Modified,
    /// File disappeared.
    Removed,
}

impl WatchEventKind {
    /// Whether this change should trigger a conversion.
    #[must_use]
    pub fn is_content_change(self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }

    /// Lowercase name, as used in logs and event payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for WatchEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A debounced change to one Markdown file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchEvent {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: WatchEventKind,
}

impl WatchEvent {
    /// Create an event.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Receiver for watch events.
///
/// Wraps a [`std::sync::mpsc::Receiver`]. Every method returns `None` once
/// the owning [`WatchHandle`] has been dropped and pending events drained.
pub struct WatchEventReceiver {
    rx: mpsc::Receiver<WatchEvent>,
}

impl WatchEventReceiver {
    /// Create a receiver from a channel receiver.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<WatchEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event (blocking).
    #[must_use]
    pub fn recv(&self) -> Option<WatchEvent> {
        self.rx.recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Returns `Ok(None)` on timeout and `Err(())` when the channel is closed.
    #[allow(clippy::result_unit_err)]
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WatchEvent>, ()> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(()),
        }
    }

    /// Try to receive an event without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<WatchEvent> {
        self.rx.try_recv().ok()
    }

    /// Blocking iterator over events; ends when the watch stops.
    pub fn iter(&self) -> impl Iterator<Item = WatchEvent> + '_ {
        self.rx.iter()
    }
}

/// Handle that keeps a watch alive.
///
/// Dropping the handle stops the watch: the OS-level watcher is released and
/// the event channel closes once pending events are drained.
pub struct WatchHandle {
    shutdown: Option<mpsc::Sender<()>>,
}

impl WatchHandle {
    /// Create a handle owning the shutdown signal sender.
    ///
    /// Dropping the sender makes the drain thread's `recv_timeout` return
    /// `Disconnected`, which ends the watch.
    #[must_use]
    pub fn new(shutdown: mpsc::Sender<()>) -> Self {
        Self {
            shutdown: Some(shutdown),
        }
    }

    /// Stop watching immediately.
    pub fn stop(mut self) {
        self.shutdown.take();
    }

    /// Whether the watch is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shutdown.is_some()
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_content_change_kinds() {
        assert!(WatchEventKind::Created.is_content_change());
        assert!(WatchEventKind::Modified.is_content_change());
        assert!(!WatchEventKind::Removed.is_content_change());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(WatchEventKind::Created.to_string(), "created");
        assert_eq!(WatchEventKind::Removed.to_string(), "removed");
    }

    #[test]
    fn test_receiver_recv() {
        let (tx, rx) = mpsc::channel();
        let receiver = WatchEventReceiver::new(rx);
        let event = WatchEvent::new("/docs/a.md", WatchEventKind::Created);

        tx.send(event.clone()).unwrap();
        assert_eq!(receiver.recv(), Some(event));

        drop(tx);
        assert_eq!(receiver.recv(), None);
    }

    #[test]
    fn test_receiver_try_recv_empty() {
        let (_tx, rx) = mpsc::channel();
        let receiver = WatchEventReceiver::new(rx);
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn test_receiver_recv_timeout() {
        let (tx, rx) = mpsc::channel();
        let receiver = WatchEventReceiver::new(rx);

        assert_eq!(receiver.recv_timeout(Duration::from_millis(5)), Ok(None));

        let event = WatchEvent::new("/docs/b.md", WatchEventKind::Modified);
        tx.send(event.clone()).unwrap();
        assert_eq!(receiver.recv_timeout(Duration::from_millis(5)), Ok(Some(event)));

        drop(tx);
        assert_eq!(receiver.recv_timeout(Duration::from_millis(5)), Err(()));
    }

    #[test]
    fn test_receiver_iter_until_closed() {
        let (tx, rx) = mpsc::channel();
        let receiver = WatchEventReceiver::new(rx);
        let events = vec![
            WatchEvent::new("/docs/a.md", WatchEventKind::Created),
            WatchEvent::new("/docs/b.md", WatchEventKind::Modified),
        ];
        for event in &events {
            tx.send(event.clone()).unwrap();
        }
        drop(tx);

        let received: Vec<_> = receiver.iter().collect();
        assert_eq!(received, events);
    }

    #[test]
    fn test_handle_drop_signals_shutdown() {
        let (tx, rx) = mpsc::channel::<()>();
        let handle = WatchHandle::new(tx);
        assert!(handle.is_active());

        drop(handle);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_handle_stop_signals_shutdown() {
        let (tx, rx) = mpsc::channel::<()>();
        WatchHandle::new(tx).stop();
        assert!(rx.recv().is_err());
    }
}
