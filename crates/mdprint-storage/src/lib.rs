//! Source discovery and change detection for mdprint.
//!
//! - [`Scanner`]: deterministic discovery of Markdown files under a root
//! - [`staleness`]: `name.md` to `name.pdf` mapping and the mtime comparison
//! - [`Watcher`]: debounced filesystem notifications, released when the
//!   [`WatchHandle`] drops
//! - [`WatchState`]: known files per root, used to drop redundant events

mod debouncer;
mod error;
mod event;
mod scanner;
mod state;
pub mod staleness;
mod watcher;

pub use debouncer::EventDebouncer;
pub use error::{ScanError, WatchError};
pub use event::{WatchEvent, WatchEventKind, WatchEventReceiver, WatchHandle};
pub use scanner::{Scanner, is_hidden, is_markdown, scan};
pub use staleness::{Freshness, target_path};
pub use state::{TrackedFiles, WatchState};
pub use watcher::{DEFAULT_DEBOUNCE, Watcher, run_watch_loop};
