//! Application state.

use crate::session::ServeSession;

/// State shared across all handlers.
pub(crate) struct AppState {
    /// The served root.
    pub(crate) session: ServeSession,
}
