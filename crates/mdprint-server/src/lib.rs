//! Live preview server for mdprint.
//!
//! Serves one directory of Markdown files with axum:
//!
//! - `GET /api/v1/files` lists the files with their titles
//! - `GET /api/v1/preview?path=` renders one file to laid-out HTML
//! - `GET /api/v1/image/{path}` serves images the previews reference
//! - `GET /api/v1/events` streams file changes as server-sent events
//! - `GET /` and `GET /view?path=` are plain browser pages that reload on change
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router (mdprint-server)
//!                        │
//!                        ├─► API routes ──► ServeSession ──► Converter (render only)
//!                        │
//!                        └─► SSE ◄── broadcast ◄── ServeSession::apply
//!                                                        ▲
//!                                   Watcher (notify) ────┘
//! ```

mod app;
mod assets;
mod error;
mod handlers;
mod middleware;
mod session;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mdprint_pipeline::Converter;
use mdprint_storage::{DEFAULT_DEBOUNCE, Scanner, WatchState, Watcher};
use state::AppState;

pub use error::ServerError;
pub use session::{ChangeEvent, ChangeKind, FileEntry, Preview, ServeSession};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on (0 picks a free port).
    pub port: u16,
    /// Directory to serve.
    pub root: PathBuf,
    /// Debounce window for change detection.
    pub debounce: Duration,
    /// Include subdirectories.
    pub recursive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7979,
            root: PathBuf::from("."),
            debounce: DEFAULT_DEBOUNCE,
            recursive: true,
        }
    }
}

/// Run the server until Ctrl-C.
///
/// `on_ready` receives the server URL once the listener is bound.
///
/// # Errors
///
/// Returns an error if the root cannot be served or watched, or the address
/// cannot be bound.
pub async fn run_server<F>(
    config: ServerConfig,
    converter: Arc<Converter>,
    on_ready: F,
) -> Result<(), ServerError>
where
    F: FnOnce(&str),
{
    let scanner = Scanner::new().recursive(config.recursive);
    let session =
        ServeSession::with_state(&config.root, converter, WatchState::with_scanner(scanner))?;
    let (events, handle) = Watcher::new(session.root())
        .debounce(config.debounce)
        .recursive(config.recursive)
        .start()?;

    let state = Arc::new(AppState { session });

    // Ends when the watch handle drops and the event channel closes.
    let forward_state = Arc::clone(&state);
    std::thread::spawn(move || {
        for event in events.iter() {
            forward_state.session.apply(&event);
        }
    });

    let app = app::create_router(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let url = format!("http://{}", listener.local_addr()?);
    tracing::info!(address = %url, "Starting server");
    on_ready(&url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&state)))
        .await?;

    drop(handle);
    Ok(())
}

/// Wait for Ctrl-C, then end open event streams so connections can drain.
async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
    state.session.close();
}
