//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/files", get(handlers::files::list_files))
        .route("/api/v1/preview", get(handlers::preview::get_preview))
        .route("/api/v1/image/{*path}", get(handlers::image::get_image))
        .route("/api/v1/events", get(handlers::events::events));

    let router = Router::new()
        .route("/", get(handlers::pages::index))
        .route("/view", get(handlers::pages::view))
        .merge(api_routes);

    security::with_security_headers(router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
