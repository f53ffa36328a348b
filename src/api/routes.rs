//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{download, health, metrics, AppState};

/// Create the API router.
///
/// Every path not listed here, and every non-GET request on a listed
/// path, is served by the download handler.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(health).fallback(download));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(metrics).fallback(download));
    }

    router
        .fallback(download)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
