//! HTTP API handlers.

use axum::{
    extract::{RawQuery, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use crate::download::{self, IncomingRequest};
use crate::upstream::FabdlClient;

use super::response::ApiResponse;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream client.
    pub client: FabdlClient,
    /// Prometheus handle, when metrics are enabled.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(client: FabdlClient) -> Self {
        Self {
            client,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Metrics handler - Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Download handler - accepts any method and path.
pub async fn download(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> ApiResponse {
    let request = IncomingRequest::from_query_string(method, query.as_deref());
    download::handle(&state.client, &request).await
}
