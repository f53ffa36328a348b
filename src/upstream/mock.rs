//! Mock fabdl upstream for testing.
//!
//! This module provides a local HTTP server that mimics the two fabdl
//! endpoints with scripted replies, so the gateway can be exercised
//! end to end without network access.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Scripted reply for one mock endpoint.
#[derive(Debug, Clone)]
pub struct MockReply {
    /// HTTP status to answer with.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// Delay before answering.
    pub delay: Duration,
}

impl MockReply {
    /// 200 reply with a JSON body.
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// 200 reply with a raw body (for malformed JSON).
    pub fn raw(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// Reply with the given status and an empty JSON object.
    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: "{}".to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Delay the reply.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn respond(&self) -> Response {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body.clone(),
        )
            .into_response()
    }
}

/// Requests observed by the mock server.
#[derive(Debug, Default)]
pub struct MockHits {
    track_info: AtomicUsize,
    conversion: AtomicUsize,
    last_track_url: Mutex<Option<String>>,
    last_conversion: Mutex<Option<(String, String)>>,
}

impl MockHits {
    /// Number of metadata requests received.
    pub fn track_info(&self) -> usize {
        self.track_info.load(Ordering::SeqCst)
    }

    /// Number of conversion requests received.
    pub fn conversion(&self) -> usize {
        self.conversion.load(Ordering::SeqCst)
    }

    /// Total requests received.
    pub fn total(&self) -> usize {
        self.track_info() + self.conversion()
    }

    /// Decoded `url` query parameter of the last metadata request.
    pub fn last_track_url(&self) -> Option<String> {
        self.last_track_url.lock().ok().and_then(|guard| guard.clone())
    }

    /// `(gid, id)` path segments of the last conversion request.
    pub fn last_conversion(&self) -> Option<(String, String)> {
        self.last_conversion.lock().ok().and_then(|guard| guard.clone())
    }
}

#[derive(Clone)]
struct MockState {
    track_info: Arc<MockReply>,
    conversion: Arc<MockReply>,
    hits: Arc<MockHits>,
}

/// Builder for a mock fabdl server.
#[derive(Debug, Clone)]
pub struct MockUpstream {
    track_info: MockReply,
    conversion: MockReply,
}

impl MockUpstream {
    /// Create a mock that resolves every track successfully.
    pub fn new() -> Self {
        Self {
            track_info: MockReply::json(json!({
                "result": {
                    "id": 1,
                    "gid": 2,
                    "name": "Song",
                    "artists": "Artist",
                    "duration_ms": 210000
                }
            })),
            conversion: MockReply::json(json!({
                "result": { "download_url": "/download/xyz.mp3" }
            })),
        }
    }

    /// Script the metadata endpoint.
    pub fn track_info(mut self, reply: MockReply) -> Self {
        self.track_info = reply;
        self
    }

    /// Script the conversion endpoint.
    pub fn conversion(mut self, reply: MockReply) -> Self {
        self.conversion = reply;
        self
    }

    /// Bind to an ephemeral local port and start serving.
    pub async fn spawn(self) -> std::io::Result<MockServer> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let hits = Arc::new(MockHits::default());

        let state = MockState {
            track_info: Arc::new(self.track_info),
            conversion: Arc::new(self.conversion),
            hits: hits.clone(),
        };

        let router = Router::new()
            .route("/spotify/get", get(track_info_handler))
            .route("/spotify/mp3-convert-task/:gid/:id", get(conversion_handler))
            .with_state(state);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(MockServer {
            base_url: format!("http://{}", addr),
            hits,
            handle,
        })
    }
}

impl Default for MockUpstream {
    fn default() -> Self {
        Self::new()
    }
}

async fn track_info_handler(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.hits.track_info.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = state.hits.last_track_url.lock() {
        *last = params.get("url").cloned();
    }
    state.track_info.respond().await
}

async fn conversion_handler(
    State(state): State<MockState>,
    Path((gid, id)): Path<(String, String)>,
) -> Response {
    state.hits.conversion.fetch_add(1, Ordering::SeqCst);
    if let Ok(mut last) = state.hits.last_conversion.lock() {
        *last = Some((gid, id));
    }
    state.conversion.respond().await
}

/// A running mock server. Stops serving when dropped.
#[derive(Debug)]
pub struct MockServer {
    base_url: String,
    hits: Arc<MockHits>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Base URL to point a client at.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Requests observed so far.
    pub fn hits(&self) -> &MockHits {
        &self.hits
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
