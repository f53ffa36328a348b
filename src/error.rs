//! Unified error types for the gateway.

use std::error::Error as StdError;

use axum::http::StatusCode;
use strum::IntoStaticStr;
use thiserror::Error;

use crate::upstream::Endpoint;

/// Process-level error type (startup, configuration, serving).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Upstream client error.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Metrics recorder installation failed.
    #[error("metrics error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A one-shot resolve ended in an error envelope.
    #[error("track could not be resolved: {0}")]
    Unresolved(DownloadError),
}

/// Errors raised while talking to the fabdl upstream.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The upstream answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        /// Which endpoint answered.
        endpoint: Endpoint,
        /// The status it answered with.
        status: reqwest::StatusCode,
    },

    /// No response within the configured bound.
    #[error("{endpoint} timed out")]
    Timeout {
        /// Which endpoint timed out.
        endpoint: Endpoint,
    },

    /// Connection or transport failure.
    #[error("{endpoint} request failed: {source}")]
    Request {
        /// Which endpoint failed.
        endpoint: Endpoint,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Response body was not the expected JSON.
    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        /// Which endpoint sent the body.
        endpoint: Endpoint,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl UpstreamError {
    /// Classify a reqwest error raised while sending a request.
    pub fn from_send(endpoint: Endpoint, source: reqwest::Error) -> Self {
        if source.is_timeout() || mentions_timeout(&source) {
            Self::Timeout { endpoint }
        } else {
            Self::Request { endpoint, source }
        }
    }

    /// Classify a reqwest error raised while reading the response body.
    pub fn from_body(endpoint: Endpoint, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Decode { endpoint, source }
        }
    }

    /// Whether this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Request { source, .. } => mentions_timeout(source),
            _ => false,
        }
    }
}

/// Whether any error in the source chain reports a timeout in its message.
fn mentions_timeout(error: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        let message = err.to_string().to_lowercase();
        if message.contains("timeout") || message.contains("timed out") {
            return true;
        }
        current = err.source();
    }
    false
}

/// Failure kinds reported to API callers.
///
/// `Display` yields the exact client-facing message. Every kind maps to
/// HTTP 400; upstream failures are not distinguished at the status level.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DownloadError {
    /// Request method was not GET.
    #[error("Only GET requests are allowed")]
    MethodNotAllowed,

    /// The `url` parameter is absent or blank.
    #[error("The url parameter is required")]
    MissingUrl,

    /// The `url` parameter is not a Spotify track link.
    #[error("Invalid Spotify track URL. Please provide a valid Spotify track link")]
    InvalidTrackUrl,

    /// Metadata endpoint answered with a non-success status.
    #[error("Error getting track information from Spotify")]
    TrackInfoFailed,

    /// Metadata response lacks `result.id` or `result.gid`.
    #[error("Track not found or unavailable")]
    TrackNotFound,

    /// Conversion endpoint answered with a non-success status.
    #[error("Error generating download URL")]
    ConversionFailed,

    /// Conversion response lacks `result.download_url`.
    #[error("Download URL not available for this track")]
    DownloadUrlMissing,

    /// An outbound call timed out.
    #[error("Request timeout. Please try again")]
    Timeout,

    /// Any other failure (transport, decode).
    #[error("Error processing the request. Please try again")]
    Internal,
}

impl DownloadError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        self.into()
    }

    /// Map an upstream failure to the caller-facing kind.
    ///
    /// Non-success statuses are reported per endpoint; timeouts and other
    /// failures share one kind each regardless of which call raised them.
    pub fn from_upstream(error: &UpstreamError) -> Self {
        if error.is_timeout() {
            return Self::Timeout;
        }

        match error {
            UpstreamError::Status {
                endpoint: Endpoint::TrackInfo,
                ..
            } => Self::TrackInfoFailed,
            UpstreamError::Status {
                endpoint: Endpoint::Conversion,
                ..
            } => Self::ConversionFailed,
            _ => Self::Internal,
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ServiceError>;
