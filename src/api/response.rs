//! JSON envelope returned for every download request.

use axum::{
    http::{
        header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::download::TrackDownload;
use crate::error::DownloadError;

/// `developer` field of every envelope.
pub const DEVELOPER: &str = "El Impaciente";
/// `telegram_channel` field of every envelope.
pub const TELEGRAM_CHANNEL: &str = "https://t.me/Apisimpacientes";
/// Cache policy sent with successful responses.
pub const SUCCESS_CACHE_CONTROL: &str = "public, max-age=3600";

const FALLBACK_BODY: &str = r#"{"status_code":400,"developer":"El Impaciente","telegram_channel":"https://t.me/Apisimpacientes","message":"Error processing the request. Please try again"}"#;

/// Outcome of one download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    /// The track resolved.
    Success(TrackDownload),
    /// Validation or upstream failure.
    Error(DownloadError),
}

/// Serialized form of an [`ApiResponse`].
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    /// Mirrors the HTTP status.
    pub status_code: u16,
    /// Fixed developer credit.
    pub developer: &'static str,
    /// Fixed channel link.
    pub telegram_channel: &'static str,
    /// Error message, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Track, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a TrackDownload>,
}

impl ApiResponse {
    /// Success response.
    pub fn success(download: TrackDownload) -> Self {
        Self::Success(download)
    }

    /// Error response.
    pub fn error(kind: DownloadError) -> Self {
        Self::Error(kind)
    }

    /// HTTP status of this response.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::Error(kind) => kind.status(),
        }
    }

    /// Error kind carried by this response, if any.
    pub fn error_kind(&self) -> Option<DownloadError> {
        match self {
            Self::Success(_) => None,
            Self::Error(kind) => Some(*kind),
        }
    }

    /// Build the JSON envelope.
    pub fn envelope(&self) -> Envelope<'_> {
        let (message, result) = match self {
            Self::Success(download) => (None, Some(download)),
            Self::Error(kind) => (Some(kind.to_string()), None),
        };

        Envelope {
            status_code: self.status().as_u16(),
            developer: DEVELOPER,
            telegram_channel: TELEGRAM_CHANNEL,
            message,
            result,
        }
    }

    /// Serialize the envelope.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.envelope())
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let (status, body) = match self.to_json() {
            Ok(body) => (self.status(), body),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                (StatusCode::BAD_REQUEST, FALLBACK_BODY.to_string())
            }
        };

        let mut response = (status, body).into_response();
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if status.is_success() {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(SUCCESS_CACHE_CONTROL));
        }

        response
    }
}
