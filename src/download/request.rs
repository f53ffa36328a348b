//! Inbound request view and validation.

use std::collections::HashMap;

use axum::http::Method;

use crate::error::DownloadError;

/// Marker every accepted link must contain.
pub const SPOTIFY_TRACK_MARKER: &str = "open.spotify.com/track/";

/// Method and query parameters of an inbound request.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    method: Method,
    query: HashMap<String, String>,
}

impl IncomingRequest {
    /// Create a request from already-decoded parameters.
    pub fn new(method: Method, query: HashMap<String, String>) -> Self {
        Self { method, query }
    }

    /// Create a request from a raw query string.
    ///
    /// When a parameter repeats, the first occurrence wins.
    pub fn from_query_string(method: Method, raw_query: Option<&str>) -> Self {
        let mut query = HashMap::new();
        if let Some(raw) = raw_query {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                query
                    .entry(key.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }

        Self { method, query }
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Look up a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// A validated Spotify track link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    url: String,
}

impl TrackQuery {
    /// Validate a request, checking method, presence, then link shape.
    pub fn from_request(request: &IncomingRequest) -> Result<Self, DownloadError> {
        if request.method() != Method::GET {
            return Err(DownloadError::MethodNotAllowed);
        }

        let url = request
            .query_param("url")
            .filter(|value| !value.trim().is_empty())
            .ok_or(DownloadError::MissingUrl)?;

        if !url.trim().contains(SPOTIFY_TRACK_MARKER) {
            return Err(DownloadError::InvalidTrackUrl);
        }

        Ok(Self {
            url: url.to_string(),
        })
    }

    /// The link as received, forwarded upstream unchanged.
    pub fn as_str(&self) -> &str {
        &self.url
    }
}
