//! fabdl API client.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::metrics;

use super::types::{ConversionResponse, Endpoint, Identifier, TrackInfoResponse};

/// Client for the fabdl track-resolution service.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct FabdlClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// Base URL without trailing slash.
    base_url: String,
    /// Timeout applied to each call.
    timeout: Duration,
}

impl FabdlClient {
    /// Create a new client from config.
    pub fn new(config: &Config) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.upstream_connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self::with_http(
            http,
            &config.upstream_base_url,
            config.upstream_timeout(),
        ))
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http(http: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL of the metadata endpoint for a Spotify track link.
    pub fn track_info_url(&self, spotify_url: &str) -> String {
        format!(
            "{}/spotify/get?url={}",
            self.base_url,
            urlencoding::encode(spotify_url)
        )
    }

    /// URL of the conversion endpoint for a track.
    pub fn conversion_url(&self, gid: &Identifier, id: &Identifier) -> String {
        format!(
            "{}/spotify/mp3-convert-task/{}/{}",
            self.base_url,
            urlencoding::encode(&gid.to_string()),
            urlencoding::encode(&id.to_string())
        )
    }

    /// Absolute download URL for a path returned by the conversion endpoint.
    pub fn download_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch track metadata for a Spotify track link.
    #[instrument(skip(self))]
    pub async fn get_track_info(
        &self,
        spotify_url: &str,
    ) -> Result<TrackInfoResponse, UpstreamError> {
        let url = self.track_info_url(spotify_url);
        self.get_json(Endpoint::TrackInfo, &url).await
    }

    /// Request an MP3 conversion for a track.
    #[instrument(skip_all, fields(gid = %gid, id = %id))]
    pub async fn get_conversion(
        &self,
        gid: &Identifier,
        id: &Identifier,
    ) -> Result<ConversionResponse, UpstreamError> {
        let url = self.conversion_url(gid, id);
        self.get_json(Endpoint::Conversion, &url).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: &str,
    ) -> Result<T, UpstreamError> {
        let start = Instant::now();
        let result = self.send_and_decode(endpoint, url).await;
        metrics::record_upstream_latency(start, endpoint);

        if let Err(UpstreamError::Timeout { .. }) = &result {
            metrics::inc_upstream_timeouts(endpoint);
        }

        result
    }

    async fn send_and_decode<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        url: &str,
    ) -> Result<T, UpstreamError> {
        debug!(%endpoint, url, "Calling upstream");

        let response = self
            .http
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::from_send(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { endpoint, status });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::from_body(endpoint, e))
    }
}
