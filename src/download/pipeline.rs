//! The resolve pipeline: validate, fetch metadata, request conversion.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiResponse;
use crate::error::{DownloadError, UpstreamError};
use crate::metrics;
use crate::upstream::{Artists, FabdlClient};

use super::request::{IncomingRequest, TrackQuery};

/// A resolved track, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackDownload {
    /// Track title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Artist name(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<Artists>,
    /// Duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<serde_json::Number>,
    /// Absolute download URL.
    pub download_url: String,
}

/// Handle one inbound request end to end.
///
/// Never fails: every error becomes an error envelope. Dropping the
/// returned future abandons any in-flight upstream call.
#[instrument(skip_all, fields(method = %request.method()))]
pub async fn handle(client: &FabdlClient, request: &IncomingRequest) -> ApiResponse {
    let start = Instant::now();

    let outcome = match TrackQuery::from_request(request) {
        Ok(query) => resolve(client, &query).await,
        Err(kind) => {
            debug!(kind = kind.label(), "Rejected request");
            Err(kind)
        }
    };

    let label = match &outcome {
        Ok(_) => "success",
        Err(kind) => kind.label(),
    };
    metrics::record_request(start, label);

    match outcome {
        Ok(download) => ApiResponse::success(download),
        Err(kind) => ApiResponse::error(kind),
    }
}

/// Resolve a validated link into a download.
#[instrument(skip_all, fields(url = %query.as_str()))]
pub async fn resolve(
    client: &FabdlClient,
    query: &TrackQuery,
) -> Result<TrackDownload, DownloadError> {
    let info = client
        .get_track_info(query.as_str())
        .await
        .map_err(upstream_failure)?
        .into_track_info()
        .ok_or_else(|| {
            warn!("Metadata response lacks id or gid");
            DownloadError::TrackNotFound
        })?;

    debug!(id = %info.id, gid = %info.gid, "Resolved track metadata");

    let conversion = client
        .get_conversion(&info.gid, &info.id)
        .await
        .map_err(upstream_failure)?;

    let path = conversion.download_path().ok_or_else(|| {
        warn!(id = %info.id, "Conversion response lacks download_url");
        DownloadError::DownloadUrlMissing
    })?;

    let download = TrackDownload {
        title: info.name,
        artist: info.artists,
        duration_ms: info.duration_ms,
        download_url: client.download_url(path),
    };

    info!(
        title = download.title.as_deref().unwrap_or_default(),
        download_url = %download.download_url,
        "Track resolved"
    );

    Ok(download)
}

fn upstream_failure(error: UpstreamError) -> DownloadError {
    let kind = DownloadError::from_upstream(&error);
    warn!(error = %error, kind = kind.label(), "Upstream call failed");
    kind
}
