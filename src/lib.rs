//! Spotify track download gateway.
//!
//! This library resolves a Spotify track link into an MP3 download URL by
//! calling the fabdl conversion service in two steps:
//!
//! ```text
//! GET /?url=https://open.spotify.com/track/abc123
//!   -> GET {fabdl}/spotify/get?url=...                 (id, gid, name, ...)
//!   -> GET {fabdl}/spotify/mp3-convert-task/{gid}/{id} (download_url)
//!   <- 200 {"status_code":200, ..., "result":{...}}
//! ```
//!
//! Every failure is reported as HTTP 400 with a fixed message.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`upstream`]: fabdl client, wire types, and mock server
//! - [`download`]: Request validation and the resolve pipeline
//! - [`api`]: HTTP router, handlers, and response envelope
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod download;
pub mod error;
pub mod metrics;
pub mod upstream;
pub mod utils;

pub use config::Config;
pub use error::{DownloadError, Result, ServiceError, UpstreamError};
