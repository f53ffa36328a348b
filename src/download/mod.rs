//! Download module: turns a Spotify track link into a download URL.
//!
//! Validation happens in [`request`]; the two upstream calls and error
//! translation happen in [`pipeline`].

pub mod pipeline;
pub mod request;

pub use pipeline::{handle, resolve, TrackDownload};
pub use request::{IncomingRequest, TrackQuery, SPOTIFY_TRACK_MARKER};
