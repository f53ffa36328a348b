//! Upstream module for the fabdl track-resolution service.
//!
//! This module handles:
//! - Wire types for the metadata and conversion endpoints
//! - The fabdl HTTP client
//! - A mock fabdl server for testing

pub mod client;
pub mod mock;
pub mod types;

pub use client::FabdlClient;
pub use mock::{MockReply, MockServer, MockUpstream};
pub use types::{Artists, ConversionResponse, Endpoint, Identifier, TrackInfo, TrackInfoResponse};
