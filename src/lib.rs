//! dash-fetch library
//!
//! Streaming HTTP content fetcher used as the data-plane primitive of a
//! media-playback emulator: it fetches segments over HTTP, reports fine-grained
//! progress (bytes transferred, position, total size) to listeners and supports
//! cooperative mid-transfer cancellation.
//!
//! # Architecture
//!
//! - [`download`] - Download manager, listener protocol and HTTP transport

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use download::{
    DEFAULT_CHUNK_SIZE, DownloadConfig, DownloadError, DownloadEventListener, DownloadManager,
    HttpTransport, StopHandle, TracingListener, Transport,
};
