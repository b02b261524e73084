//! Streaming HTTP fetcher with progress listeners.
//!
//! This module provides a [`DownloadManager`] that fetches one resource at a
//! time, reads the response in bounded chunks and reports every step to a set
//! of [`DownloadEventListener`]s.
//!
//! # Features
//!
//! - Chunked reads of a configurable size (4096 bytes by default)
//! - Start / progress / end / canceled events, delivered in order
//! - Cooperative cancellation via [`DownloadManager::stop`] or a [`StopHandle`]
//! - Lazily created, reused HTTP session (30s connect, 5min read by default)
//! - Pluggable [`Transport`] for non-HTTP sources and tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dash_fetch::download::{DownloadConfig, DownloadManager, TracingListener};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = DownloadManager::new(Vec::new(), DownloadConfig::with_chunk_size(16 * 1024))?;
//! manager.add_listener(Arc::new(TracingListener::new()));
//! let content = manager.download("https://example.com/dash/init.mp4", true).await?;
//! assert!(content.is_some());
//! # Ok(())
//! # }
//! ```

mod config;
mod constants;
mod error;
mod listener;
mod manager;
mod tracing_listener;
mod transport;

pub use config::DownloadConfig;
pub use constants::{CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, READ_TIMEOUT_SECS};
pub use error::DownloadError;
pub use listener::{DownloadEventListener, ListenerSet};
pub use manager::{DownloadManager, StopHandle};
pub use tracing_listener::TracingListener;
pub use transport::{ChunkedBody, HttpTransport, ResponseBody, Transport};

// No module-local Result alias: use `Result<T, DownloadError>` explicitly.
