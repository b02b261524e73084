//! Single-transfer download manager.
//!
//! The [`DownloadManager`] fetches one resource at a time, reads the body in
//! fixed-size chunks and reports every step to its listeners. A transfer can
//! be stopped cooperatively: the stop request is observed at the next chunk
//! boundary and reported as a cancellation event, not as an error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dash_fetch::download::{DownloadConfig, DownloadManager, TracingListener};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = DownloadManager::new(
//!     vec![Arc::new(TracingListener::new())],
//!     DownloadConfig::default(),
//! )?;
//! let bytes = manager
//!     .download("https://example.com/video/seg-1.m4s", true)
//!     .await?;
//! println!("received {} bytes", bytes.map_or(0, |b| b.len()));
//! manager.close().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, instrument};

use super::config::DownloadConfig;
use super::error::DownloadError;
use super::listener::{DownloadEventListener, ListenerSet};
use super::transport::{HttpTransport, Transport};

/// Cloneable handle that requests cancellation of the running transfer.
///
/// Handles share the manager's stop flag, so listeners and signal handlers can
/// stop a transfer without holding the manager itself.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Requests cancellation of whatever transfer is currently running.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true if a stop was requested and not yet cleared by a new transfer.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Releases the busy flag when dropped, on every exit path of `download`.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// How a transfer loop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Canceled,
}

/// Streams resources through a shared transport and notifies listeners.
///
/// # Concurrency Model
///
/// - At most one transfer runs per instance; a second `download` while busy
///   fails with [`DownloadError::Busy`] and leaves the running one untouched
/// - Listener callbacks are awaited sequentially in registration order
///   before the next chunk is read
/// - `stop` only sets a flag; the read loop checks it before every read
///
/// The transport session is created lazily and reused for every transfer
/// until [`close`](Self::close).
pub struct DownloadManager {
    transport: Arc<dyn Transport>,
    listeners: ListenerSet,
    config: DownloadConfig,
    busy: AtomicBool,
    stop: Arc<AtomicBool>,
}

impl std::fmt::Debug for DownloadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadManager")
            .field("listeners", &self.listeners)
            .field("config", &self.config)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl DownloadManager {
    /// Creates a manager over an [`HttpTransport`] configured from `config`.
    ///
    /// Repeated listener instances in `listeners` are registered once.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        listeners: Vec<Arc<dyn DownloadEventListener>>,
        config: DownloadConfig,
    ) -> Result<Self, DownloadError> {
        let transport = Arc::new(HttpTransport::new(
            config.connect_timeout_secs,
            config.read_timeout_secs,
        ));
        Self::with_transport(transport, listeners, config)
    }

    /// Creates a manager over any [`Transport`].
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidConfig`] if `config` fails validation.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        listeners: Vec<Arc<dyn DownloadEventListener>>,
        config: DownloadConfig,
    ) -> Result<Self, DownloadError> {
        config.validate()?;
        Ok(Self {
            transport,
            listeners: ListenerSet::from_listeners(listeners),
            config,
            busy: AtomicBool::new(false),
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Returns true while a transfer's read loop is running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Bytes requested from the transport per read.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Whether a storage collaborator should persist fetched content.
    #[must_use]
    pub fn writes_to_disk(&self) -> bool {
        self.config.write_to_disk
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns a handle sharing this manager's stop flag.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    /// Registers `listener` unless the same instance is already registered.
    ///
    /// Safe to call during a transfer; the listener receives events emitted
    /// after this call only. Returns true if it was inserted.
    pub fn add_listener(&self, listener: Arc<dyn DownloadEventListener>) -> bool {
        let inserted = self.listeners.insert(listener);
        debug!(inserted, total = self.listeners.len(), "listener registration");
        inserted
    }

    /// Requests cancellation of the current transfer.
    ///
    /// `url` is informational only: there is at most one transfer per
    /// manager, and it is cancelled whichever URL is passed. Returns
    /// immediately; the read loop observes the request before its next read.
    /// Without a running transfer this has no lasting effect, because every
    /// new transfer clears the flag.
    pub fn stop(&self, url: &str) {
        debug!(url, busy = self.is_busy(), "stop requested");
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Releases the shared transport session.
    ///
    /// Downloading after `close` still works (a new session is created on
    /// demand) but is not a supported usage pattern.
    pub async fn close(&self) {
        self.transport.close().await;
    }

    /// Fetches `url`, notifying listeners of every step.
    ///
    /// Emits transfer-start, then one bytes-transferred event per chunk, then
    /// exactly one of transfer-end or transfer-canceled.
    ///
    /// # Returns
    ///
    /// `Some(bytes)` with everything received when `save` is true (a
    /// cancelled transfer returns what arrived before the stop), `None`
    /// otherwise.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::Busy`] if another transfer is running on this instance
    /// - Transport errors (invalid URL, network, timeout, HTTP status) are
    ///   returned as-is; no terminal event fires for a failed transfer
    ///
    /// The busy flag is released on every path.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download(&self, url: &str, save: bool) -> Result<Option<Vec<u8>>, DownloadError> {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            debug!("rejecting download while another transfer is running");
            return Err(DownloadError::busy(url));
        };
        self.stop.store(false, Ordering::SeqCst);
        info!("start downloading");

        let mut body = self.transport.open(url).await?;
        let total_size = body.total_length();
        let mut content = save.then(Vec::new);
        let mut position: u64 = 0;

        for listener in self.listeners.snapshot() {
            listener.on_transfer_start(url).await;
        }

        // Listeners are snapshotted per event so ones added mid-transfer
        // receive the events that follow.
        let outcome = loop {
            if self.stop.load(Ordering::SeqCst) {
                break Outcome::Canceled;
            }

            let chunk = body.read_chunk(self.config.chunk_size).await?;
            if chunk.is_empty() {
                break Outcome::Completed;
            }

            let length = chunk.len() as u64;
            position += length;
            if let Some(buffer) = content.as_mut() {
                buffer.extend_from_slice(&chunk);
            }
            for listener in self.listeners.snapshot() {
                listener
                    .on_bytes_transferred(length, url, position, total_size)
                    .await;
            }
        };

        match outcome {
            Outcome::Completed => {
                info!(bytes = position, ?total_size, "download complete");
                for listener in self.listeners.snapshot() {
                    listener.on_transfer_end(total_size, url).await;
                }
            }
            Outcome::Canceled => {
                info!(position, ?total_size, "download canceled");
                for listener in self.listeners.snapshot() {
                    listener.on_transfer_canceled(url, position, total_size).await;
                }
            }
        }

        Ok(content)
    }
}
