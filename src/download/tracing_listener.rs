//! Listener that reports transfer events through `tracing`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, info, trace};

use super::listener::DownloadEventListener;

/// Logs every transfer event.
///
/// Progress is logged at `trace` for each chunk and at `debug` whenever the
/// transfer crosses another `report_every` bytes, so long transfers stay
/// readable at the default level.
#[derive(Debug)]
pub struct TracingListener {
    report_every: u64,
    last_report: AtomicU64,
}

impl Default for TracingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingListener {
    /// Creates a listener reporting progress every 1 MiB.
    #[must_use]
    pub fn new() -> Self {
        Self::with_report_interval(1024 * 1024)
    }

    /// Creates a listener reporting progress every `report_every` bytes.
    #[must_use]
    pub fn with_report_interval(report_every: u64) -> Self {
        Self {
            report_every: report_every.max(1),
            last_report: AtomicU64::new(0),
        }
    }

    /// Returns true when `position` crossed a reporting boundary since the
    /// last report.
    fn should_report(&self, position: u64) -> bool {
        let bucket = position / self.report_every;
        let previous = self.last_report.swap(bucket, Ordering::SeqCst);
        bucket > previous
    }
}

#[async_trait]
impl DownloadEventListener for TracingListener {
    async fn on_transfer_start(&self, url: &str) {
        self.last_report.store(0, Ordering::SeqCst);
        info!(url, "transfer started");
    }

    async fn on_bytes_transferred(&self, length: u64, url: &str, position: u64, size: Option<u64>) {
        trace!(url, length, position, ?size, "bytes transferred");
        if self.should_report(position) {
            debug!(url, position, ?size, "transfer progress");
        }
    }

    async fn on_transfer_end(&self, size: Option<u64>, url: &str) {
        info!(url, ?size, "transfer finished");
    }

    async fn on_transfer_canceled(&self, url: &str, position: u64, size: Option<u64>) {
        info!(url, position, ?size, "transfer canceled");
    }
}
