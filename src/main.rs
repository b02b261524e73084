//! CLI entry point for dash-fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use dash_fetch::{DownloadConfig, DownloadEventListener, DownloadManager, TracingListener};
use tracing::{debug, info, warn};

mod cli;
mod progress;

use cli::Args;
use progress::ProgressBarListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = resolve_config(&args)?;
    let outcome = Arc::new(CancelTracker::default());
    let mut listeners: Vec<Arc<dyn DownloadEventListener>> =
        vec![Arc::new(TracingListener::new()), outcome.clone()];
    if !args.quiet && !args.no_progress {
        listeners.push(Arc::new(ProgressBarListener::new()));
    }
    let manager = DownloadManager::new(listeners, config)?;

    let stop = manager.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping transfer");
            stop.stop();
        }
    });

    let save = args.output.is_some();
    let result = manager.download(&args.url, save).await;
    manager.close().await;
    let content = result.with_context(|| format!("failed to fetch {}", args.url))?;

    if let (Some(path), Some(bytes)) = (args.output.as_ref(), content) {
        if outcome.was_canceled() {
            warn!(path = %path.display(), bytes = bytes.len(), "writing partial content");
        }
        tokio::fs::write(path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "saved");
    }

    Ok(())
}

/// Remembers whether the last transfer ended with a cancellation event.
#[derive(Debug, Default)]
struct CancelTracker {
    canceled: AtomicBool,
}

impl CancelTracker {
    fn was_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadEventListener for CancelTracker {
    async fn on_transfer_start(&self, _url: &str) {
        self.canceled.store(false, Ordering::SeqCst);
    }

    async fn on_bytes_transferred(&self, _: u64, _: &str, _: u64, _: Option<u64>) {}

    async fn on_transfer_end(&self, _size: Option<u64>, _url: &str) {
        self.canceled.store(false, Ordering::SeqCst);
    }

    async fn on_transfer_canceled(&self, _url: &str, _position: u64, _size: Option<u64>) {
        self.canceled.store(true, Ordering::SeqCst);
    }
}

/// Loads the optional config file and applies CLI overrides on top.
fn resolve_config(args: &Args) -> Result<DownloadConfig> {
    let mut config = match &args.config {
        Some(path) => DownloadConfig::from_json_file(path)?,
        None => DownloadConfig::default(),
    };
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = usize::try_from(chunk_size).context("chunk size does not fit usize")?;
    }
    if let Some(secs) = args.connect_timeout {
        config.connect_timeout_secs = secs;
    }
    if let Some(secs) = args.read_timeout {
        config.read_timeout_secs = secs;
    }
    config.write_to_disk = args.output.is_some();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_config_defaults_without_file_or_flags() {
        let args = Args::try_parse_from(["dash-fetch", "http://x/seg"]).unwrap();
        let config = resolve_config(&args).unwrap();
        assert_eq!(config, DownloadConfig::default());
    }

    #[tokio::test]
    async fn test_cancel_tracker_follows_terminal_event_not_stop_flag() {
        let tracker = CancelTracker::default();
        tracker.on_transfer_start("http://x/seg").await;
        tracker.on_transfer_end(Some(10), "http://x/seg").await;
        assert!(!tracker.was_canceled());

        tracker.on_transfer_start("http://x/seg").await;
        tracker.on_transfer_canceled("http://x/seg", 4, Some(10)).await;
        assert!(tracker.was_canceled());

        tracker.on_transfer_start("http://x/seg").await;
        assert!(!tracker.was_canceled());
    }

    #[tokio::test]
    async fn test_stop_after_completion_is_not_reported_as_partial() {
        use dash_fetch::download::{ResponseBody, Transport};

        struct TenBytes;

        struct TenBytesBody(bytes::Bytes);

        #[async_trait]
        impl ResponseBody for TenBytesBody {
            fn total_length(&self) -> Option<u64> {
                Some(10)
            }

            async fn read_chunk(
                &mut self,
                max_bytes: usize,
            ) -> Result<bytes::Bytes, dash_fetch::DownloadError> {
                let n = max_bytes.min(self.0.len());
                Ok(self.0.split_to(n))
            }
        }

        #[async_trait]
        impl Transport for TenBytes {
            async fn open(
                &self,
                _url: &str,
            ) -> Result<Box<dyn ResponseBody>, dash_fetch::DownloadError> {
                Ok(Box::new(TenBytesBody(bytes::Bytes::from_static(b"0123456789"))))
            }

            async fn close(&self) {}
        }

        let tracker = Arc::new(CancelTracker::default());
        let listeners: Vec<Arc<dyn DownloadEventListener>> = vec![tracker.clone()];
        let manager =
            DownloadManager::with_transport(Arc::new(TenBytes), listeners, DownloadConfig::default())
                .unwrap();

        let content = manager.download("memory://seg", true).await.unwrap();
        // Interrupt lands after the end event.
        manager.stop_handle().stop();

        assert_eq!(content.map(|c| c.len()), Some(10));
        assert!(manager.stop_handle().is_stop_requested());
        assert!(!tracker.was_canceled());
    }

    #[test]
    fn test_resolve_config_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "chunk_size": 1024, "read_timeout_secs": 10 }}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::try_parse_from([
            "dash-fetch",
            "http://x/seg",
            "--config",
            &path,
            "--chunk-size",
            "2048",
            "-o",
            "seg.m4s",
        ])
        .unwrap();
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.chunk_size, 2048);
        assert_eq!(config.read_timeout_secs, 10);
        assert!(config.write_to_disk);
    }
}
