//! Progress bar driven by transfer events.

use std::time::Duration;

use async_trait::async_trait;
use dash_fetch::DownloadEventListener;
use indicatif::{ProgressBar, ProgressStyle};

const KNOWN_SIZE_TEMPLATE: &str =
    "{spinner} {msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const UNKNOWN_SIZE_TEMPLATE: &str = "{spinner} {msg} {bytes} ({bytes_per_sec})";

/// Renders transfer progress on stderr.
pub(crate) struct ProgressBarListener {
    bar: ProgressBar,
}

impl ProgressBarListener {
    pub(crate) fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template(UNKNOWN_SIZE_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }

    fn apply_size(&self, size: Option<u64>) {
        let Some(size) = size else {
            return;
        };
        if self.bar.length() == Some(size) {
            return;
        }
        self.bar.set_length(size);
        self.bar.set_style(
            ProgressStyle::with_template(KNOWN_SIZE_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
    }
}

#[async_trait]
impl DownloadEventListener for ProgressBarListener {
    async fn on_transfer_start(&self, url: &str) {
        self.bar.reset();
        self.bar.set_message(short_name(url));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    async fn on_bytes_transferred(
        &self,
        _length: u64,
        _url: &str,
        position: u64,
        size: Option<u64>,
    ) {
        self.apply_size(size);
        self.bar.set_position(position);
    }

    async fn on_transfer_end(&self, _size: Option<u64>, url: &str) {
        self.bar
            .finish_with_message(format!("{} done", short_name(url)));
    }

    async fn on_transfer_canceled(&self, url: &str, _position: u64, _size: Option<u64>) {
        self.bar
            .abandon_with_message(format!("{} canceled", short_name(url)));
    }
}

/// Last path segment of `url`, or the whole URL when it has none.
fn short_name(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| url.to_string())
}
