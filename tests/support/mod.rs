//! Shared helpers for integration tests: a recording listener and mock endpoints.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use dash_fetch::{DownloadEventListener, StopHandle};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One observed listener callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start {
        url: String,
    },
    Bytes {
        length: u64,
        url: String,
        position: u64,
        size: Option<u64>,
    },
    End {
        size: Option<u64>,
        url: String,
    },
    Canceled {
        url: String,
        position: u64,
        size: Option<u64>,
    },
}

impl Event {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End { .. } | Self::Canceled { .. })
    }
}

/// Records every callback; optionally stops the transfer once `position`
/// reaches a threshold.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
    stop_at: Option<(u64, StopHandle)>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_at(position: u64, handle: StopHandle) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            stop_at: Some((position, handle)),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn positions(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Bytes { position, .. } => Some(position),
                _ => None,
            })
            .collect()
    }

    pub fn transferred_total(&self) -> u64 {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Bytes { length, .. } => Some(length),
                _ => None,
            })
            .sum()
    }

    pub fn terminal_events(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(Event::is_terminal)
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().expect("events lock").push(event);
    }
}

#[async_trait]
impl DownloadEventListener for RecordingListener {
    async fn on_transfer_start(&self, url: &str) {
        self.push(Event::Start {
            url: url.to_string(),
        });
    }

    async fn on_bytes_transferred(&self, length: u64, url: &str, position: u64, size: Option<u64>) {
        self.push(Event::Bytes {
            length,
            url: url.to_string(),
            position,
            size,
        });
        if let Some((at, handle)) = &self.stop_at {
            if position >= *at {
                handle.stop();
            }
        }
    }

    async fn on_transfer_end(&self, size: Option<u64>, url: &str) {
        self.push(Event::End {
            size,
            url: url.to_string(),
        });
    }

    async fn on_transfer_canceled(&self, url: &str, position: u64, size: Option<u64>) {
        self.push(Event::Canceled {
            url: url.to_string(),
            position,
            size,
        });
    }
}

/// Deterministic, non-uniform test payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Starts a mock server answering GET `path_str` with `content`.
pub async fn serve_bytes(path_str: &str, content: &[u8]) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;

    mock_server
}
