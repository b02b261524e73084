//! Transport seam between the download manager and the network.
//!
//! The manager only needs three things from the network layer: a lazily
//! created session, a response body it can read in bounded chunks, and the
//! declared content length. [`Transport`] and [`ResponseBody`] capture exactly
//! that; [`HttpTransport`] implements them on top of `reqwest`.

use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Opens resources as incremental byte streams.
///
/// Implementations own whatever session state they need and must tolerate
/// `open` being called again after `close`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues the request for `url` and returns its body once headers arrived.
    async fn open(&self, url: &str) -> Result<Box<dyn ResponseBody>, DownloadError>;

    /// Releases the shared session. A later `open` creates a fresh one.
    async fn close(&self);
}

/// A response body read in bounded chunks.
#[async_trait]
pub trait ResponseBody: Send {
    /// Declared content length, if the server sent one.
    fn total_length(&self) -> Option<u64>;

    /// Reads up to `max_bytes`.
    ///
    /// Fills the chunk completely unless the stream ends first. An empty
    /// chunk means the body is exhausted.
    async fn read_chunk(&mut self, max_bytes: usize) -> Result<Bytes, DownloadError>;
}

/// `reqwest`-backed transport with a lazily created, reused client.
///
/// The client is built on first `open` and shared by every following request
/// until [`Transport::close`] drops it.
#[derive(Debug)]
pub struct HttpTransport {
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    session: Mutex<Option<Client>>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }
}

impl HttpTransport {
    /// Creates a transport with explicit timeout values. No connection is
    /// made and no client is built until the first request.
    #[must_use]
    pub fn new(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        Self {
            connect_timeout_secs,
            read_timeout_secs,
            session: Mutex::new(None),
        }
    }

    /// Returns true while a client session is held.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn session(&self) -> Result<Client, reqwest::Error> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }
        debug!("creating HTTP session");
        let client = build_client(self.connect_timeout_secs, self.read_timeout_secs)?;
        *guard = Some(client.clone());
        Ok(client)
    }

    async fn send_request(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let client = self.session().map_err(|e| DownloadError::network(url, e))?;
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn open(&self, url: &str) -> Result<Box<dyn ResponseBody>, DownloadError> {
        let response = self.send_request(url).await?;
        let total_length = response.content_length();
        debug!(?total_length, status = response.status().as_u16(), "response opened");
        Ok(Box::new(ChunkedBody::new(
            url,
            total_length,
            response.bytes_stream(),
        )))
    }

    async fn close(&self) {
        let previous = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            debug!("HTTP session released");
        }
    }
}

fn build_client(
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .user_agent(user_agent::default_fetch_user_agent())
        .build()
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Re-chunks an arbitrary body stream into reads of at most `max_bytes`.
///
/// Network frames rarely line up with the requested chunk size, so bytes past
/// the requested length are held back for the next read.
pub struct ChunkedBody {
    url: String,
    total_length: Option<u64>,
    stream: ByteStream,
    pending: Bytes,
    exhausted: bool,
}

impl std::fmt::Debug for ChunkedBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedBody")
            .field("url", &self.url)
            .field("total_length", &self.total_length)
            .field("pending", &self.pending.len())
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl ChunkedBody {
    /// Wraps a body stream.
    pub fn new<S>(url: impl Into<String>, total_length: Option<u64>, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            url: url.into(),
            total_length,
            stream: Box::pin(stream),
            pending: Bytes::new(),
            exhausted: false,
        }
    }
}

#[async_trait]
impl ResponseBody for ChunkedBody {
    fn total_length(&self) -> Option<u64> {
        self.total_length
    }

    async fn read_chunk(&mut self, max_bytes: usize) -> Result<Bytes, DownloadError> {
        if self.pending.len() >= max_bytes {
            return Ok(self.pending.split_to(max_bytes));
        }

        // Grows with the frames that actually arrive; `max_bytes` is only a cap.
        let mut chunk = BytesMut::new();
        chunk.extend_from_slice(&self.pending);
        self.pending.clear();

        while chunk.len() < max_bytes && !self.exhausted {
            match self.stream.next().await {
                Some(Ok(frame)) => {
                    let wanted = max_bytes - chunk.len();
                    if frame.len() <= wanted {
                        chunk.extend_from_slice(&frame);
                    } else {
                        chunk.extend_from_slice(&frame[..wanted]);
                        self.pending = frame.slice(wanted..);
                    }
                }
                Some(Err(e)) => return Err(DownloadError::from_reqwest(self.url.clone(), e)),
                None => self.exhausted = true,
            }
        }

        Ok(chunk.freeze())
    }
}
