//! Transfer event listeners and the ordered set the manager notifies.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

/// Observer of transfer lifecycle and progress.
///
/// Callbacks are awaited one at a time, in registration order, and the read
/// loop does not advance until every listener returned. A slow listener
/// therefore slows the transfer down, which is what bandwidth-estimating
/// listeners rely on.
#[async_trait]
pub trait DownloadEventListener: Send + Sync {
    /// Called once per transfer before the first chunk is read.
    async fn on_transfer_start(&self, url: &str);

    /// Called once per non-empty chunk.
    ///
    /// `length` is the chunk size, `position` the cumulative bytes delivered
    /// so far, `size` the declared content length.
    async fn on_bytes_transferred(&self, length: u64, url: &str, position: u64, size: Option<u64>);

    /// Called when the body was read to the end without a stop request.
    async fn on_transfer_end(&self, size: Option<u64>, url: &str);

    /// Called instead of [`on_transfer_end`](Self::on_transfer_end) when a
    /// stop request was observed before the body was exhausted.
    async fn on_transfer_canceled(&self, url: &str, position: u64, size: Option<u64>);
}

/// Ordered set of listeners, unique by `Arc` identity.
///
/// Insertion order is notification order. The manager takes a
/// [`snapshot`](Self::snapshot) per event, so a listener inserted mid-transfer
/// sees every event emitted after its insertion and none before.
#[derive(Default)]
pub struct ListenerSet {
    entries: Mutex<Vec<Arc<dyn DownloadEventListener>>>,
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

impl ListenerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from an initial list, dropping repeated instances.
    #[must_use]
    pub fn from_listeners(
        listeners: impl IntoIterator<Item = Arc<dyn DownloadEventListener>>,
    ) -> Self {
        let set = Self::new();
        for listener in listeners {
            set.insert(listener);
        }
        set
    }

    /// Appends `listener` unless the same instance is already registered.
    ///
    /// Returns true if it was inserted.
    pub fn insert(&self, listener: Arc<dyn DownloadEventListener>) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.iter().any(|existing| same_listener(existing, &listener)) {
            return false;
        }
        entries.push(listener);
        true
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current listeners in notification order.
    ///
    /// The lock is released before returning so callbacks can be awaited
    /// while other tasks keep inserting.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn DownloadEventListener>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// Compare data pointers only; vtable pointers for the same type may differ
// across codegen units.
fn same_listener(a: &Arc<dyn DownloadEventListener>, b: &Arc<dyn DownloadEventListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
