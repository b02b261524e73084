//! Constants for the download module (timeouts, chunking).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large segments).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Default number of bytes read from the response per loop iteration.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Accepted range for configured timeouts, in seconds.
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;
