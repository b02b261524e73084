//! Construction-time configuration for [`DownloadManager`](super::DownloadManager).

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, READ_TIMEOUT_SECS, TIMEOUT_RANGE_SECS,
};
use super::error::DownloadError;

/// Manager configuration.
///
/// Every field has a default, so a JSON file only needs the keys it overrides:
///
/// ```json
/// { "chunk_size": 16384, "read_timeout_secs": 60 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    /// Whether fetched content should be persisted by a storage collaborator.
    ///
    /// The manager only carries this flag; it never writes to disk itself.
    pub write_to_disk: bool,
    /// Upper bound on bytes read from the response per loop iteration.
    ///
    /// Any positive value is accepted. Reads only buffer what the body
    /// delivers, so a bound larger than the resource costs nothing.
    pub chunk_size: usize,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            write_to_disk: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl DownloadConfig {
    /// Returns a default config with the given chunk size.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    /// Loads and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ConfigIo`] if the file cannot be read,
    /// [`DownloadError::ConfigParse`] if it is not valid JSON for this type,
    /// and [`DownloadError::InvalidConfig`] if a value is out of range.
    pub fn from_json_file(path: &Path) -> Result<Self, DownloadError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DownloadError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|source| DownloadError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "loaded download config");
        Ok(config)
    }

    /// Validates values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.chunk_size == 0 {
            return Err(DownloadError::invalid_config(
                "chunk_size",
                "must be greater than 0",
            ));
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), DownloadError> {
    if TIMEOUT_RANGE_SECS.contains(&value) {
        return Ok(());
    }
    Err(DownloadError::invalid_config(
        field,
        format!(
            "{value}. Expected range: {}..={}",
            TIMEOUT_RANGE_SECS.start(),
            TIMEOUT_RANGE_SECS.end()
        ),
    ))
}
