//! Error types for credential storage.

use std::path::PathBuf;

/// Errors that can occur while reading or writing stored credentials.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading, writing or removing the backing file failed.
    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but isn't a valid credential document.
    #[error("credential file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The credential document could not be serialized.
    #[error("encoding credentials failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// No per-user data directory exists on this platform.
    #[error("no local data directory available for credential storage")]
    NoDataDir,
}
