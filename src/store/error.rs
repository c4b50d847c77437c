//! Error types for connection store operations

use std::path::PathBuf;
use thiserror::Error;

use super::types::ProfileId;
use crate::config::PathError;
use crate::keys::KeyAccessError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Key(#[from] KeyAccessError),

    /// The blob failed authentication: wrong key, truncation or tampering.
    /// Never treated as an empty store.
    #[error("Decryption failed (wrong key or corrupted data)")]
    Decryption,

    #[error("Encryption failed")]
    Encryption,

    /// Decrypted plaintext is not a valid connection list, or the list
    /// could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Position {position} out of range for {len} connections")]
    Index { position: usize, len: usize },

    #[error("No connection with id {0}")]
    UnknownProfile(ProfileId),

    /// Mutating or saving before a successful load would overwrite data
    /// that could not be read
    #[error("Connection store is not loaded")]
    NotLoaded,

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Path(#[from] PathError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}
