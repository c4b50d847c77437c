//! Error types for key resolution

use std::path::PathBuf;
use thiserror::Error;

use crate::config::{KeychainError, PathError};

/// The store key could not be read, written or understood.
///
/// The application cannot open its connection store without a key, so
/// callers treat this as fatal.
#[derive(Debug, Error)]
pub enum KeyAccessError {
    #[error("Failed to read key file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write key file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Keychain(#[from] KeychainError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Stored key is malformed: {0}")]
    Malformed(String),
}

impl KeyAccessError {
    /// The backend does not exist or cannot be reached on this system at
    /// all (no secret service, no keychain access), as opposed to failing
    /// on an entry that may hold the key.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            KeyAccessError::Keychain(KeychainError::Keyring(
                keyring::Error::NoStorageAccess(_) | keyring::Error::PlatformFailure(_)
            ))
        )
    }
}
