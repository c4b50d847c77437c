//! Keychain Integration
//!
//! Stores secrets in the system keychain via the `keyring` crate.
//! Entries are addressed by service name plus an identifier; the account
//! name is prefixed with the OS user so the identity stays stable on macOS.

use keyring::Entry;

/// Service name for keychain entries
pub const SERVICE_NAME: &str = "nutty";

/// Keychain errors
#[derive(Debug, thiserror::Error)]
pub enum KeychainError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Secret not found for ID: {0}")]
    NotFound(String),

    #[error("Keychain store verification failed for ID: {0}")]
    VerificationFailed(String),
}

/// Thin keychain client bound to one service name
#[derive(Debug, Clone)]
pub struct Keychain {
    service: String,
}

impl Keychain {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Create with custom service name (for testing)
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, id: &str) -> Result<Entry, KeychainError> {
        let username = whoami::username();
        Ok(Entry::new(&self.service, &format!("{}@{}", username, id))?)
    }

    /// Store a secret, then read it back to make sure the platform kept it
    pub fn store(&self, id: &str, secret: &str) -> Result<(), KeychainError> {
        tracing::debug!("Keychain store: service={}, id={}", self.service, id);
        let entry = self.entry(id)?;
        entry.set_password(secret)?;

        match entry.get_password() {
            Ok(read_back) if read_back == secret => {
                tracing::debug!("Keychain store verified: id={}", id);
                Ok(())
            }
            Ok(_) => {
                tracing::error!("Keychain store verification failed: content mismatch");
                Err(KeychainError::VerificationFailed(id.to_string()))
            }
            Err(e) => {
                tracing::error!("Keychain store verification failed: {:?}", e);
                Err(KeychainError::Keyring(e))
            }
        }
    }

    /// Retrieve a secret from the keychain
    pub fn get(&self, id: &str) -> Result<String, KeychainError> {
        match self.entry(id)?.get_password() {
            Ok(secret) => Ok(secret),
            Err(keyring::Error::NoEntry) => Err(KeychainError::NotFound(id.to_string())),
            Err(e) => {
                tracing::error!("Keychain get failed: id={}, error={:?}", id, e);
                Err(KeychainError::Keyring(e))
            }
        }
    }
}

impl Default for Keychain {
    fn default() -> Self {
        Self::new()
    }
}
