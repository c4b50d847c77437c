//! OS credential store backend

use zeroize::Zeroizing;

use super::error::KeyAccessError;
use super::secret::SecretKey;
use super::store::KeyStore;
use crate::config::{Keychain, KeychainError};

/// Fixed keychain identifier of the connection store key
pub const KEY_ENTRY_ID: &str = "connection-store-key";

pub struct KeychainKeyStore {
    keychain: Keychain,
    id: String,
}

impl KeychainKeyStore {
    pub fn new(keychain: Keychain) -> Self {
        Self {
            keychain,
            id: KEY_ENTRY_ID.to_string(),
        }
    }
}

impl KeyStore for KeychainKeyStore {
    fn name(&self) -> String {
        "keychain".to_string()
    }

    fn load(&self) -> Result<Option<SecretKey>, KeyAccessError> {
        match self.keychain.get(&self.id) {
            Ok(text) => SecretKey::decode(&Zeroizing::new(text)).map(Some),
            Err(KeychainError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn create(&self, key: &SecretKey) -> Result<SecretKey, KeyAccessError> {
        // Never replace a key another process (or an earlier run) stored
        if let Some(existing) = self.load()? {
            tracing::warn!("Keychain already holds a store key, keeping it");
            return Ok(existing);
        }

        self.keychain.store(&self.id, &key.encode())?;
        tracing::info!(
            "Stored store key in keychain service {}",
            self.keychain.service()
        );
        Ok(key.clone())
    }
}
