//! Key provider: load-or-generate over a pluggable backend

use super::error::KeyAccessError;
use super::secret::SecretKey;
use super::store::KeyStore;

/// Guarantees a stable store key before any connection data is touched.
pub struct KeyProvider {
    store: Box<dyn KeyStore>,
}

impl KeyProvider {
    pub fn new(store: impl KeyStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn backend_name(&self) -> String {
        self.store.name()
    }

    /// Return the installation's key, creating and persisting it on first run.
    ///
    /// The key is never rotated: once created, every call (in this process
    /// or after a restart) yields the same bytes.
    pub fn resolve_key(&self) -> Result<SecretKey, KeyAccessError> {
        if let Some(key) = self.store.load()? {
            tracing::debug!("Loaded store key from {} backend", self.store.name());
            return Ok(key);
        }

        tracing::info!(
            "No store key in {} backend, generating a new one",
            self.store.name()
        );
        self.store.create(&SecretKey::generate())
    }
}
