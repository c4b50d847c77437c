//! Key store capability and the in-process backends

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::KeyAccessError;
use super::secret::SecretKey;

/// A place the store key can be fetched from or first written to.
pub trait KeyStore: Send + Sync {
    /// Short backend name for diagnostics
    fn name(&self) -> String;

    /// Fetch the persisted key, `Ok(None)` when none has been created yet
    fn load(&self) -> Result<Option<SecretKey>, KeyAccessError>;

    /// Persist a freshly generated key and return the key that is now
    /// authoritative. Backends that can detect a key written concurrently
    /// return that one instead of overwriting it.
    fn create(&self, key: &SecretKey) -> Result<SecretKey, KeyAccessError>;
}

/// Keeps the key in process memory only; useful for embedding and tests.
#[derive(Default)]
pub struct MemoryKeyStore {
    key: Mutex<Option<SecretKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: SecretKey) -> Self {
        Self {
            key: Mutex::new(Some(key)),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<Option<SecretKey>, KeyAccessError> {
        Ok(self.key.lock().clone())
    }

    fn create(&self, key: &SecretKey) -> Result<SecretKey, KeyAccessError> {
        let mut slot = self.key.lock();
        Ok(slot.get_or_insert_with(|| key.clone()).clone())
    }
}

/// Tries `primary` first and falls back to `fallback` only when the primary
/// backend does not exist on this system (see
/// [`KeyAccessError::is_backend_unavailable`]).
///
/// Any other primary error is returned as is: the primary may still hold
/// the installation's key, and generating a replacement would lose every
/// stored connection. A key found in either backend wins over generating a
/// new one, so a key written to the fallback keeps working once the primary
/// becomes reachable and stays empty.
pub struct FallbackKeyStore<P, F> {
    primary: P,
    fallback: F,
    primary_unavailable: AtomicBool,
}

impl<P: KeyStore, F: KeyStore> FallbackKeyStore<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            primary_unavailable: AtomicBool::new(false),
        }
    }

    fn mark_primary_unavailable(&self, e: &KeyAccessError) {
        tracing::warn!(
            "{} key store unavailable ({}), using {}",
            self.primary.name(),
            e,
            self.fallback.name()
        );
        self.primary_unavailable.store(true, Ordering::Relaxed);
    }
}

impl<P: KeyStore, F: KeyStore> KeyStore for FallbackKeyStore<P, F> {
    fn name(&self) -> String {
        format!("{}+{}", self.primary.name(), self.fallback.name())
    }

    fn load(&self) -> Result<Option<SecretKey>, KeyAccessError> {
        match self.primary.load() {
            Ok(Some(key)) => Ok(Some(key)),
            Ok(None) => self.fallback.load(),
            Err(e) if e.is_backend_unavailable() => {
                self.mark_primary_unavailable(&e);
                self.fallback.load()
            }
            Err(e) => Err(e),
        }
    }

    fn create(&self, key: &SecretKey) -> Result<SecretKey, KeyAccessError> {
        // A primary that could not be read must not be written either
        if self.primary_unavailable.load(Ordering::Relaxed) {
            return self.fallback.create(key);
        }

        match self.primary.create(key) {
            Ok(key) => Ok(key),
            Err(e) if e.is_backend_unavailable() => {
                self.mark_primary_unavailable(&e);
                self.fallback.create(key)
            }
            Err(e) => Err(e),
        }
    }
}
