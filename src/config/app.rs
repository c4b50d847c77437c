//! Startup Configuration
//!
//! `AppConfig` is built once at startup and passed down explicitly.

use serde::{Deserialize, Serialize};

use super::keychain::Keychain;
use super::paths::{AppPaths, PathError};
use crate::keys::{FallbackKeyStore, FileKeyStore, KeyProvider, KeychainKeyStore};

/// Where the store key lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyBackend {
    /// Owner-only key file in the config directory
    #[default]
    File,
    /// OS credential store
    Keychain,
    /// OS credential store, key file when the keychain is unavailable
    KeychainWithFileFallback,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: AppPaths,
    pub key_backend: KeyBackend,
    /// Keychain service name, only used by keychain backends
    pub keychain_service: String,
}

impl AppConfig {
    /// Platform default paths with a file-backed key
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self::new(AppPaths::resolve()?))
    }

    pub fn new(paths: AppPaths) -> Self {
        Self {
            paths,
            key_backend: KeyBackend::default(),
            keychain_service: super::keychain::SERVICE_NAME.to_string(),
        }
    }

    pub fn with_key_backend(mut self, backend: KeyBackend) -> Self {
        self.key_backend = backend;
        self
    }

    /// Build the key provider matching `key_backend`
    pub fn key_provider(&self) -> KeyProvider {
        let keychain = || KeychainKeyStore::new(Keychain::with_service(&self.keychain_service));
        let file = || FileKeyStore::new(self.paths.key_file.clone());

        match self.key_backend {
            KeyBackend::File => KeyProvider::new(file()),
            KeyBackend::Keychain => KeyProvider::new(keychain()),
            KeyBackend::KeychainWithFileFallback => {
                KeyProvider::new(FallbackKeyStore::new(keychain(), file()))
            }
        }
    }
}
