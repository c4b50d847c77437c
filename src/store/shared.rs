//! Shared connection store state
//!
//! Lock-guarded handle for callers that reach the store from more than one
//! thread. Each operation holds the lock across read, mutate and save.

use parking_lot::Mutex;
use std::sync::Arc;

use super::connections::{ConnectionStore, StoreState};
use super::error::StoreError;
use super::types::{ConnectionProfile, ProfileId};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct SharedConnectionStore {
    inner: Arc<Mutex<ConnectionStore>>,
}

impl SharedConnectionStore {
    pub fn new(store: ConnectionStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Startup sequence: create the config dir, resolve the key, construct
    /// the store. Call [`load`](Self::load) next; a load failure leaves the
    /// handle usable for [`discard_unreadable`](Self::discard_unreadable).
    pub fn open(config: &AppConfig) -> Result<Self, StoreError> {
        config.paths.ensure_config_dir()?;
        let provider = config.key_provider();
        let key = provider.resolve_key()?;
        tracing::info!(
            "Opening connection store {:?} ({} key)",
            config.paths.connections_file,
            provider.backend_name()
        );

        Ok(Self::new(ConnectionStore::new(
            config.paths.connections_file.clone(),
            key,
        )))
    }

    pub fn load(&self) -> Result<Vec<ConnectionProfile>, StoreError> {
        let mut store = self.inner.lock();
        Ok(store.load()?.to_vec())
    }

    pub fn state(&self) -> StoreState {
        self.inner.lock().state()
    }

    /// Clone of the current list
    pub fn snapshot(&self) -> Vec<ConnectionProfile> {
        self.inner.lock().connections().to_vec()
    }

    /// Run `f` with exclusive access to the store
    pub fn with_store<T>(
        &self,
        f: impl FnOnce(&mut ConnectionStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut store = self.inner.lock();
        f(&mut *store)
    }

    pub fn add(&self, profile: ConnectionProfile) -> Result<ProfileId, StoreError> {
        self.with_store(|store| store.add(profile))
    }

    pub fn remove(&self, position: usize) -> Result<ConnectionProfile, StoreError> {
        self.with_store(|store| store.remove(position))
    }

    pub fn update(&self, position: usize, profile: ConnectionProfile) -> Result<(), StoreError> {
        self.with_store(|store| store.update(position, profile))
    }

    pub fn duplicate(&self, position: usize) -> Result<ProfileId, StoreError> {
        self.with_store(|store| store.duplicate(position))
    }

    pub fn discard_unreadable(&self) -> Result<Option<std::path::PathBuf>, StoreError> {
        self.with_store(|store| store.discard_unreadable())
    }
}
