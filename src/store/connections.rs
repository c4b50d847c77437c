//! Connection Store
//!
//! Authoritative in-memory connection list plus its encrypted file. Every
//! structural change is followed by a full save; if that save fails the
//! list is rolled back, so memory never runs ahead of disk.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::StoreError;
use super::persist::{read_connections, save_connections};
use super::types::{ConnectionProfile, ProfileId};
use crate::keys::SecretKey;

/// Lifecycle of a [`ConnectionStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// `load` not called yet, or it failed on I/O
    Uninitialized,
    /// The file exists but could not be decrypted or parsed. Writes are
    /// refused until [`ConnectionStore::discard_unreadable`] is called.
    Unreadable,
    Loaded,
}

pub struct ConnectionStore {
    path: PathBuf,
    key: SecretKey,
    connections: Vec<ConnectionProfile>,
    state: StoreState,
}

impl ConnectionStore {
    pub fn new(path: impl Into<PathBuf>, key: SecretKey) -> Self {
        Self {
            path: path.into(),
            key,
            connections: Vec::new(),
            state: StoreState::Uninitialized,
        }
    }

    /// Construct and load in one step
    pub fn open(path: impl Into<PathBuf>, key: SecretKey) -> Result<Self, StoreError> {
        let mut store = Self::new(path, key);
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    /// Read the file into memory, replacing whatever was there
    pub fn load(&mut self) -> Result<&[ConnectionProfile], StoreError> {
        self.connections.clear();

        match read_connections(&self.path, &self.key) {
            Ok((connections, ids_changed)) => {
                self.connections = connections;
                self.state = StoreState::Loaded;
                tracing::info!(
                    "Loaded {} connections from {:?}",
                    self.connections.len(),
                    self.path
                );

                // Ids handed out during load must survive a restart
                if ids_changed {
                    if let Err(e) = self.save() {
                        tracing::warn!("Could not persist assigned connection ids: {}", e);
                    }
                }
                Ok(&self.connections)
            }
            Err(e) => {
                self.state = match &e {
                    StoreError::Decryption | StoreError::Serialization(_) => {
                        tracing::error!("Connection store {:?} is unreadable: {}", self.path, e);
                        StoreState::Unreadable
                    }
                    _ => StoreState::Uninitialized,
                };
                Err(e)
            }
        }
    }

    /// Encrypt and write the current list
    pub fn save(&self) -> Result<(), StoreError> {
        self.ensure_loaded()?;
        save_connections(&self.path, &self.key, &self.connections)?;
        tracing::debug!(
            "Saved {} connections to {:?}",
            self.connections.len(),
            self.path
        );
        Ok(())
    }

    /// Accept the loss of an unreadable store: move the file aside with a
    /// timestamp suffix and start over with an empty list.
    ///
    /// Returns the backup path, or `None` if there was no file to move.
    pub fn discard_unreadable(&mut self) -> Result<Option<PathBuf>, StoreError> {
        if self.state != StoreState::Unreadable {
            return Err(StoreError::NotLoaded);
        }

        let backup = if self.path.exists() {
            let mut name = OsString::from(self.path.as_os_str());
            name.push(format!(
                ".unreadable.{}",
                chrono::Utc::now().format("%Y%m%d_%H%M%S")
            ));
            let backup_path = PathBuf::from(name);

            fs::rename(&self.path, &backup_path).map_err(StoreError::io(&self.path))?;
            tracing::warn!("Moved unreadable connection store to {:?}", backup_path);
            Some(backup_path)
        } else {
            None
        };

        self.connections.clear();
        self.state = StoreState::Loaded;
        Ok(backup)
    }

    pub fn connections(&self) -> &[ConnectionProfile] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get(&self, position: usize) -> Result<&ConnectionProfile, StoreError> {
        self.connections.get(position).ok_or(StoreError::Index {
            position,
            len: self.connections.len(),
        })
    }

    pub fn position_of(&self, id: &ProfileId) -> Result<usize, StoreError> {
        self.connections
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| StoreError::UnknownProfile(id.clone()))
    }

    pub fn get_by_id(&self, id: &ProfileId) -> Result<&ConnectionProfile, StoreError> {
        let position = self.position_of(id)?;
        self.get(position)
    }

    /// Append a profile and save. Returns the id it is stored under.
    pub fn add(&mut self, mut profile: ConnectionProfile) -> Result<ProfileId, StoreError> {
        if self.connections.iter().any(|p| p.id == profile.id) {
            profile.id = ProfileId::new();
        }
        let id = profile.id.clone();

        self.mutate(|list| {
            list.push(profile);
            Ok(())
        })?;
        Ok(id)
    }

    /// Remove the profile at `position`; later entries shift down by one
    pub fn remove(&mut self, position: usize) -> Result<ConnectionProfile, StoreError> {
        self.mutate(|list| {
            check_position(list, position)?;
            Ok(list.remove(position))
        })
    }

    /// Replace the profile at `position`. The stored entry keeps its id.
    pub fn update(
        &mut self,
        position: usize,
        mut profile: ConnectionProfile,
    ) -> Result<(), StoreError> {
        self.mutate(|list| {
            check_position(list, position)?;
            profile.id = list[position].id.clone();
            list[position] = profile;
            Ok(())
        })
    }

    /// Insert a copy of the profile at `position` right after it, with the
    /// name suffixed " (Copy)". Returns the id of the copy.
    pub fn duplicate(&mut self, position: usize) -> Result<ProfileId, StoreError> {
        self.mutate(|list| {
            check_position(list, position)?;
            let copy = list[position].duplicate();
            let id = copy.id.clone();
            list.insert(position + 1, copy);
            Ok(id)
        })
    }

    pub fn remove_by_id(&mut self, id: &ProfileId) -> Result<ConnectionProfile, StoreError> {
        let position = self.position_of(id)?;
        self.remove(position)
    }

    pub fn update_by_id(
        &mut self,
        id: &ProfileId,
        profile: ConnectionProfile,
    ) -> Result<(), StoreError> {
        let position = self.position_of(id)?;
        self.update(position, profile)
    }

    pub fn duplicate_by_id(&mut self, id: &ProfileId) -> Result<ProfileId, StoreError> {
        let position = self.position_of(id)?;
        self.duplicate(position)
    }

    fn ensure_loaded(&self) -> Result<(), StoreError> {
        match self.state {
            StoreState::Loaded => Ok(()),
            _ => Err(StoreError::NotLoaded),
        }
    }

    /// Apply `f` and save; on any failure the list is restored
    fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut Vec<ConnectionProfile>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.ensure_loaded()?;
        let previous = self.connections.clone();

        let result = f(&mut self.connections).and_then(|out| self.save().map(|()| out));
        if result.is_err() {
            self.connections = previous;
        }
        result
    }
}

fn check_position(list: &[ConnectionProfile], position: usize) -> Result<(), StoreError> {
    if position < list.len() {
        Ok(())
    } else {
        Err(StoreError::Index {
            position,
            len: list.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::{Protocol, COPY_SUFFIX};
    use tempfile::{tempdir, TempDir};

    fn box1() -> ConnectionProfile {
        ConnectionProfile::ssh_with_password("box1", "alice", "10.0.0.5", "secret1")
    }

    fn box2() -> ConnectionProfile {
        ConnectionProfile::ssh_with_identity_file("box2", "bob", "10.0.0.6", "/home/bob/.ssh/id_rsa")
    }

    fn open_store() -> (TempDir, ConnectionStore) {
        let temp = tempdir().unwrap();
        let store =
            ConnectionStore::open(temp.path().join("connections.dat"), SecretKey::generate())
                .unwrap();
        (temp, store)
    }

    fn reopen(store: &ConnectionStore) -> ConnectionStore {
        ConnectionStore::open(store.path(), store.key.clone()).unwrap()
    }

    #[test]
    fn test_first_run_scenario() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("connections.dat");
        let key = SecretKey::generate();

        let mut store = ConnectionStore::new(&path, key.clone());
        assert_eq!(store.state(), StoreState::Uninitialized);
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.state(), StoreState::Loaded);

        let profile = box1();
        store.add(profile.clone()).unwrap();

        // Restart with the same key
        let restarted = ConnectionStore::open(&path, key.clone()).unwrap();
        assert_eq!(restarted.connections(), &[profile][..]);
        assert_eq!(restarted.get(0).unwrap().protocol, Protocol::Ssh);

        // Corrupt one byte
        let mut blob = fs::read(&path).unwrap();
        let middle = blob.len() / 2;
        blob[middle] ^= 0x80;
        fs::write(&path, &blob).unwrap();

        let mut corrupted = ConnectionStore::new(&path, key);
        assert!(matches!(corrupted.load(), Err(StoreError::Decryption)));
        assert_eq!(corrupted.state(), StoreState::Unreadable);
        assert!(corrupted.is_empty());
    }

    #[test]
    fn test_remove_scenario() {
        let (_temp, mut store) = open_store();
        let a = box1();
        let b = box2();
        store.add(a).unwrap();
        store.add(b.clone()).unwrap();

        store.remove(0).unwrap();
        assert_eq!(store.connections(), &[b][..]);

        store.remove(0).unwrap();
        assert!(store.is_empty());

        assert!(matches!(
            store.remove(0),
            Err(StoreError::Index { position: 0, len: 0 })
        ));
        assert!(reopen(&store).is_empty());
    }

    #[test]
    fn test_add_appends() {
        let (_temp, mut store) = open_store();
        store.add(box1()).unwrap();
        let id = store.add(box2()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().id, id);
        assert_eq!(reopen(&store).connections(), store.connections());
    }

    #[test]
    fn test_update_preserves_others() {
        let (_temp, mut store) = open_store();
        store.add(box1()).unwrap();
        store.add(box2()).unwrap();
        store.add(ConnectionProfile::telnet("switch", "10.0.0.1")).unwrap();
        let before = store.connections().to_vec();

        let replacement = ConnectionProfile::ssh_with_password("renamed", "carol", "10.0.0.7", "new");
        store.update(1, replacement.clone()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get(0).unwrap(), &before[0]);
        assert_eq!(store.get(2).unwrap(), &before[2]);

        let updated = store.get(1).unwrap();
        assert_eq!(updated.id, before[1].id);
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.password.as_deref(), Some("new"));
        assert_eq!(reopen(&store).connections(), store.connections());

        assert!(matches!(
            store.update(3, replacement),
            Err(StoreError::Index { position: 3, len: 3 })
        ));
    }

    #[test]
    fn test_duplicate() {
        let (_temp, mut store) = open_store();
        store.add(box1()).unwrap();
        store.add(box2()).unwrap();
        let source = store.get(0).unwrap().clone();

        let copy_id = store.duplicate(0).unwrap();
        assert_eq!(store.len(), 3);

        let copy = store.get(1).unwrap();
        assert_eq!(copy.id, copy_id);
        assert_ne!(copy.id, source.id);
        assert_eq!(copy.name, format!("box1{}", COPY_SUFFIX));
        assert_eq!(copy.password, source.password);
        assert_eq!(copy.domain, source.domain);
        assert_eq!(store.get(2).unwrap().name, "box2");

        assert!(store.duplicate(5).is_err());
        assert_eq!(reopen(&store).len(), 3);
    }

    #[test]
    fn test_id_addressing_survives_reorder() {
        let (_temp, mut store) = open_store();
        store.add(box1()).unwrap();
        let b = store.add(box2()).unwrap();

        // Removing an earlier entry shifts positions but not ids
        store.remove(0).unwrap();
        assert_eq!(store.position_of(&b).unwrap(), 0);

        store.duplicate_by_id(&b).unwrap();
        store
            .update_by_id(&b, ConnectionProfile::telnet("box2-telnet", "10.0.0.6"))
            .unwrap();
        assert_eq!(store.get_by_id(&b).unwrap().name, "box2-telnet");

        let removed = store.remove_by_id(&b).unwrap();
        assert_eq!(removed.id, b);
        assert!(matches!(
            store.get_by_id(&b),
            Err(StoreError::UnknownProfile(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_reassigns_clashing_id() {
        let (_temp, mut store) = open_store();
        let profile = box1();
        let first = store.add(profile.clone()).unwrap();
        let second = store.add(profile).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_unloaded_store_refuses_writes() {
        let temp = tempdir().unwrap();
        let mut store = ConnectionStore::new(temp.path().join("connections.dat"), SecretKey::generate());

        assert!(matches!(store.add(box1()), Err(StoreError::NotLoaded)));
        assert!(matches!(store.save(), Err(StoreError::NotLoaded)));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_wrong_key_then_discard() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("connections.dat");

        let mut original = ConnectionStore::open(&path, SecretKey::generate()).unwrap();
        original.add(box1()).unwrap();
        let blob = fs::read(&path).unwrap();

        let mut store = ConnectionStore::new(&path, SecretKey::generate());
        assert!(matches!(store.load(), Err(StoreError::Decryption)));

        // Nothing overwrites the undecryptable file
        assert!(matches!(store.add(box2()), Err(StoreError::NotLoaded)));
        assert_eq!(fs::read(&path).unwrap(), blob);

        let backup = store.discard_unreadable().unwrap().unwrap();
        assert_eq!(fs::read(&backup).unwrap(), blob);
        assert!(!path.exists());
        assert_eq!(store.state(), StoreState::Loaded);

        store.add(box2()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_discard_requires_unreadable() {
        let (_temp, mut store) = open_store();
        store.add(box1()).unwrap();
        assert!(matches!(store.discard_unreadable(), Err(StoreError::NotLoaded)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("store");
        let path = dir.join("connections.dat");
        let mut store = ConnectionStore::open(&path, SecretKey::generate()).unwrap();
        store.add(box1()).unwrap();

        // Occupy the target with a non-empty directory so the rename fails
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("blocker"), b"x").unwrap();

        assert!(matches!(store.add(box2()), Err(StoreError::Io { .. })));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().name, "box1");
    }

    #[test]
    fn test_load_dedupes_ids() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("connections.dat");
        let key = SecretKey::generate();

        let a = box1();
        let mut b = box2();
        b.id = a.id.clone();
        save_connections(&path, &key, &[a.clone(), b]).unwrap();

        let store = ConnectionStore::open(&path, key).unwrap();
        assert_eq!(store.get(0).unwrap().id, a.id);
        assert_ne!(store.get(1).unwrap().id, a.id);

        // The renumbered id was written back
        assert_eq!(reopen(&store).connections(), store.connections());
    }

    #[test]
    fn test_legacy_ids_stable_across_restarts() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("connections.dat");
        let key = SecretKey::generate();

        let legacy = r#"[{"name": "box1", "username": "alice", "domain": "10.0.0.5",
            "protocol": "SSH", "x11": false, "password": "secret1", "description": ""}]"#;
        fs::write(&path, crate::store::crypto::seal(&key, legacy.as_bytes()).unwrap()).unwrap();

        let first = ConnectionStore::open(&path, key.clone()).unwrap();
        let id = first.get(0).unwrap().id.clone();
        assert!(!id.is_unassigned());

        let second = ConnectionStore::open(&path, key).unwrap();
        assert_eq!(second.get(0).unwrap().id, id);
        assert_eq!(second.get(0).unwrap().password.as_deref(), Some("secret1"));
    }
}
