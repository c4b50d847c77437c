//! Encrypted connection list I/O
//!
//! The whole list is serialized to JSON, sealed as one blob and written
//! atomically: a temp file in the same directory is fsynced and renamed
//! over the target, and removed again if anything fails before that.

use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zeroize::Zeroizing;

use super::crypto;
use super::error::StoreError;
use super::types::{ConnectionProfile, ProfileId};
use crate::config::paths::ensure_private_dir;
use crate::keys::SecretKey;

/// Read and decrypt the connection list at `path`.
///
/// A missing file is a first run and yields an empty list. A present file
/// that fails to decrypt or parse is an error, never an empty list.
pub fn load_connections(
    path: &Path,
    key: &SecretKey,
) -> Result<Vec<ConnectionProfile>, StoreError> {
    read_connections(path, key).map(|(connections, _)| connections)
}

/// Like [`load_connections`], also reporting whether any id had to be
/// assigned or renumbered. The file must then be rewritten for those ids
/// to survive a restart.
pub(crate) fn read_connections(
    path: &Path,
    key: &SecretKey,
) -> Result<(Vec<ConnectionProfile>, bool), StoreError> {
    let blob = match fs::read(path) {
        Ok(blob) => blob,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok((Vec::new(), false)),
        Err(e) => return Err(StoreError::io(path)(e)),
    };

    let mut connections = decode_list(key, &blob)?;
    let ids_changed = assign_ids(&mut connections);
    Ok((connections, ids_changed))
}

/// Encrypt `connections` and atomically replace the file at `path`
pub fn save_connections(
    path: &Path,
    key: &SecretKey,
    connections: &[ConnectionProfile],
) -> Result<(), StoreError> {
    let blob = encode_blob(key, connections)?;
    write_atomic(path, &blob)
}

pub fn encode_blob(
    key: &SecretKey,
    connections: &[ConnectionProfile],
) -> Result<Vec<u8>, StoreError> {
    let plaintext = Zeroizing::new(serde_json::to_vec(connections)?);
    crypto::seal(key, &plaintext)
}

pub fn decode_blob(key: &SecretKey, blob: &[u8]) -> Result<Vec<ConnectionProfile>, StoreError> {
    let mut connections = decode_list(key, blob)?;
    assign_ids(&mut connections);
    Ok(connections)
}

fn decode_list(key: &SecretKey, blob: &[u8]) -> Result<Vec<ConnectionProfile>, StoreError> {
    let plaintext = Zeroizing::new(crypto::open(key, blob)?);
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Give records stored without an id a fresh one and renumber repeated ids
/// (hand-edited or merged files), keeping the first occurrence.
///
/// Returns whether any id changed.
fn assign_ids(connections: &mut [ConnectionProfile]) -> bool {
    let mut seen = HashSet::new();
    let mut changed = false;

    for profile in connections.iter_mut() {
        if profile.id.is_unassigned() {
            profile.id = ProfileId::new();
            tracing::debug!("Assigned id {} to connection {:?}", profile.id, profile.name);
            changed = true;
        } else if seen.contains(&profile.id) {
            profile.id = ProfileId::new();
            tracing::warn!("Duplicate connection id, reassigned to {}", profile.id);
            changed = true;
        }
        seen.insert(profile.id.clone());
    }

    changed
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_private_dir(dir)?;

    // NamedTempFile is created 0600 and deleted on drop unless persisted
    let mut temp = NamedTempFile::new_in(dir).map_err(StoreError::io(dir))?;
    temp.write_all(data).map_err(StoreError::io(temp.path()))?;
    temp.as_file()
        .sync_all()
        .map_err(StoreError::io(temp.path()))?;

    temp.persist(path)
        .map_err(|e| StoreError::io(path)(e.error))?;
    Ok(())
}
