//! Key file backend
//!
//! The key lives in a text file readable by the owning user only (`0600`).

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zeroize::Zeroizing;

use super::error::KeyAccessError;
use super::secret::SecretKey;
use super::store::KeyStore;
use crate::config::paths::ensure_private_dir;

pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_err(&self) -> impl FnOnce(std::io::Error) -> KeyAccessError + '_ {
        move |source| KeyAccessError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn write_err(&self) -> impl FnOnce(std::io::Error) -> KeyAccessError + '_ {
        move |source| KeyAccessError::Write {
            path: self.path.clone(),
            source,
        }
    }

    /// Drop group/other permission bits if anything widened them
    #[cfg(unix)]
    fn restrict_permissions(&self) -> Result<(), KeyAccessError> {
        use std::os::unix::fs::PermissionsExt;

        let mode = fs::metadata(&self.path)
            .map_err(self.read_err())?
            .permissions()
            .mode();

        if mode & 0o077 != 0 {
            tracing::warn!(
                "Key file {:?} had mode {:o}, restricting to 600",
                self.path,
                mode & 0o777
            );
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(self.write_err())?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn restrict_permissions(&self) -> Result<(), KeyAccessError> {
        Ok(())
    }
}

impl KeyStore for FileKeyStore {
    fn name(&self) -> String {
        "file".to_string()
    }

    fn load(&self) -> Result<Option<SecretKey>, KeyAccessError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => Zeroizing::new(text),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.read_err()(e)),
        };

        self.restrict_permissions()?;
        SecretKey::decode(&text).map(Some)
    }

    fn create(&self, key: &SecretKey) -> Result<SecretKey, KeyAccessError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        ensure_private_dir(dir)?;

        // Temp files are created 0600; the key appears at its final path
        // fully written or not at all.
        let mut temp = NamedTempFile::new_in(dir).map_err(self.write_err())?;
        temp.write_all(key.encode().as_bytes())
            .map_err(self.write_err())?;
        temp.as_file().sync_all().map_err(self.write_err())?;

        match temp.persist_noclobber(&self.path) {
            Ok(_) => {
                self.restrict_permissions()?;
                tracing::info!("Created store key file {:?}", self.path);
                Ok(key.clone())
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tracing::warn!(
                    "Key file {:?} was created concurrently, using the existing key",
                    self.path
                );
                self.load()?.ok_or_else(|| {
                    KeyAccessError::Malformed("key file disappeared after creation".to_string())
                })
            }
            Err(e) => Err(self.write_err()(e.error)),
        }
    }
}
