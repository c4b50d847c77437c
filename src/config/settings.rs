//! Preferences Storage
//!
//! Reads and writes the plain JSON preferences file (`config.json`).
//! Nothing secret lives here, so a corrupted file is backed up and replaced
//! with defaults instead of failing.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::paths::{ensure_private_dir, PathError};

/// Current preferences file version
pub const SETTINGS_VERSION: u32 = 1;

/// Terminal emulator used when none was chosen yet
pub const DEFAULT_TERMINAL: &str = "xfce4-terminal";

/// Preferences storage errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Settings version {found} is newer than supported {supported}")]
    VersionTooNew { found: u32, supported: u32 },
}

/// User preferences owned by the GUI shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Name of the terminal emulator used to launch sessions
    #[serde(default = "default_terminal")]
    pub terminal_emulator: String,
    /// Hide to the tray instead of quitting when the window closes
    #[serde(default = "default_minimize_on_close")]
    pub minimize_on_close: bool,
    /// Selected theme name, if any
    #[serde(default)]
    pub theme: Option<String>,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_terminal() -> String {
    DEFAULT_TERMINAL.to_string()
}

fn default_minimize_on_close() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            terminal_emulator: default_terminal(),
            minimize_on_close: default_minimize_on_close(),
            theme: None,
        }
    }
}

/// Preferences storage manager
pub struct SettingsStorage {
    path: PathBuf,
    prefs: Preferences,
}

impl SettingsStorage {
    /// Create a storage manager for `path`; call [`load`](Self::load) before use
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            prefs: Preferences::default(),
        }
    }

    /// Load preferences from disk
    /// Returns defaults if the file doesn't exist
    /// If the file is corrupted, creates a backup and returns defaults
    pub fn load(&mut self) -> Result<&Preferences, SettingsError> {
        self.prefs = match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str::<Preferences>(&contents) {
                Ok(prefs) => {
                    if prefs.version > SETTINGS_VERSION {
                        return Err(SettingsError::VersionTooNew {
                            found: prefs.version,
                            supported: SETTINGS_VERSION,
                        });
                    }
                    prefs
                }
                Err(e) => {
                    tracing::warn!("Settings file corrupted: {}", e);
                    match self.backup() {
                        Ok(backup_path) => tracing::warn!(
                            "Corrupted settings backed up to {:?}, using defaults",
                            backup_path
                        ),
                        Err(backup_err) => {
                            tracing::error!("Failed to backup corrupted settings: {}", backup_err)
                        }
                    }
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Preferences::default(),
            Err(e) => return Err(SettingsError::Io(e)),
        };

        Ok(&self.prefs)
    }

    /// Save preferences to disk
    pub fn save(&self) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        ensure_private_dir(dir)?;

        let json = serde_json::to_string_pretty(&self.prefs)?;

        // Write to temp file first, then rename (atomic write); the temp
        // file is deleted on drop unless persisted
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| SettingsError::Io(e.error))?;
        Ok(())
    }

    /// Current preferences
    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn set_terminal_emulator(&mut self, name: impl Into<String>) -> Result<(), SettingsError> {
        let name = name.into();
        self.update(|prefs| prefs.terminal_emulator = name)
    }

    pub fn set_minimize_on_close(&mut self, enabled: bool) -> Result<(), SettingsError> {
        self.update(|prefs| prefs.minimize_on_close = enabled)
    }

    pub fn set_theme(&mut self, theme: Option<String>) -> Result<(), SettingsError> {
        self.update(|prefs| prefs.theme = theme)
    }

    /// Apply `f` and save; the previous preferences are restored if saving fails
    fn update(&mut self, f: impl FnOnce(&mut Preferences)) -> Result<(), SettingsError> {
        let previous = self.prefs.clone();
        f(&mut self.prefs);

        let result = self.save();
        if result.is_err() {
            self.prefs = previous;
        }
        result
    }

    /// Get preferences file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the current file aside with a timestamp suffix
    pub fn backup(&self) -> Result<PathBuf, SettingsError> {
        let backup_path = self.path.with_extension(format!(
            "json.backup.{}",
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        ));

        if self.path.exists() {
            fs::copy(&self.path, &backup_path)?;
        }

        Ok(backup_path)
    }
}
