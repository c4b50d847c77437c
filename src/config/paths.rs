//! Filesystem Locations
//!
//! Resolves where nuTTY keeps its key file, encrypted connections and
//! preferences.
//! Config location: ~/.nutty on macOS/Linux, %APPDATA%\nuTTY on Windows

use std::fs;
use std::path::{Path, PathBuf};

/// Key file name inside the config directory
pub const KEY_FILENAME: &str = "nutty.key";

/// Encrypted connection store file name
pub const CONNECTIONS_FILENAME: &str = "connections.dat";

/// Plain JSON preferences file name
pub const SETTINGS_FILENAME: &str = "config.json";

/// Path resolution errors
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("Failed to determine config directory")]
    NoConfigDir,

    #[error("Failed to create config directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Get the nuTTY configuration directory
/// Returns %APPDATA%\nuTTY on Windows, ~/.nutty on macOS/Linux
pub fn config_dir() -> Result<PathBuf, PathError> {
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            return Ok(app_data.join("nuTTY"));
        }
        dirs::home_dir()
            .map(|home| home.join(".nutty"))
            .ok_or(PathError::NoConfigDir)
    }

    #[cfg(not(windows))]
    {
        dirs::home_dir()
            .map(|home| home.join(".nutty"))
            .ok_or(PathError::NoConfigDir)
    }
}

/// Absolute locations of every file the store touches.
///
/// Built once at startup and handed to the key provider and the stores,
/// nothing below this reads process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub key_file: PathBuf,
    pub connections_file: PathBuf,
    pub settings_file: PathBuf,
}

impl AppPaths {
    /// Resolve the platform default locations
    pub fn resolve() -> Result<Self, PathError> {
        Ok(Self::with_dir(config_dir()?))
    }

    /// Lay every file out under `dir` (for testing and portable installs)
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        let config_dir = dir.into();
        Self {
            key_file: config_dir.join(KEY_FILENAME),
            connections_file: config_dir.join(CONNECTIONS_FILENAME),
            settings_file: config_dir.join(SETTINGS_FILENAME),
            config_dir,
        }
    }

    /// Create the config directory if needed, owner-only on Unix
    pub fn ensure_config_dir(&self) -> Result<(), PathError> {
        ensure_private_dir(&self.config_dir)
    }
}

/// Create `dir` (and parents) and restrict it to the owning user.
pub(crate) fn ensure_private_dir(dir: &Path) -> Result<(), PathError> {
    let map_err = |source| PathError::CreateDir {
        path: dir.to_path_buf(),
        source,
    };

    if dir.is_dir() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(map_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).map_err(map_err)?;
    }

    tracing::debug!("Created config directory {:?}", dir);
    Ok(())
}
