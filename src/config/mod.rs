//! Configuration Management Module
//!
//! Resolves on-disk locations, builds the startup configuration, wraps the
//! system keychain and persists user preferences.

pub mod app;
pub mod keychain;
pub mod paths;
pub mod settings;

pub use app::{AppConfig, KeyBackend};
pub use keychain::{Keychain, KeychainError};
pub use paths::{config_dir, AppPaths, PathError};
pub use settings::{Preferences, SettingsError, SettingsStorage, SETTINGS_VERSION};
