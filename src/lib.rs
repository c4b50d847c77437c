//! nuTTY - encrypted connection store
//!
//! Storage core of the nuTTY SSH/Telnet session manager: one symmetric key
//! per installation ([`keys`]), an encrypted list of connection profiles
//! ([`store`]), and the startup configuration tying them together
//! ([`config`]).
//!
//! ```no_run
//! use nutty_lib::config::AppConfig;
//! use nutty_lib::store::{ConnectionProfile, SharedConnectionStore};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::resolve()?;
//! let store = SharedConnectionStore::open(&config)?;
//! store.load()?;
//! store.add(ConnectionProfile::ssh_with_password("box1", "alice", "10.0.0.5", "secret1"))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod keys;
pub mod logging;
pub mod store;

pub use config::{AppConfig, AppPaths, KeyBackend};
pub use keys::{KeyAccessError, KeyProvider, SecretKey};
pub use store::{ConnectionProfile, ConnectionStore, SharedConnectionStore, StoreError};
