//! Store Key Management
//!
//! One symmetric key per installation protects the connection store. It is
//! created on first run, persisted by a pluggable backend (key file, OS
//! keychain, or keychain with file fallback) and loaded on every start.

pub mod error;
pub mod file;
pub mod keychain;
pub mod provider;
pub mod secret;
pub mod store;

pub use error::KeyAccessError;
pub use file::FileKeyStore;
pub use keychain::{KeychainKeyStore, KEY_ENTRY_ID};
pub use provider::KeyProvider;
pub use secret::{SecretKey, KEY_LEN};
pub use store::{FallbackKeyStore, KeyStore, MemoryKeyStore};
