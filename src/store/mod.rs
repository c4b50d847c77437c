//! Encrypted Connection Store
//!
//! Holds the ordered list of saved SSH/Telnet profiles and persists it as a
//! single authenticated-encrypted blob. Plaintext passwords never reach
//! disk outside that blob.

pub mod connections;
pub mod crypto;
pub mod error;
pub mod persist;
pub mod shared;
pub mod types;

pub use connections::{ConnectionStore, StoreState};
pub use error::StoreError;
pub use persist::{load_connections, save_connections};
pub use shared::SharedConnectionStore;
pub use types::{ConnectionProfile, ProfileAuth, ProfileId, Protocol, COPY_SUFFIX};
