//! High-level settings persistence for embedding applications.
//!
//! [`SettingsStore`] owns one JSON-serializable configuration mapping and
//! persists it wholesale under a single namespaced storage key, through a
//! backend injected once at construction. Applications call [`SettingsStore::load`]
//! during their own startup sequence, then read and write settings through
//! the store; a change subscription delivers every mutation of the backing
//! area, keeping the resident configuration current.

pub mod config;
pub mod error;
pub mod store;
pub mod subscription;

pub use config::{SettingsConfig, DEFAULT_STORE_KEY};
pub use error::{SettingsError, SettingsResult};
pub use store::SettingsStore;
pub use subscription::{ChangeEvent, ChangeSubscription};

// Re-export key backend types
pub use prefstore_store::{
    ChangeSet, KeyChange, LocalFileBackend, SettingsBackend, StoreError, SyncedBackend,
};
