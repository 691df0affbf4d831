//! Storage backends for prefstore.
//!
//! A settings store persists one JSON-serializable configuration mapping
//! under a single namespaced key. This crate defines the backend seam and
//! the two concrete implementations behind it:
//!
//! - [`SyncedBackend`] -- a shared in-memory area standing in for a host
//!   platform's synchronized key-value store. Cloned handles share the same
//!   area, and every mutation is delivered natively to all subscribers.
//! - [`LocalFileBackend`] -- the local fallback: one JSON text file per key
//!   in a spool directory. File writes have no native in-process change
//!   event, so the backend publishes its own change set after every
//!   successful mutation.
//!
//! # Design Rules
//!
//! 1. The backend is chosen once, at store construction, and injected. No
//!    per-call environment sniffing.
//! 2. A write fully replaces the prior value under its key; there are no
//!    partial writes and no merging.
//! 3. `clear` empties the entire storage area, never a single key.
//! 4. Every successful mutation publishes exactly one [`ChangeSet`] carrying
//!    old and new values, so in-process subscribers observe their own writes.
//! 5. The store never interprets the values it holds -- it is a pure
//!    key-value store over `serde_json::Value`.

pub mod error;
pub mod event;
pub mod keys;
pub mod local;
pub mod synced;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use event::{ChangePublisher, ChangeSet, ChangeStream, KeyChange};
pub use keys::validate_key;
pub use local::LocalFileBackend;
pub use synced::SyncedBackend;
pub use traits::SettingsBackend;
