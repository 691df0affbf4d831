//! Store configuration: the storage key and the default payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage key used when the embedding application supplies none.
pub const DEFAULT_STORE_KEY: &str = "hhappsettings";

/// Configuration for a [`SettingsStore`](crate::SettingsStore).
///
/// Supplied once at application start; `store_key` names the slot the whole
/// configuration mapping is persisted under, and `defaults` is the value
/// callers receive before anything has been persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Namespace slot for the persisted configuration mapping.
    pub store_key: String,
    /// Default data payload, returned whenever the slot is empty.
    pub defaults: Value,
}

impl SettingsConfig {
    /// Configuration with an explicit key and defaults.
    pub fn new(store_key: impl Into<String>, defaults: Value) -> Self {
        Self {
            store_key: store_key.into(),
            defaults,
        }
    }

    /// Configuration with the default storage key and explicit defaults.
    pub fn with_defaults(defaults: Value) -> Self {
        Self::new(DEFAULT_STORE_KEY, defaults)
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_KEY, Value::Object(Map::new()))
    }
}
