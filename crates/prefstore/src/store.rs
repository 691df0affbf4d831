//! The [`SettingsStore`] facade.

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, info};

use prefstore_store::{LocalFileBackend, SettingsBackend, SyncedBackend};

use crate::config::SettingsConfig;
use crate::error::SettingsResult;
use crate::subscription::ChangeSubscription;

/// Backend-agnostic persistence facade for one configuration mapping.
///
/// The store holds the resident configuration (defaults until the first
/// [`load`](Self::load)) and dispatches every operation to the backend
/// injected at construction. The backend choice is made exactly once; it is
/// never re-derived per call.
pub struct SettingsStore {
    backend: Arc<dyn SettingsBackend>,
    config: SettingsConfig,
    resident: Arc<RwLock<Value>>,
}

impl SettingsStore {
    /// Create a store over an explicit backend.
    pub fn new(backend: Arc<dyn SettingsBackend>, config: SettingsConfig) -> Self {
        info!(store_key = %config.store_key, "settings store created");
        let resident = Arc::new(RwLock::new(config.defaults.clone()));
        Self {
            backend,
            config,
            resident,
        }
    }

    /// Create a store over a fresh in-memory synchronized area.
    ///
    /// To share one area across several stores, clone a [`SyncedBackend`]
    /// and pass each handle to [`new`](Self::new).
    pub fn synced(config: SettingsConfig) -> Self {
        Self::new(Arc::new(SyncedBackend::new()), config)
    }

    /// Create a store over a file-backed area rooted at `dir`.
    pub fn local(dir: impl AsRef<Path>, config: SettingsConfig) -> SettingsResult<Self> {
        let backend = LocalFileBackend::open(dir.as_ref())?;
        Ok(Self::new(Arc::new(backend), config))
    }

    /// The store's configuration.
    pub fn config(&self) -> &SettingsConfig {
        &self.config
    }

    /// Snapshot of the resident configuration.
    ///
    /// Defaults until the first [`load`](Self::load); thereafter the last
    /// loaded value, updated by filtered change subscriptions as external
    /// mutations are observed.
    pub fn settings(&self) -> Value {
        self.resident.read().expect("settings lock poisoned").clone()
    }

    /// Load the persisted configuration, replace the resident copy with it,
    /// and return it. Resolves to the configured defaults when nothing has
    /// been persisted yet.
    pub fn load(&self) -> SettingsResult<Value> {
        let value = self.read(&self.config.store_key, &self.config.defaults)?;
        *self.resident.write().expect("settings lock poisoned") = value.clone();
        debug!(store_key = %self.config.store_key, "settings loaded");
        Ok(value)
    }

    /// Read the value under `key`, substituting `defaults` when absent.
    pub fn read(&self, key: &str, defaults: &Value) -> SettingsResult<Value> {
        let value = self.backend.get(key)?;
        Ok(value.unwrap_or_else(|| defaults.clone()))
    }

    /// Persist `settings` wholesale under the configured key.
    pub fn write(&self, settings: &Value) -> SettingsResult<()> {
        self.write_under(&self.config.store_key, settings)
    }

    /// Persist `settings` wholesale under an explicit `key`.
    pub fn write_under(&self, key: &str, settings: &Value) -> SettingsResult<()> {
        self.backend.set(key, settings)?;
        debug!(key, "settings written");
        Ok(())
    }

    /// Delete the entry under `key`. Idempotent; `true` iff it existed.
    pub fn remove(&self, key: &str) -> SettingsResult<bool> {
        Ok(self.backend.remove(key)?)
    }

    /// Empty the entire storage area, not just this store's key.
    pub fn clear(&self) -> SettingsResult<()> {
        self.backend.clear()?;
        Ok(())
    }

    /// Subscribe to changes of the configured key.
    ///
    /// Delivered changes also replace the resident configuration. Dropping
    /// the returned handle tears the subscription down.
    pub fn on_change(&self) -> ChangeSubscription {
        self.subscription(Some(self.config.store_key.clone()))
    }

    /// Subscribe to changes of an explicit `key`.
    pub fn on_change_key(&self, key: impl Into<String>) -> ChangeSubscription {
        self.subscription(Some(key.into()))
    }

    /// Subscribe to every change in the storage area, delivered as the full
    /// changed-keys map with no resident side effect.
    pub fn on_change_all(&self) -> ChangeSubscription {
        self.subscription(None)
    }

    fn subscription(&self, filter: Option<String>) -> ChangeSubscription {
        ChangeSubscription::new(
            self.backend.subscribe(),
            filter,
            Arc::clone(&self.resident),
            self.config.defaults.clone(),
        )
    }
}
