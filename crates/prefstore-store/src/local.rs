//! File-backed fallback storage.
//!
//! [`LocalFileBackend`] persists each key as one JSON text file in a spool
//! directory (`<dir>/<key>.json`), the local-storage analogue for
//! environments without a synchronized platform store. Filesystem writes
//! carry no native in-process change event, so the backend publishes its
//! own [`ChangeSet`] after every successful mutation; subscribers observe
//! writes issued through this same backend handle.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::event::{ChangePublisher, ChangeSet, ChangeStream, KeyChange};
use crate::keys::validate_key;
use crate::traits::SettingsBackend;

/// File extension for persisted entries.
const ENTRY_EXTENSION: &str = "json";

/// A storage area persisted as one JSON file per key.
#[derive(Debug)]
pub struct LocalFileBackend {
    dir: PathBuf,
    publisher: ChangePublisher,
}

impl LocalFileBackend {
    /// Open (or create) a storage area rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "local storage area opened");
        Ok(Self {
            dir,
            publisher: ChangePublisher::new(),
        })
    }

    /// Directory holding the persisted entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of currently open subscriptions on this area.
    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Read and decode the entry under `key`, `Ok(None)` when absent.
    fn read_entry(&self, key: &str) -> StoreResult<Option<Value>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(text) => {
                let value =
                    serde_json::from_str(&text).map_err(|e| StoreError::MalformedValue {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort read of the prior value for change reporting.
    ///
    /// An unreadable prior value must not block an overwrite or a delete,
    /// so decode failures degrade to `None` here instead of propagating.
    fn prior_value(&self, key: &str) -> Option<Value> {
        match self.read_entry(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "prior value unreadable, reporting as absent");
                None
            }
        }
    }

    /// Keys of all entries currently persisted in the spool directory.
    fn persisted_keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl SettingsBackend for LocalFileBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        validate_key(key)?;
        self.read_entry(key)
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        validate_key(key)?;
        let old = self.prior_value(key);

        let text = serde_json::to_string(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(self.entry_path(key), text)?;

        let mut changes = ChangeSet::new();
        changes.record(key, KeyChange::updated(old, value.clone()));
        self.publisher.publish(changes);

        debug!(key, "entry written to local area");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let old = self.prior_value(key);

        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => {
                let mut changes = ChangeSet::new();
                changes.record(key, KeyChange::removed(old));
                self.publisher.publish(changes);
                debug!(key, "entry removed from local area");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        let mut changes = ChangeSet::new();
        for key in self.persisted_keys()? {
            let old = self.prior_value(&key);
            match fs::remove_file(self.entry_path(&key)) {
                Ok(()) => changes.record(key, KeyChange::removed(old)),
                // Already gone: another writer raced us, nothing to report.
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.publisher.publish(changes);

        debug!("local area cleared");
        Ok(())
    }

    fn subscribe(&self) -> ChangeStream {
        self.publisher.subscribe()
    }
}
