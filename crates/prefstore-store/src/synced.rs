//! Shared in-memory backend with native change delivery.
//!
//! [`SyncedBackend`] models a host platform's synchronized key-value store:
//! one storage area shared by every handle cloned from it, where the
//! platform itself notifies listeners of each mutation. Cloning the backend
//! clones the handle, not the data, so a write through one handle is
//! observed by subscribers of any other.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::event::{ChangePublisher, ChangeSet, ChangeStream, KeyChange};
use crate::keys::validate_key;
use crate::traits::SettingsBackend;

/// One shared storage area: entries plus the change fan-out.
#[derive(Debug)]
struct SharedArea {
    entries: RwLock<BTreeMap<String, Value>>,
    publisher: ChangePublisher,
}

/// A handle onto a shared, in-memory synchronized storage area.
#[derive(Clone, Debug)]
pub struct SyncedBackend {
    area: Arc<SharedArea>,
}

impl SyncedBackend {
    /// Create a new empty storage area.
    pub fn new() -> Self {
        Self::with_capacity(crate::event::DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new area whose subscriber channels hold up to `capacity`
    /// undelivered change sets.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            area: Arc::new(SharedArea {
                entries: RwLock::new(BTreeMap::new()),
                publisher: ChangePublisher::with_capacity(capacity),
            }),
        }
    }

    /// Number of entries currently in the area.
    pub fn len(&self) -> usize {
        self.area
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of currently open subscriptions on this area.
    pub fn subscriber_count(&self) -> usize {
        self.area.publisher.subscriber_count()
    }
}

impl Default for SyncedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsBackend for SyncedBackend {
    fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        validate_key(key)?;
        let entries = self.area.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> StoreResult<()> {
        validate_key(key)?;
        let old = {
            let mut entries = self.area.entries.write().map_err(|_| StoreError::Poisoned)?;
            entries.insert(key.to_string(), value.clone())
        };

        let mut changes = ChangeSet::new();
        changes.record(key, KeyChange::updated(old, value.clone()));
        self.area.publisher.publish(changes);

        debug!(key, "entry written to synced area");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        let old = {
            let mut entries = self.area.entries.write().map_err(|_| StoreError::Poisoned)?;
            entries.remove(key)
        };

        match old {
            Some(old) => {
                let mut changes = ChangeSet::new();
                changes.record(key, KeyChange::removed(Some(old)));
                self.area.publisher.publish(changes);
                debug!(key, "entry removed from synced area");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn clear(&self) -> StoreResult<()> {
        let drained = {
            let mut entries = self.area.entries.write().map_err(|_| StoreError::Poisoned)?;
            std::mem::take(&mut *entries)
        };

        let mut changes = ChangeSet::new();
        for (key, old) in drained {
            changes.record(key, KeyChange::removed(Some(old)));
        }
        // publish() suppresses the empty set, keeping repeat clears silent.
        self.area.publisher.publish(changes);

        debug!("synced area cleared");
        Ok(())
    }

    fn subscribe(&self) -> ChangeStream {
        self.area.publisher.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_round_trips() {
        let backend = SyncedBackend::new();
        let value = json!({"theme": "dark", "tabs": [1, 2, 3]});

        backend.set("cfg", &value).unwrap();

        assert_eq!(backend.get("cfg").unwrap(), Some(value));
    }

    #[test]
    fn get_of_missing_key_is_none() {
        let backend = SyncedBackend::new();
        assert_eq!(backend.get("missing").unwrap(), None);
    }

    #[test]
    fn set_replaces_wholesale() {
        let backend = SyncedBackend::new();
        backend.set("cfg", &json!({"a": 1, "b": 2})).unwrap();
        backend.set("cfg", &json!({"c": 3})).unwrap();

        // No merging: only the new value remains.
        assert_eq!(backend.get("cfg").unwrap(), Some(json!({"c": 3})));
    }

    #[test]
    fn remove_is_idempotent() {
        let backend = SyncedBackend::new();
        backend.set("cfg", &json!(1)).unwrap();

        assert!(backend.remove("cfg").unwrap());
        assert!(!backend.remove("cfg").unwrap());
        assert_eq!(backend.get("cfg").unwrap(), None);
    }

    #[test]
    fn clear_empties_the_whole_area() {
        let backend = SyncedBackend::new();
        backend.set("a", &json!(1)).unwrap();
        backend.set("b", &json!(2)).unwrap();

        backend.clear().unwrap();

        assert_eq!(backend.get("a").unwrap(), None);
        assert_eq!(backend.get("b").unwrap(), None);
        assert!(backend.is_empty());

        // Repeat clear is a silent no-op.
        backend.clear().unwrap();
    }

    #[test]
    fn cloned_handles_share_the_area() {
        let backend = SyncedBackend::new();
        let other = backend.clone();

        backend.set("cfg", &json!("shared")).unwrap();

        assert_eq!(other.get("cfg").unwrap(), Some(json!("shared")));
    }

    #[test]
    fn writes_through_one_handle_notify_subscribers_of_another() {
        let backend = SyncedBackend::new();
        let other = backend.clone();
        let mut rx = other.subscribe();

        backend.set("cfg", &json!({"a": 1})).unwrap();

        let changes = rx.try_recv().unwrap();
        let change = changes.get("cfg").unwrap();
        assert_eq!(change.old_value, None);
        assert_eq!(change.new_value, Some(json!({"a": 1})));
    }

    #[test]
    fn change_set_carries_old_and_new_values() {
        let backend = SyncedBackend::new();
        backend.set("cfg", &json!("before")).unwrap();
        let mut rx = backend.subscribe();

        backend.set("cfg", &json!("after")).unwrap();
        let changes = rx.try_recv().unwrap();
        let change = changes.get("cfg").unwrap();
        assert_eq!(change.old_value, Some(json!("before")));
        assert_eq!(change.new_value, Some(json!("after")));

        backend.remove("cfg").unwrap();
        let changes = rx.try_recv().unwrap();
        let change = changes.get("cfg").unwrap();
        assert_eq!(change.old_value, Some(json!("after")));
        assert_eq!(change.new_value, None);
    }

    #[test]
    fn clear_publishes_one_change_set_for_all_keys() {
        let backend = SyncedBackend::new();
        backend.set("a", &json!(1)).unwrap();
        backend.set("b", &json!(2)).unwrap();
        let mut rx = backend.subscribe();

        backend.clear().unwrap();

        let changes = rx.try_recv().unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes.get("a").unwrap().new_value, None);
        assert_eq!(changes.get("b").unwrap().new_value, None);
        // Exactly one event for the whole clear.
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn invalid_key_is_rejected_before_touching_the_area() {
        let backend = SyncedBackend::new();
        assert!(matches!(
            backend.set("", &json!(1)),
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(backend.is_empty());
    }
}
