//! Change events delivered to storage subscribers.
//!
//! Every mutation of a storage area is described by a [`ChangeSet`]: an
//! ordered map from key to the old and new value observed for that key in
//! one mutating call. A `set` touches one key, a `clear` may touch many.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

/// Default capacity of per-subscriber change channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Old and new value for a single key in one mutating call.
///
/// `new_value: None` means the key was removed; `old_value: None` means the
/// key did not previously exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyChange {
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

impl KeyChange {
    /// Change describing a key that now holds `new`.
    pub fn updated(old: Option<Value>, new: Value) -> Self {
        Self {
            old_value: old,
            new_value: Some(new),
        }
    }

    /// Change describing a key that was removed.
    ///
    /// `old` is `None` when the prior value could not be read back.
    pub fn removed(old: Option<Value>) -> Self {
        Self {
            old_value: old,
            new_value: None,
        }
    }
}

/// All keys touched by one mutating call, with their old/new values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    changes: BTreeMap<String, KeyChange>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change for `key`, replacing any prior record for it.
    pub fn record(&mut self, key: impl Into<String>, change: KeyChange) {
        self.changes.insert(key.into(), change);
    }

    /// The recorded change for `key`, if that key was touched.
    pub fn get(&self, key: &str) -> Option<&KeyChange> {
        self.changes.get(key)
    }

    /// Whether this change set touches `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.changes.contains_key(key)
    }

    /// Number of keys touched.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterate over touched keys and their changes, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyChange)> {
        self.changes.iter().map(|(k, c)| (k.as_str(), c))
    }
}

/// A receiver of change sets from one storage area.
///
/// Dropping the receiver is the unsubscribe; the publisher stops counting
/// it immediately.
pub type ChangeStream = broadcast::Receiver<ChangeSet>;

/// Fan-out publisher for change sets.
///
/// Thin wrapper over a broadcast channel. Publishing with no live
/// subscribers is a no-op, not an error; a slow subscriber that overflows
/// its channel skips to the oldest retained change set.
#[derive(Debug)]
pub struct ChangePublisher {
    sender: broadcast::Sender<ChangeSet>,
}

impl ChangePublisher {
    /// Create a publisher with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a publisher whose subscriber channels hold up to `capacity`
    /// undelivered change sets.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Open a new independent subscription.
    pub fn subscribe(&self) -> ChangeStream {
        self.sender.subscribe()
    }

    /// Deliver a change set to all current subscribers.
    ///
    /// Empty change sets are suppressed so idempotent re-runs of `remove`
    /// and `clear` stay silent.
    pub fn publish(&self, changes: ChangeSet) {
        if changes.is_empty() {
            return;
        }
        debug!(keys = changes.len(), "change set published");
        // Err means no live receivers; nothing to deliver.
        let _ = self.sender.send(changes);
    }

    /// Number of currently open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangePublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_of(key: &str, new: Value) -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.record(key, KeyChange::updated(None, new));
        changes
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let publisher = ChangePublisher::new();
        let mut a = publisher.subscribe();
        let mut b = publisher.subscribe();

        publisher.publish(set_of("k", json!({"a": 1})));

        let got_a = a.try_recv().unwrap();
        let got_b = b.try_recv().unwrap();
        assert_eq!(got_a, got_b);
        assert_eq!(
            got_a.get("k").unwrap().new_value,
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn empty_change_sets_are_suppressed() {
        let publisher = ChangePublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish(ChangeSet::new());

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let publisher = ChangePublisher::new();
        publisher.publish(set_of("k", json!(1)));
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn dropped_subscriber_no_longer_counted() {
        let publisher = ChangePublisher::new();
        let rx = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);
        drop(rx);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn change_set_records_in_key_order() {
        let mut changes = ChangeSet::new();
        changes.record("b", KeyChange::updated(None, json!(2)));
        changes.record("a", KeyChange::updated(None, json!(1)));

        let keys: Vec<&str> = changes.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(changes.len(), 2);
        assert!(changes.contains("a"));
        assert!(!changes.contains("c"));
    }
}
