//! Change subscriptions handed out by [`SettingsStore`](crate::SettingsStore).
//!
//! A subscription is an explicit handle: dropping it tears the underlying
//! listener down, so repeated subscribe/drop cycles never accumulate
//! listeners on the backend.

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

use prefstore_store::{ChangeSet, ChangeStream};

/// One observed mutation of the backing storage area.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// Unfiltered subscription: the full changed-keys map, verbatim.
    All(ChangeSet),
    /// The watched key now holds this value.
    Updated(Value),
    /// The watched key was removed from the area.
    Removed,
}

/// A standing subscription to storage changes.
///
/// Filtered subscriptions additionally keep the owning store's resident
/// configuration current: an update replaces it with the new value, a
/// removal resets it to the configured defaults.
#[derive(Debug)]
pub struct ChangeSubscription {
    stream: ChangeStream,
    filter: Option<String>,
    resident: Arc<RwLock<Value>>,
    defaults: Value,
}

impl ChangeSubscription {
    pub(crate) fn new(
        stream: ChangeStream,
        filter: Option<String>,
        resident: Arc<RwLock<Value>>,
        defaults: Value,
    ) -> Self {
        Self {
            stream,
            filter,
            resident,
            defaults,
        }
    }

    /// Await the next matching change.
    ///
    /// Returns `None` once the backing storage area is gone. A subscription
    /// that falls behind skips to the oldest retained change set and keeps
    /// going.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.stream.recv().await {
                Ok(changes) => {
                    if let Some(event) = self.apply(changes) {
                        return Some(event);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "change subscription lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Poll for an already-delivered matching change without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.stream.try_recv() {
                Ok(changes) => {
                    if let Some(event) = self.apply(changes) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "change subscription lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// The key this subscription is filtered on, if any.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Translate a raw change set into this subscription's event, applying
    /// the resident-configuration side effect for filtered subscriptions.
    fn apply(&self, changes: ChangeSet) -> Option<ChangeEvent> {
        let Some(key) = self.filter.as_deref() else {
            return Some(ChangeEvent::All(changes));
        };

        let change = changes.get(key)?;
        match &change.new_value {
            Some(value) => {
                *self.resident.write().expect("settings lock poisoned") = value.clone();
                Some(ChangeEvent::Updated(value.clone()))
            }
            None => {
                *self.resident.write().expect("settings lock poisoned") = self.defaults.clone();
                Some(ChangeEvent::Removed)
            }
        }
    }
}
