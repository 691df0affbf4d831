use serde_json::Value;

use crate::error::StoreResult;
use crate::event::ChangeStream;

/// A key-value storage area for settings.
///
/// All implementations must satisfy these invariants:
/// - A write fully replaces the prior value under its key; values are never
///   merged.
/// - `remove` and `clear` are idempotent.
/// - Every successful mutation is delivered to all current subscribers as
///   exactly one change set, including mutations issued by the observing
///   process itself.
/// - The area may be shared with other stores and other code; last write
///   under a key wins, with no locking across callers.
/// - I/O and decode errors are propagated, never silently ignored.
pub trait SettingsBackend: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if no value exists under `key`.
    /// Returns `Err` on I/O failure or when a persisted value cannot be
    /// decoded.
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Store `value` under `key`, replacing any prior value wholesale.
    fn set(&self, key: &str, value: &Value) -> StoreResult<()>;

    /// Delete the entry under `key`. Returns `true` if the key existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Delete every entry in the storage area, not just one key.
    fn clear(&self) -> StoreResult<()>;

    /// Open an independent subscription to this area's change sets.
    ///
    /// Dropping the returned stream tears the subscription down.
    fn subscribe(&self) -> ChangeStream;
}
