//! Storage-key validation.
//!
//! Valid storage keys:
//! - Must be non-empty
//! - Must not contain path separators (`/`, `\`) or NUL
//! - Must not be `.` or `..`, and must not start or end with `.`
//!
//! The same rules apply to every backend so a configuration written through
//! one backend is addressable through the other. The file-backed backend
//! additionally relies on these rules to keep each key inside its spool
//! directory.

use crate::error::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in a storage key.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Validate a storage key, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use prefstore_store::keys::validate_key;
///
/// assert!(validate_key("hhappsettings").is_ok());
/// assert!(validate_key("cfg").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("../escape").is_err());
/// ```
pub fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".into(),
        });
    }

    for ch in FORBIDDEN_CHARS {
        if key.contains(*ch) {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    if key == "." || key == ".." {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be a directory traversal segment".into(),
        });
    }

    if key.starts_with('.') || key.ends_with('.') {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not start or end with '.'".into(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_keys() {
        for key in ["hhappsettings", "cfg", "user-prefs", "a b c", "k1"] {
            assert!(validate_key(key).is_ok(), "expected {key:?} to be valid");
        }
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(
            validate_key(""),
            Err(StoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn rejects_path_separators() {
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("a\\b").is_err());
    }

    #[test]
    fn rejects_traversal_segments() {
        assert!(validate_key(".").is_err());
        assert!(validate_key("..").is_err());
        assert!(validate_key("../up").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("trailing.").is_err());
    }
}
