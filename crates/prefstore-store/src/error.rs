/// Errors from settings-backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is not usable as a storage-area slot name.
    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// A previously persisted value could not be decoded as JSON.
    #[error("malformed stored value under {key:?}: {reason}")]
    MalformedValue { key: String, reason: String },

    /// A value could not be encoded for persistence.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A storage-area lock was poisoned by a panicking writer.
    #[error("storage area lock poisoned")]
    Poisoned,
}

/// Result alias for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;
