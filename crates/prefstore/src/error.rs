use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("store error: {0}")]
    Store(#[from] prefstore_store::StoreError),
}

pub type SettingsResult<T> = Result<T, SettingsError>;
