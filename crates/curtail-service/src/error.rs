use curtail_core::{ShortKey, StorageError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("url already shortened as: {existing_key}")]
    Conflict { existing_key: ShortKey },
    #[error("short url not found: {0}")]
    NotFound(String),
    #[error("short url removed: {0}")]
    Gone(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict { existing_key } => Self::Conflict { existing_key },
            StorageError::NotFound(key) => Self::NotFound(key),
            StorageError::Gone(key) => Self::Gone(key),
            other => Self::Storage(other.to_string()),
        }
    }
}
