use crate::key::ShortKey;
use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by the storage layer.
///
/// `Conflict` is the one variant callers recover from: it carries the key
/// that already maps to the requested URL so the caller can answer with
/// the existing link. `NotFound` and `Gone` stay distinct because
/// transports map them to different statuses (404 vs 410).
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("original url already shortened as '{existing_key}'")]
    Conflict { existing_key: ShortKey },
    #[error("short key not found: {0}")]
    NotFound(String),
    #[error("short key is deleted: {0}")]
    Gone(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage i/o failed: {0}")]
    Io(String),
    #[error("record serialization failed: {0}")]
    Serialization(String),
}
