use crate::error::Result;
use crate::key::ShortKey;
use crate::record::{OwnedUrl, ShortRecord};
use async_trait::async_trait;

/// Capability contract implemented by every storage backend.
///
/// Both backends — the append-only file log and Postgres — expose exactly
/// these operations with identical semantics, so the service layer never
/// branches on which one it was constructed with. The backend is the sole
/// writer of its persisted state; callers only ever go through this trait.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Persists a new record, assigning its sequence number.
    ///
    /// A duplicate `original_url` belonging to a non-deleted record fails
    /// with [`StorageError::Conflict`](crate::StorageError::Conflict)
    /// carrying the already-assigned key; callers treat that as
    /// success-with-substitution, not as failure. Any other error is fatal
    /// to the calling request and is not retried here.
    async fn create(&self, record: ShortRecord) -> Result<()>;

    /// Resolves a short key to its original URL.
    ///
    /// Unknown keys return [`StorageError::NotFound`](crate::StorageError::NotFound);
    /// tombstoned ones return [`StorageError::Gone`](crate::StorageError::Gone).
    /// Resolution fails closed: the target of a deleted record is never
    /// returned.
    async fn get_by_key(&self, key: &ShortKey) -> Result<String>;

    /// Lists the owner's non-deleted records, each short URL qualified
    /// with the caller-supplied base `host`.
    async fn get_by_owner(&self, owner_id: &str, host: &str) -> Result<Vec<OwnedUrl>>;

    /// Marks each key in `keys` deleted, but only where the record belongs
    /// to `owner_id`. Mismatched or unknown keys are skipped silently, and
    /// re-deleting an already-deleted record is a no-op.
    async fn delete_many(&self, owner_id: &str, keys: &[ShortKey]) -> Result<()>;

    /// Counts all records, tombstoned ones included.
    async fn count_records(&self) -> Result<i64>;

    /// Counts distinct owners, each once regardless of how many records
    /// they hold.
    async fn count_owners(&self) -> Result<i64>;

    /// Lightweight liveness probe of the backend's underlying resource.
    async fn ping(&self) -> Result<()>;
}
