use crate::key::ShortKey;
use serde::{Deserialize, Serialize};

/// A stored URL record — the canonical entity both backends persist.
///
/// The serde mapping doubles as the append-log line format: one record is
/// one JSON object with the `uuid`/`short_url`/`user_id`/`is_deleted`
/// field names. Logs written before tombstones existed carry no
/// `is_deleted` field; those lines parse with `deleted = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortRecord {
    /// Creation sequence number, monotonically assigned by the backend.
    /// The value carried on a record passed into `create` is ignored.
    #[serde(rename = "uuid")]
    pub sequence: i64,
    /// Caller-supplied batch correlation token; empty when absent.
    #[serde(default)]
    pub correlation_id: String,
    #[serde(rename = "short_url")]
    pub short_key: ShortKey,
    pub original_url: String,
    #[serde(rename = "user_id")]
    pub owner_id: String,
    /// Tombstone flag; transitions only false to true, never back.
    #[serde(rename = "is_deleted", default)]
    pub deleted: bool,
}

impl ShortRecord {
    /// Builds a fresh, live record ready to hand to
    /// [`Repository::create`](crate::Repository::create).
    pub fn new(
        short_key: ShortKey,
        original_url: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            sequence: 0,
            correlation_id: String::new(),
            short_key,
            original_url: original_url.into(),
            owner_id: owner_id.into(),
            deleted: false,
        }
    }

    /// Attaches a batch correlation token.
    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

/// One owner-listing entry: the host-qualified short URL and its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedUrl {
    pub short_url: String,
    pub original_url: String,
}

/// One item of a batch-create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default)]
    pub original_url: String,
}

/// One entry of a batch-create response, correlated back to its request
/// item by the caller-supplied token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreated {
    pub correlation_id: String,
    #[serde(rename = "short_url")]
    pub short_key: ShortKey,
}

/// Aggregate statistics over one backend instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Total records, tombstoned ones included.
    pub urls: i64,
    /// Distinct owners, each counted once.
    pub owners: i64,
}
