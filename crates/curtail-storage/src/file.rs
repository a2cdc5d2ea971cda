use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use curtail_core::error::{Result, StorageError};
use curtail_core::{OwnedUrl, Repository, ShortKey, ShortRecord};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::info;

/// Append-only file backend.
///
/// Every mutation is serialized as one JSON object per line and flushed
/// before the call returns. The log is never rewritten: a deletion appends
/// a copy of the record with `is_deleted` set, and [`FileRepository::open`]
/// replays lines in order so the last line for a short key wins. Reads are
/// served from in-process indexes rebuilt during replay.
#[derive(Debug)]
pub struct FileRepository {
    log: Mutex<File>,
    records: DashMap<ShortKey, ShortRecord>,
    live_urls: DashMap<String, ShortKey>,
    next_sequence: AtomicI64,
}

impl FileRepository {
    /// Opens the log at `path`, creating it if missing, and replays every
    /// line into the in-process indexes before any request is served.
    ///
    /// Replay restores the sequence counter to one past the highest value
    /// seen, so records created after a restart keep ascending. Lines
    /// without an `is_deleted` field are treated as live records.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path.as_ref())
            .await
            .map_err(map_io_error)?;

        let records = DashMap::new();
        let live_urls: DashMap<String, ShortKey> = DashMap::new();
        let mut max_sequence = 0_i64;

        let mut lines = BufReader::new(file).lines();
        while let Some(line) = lines.next_line().await.map_err(map_io_error)? {
            if line.trim().is_empty() {
                continue;
            }
            let record: ShortRecord = serde_json::from_str(&line)
                .map_err(|err| StorageError::InvalidData(format!("bad log line: {err}")))?;

            max_sequence = max_sequence.max(record.sequence);
            if record.deleted {
                live_urls.remove_if(&record.original_url, |_, key| key == &record.short_key);
            } else {
                live_urls.insert(record.original_url.clone(), record.short_key.clone());
            }
            records.insert(record.short_key.clone(), record);
        }

        // The append flag keeps writes at the end of the file, so the
        // replay handle can be reused for the writer.
        let file = lines.into_inner().into_inner();

        info!(records = records.len(), "url log replayed");

        Ok(Self {
            log: Mutex::new(file),
            records,
            live_urls,
            next_sequence: AtomicI64::new(max_sequence + 1),
        })
    }

    async fn append(&self, records: &[ShortRecord]) -> Result<()> {
        let mut lines = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|err| StorageError::Serialization(err.to_string()))?;
            lines.push_str(&line);
            lines.push('\n');
        }

        let mut log = self.log.lock().await;
        log.write_all(lines.as_bytes()).await.map_err(map_io_error)?;
        log.flush().await.map_err(map_io_error)
    }
}

#[async_trait]
impl Repository for FileRepository {
    async fn create(&self, mut record: ShortRecord) -> Result<()> {
        record.deleted = false;

        // Reserve the URL before anything else; the entry API makes
        // concurrent creates of the same URL agree on a single winner.
        match self.live_urls.entry(record.original_url.clone()) {
            Entry::Occupied(existing) => {
                return Err(StorageError::Conflict {
                    existing_key: existing.get().clone(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(record.short_key.clone());
            }
        }

        if self.records.contains_key(&record.short_key) {
            self.live_urls
                .remove_if(&record.original_url, |_, key| key == &record.short_key);
            return Err(StorageError::Query(format!(
                "short key already taken: {}",
                record.short_key
            )));
        }

        record.sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);

        if let Err(err) = self.append(std::slice::from_ref(&record)).await {
            // The record never became visible; release the reservation.
            self.live_urls
                .remove_if(&record.original_url, |_, key| key == &record.short_key);
            return Err(err);
        }

        self.records.insert(record.short_key.clone(), record);
        Ok(())
    }

    async fn get_by_key(&self, key: &ShortKey) -> Result<String> {
        let Some(record) = self.records.get(key) else {
            return Err(StorageError::NotFound(key.to_string()));
        };
        if record.deleted {
            return Err(StorageError::Gone(key.to_string()));
        }
        Ok(record.original_url.clone())
    }

    async fn get_by_owner(&self, owner_id: &str, host: &str) -> Result<Vec<OwnedUrl>> {
        let mut owned = Vec::new();
        for entry in self.records.iter() {
            let record = entry.value();
            if record.owner_id == owner_id && !record.deleted {
                owned.push(OwnedUrl {
                    short_url: record.short_key.to_url(host),
                    original_url: record.original_url.clone(),
                });
            }
        }
        Ok(owned)
    }

    async fn delete_many(&self, owner_id: &str, keys: &[ShortKey]) -> Result<()> {
        let mut tombstones: Vec<ShortRecord> = Vec::new();
        for key in keys {
            if tombstones.iter().any(|planned| &planned.short_key == key) {
                continue;
            }
            let Some(record) = self.records.get(key) else {
                continue;
            };
            if record.owner_id != owner_id || record.deleted {
                continue;
            }
            let mut tombstone = record.value().clone();
            tombstone.deleted = true;
            tombstones.push(tombstone);
        }

        if tombstones.is_empty() {
            return Ok(());
        }

        // Tombstones reach the log before the indexes flip, so a deletion
        // is never observable unless it also survives a replay.
        self.append(&tombstones).await?;

        for tombstone in &tombstones {
            if let Some(mut record) = self.records.get_mut(&tombstone.short_key) {
                record.deleted = true;
            }
            self.live_urls
                .remove_if(&tombstone.original_url, |_, key| key == &tombstone.short_key);
        }
        Ok(())
    }

    async fn count_records(&self) -> Result<i64> {
        Ok(self.records.len() as i64)
    }

    async fn count_owners(&self) -> Result<i64> {
        let owners: HashSet<String> = self
            .records
            .iter()
            .map(|entry| entry.value().owner_id.clone())
            .collect();
        Ok(owners.len() as i64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

fn map_io_error(err: std::io::Error) -> StorageError {
    StorageError::Io(err.to_string())
}
