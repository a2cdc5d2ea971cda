use std::sync::Arc;

use curtail_core::{
    BatchCreated, BatchItem, OwnedUrl, Repository, ShortKey, ShortRecord, Stats, StorageError,
};
use curtail_keygen::KeyGenerator;
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::bulk;
use crate::error::ShortenerError;

/// Tuning knobs for the shortening service.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceSettings {
    /// Length of generated short keys.
    #[builder(default = 8)]
    pub key_length: usize,
    /// Number of keys handed to each bulk-deletion worker.
    #[builder(default = 10)]
    pub delete_chunk_size: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Orchestrates key generation and storage behind one API.
///
/// Generic over the repository, so the file-backed and Postgres backends
/// are interchangeable; nothing in here branches on the backend. The
/// generator is trusted to produce fresh keys and no collision retry is
/// performed.
#[derive(Debug, Clone)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    settings: ServiceSettings,
}

impl<R: Repository, G: KeyGenerator> ShortenerService<R, G> {
    /// Creates a service with default settings.
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_settings(repository, generator, ServiceSettings::default())
    }

    /// Creates a service with explicit settings.
    pub fn with_settings(repository: R, generator: G, settings: ServiceSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            settings,
        }
    }

    /// Shortens one URL for `owner_id` and returns the assigned key.
    ///
    /// A URL that is already shortened comes back as a `Conflict` carrying
    /// the existing key, so the caller can still hand out a working link.
    pub async fn create_url(
        &self,
        original_url: &str,
        owner_id: &str,
    ) -> Result<ShortKey, ShortenerError> {
        if original_url.is_empty() {
            return Err(ShortenerError::InvalidUrl("url cannot be empty".to_string()));
        }

        let key = self.generator.generate(self.settings.key_length);
        let record = ShortRecord::new(key.clone(), original_url, owner_id);
        self.repository.create(record).await?;

        debug!(key = %key, "url shortened");
        Ok(key)
    }

    /// Shortens a batch of URLs, one response entry per accepted item.
    ///
    /// Items with an empty URL or an empty correlation id are dropped
    /// rather than erred, since their response entries could not be
    /// matched back to the request. An item whose URL is already
    /// shortened gets the existing key in its entry, same as the single
    /// path; the first harder storage failure aborts the whole batch.
    pub async fn create_url_batch(
        &self,
        items: &[BatchItem],
        owner_id: &str,
    ) -> Result<Vec<BatchCreated>, ShortenerError> {
        let mut created = Vec::with_capacity(items.len());

        for item in items {
            if item.original_url.is_empty() || item.correlation_id.is_empty() {
                continue;
            }

            let key = self.generator.generate(self.settings.key_length);
            let record = ShortRecord::new(key.clone(), &item.original_url, owner_id)
                .with_correlation(&item.correlation_id);

            let short_key = match self.repository.create(record).await {
                Ok(()) => key,
                Err(StorageError::Conflict { existing_key }) => existing_key,
                Err(err) => return Err(err.into()),
            };

            created.push(BatchCreated {
                correlation_id: item.correlation_id.clone(),
                short_key,
            });
        }

        Ok(created)
    }

    /// Resolves a short key to its original URL.
    pub async fn get_original_url(&self, key: &ShortKey) -> Result<String, ShortenerError> {
        Ok(self.repository.get_by_key(key).await?)
    }

    /// Lists the caller's live short URLs, each qualified with `host`.
    pub async fn get_user_urls(
        &self,
        owner_id: &str,
        host: &str,
    ) -> Result<Vec<OwnedUrl>, ShortenerError> {
        Ok(self.repository.get_by_owner(owner_id, host).await?)
    }

    /// Tombstones the caller's keys through the chunked deletion
    /// pipeline. Returns after every worker has reported, with the first
    /// failure if there was one.
    pub async fn delete_user_urls(
        &self,
        owner_id: &str,
        keys: Vec<ShortKey>,
    ) -> Result<(), ShortenerError> {
        bulk::delete_in_chunks(
            Arc::clone(&self.repository),
            owner_id,
            keys,
            self.settings.delete_chunk_size,
        )
        .await?;
        Ok(())
    }

    /// Returns total record and distinct owner counts. Both counts must
    /// succeed; there are no partial stats.
    pub async fn get_stats(&self) -> Result<Stats, ShortenerError> {
        let urls = self.repository.count_records().await?;
        let owners = self.repository.count_owners().await?;
        Ok(Stats { urls, owners })
    }

    /// Health probe against the backend.
    pub async fn ping(&self) -> Result<(), ShortenerError> {
        Ok(self.repository.ping().await?)
    }
}
