use std::sync::Arc;

use curtail_core::error::Result;
use curtail_core::{Repository, ShortKey};
use tokio::sync::mpsc;
use tracing::warn;

/// Tombstones `keys` for `owner_id` in chunks, one worker task per chunk.
///
/// The result channel capacity equals the chunk count, so a worker's send
/// never blocks even when the receiving side has gone away. Every worker
/// outcome is collected before returning; the first error to arrive is
/// kept, later ones are logged and discarded. Chunks run unordered, which
/// is safe because tombstoning is owner-scoped and idempotent.
pub async fn delete_in_chunks<R: Repository>(
    repository: Arc<R>,
    owner_id: &str,
    keys: Vec<ShortKey>,
    chunk_size: usize,
) -> Result<()> {
    if keys.is_empty() {
        return Ok(());
    }

    let chunks: Vec<Vec<ShortKey>> = keys
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect();

    let (tx, mut rx) = mpsc::channel(chunks.len());

    for chunk in chunks {
        let repository = Arc::clone(&repository);
        let owner_id = owner_id.to_string();
        let tx = tx.clone();

        tokio::spawn(async move {
            let outcome = repository.delete_many(&owner_id, &chunk).await;
            let _ = tx.send((chunk.len(), outcome)).await;
        });
    }
    // Receiving ends once the last worker's sender drops.
    drop(tx);

    let mut first_error = None;
    while let Some((keys_in_chunk, outcome)) = rx.recv().await {
        if let Err(err) = outcome {
            warn!(keys = keys_in_chunk, error = %err, "deletion chunk failed");
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
