use async_trait::async_trait;
use curtail_core::error::{Result, StorageError};
use curtail_core::{OwnedUrl, Repository, ShortKey, ShortRecord};
use sqlx::{PgPool, Row};

/// Postgres implementation of the repository contract.
///
/// Deduplication is enforced server-side by a unique index over live rows:
/// the insert is attempted first and a unique violation triggers a
/// follow-up read of the key that already claims the URL. Soft delete
/// flips `is_deleted`, which keeps the row for counting while resolution
/// of its key fails closed.
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing Postgres connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new Postgres connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the table and index DDL. Idempotent, intended for
    /// bootstrap code and test fixtures.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../ddl/postgres/short_urls.sql"))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_live_key(&self, original_url: &str) -> Result<Option<ShortKey>> {
        let row = sqlx::query(
            r#"
            SELECT short_url
            FROM short_urls
            WHERE original_url = $1
              AND NOT is_deleted
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| {
            let key: String = row.try_get("short_url").map_err(map_sqlx_error)?;
            Ok(ShortKey::new(key))
        })
        .transpose()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn create(&self, record: ShortRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (short_url, original_url, user_id, is_deleted)
            VALUES ($1, $2, $3, FALSE)
            "#,
        )
        .bind(record.short_key.as_str())
        .bind(&record.original_url)
        .bind(&record.owner_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                // A live row already claims either the URL or the key. A
                // miss on the URL lookup means the key itself collided.
                match self.find_live_key(&record.original_url).await? {
                    Some(existing_key) => Err(StorageError::Conflict { existing_key }),
                    None => Err(StorageError::Query(format!(
                        "short key already taken: {}",
                        record.short_key
                    ))),
                }
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn get_by_key(&self, key: &ShortKey) -> Result<String> {
        let row = sqlx::query(
            r#"
            SELECT original_url, is_deleted
            FROM short_urls
            WHERE short_url = $1
            LIMIT 1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound(key.to_string()));
        };

        let deleted: bool = row.try_get("is_deleted").map_err(map_sqlx_error)?;
        if deleted {
            return Err(StorageError::Gone(key.to_string()));
        }

        row.try_get("original_url").map_err(map_sqlx_error)
    }

    async fn get_by_owner(&self, owner_id: &str, host: &str) -> Result<Vec<OwnedUrl>> {
        let rows = sqlx::query(
            r#"
            SELECT short_url, original_url
            FROM short_urls
            WHERE user_id = $1
              AND NOT is_deleted
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let mut owned = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("short_url").map_err(map_sqlx_error)?;
            let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
            owned.push(OwnedUrl {
                short_url: ShortKey::new(key).to_url(host),
                original_url,
            });
        }
        Ok(owned)
    }

    async fn delete_many(&self, owner_id: &str, keys: &[ShortKey]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        // All updates share one transaction; a failure rolls the whole
        // batch back when the handle drops.
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for key in keys {
            sqlx::query(
                r#"
                UPDATE short_urls
                SET is_deleted = TRUE
                WHERE short_url = $1
                  AND user_id = $2
                "#,
            )
            .bind(key.as_str())
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn count_records(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM short_urls")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.try_get("total").map_err(map_sqlx_error)
    }

    async fn count_owners(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(DISTINCT user_id) AS total FROM short_urls")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.try_get("total").map_err(map_sqlx_error)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
