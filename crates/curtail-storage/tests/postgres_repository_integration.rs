use std::time::Duration;

use curtail_core::{Repository, ShortKey, ShortRecord, StorageError};
use curtail_storage::PostgresRepository;
use curtail_test_infra::postgres::{PostgresConfig, PostgresServer};
use sqlx::postgres::PgPoolOptions;

struct Fixture {
    _postgres: PostgresServer,
    repo: PostgresRepository,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::new(PostgresConfig::builder().build())
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let pool = connect_with_retry(&url).await;

        let repo = PostgresRepository::new(pool);
        repo.ensure_schema().await.expect("create schema");

        Self {
            _postgres: postgres,
            repo,
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn key(value: &str) -> ShortKey {
    ShortKey::new(value)
}

fn record(short: &str, url: &str, owner: &str) -> ShortRecord {
    ShortRecord::new(key(short), url, owner)
}

#[tokio::test]
async fn insert_and_resolve_record() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("abcd1234", "https://example.com", "u1"))
        .await
        .unwrap();

    let url = fixture.repo.get_by_key(&key("abcd1234")).await.unwrap();
    assert_eq!(url, "https://example.com");
}

#[tokio::test]
async fn resolve_unknown_key_is_not_found() {
    let fixture = Fixture::start().await;

    let err = fixture.repo.get_by_key(&key("missing1")).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[tokio::test]
async fn duplicate_url_reports_existing_key() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("first111", "https://example.com", "u1"))
        .await
        .unwrap();
    let err = fixture
        .repo
        .create(record("second22", "https://example.com", "u2"))
        .await
        .unwrap_err();

    match err {
        StorageError::Conflict { existing_key } => {
            assert_eq!(existing_key, key("first111"));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn taken_short_key_is_rejected() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("clash000", "https://a.example", "u1"))
        .await
        .unwrap();
    let err = fixture
        .repo
        .create(record("clash000", "https://b.example", "u1"))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Query(_)));
}

#[tokio::test]
async fn delete_marks_key_gone() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("abcd1234", "https://example.com", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .delete_many("u1", &[key("abcd1234")])
        .await
        .unwrap();

    let err = fixture.repo.get_by_key(&key("abcd1234")).await.unwrap_err();
    assert!(matches!(err, StorageError::Gone(_)));
}

#[tokio::test]
async fn delete_is_scoped_to_owner() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("abcd1234", "https://example.com", "owner"))
        .await
        .unwrap();
    fixture
        .repo
        .delete_many("intruder", &[key("abcd1234")])
        .await
        .unwrap();

    let url = fixture.repo.get_by_key(&key("abcd1234")).await.unwrap();
    assert_eq!(url, "https://example.com");
}

#[tokio::test]
async fn delete_accepts_unknown_keys_and_empty_batches() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("abcd1234", "https://example.com", "u1"))
        .await
        .unwrap();

    fixture.repo.delete_many("u1", &[]).await.unwrap();
    fixture
        .repo
        .delete_many("u1", &[key("nope0000"), key("abcd1234")])
        .await
        .unwrap();

    let err = fixture.repo.get_by_key(&key("abcd1234")).await.unwrap_err();
    assert!(matches!(err, StorageError::Gone(_)));
}

#[tokio::test]
async fn deleted_url_can_be_shortened_again() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("old00000", "https://example.com", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .delete_many("u1", &[key("old00000")])
        .await
        .unwrap();

    fixture
        .repo
        .create(record("new00000", "https://example.com", "u1"))
        .await
        .unwrap();

    assert_eq!(
        fixture.repo.get_by_key(&key("new00000")).await.unwrap(),
        "https://example.com"
    );
    assert!(matches!(
        fixture.repo.get_by_key(&key("old00000")).await.unwrap_err(),
        StorageError::Gone(_)
    ));
}

#[tokio::test]
async fn owner_listing_filters_deleted_and_foreign_records() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("keep0001", "https://a.example", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .create(record("gone0001", "https://b.example", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .create(record("other001", "https://c.example", "u2"))
        .await
        .unwrap();
    fixture
        .repo
        .delete_many("u1", &[key("gone0001")])
        .await
        .unwrap();

    let owned = fixture
        .repo
        .get_by_owner("u1", "http://short.local")
        .await
        .unwrap();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].short_url, "http://short.local/keep0001");
    assert_eq!(owned[0].original_url, "https://a.example");
}

#[tokio::test]
async fn counts_keep_tombstones_and_dedupe_owners() {
    let fixture = Fixture::start().await;

    fixture
        .repo
        .create(record("aaaa0001", "https://a.example", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .create(record("bbbb0001", "https://b.example", "u1"))
        .await
        .unwrap();
    fixture
        .repo
        .create(record("cccc0001", "https://c.example", "u2"))
        .await
        .unwrap();
    fixture
        .repo
        .delete_many("u1", &[key("aaaa0001")])
        .await
        .unwrap();

    assert_eq!(fixture.repo.count_records().await.unwrap(), 3);
    assert_eq!(fixture.repo.count_owners().await.unwrap(), 2);
}

#[tokio::test]
async fn ping_reaches_the_server() {
    let fixture = Fixture::start().await;
    fixture.repo.ping().await.unwrap();
}
