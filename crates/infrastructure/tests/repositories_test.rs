use chrono::Utc;
use sentinel_application::ports::{BlocklistRepository, PolicyDataPort, QueryLogRepository, SecretStore};
use sentinel_domain::config::DatabaseConfig;
use sentinel_domain::{Blocklist, BlocklistMode, QueryLogEntry, QueryStatus, RecordType};
use sentinel_infrastructure::database::create_write_pool;
use sentinel_infrastructure::repositories::{SqliteBlocklistRepository, SqlitePolicyDataRepository, SqliteQueryLogRepository};
use sentinel_infrastructure::secrets::SqliteSecretStore;

async fn test_pool() -> sqlx::SqlitePool {
    create_write_pool("sqlite::memory:", &DatabaseConfig::default())
        .await
        .expect("migrations should apply to a fresh in-memory database")
}

#[tokio::test]
async fn fresh_database_has_no_rules_clients_or_blocklists() {
    let pool = test_pool().await;
    let repo = SqlitePolicyDataRepository::new(pool);

    assert!(repo.load_rules().await.unwrap().is_empty());
    assert!(repo.load_clients().await.unwrap().is_empty());
    assert!(repo.load_blocklists().await.unwrap().is_empty());
    assert!(repo.load_rewrites().await.unwrap().is_empty());
}

#[tokio::test]
async fn blocklist_create_and_replace_rules_round_trip() {
    let pool = test_pool().await;
    let repo = SqliteBlocklistRepository::new(pool.clone());

    let blocklist = Blocklist::new("Test List", "https://example.test/list.txt", BlocklistMode::Active);
    let created = repo.create(blocklist).await.expect("create should succeed");
    let id = created.id.expect("created blocklist has an id");

    repo.replace_rules(id, &["ads.example".to_string(), "tracker.example".to_string()])
        .await
        .expect("replace_rules should succeed");

    let fetched = repo.get_by_id(id).await.unwrap().expect("blocklist exists");
    assert_eq!(fetched.last_rule_count, Some(2));

    let data_repo = SqlitePolicyDataRepository::new(pool);
    let rules = data_repo.load_rules().await.unwrap();
    assert_eq!(rules.len(), 2);
}

#[tokio::test]
async fn duplicate_blocklist_url_is_rejected() {
    let pool = test_pool().await;
    let repo = SqliteBlocklistRepository::new(pool);

    let first = Blocklist::new("First", "https://example.test/dup.txt", BlocklistMode::Active);
    repo.create(first).await.expect("first create succeeds");

    let second = Blocklist::new("Second", "https://example.test/dup.txt", BlocklistMode::Active);
    let err = repo.create(second).await.expect_err("duplicate url must fail");
    assert!(matches!(err, sentinel_application::AppError::BlocklistExists(_)));
}

#[tokio::test]
async fn query_log_append_and_query_round_trip() {
    let pool = test_pool().await;
    let repo = SqliteQueryLogRepository::new(pool);

    let mut entry = QueryLogEntry::new("blocked.example", RecordType::A, "192.168.1.5", QueryStatus::Blocked, 3);
    entry.timestamp = Utc::now();
    repo.append(entry).await.unwrap();

    // append() hands off to a background batching task; give it a moment
    // to flush before querying back.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let since = Utc::now() - chrono::Duration::minutes(5);
    let rows = repo.query(since, None, Some("BLOCKED"), 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].domain.as_ref(), "blocked.example");
}

#[tokio::test]
async fn secret_store_password_hash_round_trip() {
    let pool = test_pool().await;
    let store = SqliteSecretStore::new(pool, None);

    let hash = store.hash_password("correct horse battery staple").unwrap();
    assert!(store.verify_password("correct horse battery staple", &hash));
    assert!(!store.verify_password("wrong password", &hash));
}

#[tokio::test]
async fn secret_store_encrypts_when_key_configured() {
    let pool = test_pool().await;
    let store = SqliteSecretStore::new(pool, Some("a sufficiently long passphrase"));

    store.set_secret("upstream_token", "s3cr3t-value").await.unwrap();
    let fetched = store.get_secret("upstream_token").await.unwrap();
    assert_eq!(fetched, "s3cr3t-value");
}
