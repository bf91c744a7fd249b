//! Database initialization tests

use leadsplit_common::api::auth::{load_shared_secret, SHARED_SECRET_KEY};
use leadsplit_common::db::init::init_database;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("fresh").join("leadsplit.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("leadsplit.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_expected_tables_exist() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("leadsplit.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in ["agents", "lists", "settings"] {
        assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
    }
}

#[tokio::test]
async fn test_agent_email_is_unique() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("leadsplit.db")).await.unwrap();

    let insert = "INSERT INTO agents (id, name, email, mobile, password_hash, created_at, updated_at) \
                  VALUES (?, 'A', 'dup@example.com', '1', 'h', 't', 't')";

    sqlx::query(insert).bind("id-1").execute(&pool).await.unwrap();
    let second = sqlx::query(insert).bind("id-2").execute(&pool).await;

    assert!(second.is_err(), "duplicate email should violate the unique index");
}

#[tokio::test]
async fn test_shared_secret_created_once() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("leadsplit.db")).await.unwrap();

    let first = load_shared_secret(&pool).await.unwrap();
    let second = load_shared_secret(&pool).await.unwrap();

    assert_ne!(first, 0);
    assert_eq!(first, second);

    let stored: String = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(SHARED_SECRET_KEY)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, first.to_string());
}
