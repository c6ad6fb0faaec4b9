//! Live tests for `PgKnownStateStore` using `#[sqlx::test]`.
//!
//! Each test gets a fresh database from the sqlx test harness; the store
//! creates its own table, so no migrations are applied.

use permit_scan::{KnownStateStore, ScanError};
use postgres::database::PgKnownStateStore;
use sqlx::PgPool;

const TABLE: &str = "napali_known_availability";

async fn store(pool: PgPool) -> PgKnownStateStore {
    let store = PgKnownStateStore::new(pool, TABLE).expect("valid table name");
    store.ensure_table().await.expect("ensure_table");
    store
}

#[sqlx::test(migrations = false)]
async fn upsert_then_scan_returns_latest_values(pool: PgPool) {
    let store = store(pool).await;

    store.upsert("5/23", 2).await.unwrap();
    store.upsert("5/24", 0).await.unwrap();
    store.upsert("5/23", 7).await.unwrap();

    let state = store.scan_all().await.unwrap();
    assert_eq!(state.len(), 2);
    assert_eq!(state["5/23"], 7);
    assert_eq!(state["5/24"], 0);
}

#[sqlx::test(migrations = false)]
async fn ensure_table_is_idempotent(pool: PgPool) {
    let store = store(pool).await;
    store.upsert("5/21", 1).await.unwrap();

    store.ensure_table().await.unwrap();

    let state = store.scan_all().await.unwrap();
    assert_eq!(state["5/21"], 1);
}

#[sqlx::test(migrations = false)]
async fn empty_table_scans_to_empty_state(pool: PgPool) {
    let store = store(pool).await;

    assert!(store.scan_all().await.unwrap().is_empty());
}

#[sqlx::test(migrations = false)]
async fn null_availability_reads_as_zero(pool: PgPool) {
    let store = store(pool.clone()).await;
    sqlx::query(&format!(
        "INSERT INTO {TABLE} (date, availability) VALUES ('5/22', NULL)"
    ))
    .execute(&pool)
    .await
    .unwrap();

    let state = store.scan_all().await.unwrap();
    assert_eq!(state["5/22"], 0);
}

#[sqlx::test(migrations = false)]
async fn negative_availability_fails_the_scan(pool: PgPool) {
    let store = store(pool.clone()).await;
    sqlx::query(&format!(
        "INSERT INTO {TABLE} (date, availability) VALUES ('5/22', -1)"
    ))
    .execute(&pool)
    .await
    .unwrap();

    let err = store.scan_all().await.unwrap_err();
    assert!(matches!(err, ScanError::StoreRead(_)));
}

#[sqlx::test(migrations = false)]
async fn invalid_table_name_is_rejected(pool: PgPool) {
    let err = PgKnownStateStore::new(pool, "known; DROP TABLE users").unwrap_err();
    assert!(matches!(err, ScanError::Configuration(_)));
}
