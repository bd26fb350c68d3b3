//! Outbox store tests against a real PostgreSQL.
//!
//! Ignored by default. Run with a disposable database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/claim_mirror_test cargo test -- --ignored
//! ```
//!
//! Each test migrates the schema and empties `outbox` first, so never point
//! this at a database whose outbox you care about.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use claim_mirror::adapters::postgres::PostgresOutboxStore;
use claim_mirror::domain::foundation::ClaimId;
use claim_mirror::domain::outbox::{ClaimTarget, NewOutboxEntry, Operation, OutboxStatus};
use claim_mirror::ports::OutboxStore;

// Tests share one outbox table.
static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

async fn connect() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    sqlx::query("DELETE FROM outbox").execute(&pool).await.unwrap();
    Some(pool)
}

async fn seed(store: &PostgresOutboxStore, count: usize) {
    for _ in 0..count {
        let op = Operation::RegisterWebhook(ClaimTarget {
            claim_id: ClaimId::new(),
        });
        store.enqueue(&NewOutboxEntry::new(&op).unwrap()).await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_claimers_get_disjoint_entries() {
    let _guard = DB_LOCK.lock().await;
    let Some(pool) = connect().await else { return };
    seed(&PostgresOutboxStore::new(pool.clone()), 24).await;

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let store = Arc::new(PostgresOutboxStore::new(pool.clone()));
        tasks.push(tokio::spawn(async move {
            let mut claimed = Vec::new();
            loop {
                let batch = store.claim_batch(5).await.unwrap();
                if batch.is_empty() {
                    return claimed;
                }
                claimed.extend(batch);
            }
        }));
    }

    let mut ids = HashSet::new();
    let mut total = 0;
    for task in tasks {
        for entry in task.await.unwrap() {
            assert_eq!(entry.status, OutboxStatus::Processing);
            assert!(entry.claim_token.is_some());
            assert!(entry.claimed_at.is_some());
            ids.insert(entry.id);
            total += 1;
        }
    }
    assert_eq!(total, 24);
    assert_eq!(ids.len(), 24);
}

#[tokio::test]
#[ignore]
async fn outcome_requires_the_current_claim_token() {
    let _guard = DB_LOCK.lock().await;
    let Some(pool) = connect().await else { return };
    let store = PostgresOutboxStore::new(pool);
    seed(&store, 1).await;

    let mut entry = store.claim_batch(1).await.unwrap().remove(0);
    let token = entry.claim_token.unwrap();
    entry.complete(chrono::Utc::now()).unwrap();

    assert!(!store.record_outcome(&entry, Uuid::new_v4()).await.unwrap());
    let stored = store.find_by_id(entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OutboxStatus::Processing);

    assert!(store.record_outcome(&entry, token).await.unwrap());
    let stored = store.find_by_id(entry.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OutboxStatus::Completed);
    assert_eq!(stored.attempts, 1);
    assert!(stored.claim_token.is_none());

    // The token is cleared with the outcome, so a replay matches nothing.
    assert!(!store.record_outcome(&entry, token).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn renewal_keeps_a_claim_out_of_stale_release() {
    let _guard = DB_LOCK.lock().await;
    let Some(pool) = connect().await else { return };
    let store = PostgresOutboxStore::new(pool);
    seed(&store, 1).await;

    let entry = store.claim_batch(1).await.unwrap().remove(0);
    let token = entry.claim_token.unwrap();
    let first_claimed_at = entry.claimed_at.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!store.renew_claim(entry.id, Uuid::new_v4()).await.unwrap());
    assert!(store.renew_claim(entry.id, token).await.unwrap());

    let renewed = store.find_by_id(entry.id).await.unwrap().unwrap();
    assert!(renewed.claimed_at.unwrap() > first_claimed_at);
    assert_eq!(store.release_stale(Duration::from_secs(600)).await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn stale_release_fences_out_the_old_holder() {
    let _guard = DB_LOCK.lock().await;
    let Some(pool) = connect().await else { return };
    let store = PostgresOutboxStore::new(pool);
    seed(&store, 1).await;

    let mut entry = store.claim_batch(1).await.unwrap().remove(0);
    let old_token = entry.claim_token.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        store.release_stale(Duration::from_millis(10)).await.unwrap(),
        1
    );
    let released = store.find_by_id(entry.id).await.unwrap().unwrap();
    assert_eq!(released.status, OutboxStatus::Pending);
    assert!(released.claim_token.is_none());
    assert!(released.claimed_at.is_none());

    let reclaimed = store.claim_batch(1).await.unwrap().remove(0);
    assert_eq!(reclaimed.id, entry.id);
    assert_ne!(reclaimed.claim_token, Some(old_token));

    assert!(!store.renew_claim(entry.id, old_token).await.unwrap());
    entry.complete(chrono::Utc::now()).unwrap();
    assert!(!store.record_outcome(&entry, old_token).await.unwrap());
}
