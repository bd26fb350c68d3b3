//! PostgreSQL implementation of OutboxStore.
//!
//! Claiming locks candidate rows with `FOR UPDATE SKIP LOCKED` and flips them
//! to `processing` in the same transaction, so concurrent workers in any
//! number of processes never claim the same row. Renewals and outcomes are
//! written only while the row still carries the claim token handed out at
//! claim time.
//!
//! Every lease timestamp is taken from the database's `now()`, and the stale
//! cutoff is computed in SQL, so worker clock skew cannot shift the lease.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use std::time::Duration;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, OutboxEntryId};
use crate::domain::outbox::{NewOutboxEntry, OutboxEntry, OutboxStatus};
use crate::ports::OutboxStore;

/// PostgreSQL implementation of OutboxStore.
#[derive(Clone)]
pub struct PostgresOutboxStore {
    pool: PgPool,
}

impl PostgresOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Writes `entry` inside a caller-owned transaction.
    ///
    /// Producers call this in the same transaction as the domain write the
    /// entry describes, so either both commit or neither does.
    ///
    /// ```ignore
    /// let mut txn = pool.begin().await?;
    /// insert_claim(&mut txn, &claim).await?;
    /// PostgresOutboxStore::enqueue_in_txn(&mut txn, &NewOutboxEntry::new(&op)?).await?;
    /// txn.commit().await?;
    /// ```
    pub async fn enqueue_in_txn(
        txn: &mut Transaction<'_, Postgres>,
        entry: &NewOutboxEntry,
    ) -> Result<(), DomainError> {
        insert_entry(entry)
            .execute(&mut **txn)
            .await
            .map_err(|e| DomainError::database("Failed to insert outbox entry", e))?;
        Ok(())
    }
}

fn insert_entry(
    entry: &NewOutboxEntry,
) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO outbox (id, operation, payload, status, attempts, max_attempts, created_at)
        VALUES ($1, $2, $3, 'pending', 0, $4, $5)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(&entry.operation)
    .bind(&entry.payload)
    .bind(to_i32(entry.max_attempts))
    .bind(entry.created_at)
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    async fn enqueue(&self, entry: &NewOutboxEntry) -> Result<(), DomainError> {
        insert_entry(entry)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to insert outbox entry", e))?;
        Ok(())
    }

    async fn claim_batch(&self, limit: u32) -> Result<Vec<OutboxEntry>, DomainError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin claim transaction", e))?;

        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM outbox
            WHERE status = 'pending'
            ORDER BY created_at
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&mut *txn)
        .await
        .map_err(|e| DomainError::database("Failed to select claimable entries", e))?;

        if ids.is_empty() {
            txn.commit()
                .await
                .map_err(|e| DomainError::database("Failed to commit claim transaction", e))?;
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            UPDATE outbox
            SET status = 'processing', claimed_at = now(), claim_token = $2
            WHERE id = ANY($1)
            RETURNING id, operation, payload, status, attempts, max_attempts, last_error,
                      created_at, processed_at, retry_after, claimed_at, claim_token
            "#,
        )
        .bind(&ids)
        .bind(Uuid::new_v4())
        .fetch_all(&mut *txn)
        .await
        .map_err(|e| DomainError::database("Failed to mark entries processing", e))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit claim transaction", e))?;

        let mut entries = rows
            .iter()
            .map(row_to_entry)
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }

    async fn renew_claim(&self, id: OutboxEntryId, claim_token: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE outbox
            SET claimed_at = now()
            WHERE id = $1 AND claim_token = $2 AND status = 'processing'
            "#,
        )
        .bind(id.as_uuid())
        .bind(claim_token)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to renew outbox claim", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_outcome(
        &self,
        entry: &OutboxEntry,
        claim_token: Uuid,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE outbox SET
                status = $3,
                attempts = $4,
                last_error = $5,
                processed_at = $6,
                claimed_at = NULL,
                claim_token = NULL
            WHERE id = $1 AND claim_token = $2 AND status = 'processing'
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(claim_token)
        .bind(entry.status.as_str())
        .bind(to_i32(entry.attempts))
        .bind(&entry.last_error)
        .bind(entry.processed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to record outbox outcome", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_stale(&self, older_than: Duration) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE outbox
            SET status = 'pending', claimed_at = NULL, claim_token = NULL
            WHERE status = 'processing'
              AND (claimed_at IS NULL OR claimed_at < now() - make_interval(secs => $1))
            "#,
        )
        .bind(older_than.as_secs_f64())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to release stale claims", e))?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: OutboxEntryId) -> Result<Option<OutboxEntry>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, operation, payload, status, attempts, max_attempts, last_error,
                   created_at, processed_at, retry_after, claimed_at, claim_token
            FROM outbox
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch outbox entry", e))?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn list(
        &self,
        status: Option<OutboxStatus>,
        limit: u32,
    ) -> Result<Vec<OutboxEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, operation, payload, status, attempts, max_attempts, last_error,
                   created_at, processed_at, retry_after, claimed_at, claim_token
            FROM outbox
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list outbox entries", e))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn delete_unfinished(&self) -> Result<Vec<OutboxEntry>, DomainError> {
        let rows = sqlx::query(
            r#"
            DELETE FROM outbox
            WHERE status <> 'completed'
            RETURNING id, operation, payload, status, attempts, max_attempts, last_error,
                      created_at, processed_at, retry_after, claimed_at, claim_token
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to delete unfinished entries", e))?;

        rows.iter().map(row_to_entry).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u32(value: i32, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Negative value in outbox.{}: {}", column, value),
        )
    })
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(&format!("Failed to get {}", name), e))
}

fn row_to_entry(row: &PgRow) -> Result<OutboxEntry, DomainError> {
    let status: String = column(row, "status")?;
    let status = status
        .parse::<OutboxStatus>()
        .map_err(|e| DomainError::database("Invalid outbox status", e))?;

    Ok(OutboxEntry {
        id: OutboxEntryId::from_uuid(column(row, "id")?),
        operation: column(row, "operation")?,
        payload: column(row, "payload")?,
        status,
        attempts: to_u32(column(row, "attempts")?, "attempts")?,
        max_attempts: to_u32(column(row, "max_attempts")?, "max_attempts")?,
        last_error: column(row, "last_error")?,
        created_at: column(row, "created_at")?,
        processed_at: column(row, "processed_at")?,
        retry_after: column(row, "retry_after")?,
        claimed_at: column(row, "claimed_at")?,
        claim_token: column(row, "claim_token")?,
    })
}
