//! PostgreSQL implementation of ClaimMirrorRepository.
//!
//! Touches only the reconciled columns of the `claims` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::claim::{ClaimMirror, RepoState};
use crate::domain::foundation::{ClaimId, DomainError, Timestamp};
use crate::ports::ClaimMirrorRepository;

/// PostgreSQL implementation of ClaimMirrorRepository.
#[derive(Clone)]
pub struct PostgresClaimMirrorRepository {
    pool: PgPool,
}

impl PostgresClaimMirrorRepository {
    /// Creates a new PostgresClaimMirrorRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClaimMirrorRepository for PostgresClaimMirrorRepository {
    async fn insert(&self, claim: &ClaimMirror) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO claims (id, repo_state, external_repo_id, current_head_revision, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(claim.id.as_uuid())
        .bind(claim.repo_state.as_str())
        .bind(&claim.external_repo_id)
        .bind(&claim.current_head_revision)
        .bind(claim.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert claim", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: ClaimId) -> Result<Option<ClaimMirror>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, repo_state, external_repo_id, current_head_revision, updated_at
            FROM claims
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch claim", e))?;

        row.as_ref().map(row_to_claim).transpose()
    }

    async fn mark_ready(
        &self,
        id: ClaimId,
        external_repo_id: &str,
        head_revision: &str,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET
                repo_state = 'ready',
                external_repo_id = $2,
                current_head_revision = $3,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(external_repo_id)
        .bind(head_revision)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to mark claim ready", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_head_revision(
        &self,
        id: ClaimId,
        head_revision: &str,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET current_head_revision = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(head_revision)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update head revision", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_error(&self, ids: &[ClaimId]) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let result = sqlx::query(
            r#"
            UPDATE claims SET repo_state = 'error', updated_at = now()
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to mark claims errored", e))?;

        Ok(result.rows_affected())
    }

    async fn list(&self, limit: u32) -> Result<Vec<ClaimMirror>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, repo_state, external_repo_id, current_head_revision, updated_at
            FROM claims
            ORDER BY updated_at DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list claims", e))?;

        rows.iter().map(row_to_claim).collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn row_to_claim(row: &PgRow) -> Result<ClaimMirror, DomainError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| DomainError::database("Failed to get id", e))?;
    let repo_state: String = row
        .try_get("repo_state")
        .map_err(|e| DomainError::database("Failed to get repo_state", e))?;
    let external_repo_id: Option<String> = row
        .try_get("external_repo_id")
        .map_err(|e| DomainError::database("Failed to get external_repo_id", e))?;
    let current_head_revision: Option<String> = row
        .try_get("current_head_revision")
        .map_err(|e| DomainError::database("Failed to get current_head_revision", e))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| DomainError::database("Failed to get updated_at", e))?;

    Ok(ClaimMirror {
        id: ClaimId::from_uuid(id),
        repo_state: repo_state
            .parse::<RepoState>()
            .map_err(|e| DomainError::database("Invalid repo_state", e))?,
        external_repo_id,
        current_head_revision,
        updated_at: Timestamp::from_datetime(updated_at),
    })
}
