//! PostgreSQL implementation of SubscriberDirectory.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::DomainError;
use crate::ports::{Subscriber, SubscriberDirectory};

#[derive(Clone)]
pub struct PostgresSubscriberDirectory {
    pool: PgPool,
}

impl PostgresSubscriberDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberDirectory for PostgresSubscriberDirectory {
    async fn subscribers_for(
        &self,
        event_type: &str,
        limit: u32,
    ) -> Result<Vec<Subscriber>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, base_url, events, active
            FROM subscribers
            WHERE active AND $1 = ANY(events)
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(event_type)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to load subscribers", e))?;

        rows.iter()
            .map(|row| {
                Ok(Subscriber {
                    id: row
                        .try_get("id")
                        .map_err(|e| DomainError::database("Failed to get id", e))?,
                    name: row
                        .try_get("name")
                        .map_err(|e| DomainError::database("Failed to get name", e))?,
                    base_url: row
                        .try_get("base_url")
                        .map_err(|e| DomainError::database("Failed to get base_url", e))?,
                    events: row
                        .try_get("events")
                        .map_err(|e| DomainError::database("Failed to get events", e))?,
                    active: row
                        .try_get("active")
                        .map_err(|e| DomainError::database("Failed to get active", e))?,
                })
            })
            .collect()
    }
}
