//! Read-only queries behind the operational inspection routes.

use std::sync::Arc;

use crate::domain::claim::ClaimMirror;
use crate::domain::foundation::DomainError;
use crate::domain::outbox::{OutboxEntry, OutboxStatus};
use crate::ports::{ClaimMirrorRepository, OutboxStore};

/// Upper bound on rows returned by one inspection query.
pub const MAX_INSPECT_LIMIT: u32 = 500;

/// Query for outbox entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOutboxQuery {
    pub status: Option<OutboxStatus>,
    pub limit: u32,
}

pub struct InspectionHandler {
    outbox: Arc<dyn OutboxStore>,
    claims: Arc<dyn ClaimMirrorRepository>,
}

impl InspectionHandler {
    pub fn new(outbox: Arc<dyn OutboxStore>, claims: Arc<dyn ClaimMirrorRepository>) -> Self {
        Self { outbox, claims }
    }

    pub async fn list_outbox(&self, query: ListOutboxQuery) -> Result<Vec<OutboxEntry>, DomainError> {
        self.outbox
            .list(query.status, query.limit.min(MAX_INSPECT_LIMIT))
            .await
    }

    pub async fn list_claims(&self, limit: u32) -> Result<Vec<ClaimMirror>, DomainError> {
        self.claims.list(limit.min(MAX_INSPECT_LIMIT)).await
    }
}
