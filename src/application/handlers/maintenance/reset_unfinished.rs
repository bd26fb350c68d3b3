//! ResetUnfinishedHandler - Operator escape hatch for stuck reconciliation.
//!
//! Deletes every outbox entry that has not completed (pending, processing
//! and failed alike) and marks the claims they targeted as `error`, so the
//! abandonment is visible on the claim itself.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::foundation::{ClaimId, DomainError};
use crate::ports::{ClaimMirrorRepository, OutboxStore};

/// Counts reported back to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetUnfinishedResult {
    pub entries_deleted: u64,
    pub claims_marked_error: u64,
}

pub struct ResetUnfinishedHandler {
    outbox: Arc<dyn OutboxStore>,
    claims: Arc<dyn ClaimMirrorRepository>,
}

impl ResetUnfinishedHandler {
    pub fn new(outbox: Arc<dyn OutboxStore>, claims: Arc<dyn ClaimMirrorRepository>) -> Self {
        Self { outbox, claims }
    }

    pub async fn handle(&self) -> Result<ResetUnfinishedResult, DomainError> {
        let removed = self.outbox.delete_unfinished().await?;

        let mut claim_ids = BTreeSet::new();
        for entry in &removed {
            match entry.decode_operation() {
                Ok(operation) => {
                    claim_ids.insert(operation.claim_id());
                }
                Err(e) => {
                    tracing::warn!(entry_id = %entry.id, error = %e, "Deleted entry with undecodable payload");
                }
            }
        }
        let claim_ids: Vec<ClaimId> = claim_ids.into_iter().collect();
        let claims_marked_error = if claim_ids.is_empty() {
            0
        } else {
            self.claims.mark_error(&claim_ids).await?
        };

        let result = ResetUnfinishedResult {
            entries_deleted: removed.len() as u64,
            claims_marked_error,
        };
        tracing::warn!(
            entries_deleted = result.entries_deleted,
            claims_marked_error = result.claims_marked_error,
            "Unfinished outbox entries reset"
        );
        Ok(result)
    }
}
