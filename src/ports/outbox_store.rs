//! OutboxStore port - Durable storage and claiming of reconciliation work.
//!
//! Producers write entries in the same transaction as their domain change.
//! Workers claim batches of pending entries, and the claim is exclusive:
//! an entry in `processing` belongs to exactly one worker until its outcome
//! is recorded or the claim goes stale.
//!
//! A batch is claimed at once but dispatched one entry at a time, so the
//! worker renews each entry's claim right before dispatching it. The lease
//! therefore only has to outlast a single dispatch, not a whole batch.

use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, OutboxEntryId};
use crate::domain::outbox::{NewOutboxEntry, OutboxEntry, OutboxStatus};

/// Port for the transactional outbox.
///
/// Implementations must ensure:
/// - `claim_batch` never hands the same pending entry to two callers
/// - `renew_claim` and `record_outcome` only apply while the presented claim
///   token is current
/// - claim times and the stale cutoff come from the same clock
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Write a new pending entry.
    async fn enqueue(&self, entry: &NewOutboxEntry) -> Result<(), DomainError>;

    /// Claim up to `limit` pending entries, oldest first.
    ///
    /// Returned entries are in `processing` with a fresh `claim_token`.
    async fn claim_batch(&self, limit: u32) -> Result<Vec<OutboxEntry>, DomainError>;

    /// Restart the lease on a claimed entry just before it is dispatched.
    ///
    /// Returns `false` when the claim was released or taken over; the caller
    /// must then leave the entry alone.
    async fn renew_claim(&self, id: OutboxEntryId, claim_token: Uuid) -> Result<bool, DomainError>;

    /// Persist the outcome of a dispatched entry.
    ///
    /// Returns `false` when the claim identified by `claim_token` is no longer
    /// held, in which case nothing is written.
    async fn record_outcome(
        &self,
        entry: &OutboxEntry,
        claim_token: Uuid,
    ) -> Result<bool, DomainError>;

    /// Return `processing` entries whose claim is older than `older_than` to
    /// `pending` without consuming an attempt. Returns how many moved.
    async fn release_stale(&self, older_than: Duration) -> Result<u64, DomainError>;

    /// Find an entry by ID.
    async fn find_by_id(&self, id: OutboxEntryId) -> Result<Option<OutboxEntry>, DomainError>;

    /// List entries newest first, optionally filtered by status.
    async fn list(
        &self,
        status: Option<OutboxStatus>,
        limit: u32,
    ) -> Result<Vec<OutboxEntry>, DomainError>;

    /// Delete every entry that is not `completed`, returning what was removed.
    async fn delete_unfinished(&self) -> Result<Vec<OutboxEntry>, DomainError>;
}
