//! In-memory outbox store.
//!
//! Claiming takes the lock, picks the oldest pending entries and flips them
//! to `processing` before releasing it, so concurrent workers in one process
//! see the same exclusivity that `FOR UPDATE SKIP LOCKED` gives across
//! processes. Useful for tests and single-process development.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, OutboxEntryId};
use crate::domain::outbox::{NewOutboxEntry, OutboxEntry, OutboxStatus};
use crate::ports::OutboxStore;

/// In-memory implementation of the OutboxStore port.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOutboxStore {
    entries: Arc<Mutex<Vec<OutboxEntry>>>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored entry in insertion order.
    pub async fn entries(&self) -> Vec<OutboxEntry> {
        self.entries.lock().await.clone()
    }

    /// Number of entries currently in `status`.
    pub async fn count_with_status(&self, status: OutboxStatus) -> usize {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.status == status)
            .count()
    }

    /// Overwrite the claim time of an entry, for simulating abandoned claims.
    pub async fn backdate_claim(&self, id: OutboxEntryId, claimed_at: DateTime<Utc>) {
        if let Some(entry) = self.entries.lock().await.iter_mut().find(|e| e.id == id) {
            entry.claimed_at = Some(claimed_at);
        }
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn enqueue(&self, entry: &NewOutboxEntry) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().await;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Outbox entry {} already exists", entry.id),
            ));
        }
        entries.push(OutboxEntry::from_new(entry.clone()));
        Ok(())
    }

    async fn claim_batch(&self, limit: u32) -> Result<Vec<OutboxEntry>, DomainError> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();

        let mut pending: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == OutboxStatus::Pending)
            .map(|(idx, _)| idx)
            .collect();
        pending.sort_by_key(|idx| entries[*idx].created_at);

        let mut claimed = Vec::new();
        for idx in pending.into_iter().take(limit as usize) {
            let entry = &mut entries[idx];
            entry.claim(Uuid::new_v4(), now)?;
            claimed.push(entry.clone());
        }
        Ok(claimed)
    }

    async fn renew_claim(&self, id: OutboxEntryId, claim_token: Uuid) -> Result<bool, DomainError> {
        let mut entries = self.entries.lock().await;
        match entries.iter_mut().find(|e| e.id == id) {
            Some(stored)
                if stored.status == OutboxStatus::Processing
                    && stored.claim_token == Some(claim_token) =>
            {
                stored.claimed_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_outcome(
        &self,
        entry: &OutboxEntry,
        claim_token: Uuid,
    ) -> Result<bool, DomainError> {
        let mut entries = self.entries.lock().await;
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(stored)
                if stored.status == OutboxStatus::Processing
                    && stored.claim_token == Some(claim_token) =>
            {
                *stored = entry.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_stale(&self, older_than: Duration) -> Result<u64, DomainError> {
        let Some(claimed_before) = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };
        let mut entries = self.entries.lock().await;
        let mut released = 0;
        for entry in entries.iter_mut().filter(|e| {
            e.status == OutboxStatus::Processing
                && e.claimed_at.map_or(true, |at| at < claimed_before)
        }) {
            entry.release_stale()?;
            released += 1;
        }
        Ok(released)
    }

    async fn find_by_id(&self, id: OutboxEntryId) -> Result<Option<OutboxEntry>, DomainError> {
        Ok(self.entries.lock().await.iter().find(|e| e.id == id).cloned())
    }

    async fn list(
        &self,
        status: Option<OutboxStatus>,
        limit: u32,
    ) -> Result<Vec<OutboxEntry>, DomainError> {
        let entries = self.entries.lock().await;
        let mut listed: Vec<OutboxEntry> = entries
            .iter()
            .filter(|e| status.map_or(true, |s| e.status == s))
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        listed.truncate(limit as usize);
        Ok(listed)
    }

    async fn delete_unfinished(&self) -> Result<Vec<OutboxEntry>, DomainError> {
        let mut entries = self.entries.lock().await;
        let (removed, kept): (Vec<_>, Vec<_>) = entries
            .drain(..)
            .partition(|e| e.status != OutboxStatus::Completed);
        *entries = kept;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ClaimId;
    use crate::domain::outbox::{ClaimTarget, Operation};
    use chrono::Duration;

    fn new_entry() -> NewOutboxEntry {
        NewOutboxEntry::new(&Operation::RegisterWebhook(ClaimTarget {
            claim_id: ClaimId::new(),
        }))
        .unwrap()
    }

    async fn store_with(count: usize) -> InMemoryOutboxStore {
        let store = InMemoryOutboxStore::new();
        for _ in 0..count {
            store.enqueue(&new_entry()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn claim_batch_respects_limit_and_order() {
        let store = InMemoryOutboxStore::new();
        let mut first = new_entry();
        first.created_at = Utc::now() - Duration::seconds(10);
        let second = new_entry();
        store.enqueue(&second).await.unwrap();
        store.enqueue(&first).await.unwrap();

        let claimed = store.claim_batch(1).await.unwrap();

        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, first.id);
        assert_eq!(claimed[0].status, OutboxStatus::Processing);
    }

    #[tokio::test]
    async fn claimed_entries_are_not_claimed_again() {
        let store = store_with(3).await;

        let a = store.claim_batch(2).await.unwrap();
        let b = store.claim_batch(2).await.unwrap();

        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
        assert!(b.iter().all(|e| a.iter().all(|other| other.id != e.id)));
        assert!(store.claim_batch(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn outcome_requires_current_claim_token() {
        let store = store_with(1).await;
        let mut entry = store.claim_batch(1).await.unwrap().remove(0);
        let token = entry.claim_token.unwrap();
        entry.complete(Utc::now()).unwrap();

        assert!(!store.record_outcome(&entry, Uuid::new_v4()).await.unwrap());
        assert!(store.record_outcome(&entry, token).await.unwrap());
        assert_eq!(store.count_with_status(OutboxStatus::Completed).await, 1);
        // Already finished; the same token no longer holds a claim.
        assert!(!store.record_outcome(&entry, token).await.unwrap());
    }

    #[tokio::test]
    async fn release_stale_only_touches_old_claims() {
        let store = store_with(2).await;
        let claimed = store.claim_batch(2).await.unwrap();
        store
            .backdate_claim(claimed[0].id, Utc::now() - Duration::minutes(30))
            .await;

        let released = store
            .release_stale(std::time::Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(released, 1);
        let entry = store.find_by_id(claimed[0].id).await.unwrap().unwrap();
        assert_eq!(entry.status, OutboxStatus::Pending);
        assert_eq!(entry.attempts, 0);
        assert_eq!(store.count_with_status(OutboxStatus::Processing).await, 1);
    }

    #[tokio::test]
    async fn renew_claim_restarts_the_lease_for_the_holder_only() {
        let store = store_with(1).await;
        let entry = store.claim_batch(1).await.unwrap().remove(0);
        let token = entry.claim_token.unwrap();
        store
            .backdate_claim(entry.id, Utc::now() - Duration::minutes(30))
            .await;

        assert!(!store.renew_claim(entry.id, Uuid::new_v4()).await.unwrap());
        assert!(store.renew_claim(entry.id, token).await.unwrap());

        let released = store
            .release_stale(std::time::Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(released, 0);
    }

    #[tokio::test]
    async fn released_claim_cannot_be_renewed() {
        let store = store_with(1).await;
        let entry = store.claim_batch(1).await.unwrap().remove(0);
        let token = entry.claim_token.unwrap();
        store
            .backdate_claim(entry.id, Utc::now() - Duration::minutes(30))
            .await;
        store
            .release_stale(std::time::Duration::from_secs(600))
            .await
            .unwrap();

        assert!(!store.renew_claim(entry.id, token).await.unwrap());
        let reclaimed = store.claim_batch(1).await.unwrap().remove(0);
        assert_ne!(reclaimed.claim_token, Some(token));
    }

    #[tokio::test]
    async fn delete_unfinished_keeps_completed() {
        let store = store_with(3).await;
        let mut done = store.claim_batch(1).await.unwrap().remove(0);
        let token = done.claim_token.unwrap();
        done.complete(Utc::now()).unwrap();
        store.record_outcome(&done, token).await.unwrap();

        let removed = store.delete_unfinished().await.unwrap();

        assert_eq!(removed.len(), 2);
        let remaining = store.entries().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, done.id);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = store_with(3).await;
        store.claim_batch(1).await.unwrap();

        let pending = store.list(Some(OutboxStatus::Pending), 10).await.unwrap();
        let all = store.list(None, 2).await.unwrap();

        assert_eq!(pending.len(), 2);
        assert_eq!(all.len(), 2);
    }
}
