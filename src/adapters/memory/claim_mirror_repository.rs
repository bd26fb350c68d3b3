//! In-memory claim mirror repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::claim::ClaimMirror;
use crate::domain::foundation::{ClaimId, DomainError, ErrorCode};
use crate::ports::ClaimMirrorRepository;

/// In-memory implementation of the ClaimMirrorRepository port.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClaimMirrorRepository {
    claims: Arc<RwLock<HashMap<ClaimId, ClaimMirror>>>,
}

impl InMemoryClaimMirrorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `claims`.
    pub fn with_claims(claims: impl IntoIterator<Item = ClaimMirror>) -> Self {
        let map = claims.into_iter().map(|c| (c.id, c)).collect();
        Self {
            claims: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn get(&self, id: ClaimId) -> Option<ClaimMirror> {
        self.claims.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.claims.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.claims.read().await.is_empty()
    }
}

#[async_trait]
impl ClaimMirrorRepository for InMemoryClaimMirrorRepository {
    async fn insert(&self, claim: &ClaimMirror) -> Result<(), DomainError> {
        let mut claims = self.claims.write().await;
        if claims.contains_key(&claim.id) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Claim {} already exists", claim.id),
            ));
        }
        claims.insert(claim.id, claim.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ClaimId) -> Result<Option<ClaimMirror>, DomainError> {
        Ok(self.get(id).await)
    }

    async fn mark_ready(
        &self,
        id: ClaimId,
        external_repo_id: &str,
        head_revision: &str,
    ) -> Result<bool, DomainError> {
        match self.claims.write().await.get_mut(&id) {
            Some(claim) => {
                claim.mark_ready(external_repo_id, head_revision);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_head_revision(
        &self,
        id: ClaimId,
        head_revision: &str,
    ) -> Result<bool, DomainError> {
        match self.claims.write().await.get_mut(&id) {
            Some(claim) => {
                claim.record_head_revision(head_revision);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_error(&self, ids: &[ClaimId]) -> Result<u64, DomainError> {
        let mut claims = self.claims.write().await;
        let mut changed = 0;
        for id in ids {
            if let Some(claim) = claims.get_mut(id) {
                claim.mark_error();
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn list(&self, limit: u32) -> Result<Vec<ClaimMirror>, DomainError> {
        let mut claims: Vec<ClaimMirror> = self.claims.read().await.values().cloned().collect();
        claims.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        claims.truncate(limit as usize);
        Ok(claims)
    }
}
