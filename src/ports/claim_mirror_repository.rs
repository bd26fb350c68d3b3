//! Claim mirror repository port.
//!
//! Only the reconciliation-owned columns of a claim are exposed here. The
//! rest of the claim record belongs to the API that creates it.

use async_trait::async_trait;

use crate::domain::claim::ClaimMirror;
use crate::domain::foundation::{ClaimId, DomainError};

/// Repository port for the reconciled side of claims.
#[async_trait]
pub trait ClaimMirrorRepository: Send + Sync {
    /// Insert a claim record. Producers normally do this in their own
    /// transaction; the method exists for seeding and tests.
    async fn insert(&self, claim: &ClaimMirror) -> Result<(), DomainError>;

    /// Find a claim by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: ClaimId) -> Result<Option<ClaimMirror>, DomainError>;

    /// Record a fully provisioned repository and move the claim to `ready`.
    ///
    /// Returns `false` if no such claim exists.
    async fn mark_ready(
        &self,
        id: ClaimId,
        external_repo_id: &str,
        head_revision: &str,
    ) -> Result<bool, DomainError>;

    /// Overwrite the current head revision.
    ///
    /// Returns `false` if no such claim exists.
    async fn update_head_revision(
        &self,
        id: ClaimId,
        head_revision: &str,
    ) -> Result<bool, DomainError>;

    /// Move the given claims to `error`. Returns how many rows changed.
    async fn mark_error(&self, ids: &[ClaimId]) -> Result<u64, DomainError>;

    /// List claims, most recently updated first.
    async fn list(&self, limit: u32) -> Result<Vec<ClaimMirror>, DomainError>;
}
