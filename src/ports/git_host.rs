//! GitHost port - The authoritative external content store.
//!
//! Every method must be idempotent: the worker delivers at-least-once, so
//! any call may be repeated after a partial failure.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::ClaimId;
use crate::domain::outbox::GitRef;

/// A file to write in a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

impl FileChange {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Author recorded on commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
}

/// Failures reported by the external store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GitHostError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {message}")]
    Conflict { message: String, paths: Vec<String> },

    #[error("git host unavailable: {0}")]
    Unavailable(String),

    #[error("git host API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl GitHostError {
    /// Whether a later attempt might succeed without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(self, GitHostError::Unavailable(_))
    }
}

/// Port for the external git hosting service.
///
/// Repositories are addressed by claim ID; the adapter decides how that maps
/// onto its own naming.
#[async_trait]
pub trait GitHost: Send + Sync {
    /// Ensure the repository exists. Returns its external ID, whether it was
    /// created by this call or already present.
    async fn create_repo(&self, claim_id: ClaimId) -> Result<String, GitHostError>;

    /// Write `files` to `branch` in one commit. Returns the new head revision.
    async fn commit_files(
        &self,
        claim_id: ClaimId,
        files: &[FileChange],
        author: &CommitAuthor,
        message: &str,
        branch: &GitRef,
    ) -> Result<String, GitHostError>;

    /// Protect the default branch. A no-op when protection already exists.
    async fn setup_branch_protection(&self, claim_id: ClaimId) -> Result<(), GitHostError>;

    /// Register the push webhook. A no-op when the hook already exists.
    async fn setup_webhook(&self, claim_id: ClaimId) -> Result<(), GitHostError>;

    /// Create `name` from `from`. A no-op when `name` already exists.
    async fn create_branch(
        &self,
        claim_id: ClaimId,
        name: &GitRef,
        from: &GitRef,
    ) -> Result<(), GitHostError>;

    /// Rename `old` to `new`. A no-op when the rename was already applied.
    async fn rename_branch(
        &self,
        claim_id: ClaimId,
        old: &GitRef,
        new: &GitRef,
    ) -> Result<(), GitHostError>;
}
