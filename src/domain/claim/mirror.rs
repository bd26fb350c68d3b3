//! The local record mirrored into the external content store.

use serde::{Deserialize, Serialize};

use super::RepoState;
use crate::domain::foundation::{ClaimId, Timestamp};

/// The reconciliation-relevant slice of a claim.
///
/// `current_head_revision` is written by the provision and commit handlers
/// and by the push webhook. Writers do not coordinate, so the last write
/// wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMirror {
    pub id: ClaimId,
    pub repo_state: RepoState,
    pub external_repo_id: Option<String>,
    pub current_head_revision: Option<String>,
    pub updated_at: Timestamp,
}

impl ClaimMirror {
    /// A freshly created claim awaiting its repository.
    pub fn new(id: ClaimId) -> Self {
        Self {
            id,
            repo_state: RepoState::Provisioning,
            external_repo_id: None,
            current_head_revision: None,
            updated_at: Timestamp::now(),
        }
    }

    /// Records a fully provisioned repository.
    pub fn mark_ready(
        &mut self,
        external_repo_id: impl Into<String>,
        head_revision: impl Into<String>,
    ) {
        self.external_repo_id = Some(external_repo_id.into());
        self.current_head_revision = Some(head_revision.into());
        self.repo_state = RepoState::Ready;
        self.touch();
    }

    pub fn record_head_revision(&mut self, head_revision: impl Into<String>) {
        self.current_head_revision = Some(head_revision.into());
        self.touch();
    }

    pub fn mark_error(&mut self) {
        self.repo_state = RepoState::Error;
        self.touch();
    }

    pub fn is_ready(&self) -> bool {
        self.repo_state == RepoState::Ready
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
