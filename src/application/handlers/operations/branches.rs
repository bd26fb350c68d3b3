//! Branch operations. Ref names are validated before any external call.

use std::sync::Arc;

use super::OperationError;
use crate::domain::outbox::{CreateBranchPayload, GitRef, RenameBranchPayload};
use crate::ports::GitHost;

pub struct CreateBranchHandler {
    git_host: Arc<dyn GitHost>,
}

impl CreateBranchHandler {
    pub fn new(git_host: Arc<dyn GitHost>) -> Self {
        Self { git_host }
    }

    pub async fn handle(&self, payload: &CreateBranchPayload) -> Result<(), OperationError> {
        let name = GitRef::parse("branch_name", &payload.branch_name)?;
        let from = GitRef::parse("from_ref", &payload.from_ref)?;

        self.git_host
            .create_branch(payload.claim_id, &name, &from)
            .await?;
        tracing::debug!(claim_id = %payload.claim_id, branch = %name, from = %from, "Branch created");
        Ok(())
    }
}

pub struct RenameBranchHandler {
    git_host: Arc<dyn GitHost>,
}

impl RenameBranchHandler {
    pub fn new(git_host: Arc<dyn GitHost>) -> Self {
        Self { git_host }
    }

    pub async fn handle(&self, payload: &RenameBranchPayload) -> Result<(), OperationError> {
        let old = GitRef::parse("old_name", &payload.old_name)?;
        let new = GitRef::parse("new_name", &payload.new_name)?;

        self.git_host
            .rename_branch(payload.claim_id, &old, &new)
            .await?;
        tracing::debug!(claim_id = %payload.claim_id, old = %old, new = %new, "Branch renamed");
        Ok(())
    }
}
