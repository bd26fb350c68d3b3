//! Repository configuration operations: branch protection and webhook.

use std::sync::Arc;

use super::OperationError;
use crate::domain::outbox::ClaimTarget;
use crate::ports::GitHost;

pub struct ApplyBranchProtectionHandler {
    git_host: Arc<dyn GitHost>,
}

impl ApplyBranchProtectionHandler {
    pub fn new(git_host: Arc<dyn GitHost>) -> Self {
        Self { git_host }
    }

    pub async fn handle(&self, target: &ClaimTarget) -> Result<(), OperationError> {
        self.git_host.setup_branch_protection(target.claim_id).await?;
        Ok(())
    }
}

pub struct RegisterWebhookHandler {
    git_host: Arc<dyn GitHost>,
}

impl RegisterWebhookHandler {
    pub fn new(git_host: Arc<dyn GitHost>) -> Self {
        Self { git_host }
    }

    pub async fn handle(&self, target: &ClaimTarget) -> Result<(), OperationError> {
        self.git_host.setup_webhook(target.claim_id).await?;
        Ok(())
    }
}
