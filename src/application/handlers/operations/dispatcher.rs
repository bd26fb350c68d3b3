//! OperationDispatcher - Routes a decoded operation to its handler.

use std::sync::Arc;

use super::{
    ApplyBranchProtectionHandler, CommitContentHandler, CreateBranchHandler, OperationError,
    OperationSettings, ProvisionRepoHandler, RegisterWebhookHandler, RenameBranchHandler,
};
use crate::domain::outbox::Operation;
use crate::ports::{ClaimMirrorRepository, GitHost};

/// What a successful dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Provisioned {
        external_repo_id: String,
        head_revision: String,
    },
    Committed {
        head_revision: String,
    },
    BranchCreated,
    BranchRenamed,
    BranchProtected,
    WebhookRegistered,
}

/// One handler per operation kind, selected by an exhaustive match.
pub struct OperationDispatcher {
    provision_repo: ProvisionRepoHandler,
    commit_content: CommitContentHandler,
    create_branch: CreateBranchHandler,
    rename_branch: RenameBranchHandler,
    apply_branch_protection: ApplyBranchProtectionHandler,
    register_webhook: RegisterWebhookHandler,
}

impl OperationDispatcher {
    pub fn new(
        git_host: Arc<dyn GitHost>,
        claims: Arc<dyn ClaimMirrorRepository>,
        settings: OperationSettings,
    ) -> Self {
        Self {
            provision_repo: ProvisionRepoHandler::new(
                git_host.clone(),
                claims.clone(),
                settings.clone(),
            ),
            commit_content: CommitContentHandler::new(git_host.clone(), claims, settings),
            create_branch: CreateBranchHandler::new(git_host.clone()),
            rename_branch: RenameBranchHandler::new(git_host.clone()),
            apply_branch_protection: ApplyBranchProtectionHandler::new(git_host.clone()),
            register_webhook: RegisterWebhookHandler::new(git_host),
        }
    }

    pub async fn dispatch(&self, operation: &Operation) -> Result<OperationOutcome, OperationError> {
        match operation {
            Operation::ProvisionRepo(payload) => {
                let result = self.provision_repo.handle(payload).await?;
                Ok(OperationOutcome::Provisioned {
                    external_repo_id: result.external_repo_id,
                    head_revision: result.head_revision,
                })
            }
            Operation::CommitContent(payload) => {
                let head_revision = self.commit_content.handle(payload).await?;
                Ok(OperationOutcome::Committed { head_revision })
            }
            Operation::CreateBranch(payload) => {
                self.create_branch.handle(payload).await?;
                Ok(OperationOutcome::BranchCreated)
            }
            Operation::RenameBranch(payload) => {
                self.rename_branch.handle(payload).await?;
                Ok(OperationOutcome::BranchRenamed)
            }
            Operation::ApplyBranchProtection(target) => {
                self.apply_branch_protection.handle(target).await?;
                Ok(OperationOutcome::BranchProtected)
            }
            Operation::RegisterWebhook(target) => {
                self.register_webhook.handle(target).await?;
                Ok(OperationOutcome::WebhookRegistered)
            }
        }
    }
}
