//! ProvisionRepoHandler - Creates and fully configures a claim repository.
//!
//! The steps run in order and each one is idempotent, so a retry after a
//! partial failure converges on the same end state:
//!
//! 1. create the repository (existing repository is reused)
//! 2. commit the claim content file to the default branch
//! 3. protect the default branch
//! 4. register the push webhook
//! 5. record the repository and head on the claim and mark it `ready`

use std::sync::Arc;

use super::settings::{initial_commit_message, OperationSettings};
use super::OperationError;
use crate::domain::outbox::ProvisionRepoPayload;
use crate::ports::{ClaimMirrorRepository, FileChange, GitHost};

/// Outcome of a successful provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRepoResult {
    pub external_repo_id: String,
    pub head_revision: String,
}

pub struct ProvisionRepoHandler {
    git_host: Arc<dyn GitHost>,
    claims: Arc<dyn ClaimMirrorRepository>,
    settings: OperationSettings,
}

impl ProvisionRepoHandler {
    pub fn new(
        git_host: Arc<dyn GitHost>,
        claims: Arc<dyn ClaimMirrorRepository>,
        settings: OperationSettings,
    ) -> Self {
        Self {
            git_host,
            claims,
            settings,
        }
    }

    pub async fn handle(
        &self,
        payload: &ProvisionRepoPayload,
    ) -> Result<ProvisionRepoResult, OperationError> {
        let claim_id = payload.claim_id;

        let external_repo_id = self.git_host.create_repo(claim_id).await?;

        let files = [FileChange::new(
            payload.format.content_path(),
            payload.content.clone(),
        )];
        let author = self
            .settings
            .author(&payload.author_id, &payload.author_name);
        let head_revision = self
            .git_host
            .commit_files(
                claim_id,
                &files,
                &author,
                &initial_commit_message(&payload.title),
                &self.settings.default_branch,
            )
            .await?;

        self.git_host.setup_branch_protection(claim_id).await?;
        self.git_host.setup_webhook(claim_id).await?;

        let found = self
            .claims
            .mark_ready(claim_id, &external_repo_id, &head_revision)
            .await?;
        if !found {
            tracing::warn!(%claim_id, "Provisioned repository for a claim with no local record");
        }

        tracing::info!(
            %claim_id,
            external_repo_id = %external_repo_id,
            head_revision = %head_revision,
            "Claim repository provisioned"
        );

        Ok(ProvisionRepoResult {
            external_repo_id,
            head_revision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryClaimMirrorRepository, InMemoryGitHost};
    use crate::domain::claim::{ClaimMirror, RepoState};
    use crate::domain::foundation::ClaimId;
    use crate::domain::outbox::ContentFormat;
    use crate::ports::GitHostError;

    fn payload(claim_id: ClaimId) -> ProvisionRepoPayload {
        ProvisionRepoPayload {
            claim_id,
            title: "Goldbach holds below 4e18".into(),
            content: "# Claim\n\nbody".into(),
            format: ContentFormat::Markdown,
            author_id: "user-1".into(),
            author_name: "Ada".into(),
        }
    }

    fn setup() -> (
        ProvisionRepoHandler,
        Arc<InMemoryGitHost>,
        Arc<InMemoryClaimMirrorRepository>,
        ClaimId,
    ) {
        let claim = ClaimMirror::new(ClaimId::new());
        let claim_id = claim.id;
        let host = Arc::new(InMemoryGitHost::new());
        let claims = Arc::new(InMemoryClaimMirrorRepository::with_claims([claim]));
        let handler =
            ProvisionRepoHandler::new(host.clone(), claims.clone(), OperationSettings::default());
        (handler, host, claims, claim_id)
    }

    #[tokio::test]
    async fn provisions_repository_and_marks_claim_ready() {
        let (handler, host, claims, claim_id) = setup();

        let result = handler.handle(&payload(claim_id)).await.unwrap();

        let claim = claims.get(claim_id).await.unwrap();
        assert_eq!(claim.repo_state, RepoState::Ready);
        assert_eq!(claim.external_repo_id, Some(result.external_repo_id));
        assert_eq!(claim.current_head_revision, Some(result.head_revision.clone()));
        assert_eq!(host.branch_head(claim_id, "main").await, Some(result.head_revision));
        assert_eq!(
            host.file(claim_id, "main", "claim.md").await.as_deref(),
            Some("# Claim\n\nbody")
        );
        assert!(host.is_protected(claim_id).await);
        assert_eq!(host.webhook_count(claim_id).await, 1);
    }

    #[tokio::test]
    async fn running_twice_leaves_one_repository() {
        let (handler, host, claims, claim_id) = setup();

        handler.handle(&payload(claim_id)).await.unwrap();
        handler.handle(&payload(claim_id)).await.unwrap();

        assert_eq!(host.repo_count().await, 1);
        assert_eq!(host.webhook_count(claim_id).await, 1);
        assert_eq!(
            claims.get(claim_id).await.unwrap().repo_state,
            RepoState::Ready
        );
    }

    #[tokio::test]
    async fn latex_content_lands_in_tex_file() {
        let (handler, host, _claims, claim_id) = setup();
        let mut p = payload(claim_id);
        p.format = ContentFormat::Latex;

        handler.handle(&p).await.unwrap();

        assert!(host.file(claim_id, "main", "claim.tex").await.is_some());
    }

    #[tokio::test]
    async fn failure_leaves_claim_provisioning() {
        let (handler, host, claims, claim_id) = setup();
        host.fail_always(GitHostError::Unavailable("down".into())).await;

        let err = handler.handle(&payload(claim_id)).await.unwrap_err();

        assert!(matches!(err, OperationError::GitHost(GitHostError::Unavailable(_))));
        assert_eq!(
            claims.get(claim_id).await.unwrap().repo_state,
            RepoState::Provisioning
        );
    }
}
