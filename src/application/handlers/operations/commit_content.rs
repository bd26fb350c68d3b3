//! CommitContentHandler - Writes new claim content to the default branch.

use std::sync::Arc;

use super::settings::{commit_message, OperationSettings};
use super::OperationError;
use crate::domain::outbox::CommitContentPayload;
use crate::ports::{ClaimMirrorRepository, FileChange, GitHost};

pub struct CommitContentHandler {
    git_host: Arc<dyn GitHost>,
    claims: Arc<dyn ClaimMirrorRepository>,
    settings: OperationSettings,
}

impl CommitContentHandler {
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

    /// Commits the content and returns the new head revision.
    pub async fn handle(&self, payload: &CommitContentPayload) -> Result<String, OperationError> {
        let claim_id = payload.claim_id;
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
                &commit_message(&payload.message),
                &self.settings.default_branch,
            )
            .await?;

        if !self
            .claims
            .update_head_revision(claim_id, &head_revision)
            .await?
        {
            tracing::warn!(%claim_id, "Committed content for a claim with no local record");
        }

        tracing::debug!(%claim_id, head_revision = %head_revision, "Claim content committed");
        Ok(head_revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryClaimMirrorRepository, InMemoryGitHost};
    use crate::domain::claim::ClaimMirror;
    use crate::domain::foundation::ClaimId;
    use crate::domain::outbox::ContentFormat;
    use crate::ports::GitHostError;

    fn payload(claim_id: ClaimId, content: &str) -> CommitContentPayload {
        CommitContentPayload {
            claim_id,
            content: content.into(),
            format: ContentFormat::Plain,
            message: "Fix typo".into(),
            author_id: "user-1".into(),
            author_name: "Ada".into(),
        }
    }

    async fn setup() -> (
        CommitContentHandler,
        Arc<InMemoryGitHost>,
        Arc<InMemoryClaimMirrorRepository>,
        ClaimId,
    ) {
        let claim = ClaimMirror::new(ClaimId::new());
        let claim_id = claim.id;
        let host = Arc::new(InMemoryGitHost::new());
        host.create_repo(claim_id).await.unwrap();
        let claims = Arc::new(InMemoryClaimMirrorRepository::with_claims([claim]));
        let handler =
            CommitContentHandler::new(host.clone(), claims.clone(), OperationSettings::default());
        (handler, host, claims, claim_id)
    }

    #[tokio::test]
    async fn commit_updates_claim_head() {
        let (handler, host, claims, claim_id) = setup().await;

        let head = handler.handle(&payload(claim_id, "v2")).await.unwrap();

        assert_eq!(
            claims.get(claim_id).await.unwrap().current_head_revision,
            Some(head.clone())
        );
        assert_eq!(host.branch_head(claim_id, "main").await, Some(head));
        assert_eq!(host.file(claim_id, "main", "claim.txt").await.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn missing_repository_is_not_found() {
        let (handler, _host, claims, _claim_id) = setup().await;
        let orphan = ClaimId::new();

        let err = handler.handle(&payload(orphan, "v2")).await.unwrap_err();

        assert!(matches!(err, OperationError::GitHost(GitHostError::NotFound(_))));
        assert!(claims.get(orphan).await.is_none());
    }
}
