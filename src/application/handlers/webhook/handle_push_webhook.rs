//! HandlePushWebhookHandler - Folds pushes made on the git host back into
//! the local claim record.
//!
//! Content can change on the host without passing through the outbox (a
//! direct push by a collaborator). Each accepted push overwrites the claim's
//! head revision and is announced downstream as `claim.content_updated`.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::claim::ClaimContentUpdated;
use crate::domain::foundation::{ClaimId, DomainError, SerializableDomainEvent};
use crate::domain::outbox::GitRef;
use crate::ports::{ClaimMirrorRepository, EventPublisher, WebhookVerifier};

/// Revision a push reports when it deletes the ref.
const DELETED_REVISION: &str = "0000000000000000000000000000000000000000";

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandlePushWebhookCommand {
    /// Value of the provider's event header, if sent.
    pub event_type: Option<String>,
    /// Value of the provider's signature header, if sent.
    pub signature: Option<String>,
    /// Raw request body, exactly as received.
    pub body: Vec<u8>,
}

/// Why an authenticated delivery caused no change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoredPush {
    /// Not a push event.
    EventType(String),
    /// Repository name is not a claim ID.
    UnknownRepository(String),
    /// The push deleted the ref.
    RefDeleted,
    /// Push to a branch other than the default one.
    OtherRef(String),
    /// No local claim matches the repository.
    ClaimNotFound(ClaimId),
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePushWebhookResult {
    /// Head revision updated and notification published.
    HeadUpdated {
        claim_id: ClaimId,
        head_revision: String,
    },
    /// Authenticated but nothing to do.
    Ignored(IgnoredPush),
}

/// Failures that reject a delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Storage(#[from] DomainError),
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref", default)]
    git_ref: String,
    #[serde(default)]
    after: String,
    #[serde(default)]
    repository: Option<PushRepository>,
    #[serde(default)]
    commits: Vec<PushCommit>,
}

#[derive(Debug, Deserialize)]
struct PushRepository {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PushCommit {
    #[serde(default)]
    message: String,
}

pub struct HandlePushWebhookHandler {
    verifier: Arc<dyn WebhookVerifier>,
    claims: Arc<dyn ClaimMirrorRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    tracked_ref: String,
}

impl HandlePushWebhookHandler {
    pub fn new(
        verifier: Arc<dyn WebhookVerifier>,
        claims: Arc<dyn ClaimMirrorRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        default_branch: &GitRef,
    ) -> Self {
        Self {
            verifier,
            claims,
            event_publisher,
            tracked_ref: format!("refs/heads/{}", default_branch),
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePushWebhookCommand,
    ) -> Result<HandlePushWebhookResult, WebhookError> {
        // 1. Authenticate before looking at the body
        let signature = cmd.signature.as_deref().unwrap_or_default();
        if !self.verifier.verify(&cmd.body, signature) {
            tracing::warn!("Rejected webhook delivery with invalid signature");
            return Err(WebhookError::InvalidSignature);
        }

        // 2. The body must be JSON whatever the event type
        let document: JsonValue = serde_json::from_slice(&cmd.body)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        let event_type = cmd.event_type.unwrap_or_default();
        if event_type != "push" {
            tracing::debug!(event_type = %event_type, "Ignoring webhook event");
            return Ok(HandlePushWebhookResult::Ignored(IgnoredPush::EventType(
                event_type,
            )));
        }

        let push: PushPayload = serde_json::from_value(document)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;

        self.handle_push(push).await
    }

    async fn handle_push(&self, push: PushPayload) -> Result<HandlePushWebhookResult, WebhookError> {
        let repo_name = push.repository.map(|r| r.name).unwrap_or_default();
        let claim_id = match Uuid::parse_str(&repo_name) {
            Ok(id) => ClaimId::from_uuid(id),
            Err(_) => {
                tracing::warn!(repository = %repo_name, "Push event for non-claim repository");
                return Ok(HandlePushWebhookResult::Ignored(
                    IgnoredPush::UnknownRepository(repo_name),
                ));
            }
        };

        if push.after.is_empty() || push.after == DELETED_REVISION {
            return Ok(HandlePushWebhookResult::Ignored(IgnoredPush::RefDeleted));
        }

        if push.git_ref != self.tracked_ref {
            tracing::debug!(%claim_id, git_ref = %push.git_ref, "Ignoring push to untracked ref");
            return Ok(HandlePushWebhookResult::Ignored(IgnoredPush::OtherRef(
                push.git_ref,
            )));
        }

        if !self
            .claims
            .update_head_revision(claim_id, &push.after)
            .await?
        {
            tracing::warn!(%claim_id, "Push event for unknown claim");
            return Ok(HandlePushWebhookResult::Ignored(
                IgnoredPush::ClaimNotFound(claim_id),
            ));
        }

        if let Some(last) = push.commits.last() {
            let summary: String = last.message.chars().take(80).collect();
            tracing::info!(
                %claim_id,
                head_revision = %push.after,
                message = %summary,
                "Push to claim"
            );
        }

        let event = ClaimContentUpdated::new(claim_id, push.after.clone(), push.git_ref);
        if let Err(e) = self.event_publisher.publish(event.to_envelope()).await {
            tracing::warn!(%claim_id, error = %e, "Failed to publish content update");
        }

        Ok(HandlePushWebhookResult::HeadUpdated {
            claim_id,
            head_revision: push.after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::memory::InMemoryClaimMirrorRepository;
    use crate::domain::claim::ClaimMirror;
    use serde_json::json;

    struct StaticVerifier(bool);

    impl WebhookVerifier for StaticVerifier {
        fn verify(&self, _body: &[u8], _signature: &str) -> bool {
            self.0
        }
    }

    struct Fixture {
        handler: HandlePushWebhookHandler,
        claims: Arc<InMemoryClaimMirrorRepository>,
        bus: Arc<InMemoryEventBus>,
        claim_id: ClaimId,
    }

    fn fixture(valid_signature: bool) -> Fixture {
        let claim = ClaimMirror::new(ClaimId::new());
        let claim_id = claim.id;
        let claims = Arc::new(InMemoryClaimMirrorRepository::with_claims([claim]));
        let bus = Arc::new(InMemoryEventBus::new());
        let handler = HandlePushWebhookHandler::new(
            Arc::new(StaticVerifier(valid_signature)),
            claims.clone(),
            bus.clone(),
            &GitRef::main(),
        );
        Fixture {
            handler,
            claims,
            bus,
            claim_id,
        }
    }

    fn push(repo: &str, git_ref: &str, after: &str) -> HandlePushWebhookCommand {
        let body = json!({
            "ref": git_ref,
            "after": after,
            "repository": {"name": repo},
            "commits": [{"message": "Tighten bound"}],
        });
        HandlePushWebhookCommand {
            event_type: Some("push".into()),
            signature: Some("sig".into()),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    const HEAD: &str = "1111111111111111111111111111111111111111";

    #[tokio::test]
    async fn valid_push_updates_head_and_publishes() {
        let f = fixture(true);

        let result = f
            .handler
            .handle(push(&f.claim_id.to_string(), "refs/heads/main", HEAD))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandlePushWebhookResult::HeadUpdated {
                claim_id: f.claim_id,
                head_revision: HEAD.into()
            }
        );
        assert_eq!(
            f.claims.get(f.claim_id).await.unwrap().current_head_revision.as_deref(),
            Some(HEAD)
        );
        let events = f.bus.events_of_type("claim.content_updated");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["head_revision"], HEAD);
        assert_eq!(events[0].payload["ref"], "refs/heads/main");
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_without_writes() {
        let f = fixture(false);

        let err = f
            .handler
            .handle(push(&f.claim_id.to_string(), "refs/heads/main", HEAD))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        assert!(f.claims.get(f.claim_id).await.unwrap().current_head_revision.is_none());
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn push_to_other_branch_is_ignored() {
        let f = fixture(true);

        let result = f
            .handler
            .handle(push(&f.claim_id.to_string(), "refs/heads/draft", HEAD))
            .await
            .unwrap();

        assert!(matches!(
            result,
            HandlePushWebhookResult::Ignored(IgnoredPush::OtherRef(_))
        ));
        assert!(f.claims.get(f.claim_id).await.unwrap().current_head_revision.is_none());
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn deletion_push_is_ignored() {
        let f = fixture(true);

        let result = f
            .handler
            .handle(push(
                &f.claim_id.to_string(),
                "refs/heads/main",
                DELETED_REVISION,
            ))
            .await
            .unwrap();

        assert_eq!(result, HandlePushWebhookResult::Ignored(IgnoredPush::RefDeleted));
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn non_uuid_repository_is_ignored() {
        let f = fixture(true);

        let result = f
            .handler
            .handle(push("website", "refs/heads/main", HEAD))
            .await
            .unwrap();

        assert!(matches!(
            result,
            HandlePushWebhookResult::Ignored(IgnoredPush::UnknownRepository(_))
        ));
    }

    #[tokio::test]
    async fn unknown_claim_publishes_nothing() {
        let f = fixture(true);
        let stranger = ClaimId::new();

        let result = f
            .handler
            .handle(push(&stranger.to_string(), "refs/heads/main", HEAD))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandlePushWebhookResult::Ignored(IgnoredPush::ClaimNotFound(stranger))
        );
        assert_eq!(f.bus.event_count(), 0);
    }

    #[tokio::test]
    async fn non_push_event_is_ignored() {
        let f = fixture(true);
        let mut cmd = push(&f.claim_id.to_string(), "refs/heads/main", HEAD);
        cmd.event_type = Some("issues".into());

        let result = f.handler.handle(cmd).await.unwrap();

        assert_eq!(
            result,
            HandlePushWebhookResult::Ignored(IgnoredPush::EventType("issues".into()))
        );
    }

    #[tokio::test]
    async fn unparseable_body_is_malformed() {
        let f = fixture(true);
        let cmd = HandlePushWebhookCommand {
            event_type: Some("push".into()),
            signature: Some("sig".into()),
            body: b"not json".to_vec(),
        };

        let err = f.handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, WebhookError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn publish_failure_still_updates_head() {
        let f = fixture(true);
        f.bus.fail_publishing();

        let result = f
            .handler
            .handle(push(&f.claim_id.to_string(), "refs/heads/main", HEAD))
            .await
            .unwrap();

        assert!(matches!(result, HandlePushWebhookResult::HeadUpdated { .. }));
    }
}
