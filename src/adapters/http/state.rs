//! Shared application state for the HTTP surface.

use std::sync::Arc;

use crate::application::{HandlePushWebhookHandler, InspectionHandler, ResetUnfinishedHandler};
use crate::domain::outbox::GitRef;
use crate::ports::{ClaimMirrorRepository, EventPublisher, OutboxStore, WebhookVerifier};

/// Dependencies handed to every route.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub outbox: Arc<dyn OutboxStore>,
    pub claims: Arc<dyn ClaimMirrorRepository>,
    pub event_publisher: Arc<dyn EventPublisher>,
    pub webhook_verifier: Arc<dyn WebhookVerifier>,
    pub default_branch: GitRef,
}

impl AppState {
    pub fn push_webhook_handler(&self) -> HandlePushWebhookHandler {
        HandlePushWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.claims.clone(),
            self.event_publisher.clone(),
            &self.default_branch,
        )
    }

    pub fn inspection_handler(&self) -> InspectionHandler {
        InspectionHandler::new(self.outbox.clone(), self.claims.clone())
    }

    pub fn reset_unfinished_handler(&self) -> ResetUnfinishedHandler {
        ResetUnfinishedHandler::new(self.outbox.clone(), self.claims.clone())
    }
}
