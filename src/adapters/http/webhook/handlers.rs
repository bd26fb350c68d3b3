//! Push webhook endpoint.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::dto::{ErrorResponse, StatusResponse};
use crate::adapters::http::AppState;
use crate::application::{HandlePushWebhookCommand, HandlePushWebhookResult, WebhookError};

/// Git hosts whose push deliveries are understood.
///
/// The two speak the same payload format and differ only in header names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookProvider {
    Forgejo,
    Gitea,
}

impl WebhookProvider {
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "forgejo" => Some(WebhookProvider::Forgejo),
            "gitea" => Some(WebhookProvider::Gitea),
            _ => None,
        }
    }

    pub fn event_header(&self) -> &'static str {
        match self {
            WebhookProvider::Forgejo => "X-Forgejo-Event",
            WebhookProvider::Gitea => "X-Gitea-Event",
        }
    }

    pub fn signature_header(&self) -> &'static str {
        match self {
            WebhookProvider::Forgejo => "X-Forgejo-Signature",
            WebhookProvider::Gitea => "X-Gitea-Signature",
        }
    }
}

/// POST /webhooks/:provider
///
/// The body is taken as raw bytes; the signature covers them exactly.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusResponse>, WebhookApiError> {
    let provider = WebhookProvider::from_path(&provider)
        .ok_or(WebhookApiError::UnknownProvider(provider))?;

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let cmd = HandlePushWebhookCommand {
        event_type: header(provider.event_header()),
        signature: header(provider.signature_header()),
        body: body.to_vec(),
    };

    match state.push_webhook_handler().handle(cmd).await? {
        HandlePushWebhookResult::HeadUpdated {
            claim_id,
            head_revision,
        } => {
            tracing::debug!(?provider, claim_id = %claim_id, head = %head_revision, "Push applied");
        }
        HandlePushWebhookResult::Ignored(reason) => {
            tracing::debug!(?provider, ?reason, "Push ignored");
        }
    }

    Ok(Json(StatusResponse::ok()))
}

/// Errors rendered by the webhook endpoint.
#[derive(Debug)]
pub enum WebhookApiError {
    UnknownProvider(String),
    Webhook(WebhookError),
}

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        WebhookApiError::Webhook(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            WebhookApiError::UnknownProvider(p) => (
                StatusCode::NOT_FOUND,
                "UNKNOWN_PROVIDER",
                format!("Unknown webhook provider: {}", p),
            ),
            WebhookApiError::Webhook(WebhookError::InvalidSignature) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                "Invalid webhook signature".to_string(),
            ),
            WebhookApiError::Webhook(e @ WebhookError::MalformedPayload(_)) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD", e.to_string())
            }
            WebhookApiError::Webhook(WebhookError::Storage(e)) => {
                tracing::error!(error = %e, "Webhook processing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Webhook processing failed".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
