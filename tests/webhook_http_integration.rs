//! HTTP integration tests for the webhook, inspection and health routes.
//!
//! Requests go through the full axum router via `tower::ServiceExt::oneshot`,
//! backed by in-memory storage and a real HMAC verifier.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use claim_mirror::adapters::events::InMemoryEventBus;
use claim_mirror::adapters::forgejo::HmacSha256Verifier;
use claim_mirror::adapters::http::{app_router, AppState, RouterOptions};
use claim_mirror::adapters::memory::{InMemoryClaimMirrorRepository, InMemoryOutboxStore};
use claim_mirror::domain::claim::{ClaimMirror, RepoState};
use claim_mirror::domain::foundation::ClaimId;
use claim_mirror::domain::outbox::{ClaimTarget, GitRef, NewOutboxEntry, Operation};
use claim_mirror::ports::{ClaimMirrorRepository, OutboxStore};

const SECRET: &str = "webhook-secret";
const HEAD: &str = "9f1c2e7d4b3a59687f0e1d2c3b4a596877665544";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    claims: Arc<InMemoryClaimMirrorRepository>,
    outbox: Arc<InMemoryOutboxStore>,
    bus: Arc<InMemoryEventBus>,
    claim_id: ClaimId,
}

fn test_app(debug_routes: bool) -> TestApp {
    let claim = ClaimMirror::new(ClaimId::new());
    let claim_id = claim.id;
    let claims = Arc::new(InMemoryClaimMirrorRepository::with_claims([claim]));
    let outbox = Arc::new(InMemoryOutboxStore::new());
    let bus = Arc::new(InMemoryEventBus::new());

    let state = AppState {
        outbox: outbox.clone(),
        claims: claims.clone(),
        event_publisher: bus.clone(),
        webhook_verifier: Arc::new(HmacSha256Verifier::new(Some(SecretString::new(
            SECRET.to_string(),
        )))),
        default_branch: GitRef::main(),
    };
    let router = app_router(
        state,
        RouterOptions {
            debug_routes,
            request_timeout: Duration::from_secs(5),
        },
    );

    TestApp {
        router,
        claims,
        outbox,
        bus,
        claim_id,
    }
}

fn push_body(claim_id: &str, git_ref: &str, after: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "ref": git_ref,
        "before": "0000000000000000000000000000000000000000",
        "after": after,
        "repository": {"name": claim_id, "full_name": format!("claims/{}", claim_id)},
        "commits": [{"id": after, "message": "Tighten the bound in section 2"}]
    }))
    .unwrap()
}

fn delivery(provider: &str, event: &str, body: Vec<u8>, signature: &str) -> Request<Body> {
    let prefix = if provider == "gitea" { "X-Gitea" } else { "X-Forgejo" };
    Request::builder()
        .method("POST")
        .uri(format!("/webhooks/{}", provider))
        .header("Content-Type", "application/json")
        .header(format!("{}-Event", prefix), event)
        .header(format!("{}-Signature", prefix), signature)
        .body(Body::from(body))
        .unwrap()
}

fn signed(provider: &str, event: &str, body: Vec<u8>) -> Request<Body> {
    let signature = HmacSha256Verifier::sign(SECRET, &body).unwrap();
    delivery(provider, event, body, &signature)
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn head_of(app: &TestApp) -> Option<String> {
    app.claims
        .get(app.claim_id)
        .await
        .and_then(|c| c.current_head_revision)
}

// =============================================================================
// Push webhook
// =============================================================================

#[tokio::test]
async fn valid_push_updates_head_and_notifies() {
    let app = test_app(false);
    let body = push_body(&app.claim_id.to_string(), "refs/heads/main", HEAD);

    let (status, json) = send(&app, signed("forgejo", "push", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));
    assert_eq!(head_of(&app).await.as_deref(), Some(HEAD));

    let events = app.bus.events_of_type("claim.content_updated");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload["head_revision"], HEAD);
    assert_eq!(events[0].payload["claim_id"], app.claim_id.to_string());
    assert_eq!(events[0].payload["ref"], "refs/heads/main");
}

#[tokio::test]
async fn gitea_headers_are_accepted() {
    let app = test_app(false);
    let body = push_body(&app.claim_id.to_string(), "refs/heads/main", HEAD);

    let (status, _) = send(&app, signed("gitea", "push", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(head_of(&app).await.as_deref(), Some(HEAD));
}

#[tokio::test]
async fn tampered_delivery_is_rejected_without_writes() {
    let app = test_app(false);
    let body = push_body(&app.claim_id.to_string(), "refs/heads/main", HEAD);
    let signature = HmacSha256Verifier::sign(SECRET, &body).unwrap();
    let tampered = push_body(
        &app.claim_id.to_string(),
        "refs/heads/main",
        "1111111111111111111111111111111111111111",
    );

    let (status, json) = send(&app, delivery("forgejo", "push", tampered, &signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "INVALID_SIGNATURE");
    assert!(head_of(&app).await.is_none());
    assert_eq!(app.bus.event_count(), 0);
}

#[tokio::test]
async fn missing_signature_is_rejected() {
    let app = test_app(false);
    let body = push_body(&app.claim_id.to_string(), "refs/heads/main", HEAD);
    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/forgejo")
        .header("X-Forgejo-Event", "push")
        .body(Body::from(body))
        .unwrap();

    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn push_to_other_branch_is_ignored() {
    let app = test_app(false);
    let body = push_body(&app.claim_id.to_string(), "refs/heads/proposal/1", HEAD);

    let (status, json) = send(&app, signed("forgejo", "push", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(head_of(&app).await.is_none());
    assert_eq!(app.bus.event_count(), 0);
}

#[tokio::test]
async fn branch_deletion_is_ignored() {
    let app = test_app(false);
    let body = push_body(
        &app.claim_id.to_string(),
        "refs/heads/main",
        "0000000000000000000000000000000000000000",
    );

    let (status, _) = send(&app, signed("forgejo", "push", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(head_of(&app).await.is_none());
    assert_eq!(app.bus.event_count(), 0);
}

#[tokio::test]
async fn non_claim_repository_is_ignored() {
    let app = test_app(false);
    let body = push_body("website", "refs/heads/main", HEAD);

    let (status, _) = send(&app, signed("forgejo", "push", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.bus.event_count(), 0);
}

#[tokio::test]
async fn unknown_claim_publishes_nothing() {
    let app = test_app(false);
    let body = push_body(&ClaimId::new().to_string(), "refs/heads/main", HEAD);

    let (status, _) = send(&app, signed("forgejo", "push", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.bus.event_count(), 0);
}

#[tokio::test]
async fn non_push_events_are_acknowledged() {
    let app = test_app(false);
    let body = serde_json::to_vec(&json!({"action": "opened", "number": 3})).unwrap();

    let (status, json) = send(&app, signed("forgejo", "issues", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(app.bus.event_count(), 0);
}

#[tokio::test]
async fn signed_garbage_is_a_bad_request() {
    let app = test_app(false);

    let (status, json) = send(&app, signed("forgejo", "push", b"{not json".to_vec())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "MALFORMED_PAYLOAD");
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let app = test_app(false);
    let body = push_body(&app.claim_id.to_string(), "refs/heads/main", HEAD);

    let (status, json) = send(&app, signed("github", "push", body)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "UNKNOWN_PROVIDER");
}

// =============================================================================
// Health and inspection
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app(false);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));
}

#[tokio::test]
async fn debug_routes_are_hidden_unless_enabled() {
    let app = test_app(false);
    let request = Request::builder()
        .uri("/debug/outbox")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn debug_outbox_filters_by_status() {
    let app = test_app(true);
    let entry = NewOutboxEntry::new(&Operation::RegisterWebhook(ClaimTarget {
        claim_id: app.claim_id,
    }))
    .unwrap();
    app.outbox.enqueue(&entry).await.unwrap();

    let pending = Request::builder()
        .uri("/debug/outbox?status=pending&limit=10")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, pending).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["operation"], "register_webhook");
    assert_eq!(json[0]["status"], "pending");

    let failed = Request::builder()
        .uri("/debug/outbox?status=failed")
        .body(Body::empty())
        .unwrap();
    let (_, json) = send(&app, failed).await;
    assert!(json.as_array().unwrap().is_empty());

    let invalid = Request::builder()
        .uri("/debug/outbox?status=retrying")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, invalid).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_QUERY");
}

#[tokio::test]
async fn debug_claims_lists_claims() {
    let app = test_app(true);
    let request = Request::builder()
        .uri("/debug/claims")
        .body(Body::empty())
        .unwrap();

    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["id"], app.claim_id.to_string());
    assert_eq!(json[0]["repo_state"], "provisioning");
}

#[tokio::test]
async fn debug_reset_drops_unfinished_entries_and_errors_claims() {
    let app = test_app(true);
    let entry = NewOutboxEntry::new(&Operation::ApplyBranchProtection(ClaimTarget {
        claim_id: app.claim_id,
    }))
    .unwrap();
    app.outbox.enqueue(&entry).await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/debug/outbox/reset")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"entries_deleted": 1, "claims_marked_error": 1}));
    assert!(app.outbox.entries().await.is_empty());
    let claim = app.claims.find_by_id(app.claim_id).await.unwrap().unwrap();
    assert_eq!(claim.repo_state, RepoState::Error);
}
