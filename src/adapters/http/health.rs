//! Liveness endpoint.

use axum::{routing::get, Json, Router};

use super::dto::StatusResponse;

/// GET /health
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

pub fn health_routes<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/health", get(health))
}
