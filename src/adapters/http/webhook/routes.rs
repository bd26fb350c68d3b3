use axum::{routing::post, Router};

use super::handlers::receive_webhook;
use crate::adapters::http::AppState;

/// Routes mounted under `/webhooks`.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/:provider", post(receive_webhook))
}
