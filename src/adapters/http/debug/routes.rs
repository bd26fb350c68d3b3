use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{list_claims, list_outbox, reset_outbox};
use crate::adapters::http::AppState;

/// Routes mounted under `/debug`.
pub fn debug_routes() -> Router<AppState> {
    Router::new()
        .route("/outbox", get(list_outbox))
        .route("/outbox/reset", post(reset_outbox))
        .route("/claims", get(list_claims))
}
