//! HTTP adapter for inbound git host webhooks.
//!
//! - `POST /webhooks/:provider` - Push deliveries from Forgejo or Gitea

mod handlers;
mod routes;

pub use handlers::{receive_webhook, WebhookProvider};
pub use routes::webhook_routes;
