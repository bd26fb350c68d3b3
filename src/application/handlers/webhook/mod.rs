//! Inbound webhook handlers.

mod handle_push_webhook;

pub use handle_push_webhook::{
    HandlePushWebhookCommand, HandlePushWebhookHandler, HandlePushWebhookResult, IgnoredPush,
    WebhookError,
};
