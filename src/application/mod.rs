//! Application layer - Handlers that orchestrate domain types and ports.

pub mod handlers;

pub use handlers::maintenance::{
    InspectionHandler, ListOutboxQuery, ResetUnfinishedHandler, ResetUnfinishedResult,
};
pub use handlers::operations::{
    OperationDispatcher, OperationError, OperationOutcome, OperationSettings,
};
pub use handlers::webhook::{
    HandlePushWebhookCommand, HandlePushWebhookHandler, HandlePushWebhookResult, IgnoredPush,
    WebhookError,
};
