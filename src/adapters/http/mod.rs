//! HTTP adapters - The service's REST surface.
//!
//! - `/health` - Liveness
//! - `/webhooks/:provider` - Push deliveries from the git host
//! - `/debug/*` - Operator inspection, behind a feature flag

pub mod debug;
pub mod dto;
pub mod health;
mod router;
mod state;
pub mod webhook;

pub use dto::{ErrorResponse, StatusResponse};
pub use router::{app_router, RouterOptions};
pub use state::AppState;
