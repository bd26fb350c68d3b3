//! HTTP adapter for operator inspection.
//!
//! Mounted only when `features.debug_routes` is enabled:
//! - `GET /debug/outbox?status=&limit=` - Outbox entries, newest first
//! - `GET /debug/claims?limit=` - Claims, most recently updated first
//! - `POST /debug/outbox/reset` - Drop unfinished entries, mark their claims `error`

mod dto;
mod handlers;
mod routes;

pub use dto::{ClaimView, OutboxEntryView, ResetResponse};
pub use routes::debug_routes;
