//! Adapters - Implementations of port interfaces.
//!
//! - `postgres` - Outbox, claim and subscriber storage
//! - `forgejo` - Git host client and webhook signature verification
//! - `outbox` - The reconciliation worker
//! - `events` - Downstream event publishing
//! - `http` - Webhook, inspection and health routes
//! - `memory` - In-memory ports for tests and local runs

pub mod events;
pub mod forgejo;
pub mod http;
pub mod memory;
pub mod outbox;
pub mod postgres;
