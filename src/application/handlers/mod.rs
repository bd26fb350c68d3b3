//! Application handlers.
//!
//! - `operations` - one handler per outbox operation, plus the dispatcher
//! - `webhook` - inbound push notifications from the git host
//! - `maintenance` - operator inspection and reset

pub mod maintenance;
pub mod operations;
pub mod webhook;
