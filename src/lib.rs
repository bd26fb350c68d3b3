//! Claim Mirror - Reconciles claims into an external git host.
//!
//! Producers write an outbox entry in the same transaction as their domain
//! change. A background worker drains the outbox against the git host, and
//! push webhooks fold changes made on the host back into the local record.

pub mod adapters;
pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
