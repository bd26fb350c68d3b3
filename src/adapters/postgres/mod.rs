//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresOutboxStore` - Outbox claiming with `FOR UPDATE SKIP LOCKED`
//! - `PostgresClaimMirrorRepository` - Reconciled columns of claims
//! - `PostgresSubscriberDirectory` - Notification subscribers

mod claim_mirror_repository;
mod outbox_store;
mod subscriber_directory;

pub use claim_mirror_repository::PostgresClaimMirrorRepository;
pub use outbox_store::PostgresOutboxStore;
pub use subscriber_directory::PostgresSubscriberDirectory;
