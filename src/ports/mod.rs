//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the reconciliation logic and the outside world. Adapters implement them.
//!
//! ## Storage Ports
//!
//! - `OutboxStore` - Transactional outbox with exclusive batch claiming
//! - `ClaimMirrorRepository` - Reconciled columns of the claims table
//!
//! ## External Store
//!
//! - `GitHost` - The authoritative git hosting service
//!
//! ## Notification Ports
//!
//! - `EventPublisher` - Downstream domain event delivery
//! - `SubscriberDirectory` - Extensions subscribed to events
//!
//! ## Webhook Ports
//!
//! - `WebhookVerifier` - Signature check for inbound pushes

mod claim_mirror_repository;
mod event_publisher;
mod git_host;
mod outbox_store;
mod subscriber_directory;
mod webhook_verifier;

pub use claim_mirror_repository::ClaimMirrorRepository;
pub use event_publisher::EventPublisher;
pub use git_host::{CommitAuthor, FileChange, GitHost, GitHostError};
pub use outbox_store::OutboxStore;
pub use subscriber_directory::{Subscriber, SubscriberDirectory};
pub use webhook_verifier::WebhookVerifier;
