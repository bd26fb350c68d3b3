//! In-memory adapters for tests and local development.

mod claim_mirror_repository;
mod git_host;
mod outbox_store;

pub use claim_mirror_repository::InMemoryClaimMirrorRepository;
pub use git_host::{GitHostCall, InMemoryGitHost};
pub use outbox_store::InMemoryOutboxStore;
