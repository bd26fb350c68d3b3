//! Outbox module - durable reconciliation work items.
//!
//! - `OutboxEntry` / `OutboxStatus` - the entry and its state machine
//! - `Operation` - the closed set of operations with typed payloads
//! - `GitRef` - validated branch/ref names
//! - `ContentFormat` - claim content formats

mod content;
mod entry;
mod git_ref;
mod operation;

pub use content::{sanitize, truncate_chars, ContentFormat};
pub use entry::{
    NewOutboxEntry, OutboxEntry, OutboxStatus, DEFAULT_MAX_ATTEMPTS, MAX_ERROR_LENGTH,
};
pub use git_ref::GitRef;
pub use operation::{
    ClaimTarget, CommitContentPayload, CreateBranchPayload, Operation, OperationKind,
    ProvisionRepoPayload, RenameBranchPayload,
};
