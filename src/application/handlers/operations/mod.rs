//! Operation handlers.
//!
//! One handler per outbox operation kind. Every handler is idempotent so the
//! worker can retry any of them after a partial failure.

mod branches;
mod commit_content;
mod dispatcher;
mod error;
mod provision_repo;
mod repo_settings;
mod settings;

pub use branches::{CreateBranchHandler, RenameBranchHandler};
pub use commit_content::CommitContentHandler;
pub use dispatcher::{OperationDispatcher, OperationOutcome};
pub use error::OperationError;
pub use provision_repo::{ProvisionRepoHandler, ProvisionRepoResult};
pub use repo_settings::{ApplyBranchProtectionHandler, RegisterWebhookHandler};
pub use settings::{
    OperationSettings, MAX_AUTHOR_NAME_CHARS, MAX_MESSAGE_CHARS, MAX_TITLE_CHARS,
};
