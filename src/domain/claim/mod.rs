//! Claim module - the locally stored side of the mirror.

mod events;
mod mirror;
mod repo_state;

pub use events::ClaimContentUpdated;
pub use mirror::ClaimMirror;
pub use repo_state::RepoState;
