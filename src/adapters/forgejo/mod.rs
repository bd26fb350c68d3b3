//! Forgejo adapters - GitHost over the Forgejo REST API and push webhook
//! signature verification.

mod client;
mod signature;

pub use client::{ForgejoConfig, ForgejoGitHost};
pub use signature::HmacSha256Verifier;
