//! The closed set of reconciliation operations and their payloads.
//!
//! Entries persist the operation tag and the payload document separately.
//! [`Operation::decode`] turns the pair back into a typed value with an
//! exhaustive match, so an unknown tag or a payload missing required fields
//! is an error rather than a silent no-op.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

use super::content::ContentFormat;
use crate::domain::foundation::{ClaimId, ValidationError};

/// Tag identifying an operation kind, as stored in the `operation` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ProvisionRepo,
    CommitContent,
    CreateBranch,
    RenameBranch,
    ApplyBranchProtection,
    RegisterWebhook,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::ProvisionRepo,
        OperationKind::CommitContent,
        OperationKind::CreateBranch,
        OperationKind::RenameBranch,
        OperationKind::ApplyBranchProtection,
        OperationKind::RegisterWebhook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ProvisionRepo => "provision_repo",
            OperationKind::CommitContent => "commit_content",
            OperationKind::CreateBranch => "create_branch",
            OperationKind::RenameBranch => "rename_branch",
            OperationKind::ApplyBranchProtection => "apply_branch_protection",
            OperationKind::RegisterWebhook => "register_webhook",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownOperation(s.to_string()))
    }
}

fn default_author() -> String {
    "service".to_string()
}

fn default_commit_message() -> String {
    "Update claim content".to_string()
}

fn default_from_ref() -> String {
    "main".to_string()
}

/// Provision the git host repository for a newly created claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRepoPayload {
    #[serde(alias = "entity_id")]
    pub claim_id: ClaimId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub format: ContentFormat,
    #[serde(default = "default_author")]
    pub author_id: String,
    #[serde(default = "default_author")]
    pub author_name: String,
}

/// Commit new content for an existing claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitContentPayload {
    #[serde(alias = "entity_id")]
    pub claim_id: ClaimId,
    pub content: String,
    #[serde(default)]
    pub format: ContentFormat,
    #[serde(default = "default_commit_message")]
    pub message: String,
    #[serde(default = "default_author")]
    pub author_id: String,
    #[serde(default = "default_author")]
    pub author_name: String,
}

/// Create a branch in a claim repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBranchPayload {
    #[serde(alias = "entity_id")]
    pub claim_id: ClaimId,
    pub branch_name: String,
    #[serde(default = "default_from_ref")]
    pub from_ref: String,
}

/// Rename a branch in a claim repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenameBranchPayload {
    #[serde(alias = "entity_id")]
    pub claim_id: ClaimId,
    pub old_name: String,
    pub new_name: String,
}

/// Payload for operations that only need to know which claim they target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimTarget {
    #[serde(alias = "entity_id")]
    pub claim_id: ClaimId,
}

/// A typed reconciliation operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    ProvisionRepo(ProvisionRepoPayload),
    CommitContent(CommitContentPayload),
    CreateBranch(CreateBranchPayload),
    RenameBranch(RenameBranchPayload),
    ApplyBranchProtection(ClaimTarget),
    RegisterWebhook(ClaimTarget),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::ProvisionRepo(_) => OperationKind::ProvisionRepo,
            Operation::CommitContent(_) => OperationKind::CommitContent,
            Operation::CreateBranch(_) => OperationKind::CreateBranch,
            Operation::RenameBranch(_) => OperationKind::RenameBranch,
            Operation::ApplyBranchProtection(_) => OperationKind::ApplyBranchProtection,
            Operation::RegisterWebhook(_) => OperationKind::RegisterWebhook,
        }
    }

    /// The claim this operation reconciles.
    pub fn claim_id(&self) -> ClaimId {
        match self {
            Operation::ProvisionRepo(p) => p.claim_id,
            Operation::CommitContent(p) => p.claim_id,
            Operation::CreateBranch(p) => p.claim_id,
            Operation::RenameBranch(p) => p.claim_id,
            Operation::ApplyBranchProtection(p) | Operation::RegisterWebhook(p) => p.claim_id,
        }
    }

    /// Serializes the payload document stored alongside the tag.
    pub fn payload(&self) -> Result<JsonValue, ValidationError> {
        let value = match self {
            Operation::ProvisionRepo(p) => serde_json::to_value(p),
            Operation::CommitContent(p) => serde_json::to_value(p),
            Operation::CreateBranch(p) => serde_json::to_value(p),
            Operation::RenameBranch(p) => serde_json::to_value(p),
            Operation::ApplyBranchProtection(p) | Operation::RegisterWebhook(p) => {
                serde_json::to_value(p)
            }
        };
        value.map_err(|e| ValidationError::malformed_payload(self.kind().as_str(), e.to_string()))
    }

    /// Rebuilds a typed operation from a stored tag and payload.
    pub fn decode(kind: OperationKind, payload: &JsonValue) -> Result<Self, ValidationError> {
        fn parse<T: for<'de> Deserialize<'de>>(
            kind: OperationKind,
            payload: &JsonValue,
        ) -> Result<T, ValidationError> {
            serde_json::from_value(payload.clone())
                .map_err(|e| ValidationError::malformed_payload(kind.as_str(), e.to_string()))
        }

        Ok(match kind {
            OperationKind::ProvisionRepo => Operation::ProvisionRepo(parse(kind, payload)?),
            OperationKind::CommitContent => Operation::CommitContent(parse(kind, payload)?),
            OperationKind::CreateBranch => Operation::CreateBranch(parse(kind, payload)?),
            OperationKind::RenameBranch => Operation::RenameBranch(parse(kind, payload)?),
            OperationKind::ApplyBranchProtection => {
                Operation::ApplyBranchProtection(parse(kind, payload)?)
            }
            OperationKind::RegisterWebhook => Operation::RegisterWebhook(parse(kind, payload)?),
        })
    }
}
