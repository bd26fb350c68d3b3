//! Provisioning state of a claim's external repository.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Where a claim's repository is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoState {
    /// Created locally; the external repository may not exist yet.
    #[default]
    Provisioning,
    /// Repository exists and carries the initial content.
    Ready,
    /// Reconciliation was abandoned by an operator.
    Error,
}

impl RepoState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoState::Provisioning => "provisioning",
            RepoState::Ready => "ready",
            RepoState::Error => "error",
        }
    }
}

impl fmt::Display for RepoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepoState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provisioning" => Ok(RepoState::Provisioning),
            "ready" => Ok(RepoState::Ready),
            "error" => Ok(RepoState::Error),
            other => Err(ValidationError::invalid_format(
                "repo_state",
                format!("unknown repo state {:?}", other),
            )),
        }
    }
}
