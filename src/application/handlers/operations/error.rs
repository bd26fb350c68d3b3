//! Errors raised while executing an outbox operation.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ValidationError};
use crate::ports::GitHostError;

/// Failure of a single operation attempt.
///
/// The worker turns every variant into a retry or a terminal failure; none
/// of them reach the producer.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] ValidationError),

    #[error(transparent)]
    GitHost(#[from] GitHostError),

    #[error("storage error: {0}")]
    Storage(#[from] DomainError),
}

impl OperationError {
    /// Short category used as a structured log field.
    pub fn category(&self) -> &'static str {
        match self {
            OperationError::InvalidPayload(_) => "invalid_input",
            OperationError::GitHost(GitHostError::NotFound(_)) => "not_found",
            OperationError::GitHost(GitHostError::Conflict { .. }) => "conflict",
            OperationError::GitHost(GitHostError::Unavailable(_)) => "unavailable",
            OperationError::GitHost(GitHostError::Api { .. }) => "git_host_api",
            OperationError::Storage(_) => "database",
        }
    }
}
