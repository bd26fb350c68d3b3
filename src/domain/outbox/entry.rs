//! Outbox entries and their delivery state machine.
//!
//! ```text
//! pending --claim--> processing --complete--> completed
//!                      |
//!                      +--failure, attempts < max--> pending
//!                      +--failure, attempts = max--> failed
//! ```
//!
//! `completed` and `failed` are terminal. Every completion or failure
//! consumes exactly one attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::content::truncate_chars;
use super::operation::{Operation, OperationKind};
use crate::domain::foundation::{DomainError, ErrorCode, OutboxEntryId, ValidationError};

/// Attempt ceiling used when a producer does not choose one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Longest `last_error` kept on an entry, in characters.
pub const MAX_ERROR_LENGTH: usize = 2000;

/// Status of an outbox entry in the reconciliation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Waiting to be claimed by a worker
    Pending,
    /// Claimed by exactly one worker
    Processing,
    /// Reconciled successfully
    Completed,
    /// Exhausted its attempts
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Processing => "processing",
            OutboxStatus::Completed => "completed",
            OutboxStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OutboxStatus::Completed | OutboxStatus::Failed)
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboxStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "processing" => Ok(OutboxStatus::Processing),
            "completed" => Ok(OutboxStatus::Completed),
            "failed" => Ok(OutboxStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown outbox status {:?}", other),
            )),
        }
    }
}

/// An entry as written by a producer, before the store owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOutboxEntry {
    pub id: OutboxEntryId,
    /// Operation tag as stored; see [`OperationKind::as_str`].
    pub operation: String,
    pub payload: JsonValue,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl NewOutboxEntry {
    /// Creates a pending entry for `operation` with the default attempt ceiling.
    pub fn new(operation: &Operation) -> Result<Self, ValidationError> {
        Ok(Self {
            id: OutboxEntryId::new(),
            operation: operation.kind().as_str().to_string(),
            payload: operation.payload()?,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            created_at: Utc::now(),
        })
    }

    /// Overrides the attempt ceiling. Values below one are raised to one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// A durable unit of pending reconciliation work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: OutboxEntryId,
    /// Raw operation tag. Kept as text so a row with an unknown tag still
    /// loads and fails through the normal attempt accounting.
    pub operation: String,
    pub payload: JsonValue,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    /// Present in the schema for backoff scheduling; nothing populates it yet.
    pub retry_after: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    /// Fencing token of the current claim; finishing writes must present it.
    pub claim_token: Option<Uuid>,
}

impl OutboxEntry {
    /// Materializes a freshly written entry.
    pub fn from_new(new: NewOutboxEntry) -> Self {
        Self {
            id: new.id,
            operation: new.operation,
            payload: new.payload,
            status: OutboxStatus::Pending,
            attempts: 0,
            max_attempts: new.max_attempts,
            last_error: None,
            created_at: new.created_at,
            processed_at: None,
            retry_after: None,
            claimed_at: None,
            claim_token: None,
        }
    }

    /// Decodes the typed operation from the stored tag and payload.
    pub fn decode_operation(&self) -> Result<Operation, ValidationError> {
        let kind: OperationKind = self.operation.parse()?;
        Operation::decode(kind, &self.payload)
    }

    /// `pending -> processing`, recording the claim.
    pub fn claim(&mut self, token: Uuid, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.expect_status(OutboxStatus::Pending, "claim")?;
        self.status = OutboxStatus::Processing;
        self.claimed_at = Some(now);
        self.claim_token = Some(token);
        Ok(())
    }

    /// `processing -> completed`, consuming one attempt.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.expect_status(OutboxStatus::Processing, "complete")?;
        self.attempts = (self.attempts + 1).min(self.max_attempts);
        self.status = OutboxStatus::Completed;
        self.processed_at = Some(now);
        self.release_claim();
        Ok(())
    }

    /// `processing -> pending | failed`, consuming one attempt.
    ///
    /// Returns the status the entry moved to.
    pub fn record_failure(&mut self, error: &str) -> Result<OutboxStatus, DomainError> {
        self.expect_status(OutboxStatus::Processing, "record failure for")?;
        self.attempts = (self.attempts + 1).min(self.max_attempts);
        self.last_error = Some(truncate_chars(error, MAX_ERROR_LENGTH));
        self.status = if self.attempts >= self.max_attempts {
            OutboxStatus::Failed
        } else {
            OutboxStatus::Pending
        };
        self.release_claim();
        Ok(self.status)
    }

    /// Returns an abandoned `processing` entry to `pending` without
    /// consuming an attempt.
    pub fn release_stale(&mut self) -> Result<(), DomainError> {
        self.expect_status(OutboxStatus::Processing, "release")?;
        self.status = OutboxStatus::Pending;
        self.release_claim();
        Ok(())
    }

    fn release_claim(&mut self) {
        self.claimed_at = None;
        self.claim_token = None;
    }

    fn expect_status(&self, expected: OutboxStatus, action: &str) -> Result<(), DomainError> {
        if self.status != expected {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot {} outbox entry {} in status {}",
                    action, self.id, self.status
                ),
            ));
        }
        Ok(())
    }
}
