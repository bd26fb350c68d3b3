//! Views returned by the inspection routes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::application::ResetUnfinishedResult;
use crate::domain::claim::ClaimMirror;
use crate::domain::outbox::OutboxEntry;

/// Default number of rows when `limit` is omitted.
pub const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutboxQueryParams {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimsQueryParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntryView {
    pub id: String,
    pub operation: String,
    pub payload: JsonValue,
    pub status: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl From<OutboxEntry> for OutboxEntryView {
    fn from(entry: OutboxEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            operation: entry.operation,
            payload: entry.payload,
            status: entry.status.as_str().to_string(),
            attempts: entry.attempts,
            max_attempts: entry.max_attempts,
            last_error: entry.last_error,
            created_at: entry.created_at,
            processed_at: entry.processed_at,
            claimed_at: entry.claimed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimView {
    pub id: String,
    pub repo_state: String,
    pub external_repo_id: Option<String>,
    pub current_head_revision: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClaimMirror> for ClaimView {
    fn from(claim: ClaimMirror) -> Self {
        Self {
            id: claim.id.to_string(),
            repo_state: claim.repo_state.as_str().to_string(),
            external_repo_id: claim.external_repo_id,
            current_head_revision: claim.current_head_revision,
            updated_at: *claim.updated_at.as_datetime(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub entries_deleted: u64,
    pub claims_marked_error: u64,
}

impl From<ResetUnfinishedResult> for ResetResponse {
    fn from(result: ResetUnfinishedResult) -> Self {
        Self {
            entries_deleted: result.entries_deleted,
            claims_marked_error: result.claims_marked_error,
        }
    }
}
