//! Events emitted by the claim aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClaimId, DomainEvent, EventId, Timestamp};

/// Published when a push to the default branch moves a claim's head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimContentUpdated {
    pub event_id: EventId,
    pub claim_id: ClaimId,
    pub head_revision: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub occurred_at: Timestamp,
}

impl ClaimContentUpdated {
    pub fn new(
        claim_id: ClaimId,
        head_revision: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            claim_id,
            head_revision: head_revision.into(),
            git_ref: git_ref.into(),
            occurred_at: Timestamp::now(),
        }
    }
}

impl DomainEvent for ClaimContentUpdated {
    fn event_type(&self) -> &'static str {
        "claim.content_updated"
    }

    fn aggregate_id(&self) -> String {
        self.claim_id.to_string()
    }

    fn aggregate_type(&self) -> &'static str {
        "Claim"
    }

    fn occurred_at(&self) -> Timestamp {
        self.occurred_at
    }

    fn event_id(&self) -> EventId {
        self.event_id.clone()
    }
}
