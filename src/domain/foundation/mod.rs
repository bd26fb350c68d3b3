//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, events and error types
//! that form the vocabulary of the reconciliation domain.

mod errors;
mod events;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent};
pub use ids::{ClaimId, OutboxEntryId};
pub use timestamp::Timestamp;
