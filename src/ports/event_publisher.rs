//! EventPublisher port - Interface for publishing domain events.
//!
//! Downstream consumers learn about claim changes through this port. The
//! transport (in-process bus, HTTP fan-out) is an adapter concern.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Delivery is best-effort: publishing never rolls back the state change
/// that produced the event.
///
/// # Example
///
/// ```ignore
/// let event = ClaimContentUpdated::new(claim_id, head, "refs/heads/main");
/// publisher.publish(event.to_envelope()).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish several events in order.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_publisher_is_object_safe() {
        fn _accepts_dyn(_publisher: &dyn EventPublisher) {}
    }
}
