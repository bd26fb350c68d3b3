//! SubscriberDirectory port - Who receives downstream notifications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::DomainError;

/// An extension subscribed to domain events over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub events: Vec<String>,
    pub active: bool,
}

impl Subscriber {
    pub fn wants(&self, event_type: &str) -> bool {
        self.active && self.events.iter().any(|e| e == event_type)
    }
}

/// Port for looking up event subscribers.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// Active subscribers for `event_type`, at most `limit` of them.
    async fn subscribers_for(
        &self,
        event_type: &str,
        limit: u32,
    ) -> Result<Vec<Subscriber>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(active: bool) -> Subscriber {
        Subscriber {
            id: Uuid::new_v4(),
            name: "search-indexer".into(),
            base_url: "http://indexer.local".into(),
            events: vec!["claim.content_updated".into()],
            active,
        }
    }

    #[test]
    fn active_subscriber_wants_listed_event() {
        assert!(subscriber(true).wants("claim.content_updated"));
        assert!(!subscriber(true).wants("claim.deleted"));
    }

    #[test]
    fn inactive_subscriber_wants_nothing() {
        assert!(!subscriber(false).wants("claim.content_updated"));
    }
}
