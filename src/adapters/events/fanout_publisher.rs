//! HttpFanoutPublisher - Fire-and-forget delivery of events to extensions.
//!
//! Each subscriber receives `POST {base_url}/events` with the event payload
//! flattened next to `event_type` and `event_id`. Deliveries run as detached
//! tasks; failures are logged and never reach the publisher's caller.
//!
//! Amplification is bounded two ways: at most `max_subscribers_per_event`
//! subscribers are notified per event, and at most `max_concurrent`
//! deliveries are in flight across the process.

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventPublisher, Subscriber, SubscriberDirectory};

/// Configuration for HTTP fan-out.
#[derive(Debug, Clone)]
pub struct HttpFanoutConfig {
    /// Deliveries in flight at once, across all events.
    pub max_concurrent: usize,
    /// Subscribers notified per event.
    pub max_subscribers_per_event: u32,
    /// Timeout for each delivery request.
    pub timeout: Duration,
}

impl Default for HttpFanoutConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            max_subscribers_per_event: 50,
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct HttpFanoutPublisher {
    client: reqwest::Client,
    directory: Arc<dyn SubscriberDirectory>,
    permits: Arc<Semaphore>,
    config: HttpFanoutConfig,
}

impl HttpFanoutPublisher {
    pub fn new(
        directory: Arc<dyn SubscriberDirectory>,
        config: HttpFanoutConfig,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to build notification client: {}", e),
                )
            })?;

        Ok(Self {
            client,
            directory,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            config,
        })
    }

    /// Looks up subscribers and spawns one delivery task per subscriber.
    /// Returns the task handles so callers that care can wait on them.
    pub async fn dispatch(
        &self,
        event: &EventEnvelope,
    ) -> Result<Vec<JoinHandle<()>>, DomainError> {
        let cap = self.config.max_subscribers_per_event;
        let mut subscribers = self
            .directory
            .subscribers_for(&event.event_type, cap.saturating_add(1))
            .await?;

        // An extension is never notified of events it caused itself.
        if let Some(source) = event.metadata.causation_id.as_deref() {
            subscribers.retain(|s| s.id.to_string() != source);
        }
        if subscribers.len() > cap as usize {
            tracing::warn!(
                event_type = %event.event_type,
                cap,
                "Too many subscribers for event, notifying the first ones only"
            );
            subscribers.truncate(cap as usize);
        }
        if subscribers.is_empty() {
            return Ok(Vec::new());
        }

        tracing::info!(
            event_type = %event.event_type,
            subscribers = subscribers.len(),
            "Dispatching event to subscribers"
        );

        let body = Arc::new(notification_body(event));
        let handles = subscribers
            .into_iter()
            .map(|subscriber| {
                let client = self.client.clone();
                let permits = self.permits.clone();
                let body = body.clone();
                let event_type = event.event_type.clone();
                tokio::spawn(async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    deliver(&client, &subscriber, &event_type, &body).await;
                })
            })
            .collect();
        Ok(handles)
    }
}

async fn deliver(
    client: &reqwest::Client,
    subscriber: &Subscriber,
    event_type: &str,
    body: &JsonValue,
) {
    let url = format!("{}/events", subscriber.base_url.trim_end_matches('/'));
    match client.post(&url).json(body).send().await {
        Ok(response) if response.status().as_u16() >= 400 => {
            tracing::warn!(
                subscriber = %subscriber.name,
                status = response.status().as_u16(),
                event_type,
                "Subscriber rejected event notification"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(
                subscriber = %subscriber.name,
                error = %e,
                event_type,
                "Failed to notify subscriber"
            );
        }
    }
}

/// The JSON document sent to subscribers: payload fields plus
/// `event_type` and `event_id`.
pub fn notification_body(event: &EventEnvelope) -> JsonValue {
    let mut body = match &event.payload {
        JsonValue::Object(fields) => fields.clone(),
        JsonValue::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("payload".to_string(), other.clone());
            map
        }
    };
    body.insert(
        "event_type".to_string(),
        JsonValue::String(event.event_type.clone()),
    );
    body.insert(
        "event_id".to_string(),
        JsonValue::String(event.event_id.to_string()),
    );
    JsonValue::Object(body)
}

#[async_trait]
impl EventPublisher for HttpFanoutPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.dispatch(&event).await?;
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.dispatch(&event).await?;
        }
        Ok(())
    }
}
