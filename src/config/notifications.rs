//! Downstream notification fan-out configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Deliveries in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Subscribers notified per event; the rest are skipped with a warning
    #[serde(default = "default_max_subscribers")]
    pub max_subscribers_per_event: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent == 0 {
            return Err(ValidationError::InvalidNotificationSetting("max_concurrent"));
        }
        if self.max_subscribers_per_event == 0 {
            return Err(ValidationError::InvalidNotificationSetting(
                "max_subscribers_per_event",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidNotificationSetting("timeout_secs"));
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_subscribers_per_event: default_max_subscribers(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_max_concurrent() -> usize {
    10
}

fn default_max_subscribers() -> u32 {
    50
}

fn default_timeout() -> u64 {
    10
}
