//! Inbound webhook configuration

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

/// Shared secret for push webhook signatures.
///
/// Without a secret every delivery is rejected.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WebhookConfig {
    pub secret: Option<SecretString>,
}

impl WebhookConfig {
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if production && self.secret.is_none() {
            return Err(ValidationError::WebhookSecretRequired);
        }
        Ok(())
    }
}
