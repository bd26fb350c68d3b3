//! Git host configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::outbox::GitRef;

/// Connection and identity settings for the Forgejo instance.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHostConfig {
    /// Instance root URL, e.g. `http://forgejo:3000`
    pub base_url: String,

    /// Organization that owns every claim repository
    #[serde(default = "default_organization")]
    pub organization: String,

    /// API token of the service account
    pub api_token: Option<SecretString>,

    /// URL the git host delivers push webhooks to
    #[serde(default)]
    pub webhook_callback_url: String,

    /// Branch that carries claim content
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Domain used to build commit author emails
    #[serde(default = "default_author_email_domain")]
    pub author_email_domain: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl GitHostConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parsed default branch
    pub fn default_branch(&self) -> Result<GitRef, ValidationError> {
        GitRef::parse("default_branch", &self.default_branch)
            .map_err(|_| ValidationError::InvalidDefaultBranch)
    }

    /// Validate git host configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("GIT_HOST__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidGitHostUrl("base_url"));
        }
        if production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::GitHostMustBeHttps);
        }
        if self.api_token.is_none() {
            return Err(ValidationError::MissingRequired("GIT_HOST__API_TOKEN"));
        }
        if self.organization.is_empty() {
            return Err(ValidationError::MissingRequired("GIT_HOST__ORGANIZATION"));
        }
        if !self.webhook_callback_url.is_empty()
            && !self.webhook_callback_url.starts_with("http://")
            && !self.webhook_callback_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidGitHostUrl("webhook_callback_url"));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        self.default_branch()?;
        Ok(())
    }
}

impl Default for GitHostConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            organization: default_organization(),
            api_token: None,
            webhook_callback_url: String::new(),
            default_branch: default_branch(),
            author_email_domain: default_author_email_domain(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_organization() -> String {
    "claims".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_author_email_domain() -> String {
    "claims.local".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}
