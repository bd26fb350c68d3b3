//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool max_connections must be positive and at least min_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid git host URL: {0}")]
    InvalidGitHostUrl(&'static str),

    #[error("Invalid default branch name")]
    InvalidDefaultBranch,

    #[error("Git host must use HTTPS in production")]
    GitHostMustBeHttps,

    #[error("Webhook secret is required in production")]
    WebhookSecretRequired,

    #[error("Worker {0} must be greater than zero")]
    InvalidWorkerSetting(&'static str),

    #[error("Worker stale_claim_timeout_secs must be 0 or at least {min_secs}")]
    StaleClaimTimeoutTooShort { min_secs: u64 },

    #[error("Notification {0} must be greater than zero")]
    InvalidNotificationSetting(&'static str),
}
