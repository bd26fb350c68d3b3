//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `CLAIM_MIRROR` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use claim_mirror::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod features;
mod git_host;
mod notifications;
mod server;
mod webhook;
mod worker;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use features::FeatureFlags;
pub use git_host::GitHostConfig;
pub use notifications::NotificationConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;
pub use worker::WorkerConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Git host connection (Forgejo)
    pub git_host: GitHostConfig,

    /// Push webhook secret
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Reconciliation worker
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Downstream event notifications
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Feature flags
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `CLAIM_MIRROR__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CLAIM_MIRROR__DATABASE__URL=...` -> `database.url = ...`
    /// - `CLAIM_MIRROR__GIT_HOST__API_TOKEN=...` -> `git_host.api_token = ...`
    ///
    /// A `.env` file is read first when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CLAIM_MIRROR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        let production = self.is_production();
        self.server.validate()?;
        self.database.validate()?;
        self.git_host.validate(production)?;
        self.webhook.validate(production)?;
        self.worker.validate(self.git_host.request_timeout())?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 9] = [
        "CLAIM_MIRROR__DATABASE__URL",
        "CLAIM_MIRROR__GIT_HOST__BASE_URL",
        "CLAIM_MIRROR__GIT_HOST__API_TOKEN",
        "CLAIM_MIRROR__WEBHOOK__SECRET",
        "CLAIM_MIRROR__SERVER__PORT",
        "CLAIM_MIRROR__SERVER__ENVIRONMENT",
        "CLAIM_MIRROR__WORKER__BATCH_SIZE",
        "CLAIM_MIRROR__WORKER__STALE_CLAIM_TIMEOUT_SECS",
        "CLAIM_MIRROR__FEATURES__DEBUG_ROUTES",
    ];

    fn set_minimal_env() {
        env::set_var("CLAIM_MIRROR__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("CLAIM_MIRROR__GIT_HOST__BASE_URL", "http://forgejo:3000");
        env::set_var("CLAIM_MIRROR__GIT_HOST__API_TOKEN", "token");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.git_host.base_url, "http://forgejo:3000");
        assert_eq!(
            config.git_host.api_token.as_ref().unwrap().expose_secret(),
            "token"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sections_fall_back_to_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.worker.batch_size, 10);
        assert!(config.webhook.secret.is_none());
        assert!(!config.features.debug_routes);
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("CLAIM_MIRROR__SERVER__PORT", "3000"),
            ("CLAIM_MIRROR__WORKER__BATCH_SIZE", "25"),
            ("CLAIM_MIRROR__FEATURES__DEBUG_ROUTES", "true"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.worker.batch_size, 25);
        assert!(config.features.debug_routes);
    }

    #[test]
    fn test_lease_checked_against_git_host_timeout() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("CLAIM_MIRROR__WORKER__STALE_CLAIM_TIMEOUT_SECS", "120")])
            .unwrap();

        assert_eq!(
            config.validate(),
            Err(ValidationError::StaleClaimTimeoutTooShort { min_secs: 240 })
        );
    }

    #[test]
    fn test_production_requires_webhook_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("CLAIM_MIRROR__SERVER__ENVIRONMENT", "production"),
            ("CLAIM_MIRROR__GIT_HOST__BASE_URL", "https://git.example.com"),
        ])
        .unwrap();

        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::WebhookSecretRequired)
        );
    }

    #[test]
    fn test_missing_database_section_fails() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("CLAIM_MIRROR__GIT_HOST__BASE_URL", "http://forgejo:3000");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }
}
