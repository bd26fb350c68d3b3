//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeatureFlags {
    /// Mount the `/debug` inspection and reset routes
    #[serde(default)]
    pub debug_routes: bool,
}
