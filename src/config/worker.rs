//! Reconciliation worker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Git host requests made by the costliest operation. Provisioning checks
/// then writes the repo, the first commit, protection and the hook.
pub const MAX_GIT_HOST_REQUESTS_PER_OPERATION: u64 = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Run the worker in this process
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Time since the last renewal after which a `processing` claim is
    /// released; `0` disables
    #[serde(default = "default_stale_claim_timeout")]
    pub stale_claim_timeout_secs: u64,
}

impl WorkerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stale_claim_timeout(&self) -> Option<Duration> {
        match self.stale_claim_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// `git_host_request_timeout` bounds a single git host request. A lease
    /// shorter than one operation's worth of requests would let another
    /// worker reclaim an entry that is still being dispatched.
    pub fn validate(&self, git_host_request_timeout: Duration) -> Result<(), ValidationError> {
        if self.poll_interval_ms == 0 {
            return Err(ValidationError::InvalidWorkerSetting("poll_interval_ms"));
        }
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidWorkerSetting("batch_size"));
        }
        if let Some(lease) = self.stale_claim_timeout() {
            let min_secs = git_host_request_timeout
                .as_secs()
                .saturating_mul(MAX_GIT_HOST_REQUESTS_PER_OPERATION);
            if lease.as_secs() < min_secs {
                return Err(ValidationError::StaleClaimTimeoutTooShort { min_secs });
            }
        }
        Ok(())
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_ms: default_poll_interval(),
            batch_size: default_batch_size(),
            stale_claim_timeout_secs: default_stale_claim_timeout(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    5_000
}

fn default_batch_size() -> u32 {
    10
}

fn default_stale_claim_timeout() -> u64 {
    600
}
