//! Top-level configuration

use serde::{Deserialize, Serialize};

use crate::components::{LoggingConfig, SharingConfig, SyncConfig, MIN_TOKEN_LENGTH};
use crate::error::{ConfigError, ConfigResult};

/// Root configuration for the funnel core
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelConfig {
    /// Dual-store synchronization
    pub sync: SyncConfig,

    /// Share token issuance
    pub sharing: SharingConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl FunnelConfig {
    /// Reject values the core cannot operate with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sync.remote_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "sync.remote_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.sync.cache_key.trim().is_empty() {
            return Err(ConfigError::invalid("sync.cache_key", "must not be empty"));
        }
        if self.sharing.token_length < MIN_TOKEN_LENGTH {
            return Err(ConfigError::invalid(
                "sharing.token_length",
                format!("must be at least {}", MIN_TOKEN_LENGTH),
            ));
        }
        if self.sharing.issue_attempts == 0 {
            return Err(ConfigError::invalid(
                "sharing.issue_attempts",
                "must be at least 1",
            ));
        }
        if self.sharing.max_days_valid == 0 {
            return Err(ConfigError::invalid(
                "sharing.max_days_valid",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
