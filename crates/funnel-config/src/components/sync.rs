//! Sync component configuration
//!
//! Settings for the remote store timeout and the on-device template cache.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Dual-store synchronization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Upper bound for every remote call; a timeout counts as a remote failure
    pub remote_timeout_ms: u64,

    /// Directory holding the local cache blob
    pub cache_dir: PathBuf,

    /// Key of the local cache blob (file stem for file-backed caches)
    pub cache_key: String,
}

impl SyncConfig {
    /// Remote timeout as a [`Duration`]
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    /// Full path of the cache blob inside `cache_dir`
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.json", self.cache_key))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_timeout_ms: 10_000,
            cache_dir: PathBuf::from("./.funnel"),
            cache_key: "funnel_templates".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.remote_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache_key, "funnel_templates");
        assert_eq!(
            config.cache_path(),
            PathBuf::from("./.funnel/funnel_templates.json")
        );
    }

    #[test]
    fn test_sync_config_partial_toml() {
        let config: SyncConfig = toml::from_str("remote_timeout_ms = 250").unwrap();
        assert_eq!(config.remote_timeout_ms, 250);
        assert_eq!(config.cache_key, "funnel_templates");
    }
}
