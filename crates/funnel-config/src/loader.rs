//! Config file loading

use std::path::Path;

use tracing::{debug, info};

use crate::config::FunnelConfig;
use crate::error::{ConfigError, ConfigResult};

/// On-disk config formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Loads [`FunnelConfig`] from disk
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read, parse and validate a config file
    pub async fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<FunnelConfig> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::parse(&content, format)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults
    pub async fn load_or_default(path: Option<&Path>) -> ConfigResult<FunnelConfig> {
        match path {
            Some(path) => Self::load_from_file(path).await,
            None => {
                debug!("No config file given, using defaults");
                Ok(FunnelConfig::default())
            }
        }
    }

    /// Parse config content in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> ConfigResult<FunnelConfig> {
        match format {
            #[cfg(feature = "toml")]
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::parse(e.to_string()))
            }
            #[cfg(not(feature = "toml"))]
            ConfigFormat::Toml => Err(ConfigError::UnsupportedFormat("toml".to_string())),
            #[cfg(feature = "yaml")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| ConfigError::parse(e.to_string()))
            }
            #[cfg(not(feature = "yaml"))]
            ConfigFormat::Yaml => Err(ConfigError::UnsupportedFormat("yaml".to_string())),
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::parse(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::LogFormat;
    use std::io::Write;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("b.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert!(ConfigFormat::from_path(Path::new("b.ini")).is_err());
    }

    #[tokio::test]
    async fn test_load_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[sync]
remote_timeout_ms = 500
cache_key = "device_cache"

[sharing]
token_length = 16

[logging]
format = "pretty"
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.sync.remote_timeout_ms, 500);
        assert_eq!(config.sync.cache_key, "device_cache");
        assert_eq!(config.sharing.token_length, 16);
        assert_eq!(config.sharing.issue_attempts, 3);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[tokio::test]
    async fn test_load_json_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"sharing": {{"issue_attempts": 0}}}}"#).unwrap();

        let err = ConfigLoader::load_from_file(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = ConfigLoader::load_from_file("/definitely/not/here.toml")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[tokio::test]
    async fn test_load_or_default_without_path() {
        let config = ConfigLoader::load_or_default(None).await.unwrap();
        assert_eq!(config, FunnelConfig::default());
    }
}
