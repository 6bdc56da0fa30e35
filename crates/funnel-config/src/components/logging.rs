//! Logging configuration

use serde::{Deserialize, Serialize};

/// Output style of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented
    Pretty,
    /// One line per event
    #[default]
    Compact,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, e.g. `info` or `funnel_core=debug`
    pub level: String,

    /// Output style
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_format_parse() {
        let config: LoggingConfig = toml::from_str(
            r#"
level = "funnel_core=debug"
format = "pretty"
"#,
        )
        .unwrap();
        assert_eq!(config.level, "funnel_core=debug");
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
