//! Configuration for [`ProvApi`](crate::api::ProvApi)
//!
//! Loaded from YAML:
//!
//! ```yaml
//! api_id: 5b0c5a4e-3a43-4a8f-9d5e-2b1f7d2c9e10
//! db_path: /var/lib/provgraph/prov.db
//! log:
//!   level: debug
//!   ansi: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::Dispatch;
use uuid::Uuid;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
}

/// API instance configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Identifier attached to every log line of the instance; random if unset
    pub api_id: Option<Uuid>,
    /// Logging applied to the instance's operations only
    pub log: Option<LogConfig>,
    /// SQLite database used by the CLI
    pub db_path: Option<PathBuf>,
}

impl ApiConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = Some(log);
        self
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`
    pub level: String,
    /// Colored output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::InvalidLevel(self.level.clone()))
    }

    /// Build a subscriber writing to stderr at the configured level
    pub fn dispatch(&self) -> Result<Dispatch, ConfigError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level_filter()?)
            .with_ansi(self.ansi)
            .with_writer(std::io::stderr)
            .finish();
        Ok(Dispatch::new(subscriber))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml() {
        let config = ApiConfig::from_yaml_str(
            "api_id: 5b0c5a4e-3a43-4a8f-9d5e-2b1f7d2c9e10\nlog:\n  level: debug\n",
        )
        .unwrap();
        assert_eq!(
            config.api_id.unwrap().to_string(),
            "5b0c5a4e-3a43-4a8f-9d5e-2b1f7d2c9e10"
        );
        let log = config.log.unwrap();
        assert_eq!(log.level_filter().unwrap(), LevelFilter::DEBUG);
        assert!(!log.ansi);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ApiConfig::from_yaml_str("{}").unwrap(), ApiConfig::default());
    }

    #[test]
    fn test_invalid_level() {
        let log = LogConfig::new("loud");
        assert!(matches!(log.level_filter(), Err(ConfigError::InvalidLevel(_))));
        assert!(log.dispatch().is_err());
        assert!(LogConfig::new("WARN").dispatch().is_ok());
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provgraph.yaml");
        std::fs::write(&path, "db_path: /tmp/prov.db\n").unwrap();

        let config = ApiConfig::from_path(&path).unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/prov.db")));
        assert!(matches!(
            ApiConfig::from_path(dir.path().join("missing.yaml")),
            Err(ConfigError::Io(_))
        ));
    }
}
