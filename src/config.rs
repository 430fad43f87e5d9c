//! Client and flow configuration
//!
//! Both structs are plain serde types with defaults. They are read from an
//! optional JSON file and then overridden from the command line; every flow
//! receives them explicitly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid node URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How to reach the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the node REST API
    pub node_url: String,
    /// Sent as `X-Node-API-Token` when set
    pub api_token: Option<String>,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            node_url: "http://localhost:4001".to_string(),
            api_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Parse the node URL
    pub fn node_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.node_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node_url()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings shared by the multisig and escrow flows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Directory holding the transaction files
    pub data_dir: PathBuf,
    /// Absolute fee overriding the node's per-byte suggestion
    pub flat_fee: Option<u64>,
    /// Rounds to wait for confirmation
    pub wait_rounds: u64,
    /// Wall-clock limit on waiting, in seconds
    pub wait_deadline_secs: Option<u64>,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".txkit_data"),
            flat_fee: None,
            wait_rounds: 10,
            wait_deadline_secs: None,
        }
    }
}

impl FlowConfig {
    pub fn wait_deadline(&self) -> Option<Duration> {
        self.wait_deadline_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wait_rounds == 0 {
            return Err(ConfigError::Invalid(
                "wait_rounds must be greater than 0".to_string(),
            ));
        }
        if self.wait_deadline_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "wait_deadline_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub flow: FlowConfig,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()?;
        self.flow.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.flow.wait_deadline(), None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("txkit.json");
        fs::write(
            &path,
            r#"{ "client": { "node_url": "https://node.example:8080" }, "flow": { "wait_rounds": 4 } }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.client.node_url, "https://node.example:8080");
        assert_eq!(config.client.request_timeout_secs, 30);
        assert_eq!(config.flow.wait_rounds, 4);
        assert_eq!(config.flow.data_dir, PathBuf::from(".txkit_data"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("txkit.json");

        let mut config = Config::default();
        config.client.api_token = Some("secret".to_string());
        config.flow.flat_fee = Some(1000);
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
        assert!(Config::load_or_default(None).unwrap() == Config::default());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.flow.wait_rounds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.client.node_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

        let mut config = Config::default();
        config.client.node_url = "ftp://node".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
