//! YAML server configuration.
//!
//! ```yaml
//! server:
//!   port: 8080
//! storage:
//!   dataDir: /var/lib/depot
//! auth:
//!   tokens:
//!     - example-token
//! ```
//!
//! Every section is optional except the token list: an empty allow-list
//! would lock every client out, so loading fails instead.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("no auth tokens configured")]
    NoTokens,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(rename = "dataDir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub tokens: Vec<String>,
}

impl Config {
    /// Read and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&text)?;
        if config.auth.tokens.is_empty() {
            return Err(ConfigError::NoTokens);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_config_parses() {
        let file = write_config(
            "server:\n  port: 9090\nstorage:\n  dataDir: /srv/depot\nauth:\n  tokens:\n    - t1\n    - t2\n",
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/depot"));
        assert_eq!(config.auth.tokens, ["t1", "t2"]);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let file = write_config("auth:\n  tokens: [only]\n");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn empty_token_list_is_rejected() {
        let file = write_config("auth:\n  tokens: []\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoTokens));
    }

    #[test]
    fn absent_auth_section_is_rejected() {
        let file = write_config("server:\n  port: 1234\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NoTokens));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Config::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = write_config("auth: [not-a-map\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
