//! # Quill configuration
//!
//! Typed settings for the REPL server, loaded from TOML. Every field has a
//! default, so an empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! max_body_bytes = 1048576
//!
//! [repl]
//! default_namespace = "user"
//! eval_timeout_secs = 10
//! max_depth = 2000
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read config file {}: {error}", .path.display())]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {}: {error}", .path.display())]
    Parse { path: PathBuf, error: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuillConfig {
    pub server: ServerConfig,
    pub repl: ReplConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port`, ready for parsing as a socket address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Namespace each evaluation starts in.
    pub default_namespace: String,
    /// How long a request waits for its evaluation. `None` waits forever.
    pub eval_timeout_secs: Option<u64>,
    /// Bound on nested evaluation before it fails.
    pub max_depth: usize,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            default_namespace: "user".to_string(),
            eval_timeout_secs: None,
            max_depth: 2000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `quill_web=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl QuillConfig {
    /// `$XDG_CONFIG_HOME/quill/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("quill").join("config.toml"))
    }

    /// Load from `path` when given (it must exist), else from
    /// [`default_path`](Self::default_path) when that file exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_bind_locally_without_timeout() {
        let config = QuillConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.server.max_body_bytes, 1_048_576);
        assert_eq!(config.repl.default_namespace, "user");
        assert_eq!(config.repl.eval_timeout_secs, None);
        assert_eq!(config.repl.max_depth, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = QuillConfig::from_toml_str(
            r#"
            [server]
            port = 9000

            [repl]
            eval_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.repl.eval_timeout_secs, Some(5));
        assert_eq!(config.repl.max_depth, 2000);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(QuillConfig::from_toml_str("").unwrap(), QuillConfig::default());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = QuillConfig::from_toml_str("[server]\nport = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn loads_explicit_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = QuillConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = QuillConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(path) if path == missing));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not toml at all [").unwrap();
        let err = QuillConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }
}
