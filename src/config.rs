//! Configuration module for Depot.

use serde::Deserialize;
use std::path::Path;

use crate::{DepotError, Result};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty means permissive (development mode).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Primary directory for uploaded blobs.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Secondary directory for the backup manifest and blob copies.
    ///
    /// Must be distinct from `upload_dir`; the backup manager owns it
    /// exclusively.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_backup_dir() -> String {
    "file_backups".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            backup_dir: default_backup_dir(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional path to a log file. Console-only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DepotError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DepotError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `DEPOT_PORT`: Override the listen port
    /// - `DEPOT_UPLOAD_DIR`: Override the primary blob directory
    /// - `DEPOT_BACKUP_DIR`: Override the backup directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("DEPOT_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(dir) = std::env::var("DEPOT_UPLOAD_DIR") {
            if !dir.is_empty() {
                self.storage.upload_dir = dir;
            }
        }

        if let Ok(dir) = std::env::var("DEPOT_BACKUP_DIR") {
            if !dir.is_empty() {
                self.storage.backup_dir = dir;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The upload and backup directories are the same path
    /// - The upload size limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.storage.upload_dir == self.storage.backup_dir {
            return Err(DepotError::Config(
                "upload_dir and backup_dir must be distinct directories".to_string(),
            ));
        }
        if self.storage.max_upload_size_mb == 0 {
            return Err(DepotError::Config(
                "max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.storage.upload_dir, "uploads");
        assert_eq!(config.storage.backup_dir, "file_backups");
        assert_eq!(config.storage.max_upload_size_mb, 100);
        assert_eq!(config.storage.max_upload_size_bytes(), 100 * 1024 * 1024);

        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 3000
cors_origins = ["http://localhost:5173"]

[storage]
upload_dir = "data/uploads"
backup_dir = "data/backups"
max_upload_size_mb = 50

[logging]
level = "debug"
file = "logs/depot.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.cors_origins.len(), 1);
        assert_eq!(config.server.cors_origins[0], "http://localhost:5173");

        assert_eq!(config.storage.upload_dir, "data/uploads");
        assert_eq!(config.storage.backup_dir, "data/backups");
        assert_eq!(config.storage.max_upload_size_mb, 50);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/depot.log"));
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9000
"#;

        let config = Config::parse(toml).unwrap();

        // Specified values
        assert_eq!(config.server.port, 9000);

        // Default values
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.upload_dir, "uploads");
        assert_eq!(config.storage.max_upload_size_mb, 100);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backup_dir, "file_backups");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(DepotError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");

        assert!(result.is_err());
        assert!(matches!(result, Err(DepotError::Io(_))));
    }

    #[test]
    fn test_apply_env_overrides_port() {
        let original = std::env::var("DEPOT_PORT").ok();

        std::env::set_var("DEPOT_PORT", "4242");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.server.port, 4242);

        if let Some(val) = original {
            std::env::set_var("DEPOT_PORT", val);
        } else {
            std::env::remove_var("DEPOT_PORT");
        }
    }

    #[test]
    fn test_apply_env_overrides_invalid_port() {
        let original = std::env::var("DEPOT_PORT").ok();

        std::env::set_var("DEPOT_PORT", "not-a-port");

        let mut config = Config::default();
        config.apply_env_overrides();

        // Invalid values are ignored
        assert_eq!(config.server.port, 8080);

        if let Some(val) = original {
            std::env::set_var("DEPOT_PORT", val);
        } else {
            std::env::remove_var("DEPOT_PORT");
        }
    }

    #[test]
    fn test_validate_same_directories() {
        let mut config = Config::default();
        config.storage.upload_dir = "data".to_string();
        config.storage.backup_dir = "data".to_string();

        let result = config.validate();
        assert!(result.is_err());
        if let Err(DepotError::Config(msg)) = result {
            assert!(msg.contains("distinct"));
        }
    }

    #[test]
    fn test_validate_zero_upload_size() {
        let mut config = Config::default();
        config.storage.max_upload_size_mb = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }
}
