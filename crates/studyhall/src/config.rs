//! Configuration management for the Studyhall realtime server.
//!
//! This module handles loading, validation, and conversion of server configuration
//! from TOML files and command-line arguments.

use anyhow::Context;
use realtime_server::{AuthConfig, SecurityConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Environment variable that overrides the configured token secret.
pub const TOKEN_SECRET_ENV: &str = "STUDYHALL_TOKEN_SECRET";

fn default_max_connections() -> usize {
    1000
}

fn default_connection_timeout() -> u64 {
    60
}

fn default_max_message_size() -> usize {
    64 * 1024
}

fn default_outbound_queue_depth() -> usize {
    256
}

fn default_token_secret() -> String {
    "studyhall-dev-secret".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
///
/// This is the main configuration structure that encompasses all server
/// settings including networking, credential verification, security limits,
/// and logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    pub server: ServerSettings,
    /// Credential verification settings
    #[serde(default)]
    pub auth: AuthSettings,
    /// Security limit settings
    #[serde(default)]
    pub security: SecuritySettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
///
/// Controls network binding, connection limits, and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

/// Credential verification configuration.
///
/// The shared secret here signs and verifies the bearer tokens presented by
/// connecting clients. The `STUDYHALL_TOKEN_SECRET` environment variable
/// takes precedence over the file value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Shared secret for bearer token signing and verification
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
}

/// Security limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Maximum inbound message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Outbound queue depth per connection
    #[serde(default = "default_outbound_queue_depth")]
    pub outbound_queue_depth: usize,
}

/// Logging system configuration.
///
/// Controls log output format, levels, and destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
    /// Optional file path for log output (None means stdout only)
    #[serde(default)]
    pub file_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                bind_address: "127.0.0.1:8080".to_string(),
                max_connections: default_max_connections(),
                connection_timeout: default_connection_timeout(),
            },
            auth: AuthSettings::default(),
            security: SecuritySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
        }
    }
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            outbound_queue_depth: default_outbound_queue_depth(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the
    /// specified path and returns the default configuration. In either case
    /// the `STUDYHALL_TOKEN_SECRET` environment variable, when present,
    /// overrides the token secret.
    pub async fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)
                .context("Failed to serialize default configuration")?;
            tokio::fs::write(path, toml_content)
                .await
                .with_context(|| format!("Failed to write default config to {}", path.display()))?;
            info!("Created default configuration file: {}", path.display());
            default_config
        };

        if let Ok(secret) = std::env::var(TOKEN_SECRET_ENV) {
            if !secret.is_empty() {
                config.auth.token_secret = secret;
            }
        }

        Ok(config)
    }

    /// Converts the application configuration to a realtime server configuration.
    ///
    /// This method translates the TOML-based configuration into the types
    /// expected by the server core.
    pub fn to_server_config(&self) -> anyhow::Result<ServerConfig> {
        Ok(ServerConfig {
            bind_address: self
                .server
                .bind_address
                .parse()
                .with_context(|| format!("Invalid bind address: {}", self.server.bind_address))?,
            max_connections: self.server.max_connections,
            connection_timeout: self.server.connection_timeout,
            auth: AuthConfig {
                token_secret: self.auth.token_secret.clone(),
            },
            security: SecurityConfig {
                max_message_size: self.security.max_message_size,
                outbound_queue_depth: self.security.outbound_queue_depth,
            },
        })
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// Checks the bind address, token secret, connection limits, and log
    /// level for validity.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.auth.token_secret.is_empty() {
            return Err("Token secret cannot be empty".to_string());
        }

        if self.server.max_connections == 0 {
            return Err("max_connections must be greater than zero".to_string());
        }

        if self.security.max_message_size == 0 {
            return Err("max_message_size must be greater than zero".to_string());
        }

        if self.security.outbound_queue_depth == 0 {
            return Err("outbound_queue_depth must be greater than zero".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!("Invalid log level: {}", self.logging.level));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let server_config = config
            .to_server_config()
            .expect("Default config should convert to ServerConfig");
        assert_eq!(server_config.max_connections, 1000);
        assert_eq!(server_config.connection_timeout, 60);
        assert_eq!(server_config.security.outbound_queue_depth, 256);
    }

    #[test]
    fn test_config_validation_failures() {
        let mut config = AppConfig::default();

        config.server.bind_address = "invalid".to_string();
        assert!(config.validate().is_err());

        config.server.bind_address = "127.0.0.1:8080".to_string();
        config.auth.token_secret = String::new();
        assert!(config.validate().is_err());

        config.auth.token_secret = "secret".to_string();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_partial_toml() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("config.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
bind_address = "0.0.0.0:9100"
max_connections = 64

[logging]
level = "debug"
"#,
        )
        .await
        .expect("Failed to write config file");

        let config = AppConfig::load_from_file(&path)
            .await
            .expect("Failed to load config");
        assert_eq!(config.server.bind_address, "0.0.0.0:9100");
        assert_eq!(config.server.max_connections, 64);
        // Omitted sections fall back to defaults
        assert_eq!(config.server.connection_timeout, 60);
        assert_eq!(config.security.max_message_size, 64 * 1024);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path: PathBuf = dir.path().join("missing.toml");
        assert!(!path.exists());

        let config = AppConfig::load_from_file(&path)
            .await
            .expect("Failed to create default config");
        assert!(path.exists());
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
    }
}
