//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, database path,
//! URL layout and JWT settings. A few values can be overridden from the
//! environment so secrets need not live in the file.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Environment variable overriding `database_path`
pub const ENV_DATABASE_PATH: &str = "CIRCUMSTANCES_DATABASE_PATH";
/// Environment variable overriding `auth.jwt_secret`
pub const ENV_JWT_SECRET: &str = "CIRCUMSTANCES_JWT_SECRET";
/// Environment variable overriding `bind_port`
pub const ENV_BIND_PORT: &str = "CIRCUMSTANCES_BIND_PORT";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration field {field}: {reason}")]
    InvalidField {
        /// Field name
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// SQLite database file (":memory:" for a throwaway database)
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Prefix every route is mounted under
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// API version segment used in resource paths (e.g., "v1")
    #[serde(default)]
    pub api_version: Option<String>,

    /// Authorization settings
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Authorization settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Enforce role checks (disable only for local development)
    #[serde(default = "default_auth_enabled")]
    pub enabled: bool,

    /// Shared HS256 secret for verifying bearer tokens
    #[serde(default)]
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_auth_enabled(),
            jwt_secret: String::new(),
        }
    }
}

fn default_database_path() -> String {
    "circumstances.db".to_string()
}

fn default_base_path() -> String {
    "/nsjsa".to_string()
}

fn default_auth_enabled() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ServerConfig = toml::from_str(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = path;
        }
        if let Some(secret) = lookup(ENV_JWT_SECRET) {
            self.auth.jwt_secret = secret;
        }
        if let Some(port) = lookup(ENV_BIND_PORT) {
            self.bind_port = port.parse().map_err(|_| ConfigError::InvalidField {
                field: "bind_port".to_string(),
                reason: format!("not a port number: {}", port),
            })?;
        }
        Ok(())
    }

    /// Check cross-field requirements and normalize optional values
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.auth.enabled && self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField("auth.jwt_secret".to_string()));
        }

        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::InvalidField {
                field: "base_path".to_string(),
                reason: "must start with '/'".to_string(),
            });
        }
        while self.base_path.ends_with('/') {
            self.base_path.pop();
        }

        if self.api_version.as_deref().is_some_and(|v| v.trim().is_empty()) {
            self.api_version = None;
        }

        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            database_path: ":memory:".to_string(),
            base_path: default_base_path(),
            api_version: None,
            auth: AuthConfig {
                enabled: true,
                jwt_secret: "test-secret-key-do-not-use-in-production".to_string(),
            },
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
