//! Server configuration loaded from a YAML file.
//!
//! The configuration is read once at startup and is immutable afterwards.

#[cfg(test)]
mod tests;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default port for the system database of a multi-tenant HANA instance.
pub const DEFAULT_HANA_PORT: u16 = 30013;

/// Default port for the HTTP/SSE transport.
pub const DEFAULT_HTTP_PORT: u16 = 8088;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub connector: ConnectorConfig,
    /// Optional allowlist of exposed tables. Empty means unrestricted.
    #[serde(default)]
    pub tables: Vec<String>,
    /// Optional log file path. When unset, logs go to stderr.
    #[serde(default)]
    pub log_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub name: String,
    /// Prefix applied to every exposed tool name, e.g. `sap_hana`.
    pub prefix: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

/// Connector settings, discriminated by the `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectorConfig {
    Hana(HanaConfig),
    Odbc(OdbcConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HanaConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_hana_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Tenant database name for multi-tenant HANA.
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub encrypt: bool,
    #[serde(rename = "sslValidateCertificate", default = "default_true")]
    pub ssl_validate_certificate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OdbcConfig {
    #[serde(default)]
    pub connection_string: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    #[error("Server name is required")]
    MissingServerName,
    #[error("Server prefix is required")]
    MissingServerPrefix,
    #[error("HANA host is required")]
    MissingHanaHost,
    #[error("HANA user is required")]
    MissingHanaUser,
    #[error("HANA password is required")]
    MissingHanaPassword,
    #[error("ODBC connection_string is required")]
    MissingConnectionString,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

impl Config {
    /// Load and validate a configuration file.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(crate::ServerError::Config(
                ConfigError::FileNotFound(path.display().to_string()).to_string(),
            ));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))
            .map_err(|e| crate::ServerError::Config(format!("{e:#}")))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| crate::ServerError::Config(format!("{e}")))?;

        config
            .validate()
            .map_err(|e| crate::ServerError::Config(e.to_string()))?;

        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.name.is_empty() {
            return Err(ConfigError::MissingServerName);
        }
        if self.server.prefix.is_empty() {
            return Err(ConfigError::MissingServerPrefix);
        }

        match &self.connector {
            ConnectorConfig::Hana(hana) => {
                if hana.host.is_empty() {
                    return Err(ConfigError::MissingHanaHost);
                }
                if hana.user.is_empty() {
                    return Err(ConfigError::MissingHanaUser);
                }
                if hana.password.is_empty() {
                    return Err(ConfigError::MissingHanaPassword);
                }
            }
            ConnectorConfig::Odbc(odbc) => {
                if odbc.connection_string.is_empty() {
                    return Err(ConfigError::MissingConnectionString);
                }
            }
        }

        Ok(())
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

fn default_hana_port() -> u16 {
    DEFAULT_HANA_PORT
}

fn default_true() -> bool {
    true
}
