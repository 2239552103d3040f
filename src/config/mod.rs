//! TOML-based configuration.
//!
//! Supports a config file (pulse.toml) with environment variable
//! expansion in the connection string.
//!
//! Example configuration:
//! ```toml
//! [backend]
//! dialect = "snowflake"
//! connection_string = "${WAREHOUSE_CONNECTION_STRING}"
//! default_schema = "analytics"
//!
//! [catalog]
//! paths = ["config/finance.toml", "config/product.toml"]
//!
//! [cache]
//! enabled = true
//! ttl_seconds = 600
//! ```

use std::collections::VecDeque;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sql::dialect::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Backend connection configuration.
    pub backend: BackendSettings,

    /// Metric catalog configuration.
    pub catalog: CatalogSettings,

    /// Result cache configuration.
    pub cache: CacheSettings,
}

/// Backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSettings {
    /// SQL dialect the generator emits (duckdb, snowflake).
    pub dialect: Dialect,

    /// Connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Default schema for unqualified metric definitions.
    pub default_schema: Option<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::DuckDb,
            connection_string: "./data/local.duckdb".to_string(),
            default_schema: None,
        }
    }
}

impl BackendSettings {
    /// The connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.connection_string)
    }
}

/// Metric catalog configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Catalog files, loaded in order; the first definition of a metric
    /// name wins.
    pub paths: Vec<PathBuf>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("metrics.toml")],
        }
    }
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,

    /// Cache TTL in seconds.
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 600,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `PULSE_CONFIG`
    /// 2. `./pulse.toml`
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("PULSE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("pulse.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }
}

/// Expand `${VAR}` references in a string.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars: VecDeque<char> = s.chars().collect();

    while let Some(c) = chars.pop_front() {
        if c == '$' && chars.front() == Some(&'{') {
            chars.pop_front();
            let mut var_name = String::new();
            loop {
                match chars.pop_front() {
                    Some('}') => break,
                    Some(ch) => var_name.push(ch),
                    None => break,
                }
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
