//! Configuration management for opendata-glance.
//!
//! Handles loading configuration from TOML files and environment variables:
//! where the query engine lives, which project to bill queries to, and where
//! the bearer token is kept.

use crate::error::{OpenDataError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default REST endpoint of the query engine.
pub const DEFAULT_ENGINE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Query engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Credential settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Query engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Base URL of the engine's REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Project to run queries in. When unset, the first project accessible
    /// to the token is used.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Request timeout in seconds. No timeout is applied when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_ENGINE_URL.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: None,
            timeout_secs: None,
        }
    }
}

impl EngineConfig {
    /// Parses and validates the base URL.
    ///
    /// Trailing slashes are stripped so paths can be appended directly.
    pub fn endpoint(&self) -> Result<String> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| OpenDataError::config(format!("Invalid engine URL: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(OpenDataError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        Ok(self.base_url.trim_end_matches('/').to_string())
    }

    /// Returns the configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthConfig {
    /// JSON file holding `access_token` and `expires_at`.
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("opendata-glance")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| OpenDataError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            OpenDataError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `OPENDATA_*` environment variables over file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("OPENDATA_ENGINE_URL") {
            self.engine.base_url = url;
        }
        if let Ok(project) = std::env::var("OPENDATA_PROJECT_ID") {
            if !project.is_empty() {
                self.engine.project_id = Some(project);
            }
        }
        if let Ok(path) = std::env::var("OPENDATA_TOKEN_FILE") {
            if !path.is_empty() {
                self.auth.token_file = Some(PathBuf::from(path));
            }
        }
    }
}
