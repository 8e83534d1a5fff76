//! Harness configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults, an
//! optional TOML file, and command-line flags / environment variables (see
//! the binary).
//!
//! ```toml
//! base_url = "http://localhost:3000"
//! request_timeout_ms = 10000
//! dataset_path = "fixtures/data.json"
//! test_cases_path = "fixtures/test_cases.json"
//! parallel_resources = false
//! resources = ["posts", "albums"]
//! database_path = "api.db"
//! ```

use crate::model::ResourceName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for a suite run or a seeding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Base URL of the API under test.
    pub base_url: String,
    /// Per-call timeout. Expiry is reported as its own failure kind.
    pub request_timeout_ms: u64,
    pub dataset_path: PathBuf,
    pub test_cases_path: PathBuf,
    /// Verify different resources concurrently. Cases of one resource always
    /// run in order.
    pub parallel_resources: bool,
    /// Resources to verify; empty means all of them.
    pub resources: Vec<ResourceName>,
    /// SQLite database the `seed` command populates.
    pub database_path: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout_ms: 10_000,
            dataset_path: PathBuf::from("fixtures/data.json"),
            test_cases_path: PathBuf::from("fixtures/test_cases.json"),
            parallel_resources: false,
            resources: Vec::new(),
            database_path: None,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Invalid(format!("base_url {}: {e}", self.base_url)))?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The resources to verify, in suite order.
    pub fn selected_resources(&self) -> Vec<ResourceName> {
        ResourceName::ALL
            .into_iter()
            .filter(|resource| self.resources.is_empty() || self.resources.contains(resource))
            .collect()
    }
}
