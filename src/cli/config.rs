//! Configuration file
//!
//! A single JSON object. Only `data_dir` is required:
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/modelgate",
//!   "descriptor_dir": "./db_model",
//!   "descriptor_suffix": ".table.json",
//!   "timestamp_mode": "legacy",
//!   "log_filter": "info"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::descriptor::DEFAULT_SUFFIX;
use crate::observability::DEFAULT_LOG_FILTER;
use crate::schema::TimestampMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the file store (required)
    pub data_dir: String,

    /// Directory scanned for descriptor files
    #[serde(default = "default_descriptor_dir")]
    pub descriptor_dir: String,

    /// File-name suffix of descriptor files
    #[serde(default = "default_descriptor_suffix")]
    pub descriptor_suffix: String,

    #[serde(default)]
    pub timestamp_mode: TimestampMode,

    /// `tracing` filter directive; `RUST_LOG` overrides it
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_descriptor_dir() -> String {
    "./db_model".to_string()
}
fn default_descriptor_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.descriptor_dir.trim().is_empty() {
            return Err(CliError::config_error("descriptor_dir must not be empty"));
        }

        if !self.descriptor_suffix.starts_with('.') || self.descriptor_suffix.len() < 2 {
            return Err(CliError::config_error(format!(
                "Invalid descriptor_suffix: '{}'. It must start with '.'",
                self.descriptor_suffix
            )));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn descriptor_path(&self) -> &Path {
        Path::new(&self.descriptor_dir)
    }
}
