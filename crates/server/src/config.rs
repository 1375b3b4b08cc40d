//! Server configuration

use anyhow::{Context, Result};
use maintenance_lib::DEFAULT_CURRENT_YEAR;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix of environment overrides, e.g. `VMMS_API_PORT=9000`
pub const ENV_PREFIX: &str = "VMMS";

/// Optional configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "vmms.toml";

/// Prediction server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Fitted pipeline artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// SQLite prediction log
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Sample rows exported at training time
    #[serde(default = "default_sample_data_path")]
    pub sample_data_path: PathBuf,

    /// Year from which vehicle age is derived
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,
}

fn default_api_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model/vehicle_maintenance_model.json")
}

fn default_database_path() -> PathBuf {
    PathBuf::from("predictions.db")
}

fn default_sample_data_path() -> PathBuf {
    PathBuf::from("visualizations/sample_data.csv")
}

fn default_reference_year() -> i32 {
    DEFAULT_CURRENT_YEAR
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            model_path: default_model_path(),
            database_path: default_database_path(),
            sample_data_path: default_sample_data_path(),
            reference_year: default_reference_year(),
        }
    }
}

impl ServerConfig {
    /// Load from `vmms.toml` (if present) overlaid by `VMMS_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(file: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read server configuration")?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }
}
