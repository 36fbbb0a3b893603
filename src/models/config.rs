use crate::models::config_validator::validate_config;
use crate::models::error::{BackupError, Result};
use crate::models::location::Location;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Location name to the directory holding its `.sql` files
    pub locations: BTreeMap<String, String>,
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "u64_sixty")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub transaction_mode: TransactionMode,
    #[serde(default = "bool_false")]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub directory: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default = "bool_true")]
    pub create_if_missing: bool,
    #[serde(default = "u64_five_thousand")]
    pub busy_timeout_ms: u64,
}

/// Where the commit boundary sits when a file holds several statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// Every statement commits on its own; a failure keeps earlier statements
    #[default]
    Statement,
    /// The whole file is one transaction; a failure rolls all of it back
    File,
}

fn default_schedule() -> String {
    "0 0 9 * * *".to_string()
}
fn default_file_extension() -> String {
    "sqlite3".to_string()
}
const fn u64_sixty() -> u64 { 60 }
const fn u64_five_thousand() -> u64 { 5000 }
const fn bool_false() -> bool { false }
const fn bool_true() -> bool { true }

impl Config {
    /// Configured locations, ordered by name
    pub fn locations(&self) -> Vec<Location> {
        self.locations
            .iter()
            .map(|(name, directory)| Location::new(name, directory))
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl DatabaseConfig {
    /// Database file that belongs to the named location
    pub fn database_path(&self, location_name: &str) -> PathBuf {
        let extension = self.file_extension.trim_start_matches('.');
        PathBuf::from(&self.directory).join(format!("{}.{}", location_name, extension))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

pub fn setup_config(config_file: String) -> Result<Config> {
    let config_path = PathBuf::from(config_file);
    info!("Loading config from: {}", config_path.display());

    let config_str = fs::read_to_string(&config_path).map_err(|cause| {
        BackupError::ConfigRead {
            path: config_path.clone(),
            cause,
        }
    })?;

    let config: Config = serde_json::from_str(&config_str).map_err(|cause| {
        BackupError::ConfigParse {
            path: config_path,
            cause,
        }
    })?;

    validate_config(&config)?;

    Ok(config)
}
