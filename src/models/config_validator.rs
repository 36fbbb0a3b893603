use crate::models::config::{Config, DatabaseConfig};
use crate::models::error::{BackupError, Result};
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Validates the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    info!("Validating configuration...");

    validate_numeric_values(config)?;

    validate_locations(&config.locations)?;

    validate_database(&config.database)?;

    validate_schedule(&config.schedule)?;

    info!("Configuration validation passed");
    Ok(())
}

fn validate_numeric_values(config: &Config) -> Result<()> {
    if config.poll_interval_secs == 0 {
        return Err(BackupError::ConfigInvalid(
            "poll_interval_secs must be greater than 0".to_string(),
        ));
    }

    if config.database.busy_timeout_ms == 0 {
        warn!("busy_timeout_ms is 0 - locked databases will fail immediately");
    }

    Ok(())
}

fn validate_locations(locations: &BTreeMap<String, String>) -> Result<()> {
    if locations.is_empty() {
        return Err(BackupError::ConfigInvalid(
            "At least one location must be configured".to_string(),
        ));
    }

    for (name, directory) in locations {
        if !is_valid_location_name(name) {
            return Err(BackupError::ConfigInvalid(format!(
                "Location name '{}' must be non-empty and use only letters, digits, '_' or '-'",
                name
            )));
        }

        let path = Path::new(directory);

        // A missing directory is skipped at run time, not a config error
        if !path.exists() {
            warn!(
                "Location '{}' directory does not exist yet and will be skipped: {}",
                name, directory
            );
            continue;
        }

        if !path.is_dir() {
            return Err(BackupError::ConfigInvalid(format!(
                "Location '{}' is not a directory: {}",
                name, directory
            )));
        }

        if let Err(e) = fs::read_dir(path) {
            return Err(BackupError::ConfigInvalid(format!(
                "Location '{}' is not readable: {}\nError: {}",
                name, directory, e
            )));
        }
    }

    Ok(())
}

fn is_valid_location_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn validate_database(database: &DatabaseConfig) -> Result<()> {
    let extension = database.file_extension.trim_start_matches('.');
    if extension.is_empty() || extension.contains(['/', '\\']) {
        return Err(BackupError::ConfigInvalid(format!(
            "file_extension '{}' must be non-empty and contain no path separators",
            database.file_extension
        )));
    }

    let path = Path::new(&database.directory);

    if !path.exists() {
        #[cfg(windows)]
        let suggestion = format!("mkdir \"{}\"", database.directory);
        #[cfg(not(windows))]
        let suggestion = format!("mkdir -p \"{}\"", database.directory);

        return Err(BackupError::ConfigInvalid(format!(
            "Database directory does not exist: {}\nSuggestion: Create the directory with: {}",
            database.directory, suggestion
        )));
    }

    if !path.is_dir() {
        return Err(BackupError::ConfigInvalid(format!(
            "Database directory is not a directory: {}",
            database.directory
        )));
    }

    if database.create_if_missing {
        if let Err(e) = check_writable(path) {
            return Err(BackupError::ConfigInvalid(format!(
                "Database directory is not writable: {}\nError: {}",
                database.directory, e
            )));
        }
    }

    Ok(())
}

fn validate_schedule(schedule: &str) -> Result<()> {
    match cron::Schedule::from_str(schedule) {
        Ok(_) => {
            info!("Schedule validated: {}", schedule);
            Ok(())
        }
        Err(cause) => Err(BackupError::InvalidSchedule {
            expression: schedule.to_string(),
            cause,
        }),
    }
}

/// Check if a directory is writable by attempting to create a temporary file
fn check_writable(path: &Path) -> std::io::Result<()> {
    let test_file = path.join(".rustysqlbackup_write_test");

    fs::write(&test_file, b"test")?;

    fs::remove_file(&test_file)?;

    Ok(())
}
