pub mod config;
pub mod config_validator;
pub mod dry_run_mode;
pub mod error;
pub mod execution_outcome;
pub mod location;
pub mod pending_file;
pub mod schedule_state;
