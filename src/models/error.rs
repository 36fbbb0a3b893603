use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to read config file '{path}': {cause}")]
    ConfigRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    ConfigParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid cron expression '{expression}': {cause}")]
    InvalidSchedule {
        expression: String,
        cause: cron::error::Error,
    },

    #[error("Failed to read directory '{path}': {cause}")]
    DirectoryRead {
        path: PathBuf,
        cause: walkdir::Error,
    },
}

pub type Result<T> = std::result::Result<T, BackupError>;

/// Why a single SQL file could not be fully executed.
///
/// These never abort a batch; the batch loop records them in the file's
/// outcome and moves on.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to open database '{database}' at '{path}': {cause}")]
    Connection {
        database: String,
        path: PathBuf,
        cause: rusqlite::Error,
    },

    #[error("Failed to read SQL file '{path}': {cause}")]
    FileRead { path: PathBuf, cause: io::Error },

    #[error("Statement #{index} rejected ({executed} earlier statements {}): {statement}: {cause}",
        rollback_label(.rolled_back))]
    StatementExecution {
        /// 1-based position of the failing statement in the file
        index: usize,
        statement: String,
        /// Statements that succeeded before this one
        executed: usize,
        rolled_back: bool,
        cause: rusqlite::Error,
    },

    #[error("Failed to {operation} transaction: {cause}")]
    Transaction {
        operation: &'static str,
        cause: rusqlite::Error,
    },

    /// The file closed the transaction it was being run inside
    #[error("Statement #{index} ended the enclosing transaction ({executed} earlier statements rolled back): {statement}")]
    TransactionEnded {
        index: usize,
        statement: String,
        executed: usize,
    },
}

fn rollback_label(rolled_back: &bool) -> &'static str {
    if *rolled_back {
        "rolled back"
    } else {
        "kept"
    }
}

impl ExecutionError {
    /// Short label used in batch summaries
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Connection { .. } => "connection",
            ExecutionError::FileRead { .. } => "file-read",
            ExecutionError::StatementExecution { .. } => "statement",
            ExecutionError::Transaction { .. } | ExecutionError::TransactionEnded { .. } => {
                "transaction"
            }
        }
    }
}
