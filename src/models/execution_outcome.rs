use crate::models::error::ExecutionError;
use crate::models::pending_file::PendingFile;
use crate::models::schedule_state::Trigger;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use uuid::Uuid;

/// Result of attempting one SQL file
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub location: String,
    pub file_name: String,
    pub path: PathBuf,
    /// Number of statements executed, or why the file stopped
    pub result: Result<usize, ExecutionError>,
}

impl ExecutionOutcome {
    pub fn new(file: &PendingFile, result: Result<usize, ExecutionError>) -> Self {
        ExecutionOutcome {
            location: file.location.name.clone(),
            file_name: file.file_name.clone(),
            path: file.path.clone(),
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&ExecutionError> {
        self.result.as_ref().err()
    }
}

/// Everything one pass over the configured locations produced
#[derive(Debug)]
pub struct BatchReport {
    pub id: Uuid,
    pub trigger: Trigger,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub outcomes: Vec<ExecutionOutcome>,
    /// Locations whose directory exists but could not be listed
    pub unreadable_locations: Vec<String>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExecutionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            id: self.id,
            trigger: self.trigger,
            started_at: self.started_at,
            finished_at: self.finished_at,
            attempted: self.outcomes.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub id: Uuid,
    pub trigger: Trigger,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}
