use crate::models::execution_outcome::BatchSummary;
use chrono::{DateTime, Local};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMode {
    /// Waiting for the next fire time or a manual trigger
    Idle,
    /// A batch is executing
    Running,
}

/// What started a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Manual,
    Scheduled,
    Startup,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Manual => write!(f, "manual"),
            Trigger::Scheduled => write!(f, "scheduled"),
            Trigger::Startup => write!(f, "startup"),
        }
    }
}

/// Process-wide scheduler bookkeeping, reset only by a restart
#[derive(Debug, Clone)]
pub struct ScheduleState {
    mode: SchedulerMode,
    next_fire: Option<DateTime<Local>>,
    last_batch: Option<BatchSummary>,
    batches_completed: u64,
}

impl ScheduleState {
    pub fn new() -> Self {
        ScheduleState {
            mode: SchedulerMode::Idle,
            next_fire: None,
            last_batch: None,
            batches_completed: 0,
        }
    }

    pub fn mode(&self) -> SchedulerMode {
        self.mode
    }

    pub fn next_fire(&self) -> Option<DateTime<Local>> {
        self.next_fire
    }

    pub fn set_next_fire(&mut self, next_fire: Option<DateTime<Local>>) {
        self.next_fire = next_fire;
    }

    pub fn last_batch(&self) -> Option<&BatchSummary> {
        self.last_batch.as_ref()
    }

    pub fn batches_completed(&self) -> u64 {
        self.batches_completed
    }

    /// Idle -> Running
    pub fn begin_batch(&mut self) {
        self.mode = SchedulerMode::Running;
    }

    /// Running -> Idle, regardless of how many files failed
    pub fn finish_batch(&mut self, summary: BatchSummary) {
        self.mode = SchedulerMode::Idle;
        self.batches_completed += 1;
        self.last_batch = Some(summary);
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}
