use crate::models::config::Config;
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, ExecutionError, Result};
use crate::models::execution_outcome::BatchReport;
use crate::models::location::Location;
use crate::models::schedule_state::{ScheduleState, Trigger};
use crate::service::batch;
use crate::service::executor;
use chrono::{DateTime, Local};
use cron::Schedule;
use indicatif::MultiProgress;
use log::{debug, info, warn};
use std::path::Path;
use std::str::FromStr;
use std::sync::mpsc::{Receiver, RecvTimeoutError};

/// Runs batches of SQL files on demand or on the configured schedule
pub struct BackupScheduler {
    config: Config,
    schedule: Schedule,
    dry_run_mode: DryRunMode,
    show_progress: bool,
    state: ScheduleState,
}

impl BackupScheduler {
    pub fn new(config: Config, dry_run_mode: DryRunMode) -> Result<Self> {
        let schedule = Schedule::from_str(&config.schedule).map_err(|cause| {
            BackupError::InvalidSchedule {
                expression: config.schedule.clone(),
                cause,
            }
        })?;

        Ok(BackupScheduler {
            config,
            schedule,
            dry_run_mode,
            show_progress: false,
            state: ScheduleState::new(),
        })
    }

    /// Draw progress bars while batches run
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// Execute a single file against the database of `location`
    pub fn run_sql_file(
        &self,
        location: &Location,
        path: &Path,
    ) -> std::result::Result<usize, ExecutionError> {
        executor::run_sql_file(
            &self.config.database,
            location,
            path,
            self.config.transaction_mode,
            self.dry_run_mode.should_commit(),
        )
    }

    /// Manual trigger: one batch, right now
    pub fn process_backups(&mut self) -> BatchReport {
        self.fire(Trigger::Manual)
    }

    /// Run one batch to completion. Idle -> Running -> Idle.
    pub fn fire(&mut self, trigger: Trigger) -> BatchReport {
        self.state.begin_batch();
        debug!("Scheduler {:?} for {} batch", self.state.mode(), trigger);

        let multi_progress = if self.show_progress {
            Some(MultiProgress::new())
        } else {
            None
        };

        let report = batch::process_backups(
            &self.config,
            self.dry_run_mode,
            trigger,
            multi_progress.as_ref(),
        );

        let summary = report.summary();
        debug!(
            "Batch {} took {}s",
            summary.id,
            (summary.finished_at - summary.started_at).num_seconds()
        );
        self.state.finish_batch(summary);
        report
    }

    /// First fire time strictly after `after`
    pub fn next_fire_after(&self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.schedule.after(after).next()
    }

    /// Fire batches on the schedule until `shutdown` receives a message or
    /// its sender is dropped.
    ///
    /// The wait is a timed receive on `shutdown`, capped at the poll interval
    /// so wall-clock changes are picked up. A batch in progress always runs to
    /// completion before shutdown is noticed.
    pub fn start_scheduler(&mut self, shutdown: &Receiver<()>) -> Result<()> {
        info!(
            "📅 Scheduler started with schedule '{}' (poll every {}s)",
            self.config.schedule, self.config.poll_interval_secs
        );

        if self.config.run_on_startup {
            info!("Running initial batch on startup...");
            self.fire(Trigger::Startup);
        }

        if self.schedule_next(&Local::now()).is_none() {
            warn!("No upcoming scheduled times found");
            return Ok(());
        }

        while let Some(next) = self.state.next_fire() {
            let now = Local::now();

            if now >= next {
                info!("Running scheduled batch for {}", next.format("%Y-%m-%d %H:%M:%S"));
                self.fire(Trigger::Scheduled);

                if self.schedule_next(&Local::now()).is_none() {
                    warn!("No upcoming scheduled times found");
                }
                continue;
            }

            let until_next = (next - now).to_std().unwrap_or_default();
            let wait = until_next.min(self.config.poll_interval());

            match shutdown.recv_timeout(wait) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("Received shutdown signal, stopping scheduler...");
                    break;
                }
            }
        }

        self.state.set_next_fire(None);
        info!("Scheduler stopped");
        Ok(())
    }

    fn schedule_next(&mut self, after: &DateTime<Local>) -> Option<DateTime<Local>> {
        let next = self.next_fire_after(after);
        self.state.set_next_fire(next);
        if let Some(next) = next {
            let secs = (next - *after).num_seconds();
            info!(
                "Next batch scheduled for: {} (in {} seconds)",
                next.format("%Y-%m-%d %H:%M:%S %Z"),
                secs
            );
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::{DatabaseConfig, TransactionMode};
    use crate::models::schedule_state::SchedulerMode;
    use chrono::{TimeZone, Timelike};
    use std::fs;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config_for(database_dir: &Path, locations: &[(&str, &Path)], schedule: &str) -> Config {
        Config {
            database: DatabaseConfig {
                directory: database_dir.to_str().unwrap().to_string(),
                file_extension: "sqlite3".to_string(),
                create_if_missing: true,
                busy_timeout_ms: 1000,
            },
            locations: locations
                .iter()
                .map(|(name, dir)| (name.to_string(), dir.to_str().unwrap().to_string()))
                .collect(),
            schedule: schedule.to_string(),
            poll_interval_secs: 1,
            transaction_mode: TransactionMode::Statement,
            run_on_startup: false,
        }
    }

    /// (location, file, succeeded) triples, comparable across batches
    fn outcome_set(report: &BatchReport) -> Vec<(String, String, bool)> {
        report
            .outcomes
            .iter()
            .map(|o| (o.location.clone(), o.file_name.clone(), o.is_success()))
            .collect()
    }

    #[test]
    fn test_rejects_invalid_schedule() {
        let temp_db = TempDir::new().unwrap();
        let config = config_for(temp_db.path(), &[], "not a schedule");

        assert!(matches!(
            BackupScheduler::new(config, DryRunMode::None),
            Err(BackupError::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn test_default_schedule_fires_next_at_nine() {
        let temp_db = TempDir::new().unwrap();
        let scheduler = BackupScheduler::new(
            config_for(temp_db.path(), &[], "0 0 9 * * *"),
            DryRunMode::None,
        )
        .unwrap();

        let morning = Local.with_ymd_and_hms(2026, 3, 10, 8, 30, 0).unwrap();
        let next = scheduler.next_fire_after(&morning).unwrap();
        assert_eq!((next.hour(), next.minute(), next.second()), (9, 0, 0));
        assert_eq!(next.date_naive(), morning.date_naive());

        let evening = Local.with_ymd_and_hms(2026, 3, 10, 21, 0, 0).unwrap();
        let next = scheduler.next_fire_after(&evening).unwrap();
        assert_eq!((next.hour(), next.minute()), (9, 0));
        assert_eq!(next.date_naive(), evening.date_naive().succ_opt().unwrap());
    }

    #[test]
    fn test_manual_and_scheduled_triggers_produce_same_outcomes() {
        let temp_db = TempDir::new().unwrap();
        let busan = TempDir::new().unwrap();
        let parent = TempDir::new().unwrap();
        let missing = parent.path().join("hongdae");
        fs::write(busan.path().join("a.sql"), "SELECT 1; SELECT 2;").unwrap();
        fs::write(busan.path().join("b.sql"), "SELECT broken from;").unwrap();

        let mut scheduler = BackupScheduler::new(
            config_for(
                temp_db.path(),
                &[("busan", busan.path()), ("hongdae", missing.as_path())],
                "0 0 9 * * *",
            ),
            DryRunMode::None,
        )
        .unwrap();

        let manual = scheduler.process_backups();
        let scheduled = scheduler.fire(Trigger::Scheduled);

        assert_eq!(manual.trigger, Trigger::Manual);
        assert_eq!(scheduled.trigger, Trigger::Scheduled);
        assert_eq!(outcome_set(&manual), outcome_set(&scheduled));
        assert_eq!(outcome_set(&manual).len(), 2);
        assert_ne!(manual.id, scheduled.id);
    }

    #[test]
    fn test_state_returns_to_idle_after_failed_batch() {
        let temp_db = TempDir::new().unwrap();
        let busan = TempDir::new().unwrap();
        fs::write(busan.path().join("bad.sql"), "THIS IS NOT SQL;").unwrap();

        let mut scheduler = BackupScheduler::new(
            config_for(temp_db.path(), &[("busan", busan.path())], "0 0 9 * * *"),
            DryRunMode::None,
        )
        .unwrap();

        let report = scheduler.process_backups();

        assert_eq!(report.failed(), 1);
        assert_eq!(scheduler.state().mode(), SchedulerMode::Idle);
        assert_eq!(scheduler.state().batches_completed(), 1);
        assert_eq!(scheduler.state().last_batch().unwrap().failed, 1);
    }

    #[test]
    fn test_run_sql_file_uses_location_database() {
        let temp_db = TempDir::new().unwrap();
        let busan = TempDir::new().unwrap();
        let file = busan.path().join("restore.sql");
        fs::write(&file, "CREATE TABLE t (id INT); INSERT INTO t VALUES (1);").unwrap();

        let config = config_for(temp_db.path(), &[("busan", busan.path())], "0 0 9 * * *");
        let location = config.locations().remove(0);
        let scheduler = BackupScheduler::new(config, DryRunMode::None).unwrap();

        assert_eq!(scheduler.run_sql_file(&location, &file).unwrap(), 2);
        assert!(temp_db.path().join("busan.sqlite3").is_file());
    }

    #[test]
    fn test_scheduler_stops_when_shutdown_sender_dropped() {
        let temp_db = TempDir::new().unwrap();
        let mut scheduler = BackupScheduler::new(
            config_for(temp_db.path(), &[], "0 0 9 * * *"),
            DryRunMode::None,
        )
        .unwrap();

        let (tx, rx) = mpsc::channel::<()>();
        drop(tx);

        scheduler.start_scheduler(&rx).unwrap();

        assert_eq!(scheduler.state().batches_completed(), 0);
        assert!(scheduler.state().next_fire().is_none());
    }

    #[test]
    fn test_run_on_startup_fires_before_waiting() {
        let temp_db = TempDir::new().unwrap();
        let busan = TempDir::new().unwrap();
        fs::write(busan.path().join("a.sql"), "SELECT 1;").unwrap();

        let mut config = config_for(temp_db.path(), &[("busan", busan.path())], "0 0 9 * * *");
        config.run_on_startup = true;
        let mut scheduler = BackupScheduler::new(config, DryRunMode::None).unwrap();

        let (tx, rx) = mpsc::channel::<()>();
        tx.send(()).unwrap();

        scheduler.start_scheduler(&rx).unwrap();

        assert_eq!(scheduler.state().batches_completed(), 1);
        assert_eq!(
            scheduler.state().last_batch().unwrap().trigger,
            Trigger::Startup
        );
    }

    #[test]
    fn test_scheduler_fires_on_schedule_until_shutdown() {
        let temp_db = TempDir::new().unwrap();
        let busan = TempDir::new().unwrap();
        fs::write(busan.path().join("a.sql"), "SELECT 1;").unwrap();

        // Every second
        let mut scheduler = BackupScheduler::new(
            config_for(temp_db.path(), &[("busan", busan.path())], "* * * * * *"),
            DryRunMode::None,
        )
        .unwrap();

        let (tx, rx) = mpsc::channel::<()>();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(3500));
            let _ = tx.send(());
        });

        scheduler.start_scheduler(&rx).unwrap();
        stopper.join().unwrap();

        let state = scheduler.state();
        assert!(state.batches_completed() >= 1);
        assert_eq!(state.mode(), SchedulerMode::Idle);
        let last = state.last_batch().unwrap();
        assert_eq!(last.trigger, Trigger::Scheduled);
        assert_eq!(last.attempted, 1);
        assert_eq!(last.succeeded, 1);
    }
}
