use crate::models::config::Config;
use crate::models::dry_run_mode::DryRunMode;
use crate::models::execution_outcome::{BatchReport, ExecutionOutcome};
use crate::models::location::Location;
use crate::models::pending_file::PendingFile;
use crate::models::schedule_state::Trigger;
use crate::service::executor::run_sql_file;
use crate::utils::directory::get_sql_files_in_path;
use crate::utils::progress::{create_progress_bar, create_spinner};
use chrono::Local;
use indicatif::{MultiProgress, ProgressBar};
use log::{debug, error, info, warn};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One pass over every configured location.
///
/// Each pending file is attempted exactly once. A failing file is recorded in
/// its outcome and never stops the pass.
pub fn process_backups(
    config: &Config,
    dry_run_mode: DryRunMode,
    trigger: Trigger,
    multi_progress: Option<&MultiProgress>,
) -> BatchReport {
    let id = Uuid::new_v4();
    let started_at = Local::now();
    info!(
        "🔄 {}Batch {} ({}) started: {}",
        dry_run_mode.progress_prefix(),
        id,
        trigger,
        started_at.format(TIMESTAMP_FORMAT)
    );

    let discovery_progress = multi_progress.map(|mp| {
        mp.add(create_spinner(&format!(
            "{}[1/2] Discovering SQL files...",
            dry_run_mode.progress_prefix()
        )))
    });

    let (pending, unreadable_locations) =
        discover_pending_files(&config.locations(), discovery_progress.as_ref());

    if let Some(progress) = discovery_progress {
        progress.finish_with_message(format!(
            "{}[1/2] Found {} SQL files",
            dry_run_mode.progress_prefix(),
            pending.len()
        ));
    }

    let mut outcomes = Vec::with_capacity(pending.len());

    if dry_run_mode.should_execute() {
        let execution_progress = multi_progress.map(|mp| {
            mp.add(create_progress_bar(
                pending.len() as u64,
                &format!("{}[2/2] Executing", dry_run_mode.progress_prefix()),
            ))
        });

        for file in &pending {
            if let Some(progress) = &execution_progress {
                progress.set_message(file.display_name());
            }

            let result = run_sql_file(
                &config.database,
                &file.location,
                &file.path,
                config.transaction_mode,
                dry_run_mode.should_commit(),
            );
            let outcome = ExecutionOutcome::new(file, result);
            log_outcome(&outcome);
            outcomes.push(outcome);

            if let Some(progress) = &execution_progress {
                progress.inc(1);
            }
        }

        if let Some(progress) = execution_progress {
            progress.finish_with_message("done");
        }
    } else {
        for file in &pending {
            info!("{}Would execute {}", dry_run_mode.progress_prefix(), file.display_name());
        }
    }

    let report = BatchReport {
        id,
        trigger,
        started_at,
        finished_at: Local::now(),
        outcomes,
        unreadable_locations,
    };

    info!(
        "✅ {}Batch {} completed: {} ({} attempted, {} succeeded, {} failed)",
        dry_run_mode.progress_prefix(),
        report.id,
        report.finished_at.format(TIMESTAMP_FORMAT),
        report.outcomes.len(),
        report.succeeded(),
        report.failed()
    );
    report
}

/// Enumerate pending files per location, skipping locations whose directory
/// is missing. Returns the files and the names of locations that could not be
/// listed.
pub fn discover_pending_files(
    locations: &[Location],
    progress: Option<&ProgressBar>,
) -> (Vec<PendingFile>, Vec<String>) {
    let mut pending = Vec::new();
    let mut unreadable = Vec::new();

    for location in locations {
        if !location.directory.is_dir() {
            debug!(
                "Skipping location '{}': {} does not exist",
                location.name,
                location.directory.display()
            );
            continue;
        }

        if let Some(pb) = progress {
            pb.set_message(format!("Scanning: {}", location.directory.display()));
        }

        let files = match get_sql_files_in_path(&location.directory) {
            Ok(files) => files,
            Err(e) => {
                warn!("Skipping location '{}': {}", location.name, e);
                unreadable.push(location.name.clone());
                continue;
            }
        };

        debug!("Found {} SQL files for '{}'", files.len(), location.name);

        for path in files {
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            pending.push(PendingFile {
                location: location.clone(),
                file_name,
                path,
            });
        }
    }

    (pending, unreadable)
}

fn log_outcome(outcome: &ExecutionOutcome) {
    match &outcome.result {
        Ok(executed) => info!(
            "✅ {}/{} ({} statements)",
            outcome.location, outcome.file_name, executed
        ),
        Err(e) => {
            error!(
                "❌ {}/{} [{}]: {}",
                outcome.location,
                outcome.file_name,
                e.kind(),
                e
            );
            debug!("Failed file path: {}", outcome.path.display());
        }
    }
}
