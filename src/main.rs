mod models;
mod repo;
mod service;
mod utils;

use crate::models::config::setup_config;
use crate::models::dry_run_mode::DryRunMode;
use crate::service::scheduler::BackupScheduler;
use crate::utils::prompt::{prompt_run_choice, RunChoice};
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use models::config::Config;
use std::io;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "RustySqlBackup")]
#[command(about = "Scheduled SQL backup file runner", long_about = None)]
struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        default_value = "config.json",
        env = "RUSTYSQLBACKUP_CONFIG"
    )]
    config_file: String,

    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        env = "LOG_LEVEL"
    )]
    log_level: String,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[arg(short = 'v', long = "validate-only")]
    validate_only: bool,

    #[arg(short = 'd', long = "dry-run", conflicts_with = "dry_run_full")]
    dry_run: bool,

    #[arg(short = 'f', long = "dry-run-full", conflicts_with = "dry_run")]
    dry_run_full: bool,

    #[arg(short = 'o', long = "once", conflicts_with = "scheduler")]
    once: bool,

    #[arg(short = 's', long = "scheduler", conflicts_with = "once")]
    scheduler: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();

    info!("RustySqlBackup starting...");
    let config: Config =
        setup_config(args.config_file.clone()).context("Failed to load configuration")?;
    debug!("Loaded config: {:?}", &config);

    if args.validate_only {
        info!("Configuration is valid. Exiting (--validate-only mode).");
        return Ok(());
    }

    let dry_run_mode = if args.dry_run_full {
        info!("Running in DRY RUN FULL mode - every file is executed and rolled back");
        DryRunMode::Full
    } else if args.dry_run {
        info!("Running in DRY RUN QUICK mode - pending files are listed, nothing is executed");
        DryRunMode::Quick
    } else {
        DryRunMode::None
    };

    let mut scheduler = BackupScheduler::new(config, dry_run_mode)
        .context("Failed to set up scheduler")?
        .with_progress(!args.quiet);

    let choice = if args.once {
        RunChoice::RunNow
    } else if args.scheduler {
        RunChoice::StartScheduler
    } else {
        prompt_run_choice(&mut io::stdin().lock(), &mut io::stdout())
            .context("Failed to read run choice")?
    };

    match choice {
        RunChoice::RunNow => {
            let report = scheduler.process_backups();
            if report.failed() > 0 {
                warn!(
                    "{} of {} SQL files failed:",
                    report.failed(),
                    report.outcomes.len()
                );
                for outcome in report.failures() {
                    if let Some(e) = outcome.error() {
                        warn!("  {}/{}: {}", outcome.location, outcome.file_name, e);
                    }
                }
            }
            if dry_run_mode.is_dry_run() {
                info!("DRY RUN completed - no database was changed");
            }
        }
        RunChoice::StartScheduler => run_scheduled(&mut scheduler)?,
    }

    Ok(())
}

fn run_scheduled(scheduler: &mut BackupScheduler) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .context("Failed to set Ctrl+C handler")?;

    scheduler
        .start_scheduler(&shutdown_rx)
        .context("Scheduler stopped with an error")?;

    Ok(())
}
