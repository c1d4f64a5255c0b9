//! stowaged - scheduler daemon for stowage backup cycles
//!
//! Loads one config file, then runs one backup cycle per day at the
//! configured UTC time, forever. A failed cycle is logged and retried at the
//! next tick; the daemon itself only exits on startup errors.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{error, info, Level};

use stowage_core::{BackupEngine, Config, GitHistoryStore};

mod schedule;

use schedule::DailySchedule;

#[derive(Parser)]
#[command(name = "stowaged")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scheduler daemon for stowage backup cycles", long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(short, long, default_value = "stowage.toml")]
    config: PathBuf,

    /// Run one cycle immediately on startup, then follow the schedule
    #[arg(long)]
    run_now: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    stowage_core::init_tracing(args.json, level);

    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    let schedule = DailySchedule::new(config.schedule.time_of_day()?);

    info!(
        source = %config.source_dir.display(),
        storage = %config.storage_dir.display(),
        at = %config.schedule.at,
        "stowaged started"
    );

    if args.run_now {
        run_cycle_once(config.clone()).await;
    }

    loop {
        let now = Utc::now();
        let next = schedule.next_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(next = %next.format("%Y-%m-%d %H:%M:%S UTC"), "sleeping until next cycle");
        tokio::time::sleep(wait).await;

        run_cycle_once(config.clone()).await;
    }
}

/// Runs one cycle on a blocking thread and logs the outcome.
///
/// Never propagates an error: the next tick is the retry.
async fn run_cycle_once(config: Config) {
    let outcome = tokio::task::spawn_blocking(move || {
        let store = GitHistoryStore::open(&config.storage_dir)?;
        let engine = BackupEngine::new(&config, store);
        engine.run_cycle(Utc::now())
    })
    .await;

    match outcome {
        Ok(Ok(report)) => info!(
            artifact = %report.artifact.name,
            pruned = report.sync.removed.len(),
            skipped = report.sync.skipped.len(),
            pushed = report.sync.pushed,
            duration_ms = report.duration_ms,
            "backup cycle complete"
        ),
        Ok(Err(err)) => error!(error = %err, "backup cycle failed"),
        Err(err) => error!(error = %err, "backup cycle task aborted"),
    }
}
