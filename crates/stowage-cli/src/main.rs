//! stowage - directory backups with git-tracked retention
//!
//! The `stowage` command drives one source/storage pair described by a TOML
//! config file.
//!
//! ## Commands
//!
//! - `run`: execute one full backup cycle (archive, prune, commit, push)
//! - `prune`: apply retention without creating a new archive
//! - `list`: show managed artifacts in the storage directory
//! - `status`: summarize storage and history state

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::Level;

use stowage_core::{
    list_artifacts, retention, BackupEngine, Config, CycleLock, GitHistoryStore, HistoryStore,
    Synchronizer,
};

#[derive(Parser)]
#[command(name = "stowage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Directory backups with git-tracked retention", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "stowage.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full backup cycle now
    Run,

    /// Prune expired artifacts without creating a new archive
    Prune {
        /// Show what would be pruned without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List managed artifacts, oldest first
    List {
        /// Emit JSON output instead of terminal text
        #[arg(long)]
        json: bool,
    },

    /// Show storage and history state
    Status {
        /// Emit JSON output instead of terminal text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    stowage_core::init_tracing(cli.json, level);

    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config {:?}", cli.config))?;

    match cli.command {
        Commands::Run => cmd_run(&config),
        Commands::Prune { dry_run } => cmd_prune(&config, dry_run),
        Commands::List { json } => cmd_list(&config, json),
        Commands::Status { json } => cmd_status(&config, json),
    }
}

/// Run one full backup cycle now
fn cmd_run(config: &Config) -> Result<()> {
    let store = GitHistoryStore::open(&config.storage_dir)
        .context("storage directory is not a usable git work tree")?;
    let engine = BackupEngine::new(config, store);

    let report = engine.run_cycle(Utc::now())?;

    println!("Backup completed: {}", report.artifact.name);
    if !report.sync.removed.is_empty() {
        println!("Pruned {} expired artifact(s):", report.sync.removed.len());
        for name in &report.sync.removed {
            println!("  - {}", name);
        }
    }
    for skip in &report.sync.skipped {
        println!("Skipped {}: {}", skip.name, skip.reason);
    }
    if let Some(commit) = &report.sync.commit {
        println!("Recorded commit {}", commit.short());
    }
    if report.sync.pushed {
        println!("Published to remote");
    }
    println!("Done in {}ms", report.duration_ms);

    Ok(())
}

/// Prune expired artifacts without creating a new archive
fn cmd_prune(config: &Config, dry_run: bool) -> Result<()> {
    if dry_run {
        let artifacts = list_artifacts(&config.storage_dir, &config.naming)?;
        let plan = retention::plan(artifacts, &config.retention);
        if plan.is_noop() {
            println!(
                "Nothing to prune ({} artifact(s) within the window)",
                plan.retained.len()
            );
            return Ok(());
        }
        println!("Would prune {} artifact(s):", plan.expired.len());
        for artifact in &plan.expired {
            println!("  - {}", artifact.name);
        }
        return Ok(());
    }

    let store = GitHistoryStore::open(&config.storage_dir)
        .context("storage directory is not a usable git work tree")?;
    let sync = Synchronizer::new(
        config.storage_dir.clone(),
        config.naming.clone(),
        config.retention,
        store,
    );

    // A standalone prune mutates the same state a cycle does, so it takes
    // the same lock.
    let _lock = CycleLock::acquire(&config.storage_dir)?;
    let result = sync.reconcile(Utc::now(), None)?;

    if result.is_noop() {
        println!("Nothing to prune");
        return Ok(());
    }
    println!("Pruned {} artifact(s)", result.removed.len());
    for name in &result.removed {
        println!("  - {}", name);
    }
    for skip in &result.skipped {
        println!("Skipped {}: {}", skip.name, skip.reason);
    }
    if let Some(commit) = &result.commit {
        println!("Recorded commit {}", commit.short());
    }
    if result.pushed {
        println!("Published to remote");
    }

    Ok(())
}

/// List managed artifacts, oldest first
fn cmd_list(config: &Config, json: bool) -> Result<()> {
    let artifacts = list_artifacts(&config.storage_dir, &config.naming)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&artifacts)?);
        return Ok(());
    }

    if artifacts.is_empty() {
        println!("No artifacts in {:?}", config.storage_dir);
        return Ok(());
    }

    for artifact in &artifacts {
        let size = std::fs::metadata(&artifact.path)
            .map(|m| m.len())
            .unwrap_or(0);
        println!(
            "{}  {:>10}  {}",
            artifact.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_bytes(size),
            artifact.name
        );
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct StatusOutput {
    storage_dir: String,
    artifacts: usize,
    oldest: Option<String>,
    newest: Option<String>,
    pending_changes: bool,
    unpushed_commits: bool,
}

/// Show storage and history state
fn cmd_status(config: &Config, json: bool) -> Result<()> {
    let store = GitHistoryStore::open(&config.storage_dir)
        .context("storage directory is not a usable git work tree")?;
    let artifacts = list_artifacts(&config.storage_dir, &config.naming)?;

    let status = StatusOutput {
        storage_dir: config.storage_dir.display().to_string(),
        artifacts: artifacts.len(),
        oldest: artifacts.first().map(|a| a.name.clone()),
        newest: artifacts.last().map(|a| a.name.clone()),
        pending_changes: store.pending_changes()?,
        unpushed_commits: store.unpushed_commits()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", render_status_text(&status));
    }

    Ok(())
}

fn render_status_text(status: &StatusOutput) -> String {
    let mut out = String::new();
    out.push_str("Storage Status\n");
    out.push_str("==============\n");
    out.push_str(&format!("storage_dir: {}\n", status.storage_dir));
    out.push_str(&format!("artifacts: {}\n", status.artifacts));
    if let Some(oldest) = &status.oldest {
        out.push_str(&format!("oldest: {}\n", oldest));
    }
    if let Some(newest) = &status.newest {
        out.push_str(&format!("newest: {}\n", newest));
    }
    out.push_str(&format!(
        "pending changes: {}\n",
        if status.pending_changes { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "unpushed commits: {}",
        if status.unpushed_commits { "yes" } else { "no" }
    ));
    out
}

/// Render a byte count for terminal output
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
