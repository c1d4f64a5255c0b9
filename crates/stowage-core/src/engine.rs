//! The backup cycle entry point.
//!
//! [`BackupEngine::run_cycle`] is the one operation schedulers and CLI
//! commands call. It is synchronous and single-threaded on purpose: a cycle
//! is lock-guarded end to end, and its phases (archive, reconcile, publish)
//! have a strict order.

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::archive::Archiver;
use crate::config::Config;
use crate::domain::{truncate_to_seconds, Artifact, Result, TIMESTAMP_FORMAT};
use crate::history::HistoryStore;
use crate::lock::CycleLock;
use crate::obs::{self, CycleSpan};
use crate::sync::{SyncResult, Synchronizer};

/// What one completed cycle did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub artifact: Artifact,
    pub sync: SyncResult,
    pub duration_ms: u64,
}

/// Owns the collaborators of one source/storage pair.
pub struct BackupEngine<H: HistoryStore> {
    source_dir: PathBuf,
    storage_dir: PathBuf,
    archiver: Archiver,
    sync: Synchronizer<H>,
}

impl<H: HistoryStore> BackupEngine<H> {
    pub fn new(config: &Config, history: H) -> Self {
        Self {
            source_dir: config.source_dir.clone(),
            storage_dir: config.storage_dir.clone(),
            archiver: Archiver::new(config.naming.clone()),
            sync: Synchronizer::new(
                config.storage_dir.clone(),
                config.naming.clone(),
                config.retention,
                history,
            ),
        }
    }

    pub fn history(&self) -> &H {
        self.sync.history()
    }

    /// Runs one full backup cycle at `now`.
    ///
    /// Order matters: the lock is taken before any storage access, the
    /// archive lands on disk before anything is staged, and the reconcile
    /// pass owns all history mutation. An error in any phase aborts the
    /// cycle; whatever an aborted cycle already wrote is picked up by the
    /// next one (the artifact gets staged by the scanner-driven plan, a
    /// stranded commit gets pushed by the publish check).
    pub fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let stamp = truncate_to_seconds(now)
            .format(TIMESTAMP_FORMAT)
            .to_string();
        let _span = CycleSpan::enter(&stamp);
        let started = Instant::now();

        let _lock = CycleLock::acquire(&self.storage_dir)?;
        obs::emit_cycle_started(&self.source_dir, &self.storage_dir);

        let artifact = self
            .archiver
            .create_artifact(&self.source_dir, &self.storage_dir, now)?;
        let sync = self.sync.reconcile(now, Some(&artifact))?;

        let duration_ms = started.elapsed().as_millis() as u64;
        obs::emit_cycle_finished(sync.added.len(), sync.removed.len(), sync.pushed, duration_ms);
        Ok(CycleReport {
            artifact,
            sync,
            duration_ms,
        })
    }
}
