//! Retention synchronization: align disk and history with the policy.
//!
//! A reconcile pass stages the cycle's new artifact (if any), prunes expired
//! artifacts from disk, stages their removals, then records everything as one
//! commit and publishes it. Failed prune deletions are skipped and retried on
//! later passes; a failed publish leaves the commit behind and is retried the
//! same way. Each pass also checks tracking against disk: a managed name the
//! store still tracks with no file behind it gets its removal staged, so an
//! aborted pass or an out-of-band delete heals on the next pass instead of
//! leaving tracking ahead of disk forever.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Artifact, NamingScheme, Result, TIMESTAMP_FORMAT};
use crate::history::{CommitId, HistoryStore};
use crate::obs;
use crate::retention::{self, RetentionPolicy};

/// Scans `storage_dir` for managed artifacts, oldest first.
///
/// Non-candidate names (wrong prefix or extension) are ignored without
/// comment; candidates with an unreadable timestamp are logged and skipped so
/// one stray file can never block retention for the rest.
pub fn list_artifacts(storage_dir: &Path, naming: &NamingScheme) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for entry in fs::read_dir(storage_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !naming.matches(name) {
            continue;
        }
        match Artifact::from_file_name(naming, storage_dir, name) {
            Ok(artifact) => artifacts.push(artifact),
            Err(err) => {
                warn!(name = %name, error = %err, "skipping malformed artifact name");
            }
        }
    }
    artifacts.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(artifacts)
}

/// A prune that was planned but left in place this pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPrune {
    pub name: String,
    pub reason: String,
}

/// What one reconcile pass changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncResult {
    /// Artifact names staged as additions.
    pub added: Vec<String>,
    /// Artifact names staged as removals: pruned from disk this pass, or
    /// found tracked with no file behind them.
    pub removed: Vec<String>,
    /// Expired artifacts whose deletion failed; they stay tracked.
    pub skipped: Vec<SkippedPrune>,
    /// Commit recorded this pass, if the index changed.
    pub commit: Option<CommitId>,
    /// Whether a publish ran (covering this commit or earlier unpublished ones).
    pub pushed: bool,
}

impl SyncResult {
    /// True when the pass changed nothing anywhere.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.skipped.is_empty()
            && self.commit.is_none()
            && !self.pushed
    }
}

/// Drives disk pruning and the history store for one storage directory.
pub struct Synchronizer<H: HistoryStore> {
    storage_dir: PathBuf,
    naming: NamingScheme,
    policy: RetentionPolicy,
    history: H,
}

impl<H: HistoryStore> Synchronizer<H> {
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        naming: NamingScheme,
        policy: RetentionPolicy,
        history: H,
    ) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            naming,
            policy,
            history,
        }
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    /// Brings disk and history in line with the retention policy.
    ///
    /// `added` is the artifact the current cycle just wrote; pass `None` for
    /// a standalone prune. The pass is idempotent: with nothing new, nothing
    /// expired and nothing unpublished it leaves no trace.
    ///
    /// Tracking is reconciled before planning: a managed name the store
    /// still tracks but disk no longer has gets its removal staged here.
    /// That replays a removal whose earlier pass failed between the unlink
    /// and the staging step, and untracks artifacts deleted out of band.
    ///
    /// Failure handling is split by kind. Deleting an expired artifact is
    /// per-item: a failure is recorded in [`SyncResult::skipped`] and the
    /// pass continues. History store failures abort the pass, since a commit
    /// cannot be half-recorded.
    pub fn reconcile(&self, now: DateTime<Utc>, added: Option<&Artifact>) -> Result<SyncResult> {
        let mut result = SyncResult::default();

        if let Some(artifact) = added {
            self.history.stage_add(&artifact.name)?;
            result.added.push(artifact.name.clone());
        }

        let artifacts = list_artifacts(&self.storage_dir, &self.naming)?;
        self.untrack_missing(&artifacts, &mut result)?;
        let plan = retention::plan(artifacts, &self.policy);
        self.prune_expired(&plan.expired, &mut result)?;

        if self.history.pending_changes()? {
            let message = commit_message(now, &result);
            let id = self.history.commit(&message)?;
            result.commit = Some(id);
        }

        // Push whenever anything local awaits the remote, including commits
        // stranded by an earlier failed publish.
        if result.commit.is_some() || self.history.unpushed_commits()? {
            self.history.push().map_err(|err| {
                obs::emit_publish_failed(&err);
                err
            })?;
            result.pushed = true;
        }

        Ok(result)
    }

    /// Stages removals for managed names tracked without a file behind them.
    ///
    /// Only names this scheme manages are touched; whatever else the store
    /// tracks (a `.gitkeep`, operator notes) is left alone.
    fn untrack_missing(&self, on_disk: &[Artifact], result: &mut SyncResult) -> Result<()> {
        let present: HashSet<&str> = on_disk.iter().map(|a| a.name.as_str()).collect();
        for name in self.history.tracked_names()? {
            if !self.naming.matches(&name) || self.naming.parse(&name).is_err() {
                continue;
            }
            if present.contains(name.as_str()) {
                continue;
            }
            warn!(name = %name, "tracked artifact missing on disk; staging removal");
            self.history.stage_remove(&name)?;
            result.removed.push(name);
        }
        Ok(())
    }

    /// Deletes expired artifacts and stages their removals.
    fn prune_expired(&self, expired: &[Artifact], result: &mut SyncResult) -> Result<()> {
        for artifact in expired {
            match fs::remove_file(&artifact.path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    // Deleted out of band; the tracking entry still has to go.
                    debug!(name = %artifact.name, "expired artifact already absent on disk");
                }
                Err(err) => {
                    obs::emit_prune_skipped(&artifact.name, &err);
                    result.skipped.push(SkippedPrune {
                        name: artifact.name.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            }
            self.history.stage_remove(&artifact.name)?;
            obs::emit_artifact_pruned(&artifact.name);
            result.removed.push(artifact.name.clone());
        }
        Ok(())
    }
}

/// One-line history message describing a pass.
fn commit_message(now: DateTime<Utc>, result: &SyncResult) -> String {
    let stamp = now.format(TIMESTAMP_FORMAT);
    match (result.added.first(), result.removed.len()) {
        (Some(name), 0) => format!("backup {stamp}: add {name}"),
        (Some(name), pruned) => format!("backup {stamp}: add {name}, prune {pruned} expired"),
        (None, 0) => format!("backup {stamp}: record stranded changes"),
        (None, pruned) => format!("backup {stamp}: prune {pruned} expired"),
    }
}
