//! Structured observability hooks for backup cycle lifecycle events.
//!
//! A cycle runs inside a [`CycleSpan`] so every log line carries the cycle
//! timestamp. Emission functions cover the events an operator greps for:
//! cycle start and finish, artifact creation, prunes, and publish failures.
//!
//! Events are emitted at `info!` level except failures, which use `warn!`.

use std::path::Path;

use tracing::{info, warn};

/// RAII guard that enters a cycle-scoped tracing span.
pub struct CycleSpan {
    _span: tracing::span::EnteredSpan,
}

impl CycleSpan {
    /// Create and enter a span tagged with the cycle timestamp.
    pub fn enter(cycle: &str) -> Self {
        let span = tracing::info_span!("stowage.cycle", cycle = %cycle);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: cycle started for a source/storage pair.
pub fn emit_cycle_started(source_dir: &Path, storage_dir: &Path) {
    info!(
        event = "cycle.started",
        source = %source_dir.display(),
        storage = %storage_dir.display(),
    );
}

/// Emit event: cycle finished with per-phase counts.
pub fn emit_cycle_finished(added: usize, pruned: usize, pushed: bool, duration_ms: u64) {
    info!(
        event = "cycle.finished",
        added = added,
        pruned = pruned,
        pushed = pushed,
        duration_ms = duration_ms,
    );
}

/// Emit event: a new artifact landed in the storage directory.
pub fn emit_artifact_created(name: &str, bytes: u64) {
    info!(event = "artifact.created", name = %name, bytes = bytes);
}

/// Emit event: an expired artifact was deleted and untracked.
pub fn emit_artifact_pruned(name: &str) {
    info!(event = "artifact.pruned", name = %name);
}

/// Emit event: an expired artifact could not be deleted this pass.
pub fn emit_prune_skipped(name: &str, error: &dyn std::fmt::Display) {
    warn!(event = "prune.skipped", name = %name, error = %error);
}

/// Emit event: publishing to the remote failed; retried next cycle.
pub fn emit_publish_failed(error: &dyn std::fmt::Display) {
    warn!(event = "publish.failed", error = %error);
}
