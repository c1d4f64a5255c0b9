//! History stores: versioned, remote-replicated records of the storage dir.
//!
//! A [`HistoryStore`] tracks artifact additions and removals in two steps,
//! staging and commit, with an explicit publish to a remote. The split lets a
//! cycle batch one addition and any number of prunes into a single commit,
//! and lets a failed publish be retried on the next cycle without creating a
//! duplicate commit.

pub mod git;
pub mod memory;

use serde::Serialize;

use crate::domain::Result;

/// Identifier of a recorded history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommitId(pub String);

impl CommitId {
    /// Abbreviated form for logs and human-facing output.
    pub fn short(&self) -> &str {
        // Ids are hex in practice, but the field is public, so cut on a char
        // boundary rather than a byte offset.
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Versioned history of artifact additions and removals.
///
/// `name` arguments are file names relative to the store's root, never
/// absolute paths. All operations are synchronous; callers that need them off
/// the main thread wrap the whole cycle instead.
pub trait HistoryStore: Send + Sync {
    /// Stages the addition (or replacement) of a named artifact.
    fn stage_add(&self, name: &str) -> Result<()>;

    /// Stages the removal of a named artifact.
    ///
    /// Must succeed when the name was never tracked, so removal after an
    /// out-of-band delete stays safe to replay.
    fn stage_remove(&self, name: &str) -> Result<()>;

    /// Records all staged changes as one entry. Fails when nothing is staged.
    fn commit(&self, message: &str) -> Result<CommitId>;

    /// Publishes local entries to the remote. Idempotent: publishing when
    /// everything is already remote is a no-op.
    fn push(&self) -> Result<()>;

    /// Whether any staged change awaits commit.
    fn pending_changes(&self) -> Result<bool>;

    /// Whether any committed entry awaits publication.
    fn unpushed_commits(&self) -> Result<bool>;

    /// Names the store currently tracks, staged changes included.
    ///
    /// Lets a pass spot tracked names with no file behind them (an aborted
    /// earlier pass, or a delete that happened behind the store's back) and
    /// stage their removals, so tracking converges back onto disk state.
    fn tracked_names(&self) -> Result<Vec<String>>;
}
