//! In-memory history store for tests and dry wiring.
//!
//! Mirrors the observable behaviour of the git store, including the
//! nothing-staged commit failure, the index that staging mutates, and the
//! staged/committed/published split. Failure injection covers the publish
//! and removal-staging retry paths.

use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::domain::{Result, StowageError};
use crate::history::{CommitId, HistoryStore};

/// One staged index change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedChange {
    Add(String),
    Remove(String),
}

/// One committed history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: CommitId,
    pub message: String,
    pub changes: Vec<StagedChange>,
}

#[derive(Debug, Default)]
struct MemoryState {
    staged: Vec<StagedChange>,
    index: BTreeSet<String>,
    commits: Vec<CommitRecord>,
    published: usize,
    push_failures: u32,
    stage_remove_failures: u32,
}

/// [`HistoryStore`] backed by a mutex-guarded ledger.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` push attempts fail.
    pub fn fail_pushes(&self, count: u32) {
        self.lock().push_failures = count;
    }

    /// Makes the next `count` removal-staging attempts fail.
    pub fn fail_stage_removes(&self, count: u32) {
        self.lock().stage_remove_failures = count;
    }

    /// Committed entries, oldest first.
    pub fn commits(&self) -> Vec<CommitRecord> {
        self.lock().commits.clone()
    }

    /// Number of commits the remote has seen.
    pub fn published_commits(&self) -> usize {
        self.lock().published
    }

    /// Changes staged but not yet committed.
    pub fn staged(&self) -> Vec<StagedChange> {
        self.lock().staged.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn stage_add(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        state.index.insert(name.to_string());
        state.staged.push(StagedChange::Add(name.to_string()));
        Ok(())
    }

    fn stage_remove(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if state.stage_remove_failures > 0 {
            state.stage_remove_failures -= 1;
            return Err(StowageError::Git("injected staging failure".to_string()));
        }
        state.index.remove(name);
        state.staged.push(StagedChange::Remove(name.to_string()));
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<CommitId> {
        let mut state = self.lock();
        if state.staged.is_empty() {
            return Err(StowageError::Commit("nothing staged".to_string()));
        }
        let id = CommitId(format!("mem{:07}", state.commits.len() + 1));
        let changes = std::mem::take(&mut state.staged);
        state.commits.push(CommitRecord {
            id: id.clone(),
            message: message.to_string(),
            changes,
        });
        Ok(id)
    }

    fn push(&self) -> Result<()> {
        let mut state = self.lock();
        if state.push_failures > 0 {
            state.push_failures -= 1;
            return Err(StowageError::Push("injected push failure".to_string()));
        }
        state.published = state.commits.len();
        Ok(())
    }

    fn pending_changes(&self) -> Result<bool> {
        Ok(!self.lock().staged.is_empty())
    }

    fn unpushed_commits(&self) -> Result<bool> {
        let state = self.lock();
        Ok(state.published < state.commits.len())
    }

    fn tracked_names(&self) -> Result<Vec<String>> {
        Ok(self.lock().index.iter().cloned().collect())
    }
}
