//! Git-backed history store.
//!
//! Shells out to the `git` binary rather than linking a git library. The
//! storage directory is the work tree of a clone whose remote is the offsite
//! replica; clone setup and credentials are operator concerns, this store
//! only drives an already-configured repository.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::domain::{Result, StowageError};
use crate::history::{CommitId, HistoryStore};

/// [`HistoryStore`] over a git work tree.
#[derive(Debug, Clone)]
pub struct GitHistoryStore {
    work_dir: PathBuf,
}

impl GitHistoryStore {
    /// Opens the store rooted at `work_dir`, verifying it is a git work tree.
    pub fn open(work_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            work_dir: work_dir.into(),
        };
        store
            .run(&["rev-parse", "--is-inside-work-tree"])
            .map_err(StowageError::Git)?;
        Ok(store)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Runs git without interpreting the exit status.
    fn raw(&self, args: &[&str]) -> std::result::Result<Output, String> {
        Command::new("git")
            .arg("-C")
            .arg(&self.work_dir)
            .args(args)
            .output()
            .map_err(|e| format!("failed to run git: {e}"))
    }

    /// Runs git, failing on non-zero exit with stderr in the message.
    fn run(&self, args: &[&str]) -> std::result::Result<String, String> {
        let output = self.raw(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn has_upstream(&self) -> std::result::Result<bool, String> {
        let output = self.raw(&["rev-parse", "--abbrev-ref", "@{u}"])?;
        Ok(output.status.success())
    }
}

impl HistoryStore for GitHistoryStore {
    fn stage_add(&self, name: &str) -> Result<()> {
        self.run(&["add", "--", name]).map_err(StowageError::Git)?;
        Ok(())
    }

    fn stage_remove(&self, name: &str) -> Result<()> {
        // --ignore-unmatch keeps removal replayable when the name was never
        // tracked; --cached leaves any surviving file on disk alone.
        self.run(&["rm", "--cached", "--ignore-unmatch", "--quiet", "--", name])
            .map_err(StowageError::Git)?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<CommitId> {
        self.run(&["commit", "--quiet", "-m", message])
            .map_err(StowageError::Commit)?;
        let id = self
            .run(&["rev-parse", "HEAD"])
            .map_err(StowageError::Commit)?;
        Ok(CommitId(id))
    }

    fn push(&self) -> Result<()> {
        self.run(&["push", "--quiet"]).map_err(StowageError::Push)?;
        Ok(())
    }

    fn pending_changes(&self) -> Result<bool> {
        let output = self
            .raw(&["diff", "--cached", "--quiet"])
            .map_err(StowageError::Git)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(StowageError::Git(format!(
                "git diff --cached failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }

    fn unpushed_commits(&self) -> Result<bool> {
        // No upstream means nothing can be awaiting publication; push itself
        // reports the missing upstream loudly if it is ever attempted.
        if !self.has_upstream().map_err(StowageError::Git)? {
            return Ok(false);
        }
        let count = self
            .run(&["rev-list", "--count", "@{u}..HEAD"])
            .map_err(StowageError::Git)?;
        let count: u64 = count
            .parse()
            .map_err(|e| StowageError::Git(format!("unexpected rev-list output {count:?}: {e}")))?;
        Ok(count > 0)
    }

    fn tracked_names(&self) -> Result<Vec<String>> {
        // ls-files reads the index, so staged adds and removals are already
        // reflected before their commit exists.
        let listing = self.run(&["ls-files"]).map_err(StowageError::Git)?;
        Ok(listing.lines().map(str::to_string).collect())
    }
}
