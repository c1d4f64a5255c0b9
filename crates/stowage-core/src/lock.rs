//! Per-storage-directory cycle lock.
//!
//! One lock file guards each storage directory so two cycles can never
//! interleave their archive, prune and commit steps. Creation uses
//! `create_new`, which is atomic on every platform we care about; the holder
//! writes its pid into the file purely for diagnostics.
//!
//! The lock does not self-expire. A crash can leave it behind, and an
//! operator removes it by hand after checking the recorded pid, the same
//! ritual git uses for `index.lock`.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::domain::{Result, StowageError};

/// Lock file name, directly under the storage directory.
pub const LOCK_FILE_NAME: &str = ".stowage.lock";

/// Held for the duration of one backup cycle; releases on drop.
#[derive(Debug)]
pub struct CycleLock {
    path: PathBuf,
}

impl CycleLock {
    /// Takes the lock for `storage_dir`, failing fast when it is held.
    pub fn acquire(storage_dir: &Path) -> Result<Self> {
        let path = storage_dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                if let Err(err) = writeln!(file, "{}", std::process::id()) {
                    let _ = fs::remove_file(&path);
                    return Err(err.into());
                }
                Ok(Self { path })
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|pid| pid.trim().to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                Err(StowageError::LockContention { path, holder })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CycleLock {
    fn drop(&mut self) {
        // Nothing sane to do with a failure here; the operator ritual covers it.
        let _ = fs::remove_file(&self.path);
    }
}
