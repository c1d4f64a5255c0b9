//! Error types shared across the stowage core.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to interpret a file name as a managed artifact name.
///
/// These errors are deliberately separate from [`StowageError`]: the storage
/// scanner treats them as per-file noise (log and skip), never as a cycle
/// failure.
#[derive(Debug, Error)]
pub enum NameParseError {
    /// The name does not carry the configured prefix and extension.
    #[error("not a managed artifact name: {name}")]
    NotManaged { name: String },

    /// Prefix and extension matched but the middle is not a valid timestamp.
    #[error("invalid timestamp {value:?} in artifact name {name}")]
    BadTimestamp {
        name: String,
        value: String,
        #[source]
        source: chrono::format::ParseError,
    },
}

/// Top-level error type for backup cycles and their collaborators.
#[derive(Debug, Error)]
pub enum StowageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A git invocation failed outside of commit/push (staging, queries).
    #[error("git error: {0}")]
    Git(String),

    /// Recording staged changes as a commit failed.
    #[error("commit failed: {0}")]
    Commit(String),

    /// Publishing local commits to the remote failed. The commit survives
    /// locally; the next cycle pushes it again.
    #[error("push failed: {0}")]
    Push(String),

    /// Another cycle holds the per-storage lock.
    #[error("backup cycle already running: lock {path:?} held by pid {holder}")]
    LockContention { path: PathBuf, holder: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Name(#[from] NameParseError),
}

pub type Result<T> = std::result::Result<T, StowageError>;
