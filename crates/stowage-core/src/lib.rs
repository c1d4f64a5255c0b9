//! stowage-core: periodic directory archiving with git-backed history.
//!
//! The crate turns a source directory into a rolling series of compressed
//! artifacts inside a storage directory, keeps that directory inside an
//! age-based retention window, and mirrors every addition and removal into a
//! git repository whose remote is the offsite replica.
//!
//! The pieces:
//! - [`archive::Archiver`] snapshots the source tree into a `.tar.zst`
//!   artifact with an atomic rename at the end.
//! - [`retention::plan`] decides, purely, which artifacts have aged out.
//! - [`sync::Synchronizer`] prunes expired artifacts and drives the
//!   [`history::HistoryStore`] (stage, commit, push) so disk and history
//!   move together.
//! - [`engine::BackupEngine::run_cycle`] strings the above into the one
//!   lock-guarded operation schedulers call.
//!
//! Scheduling lives outside this crate: callers decide when `run_cycle`
//! fires and simply pass the current time in.

pub mod archive;
pub mod config;
pub mod domain;
pub mod engine;
pub mod history;
pub mod lock;
pub mod obs;
pub mod retention;
pub mod sync;
pub mod telemetry;

pub use archive::Archiver;
pub use config::{Config, ScheduleConfig};
pub use domain::{
    truncate_to_seconds, Artifact, NameParseError, NamingScheme, Result, StowageError,
    TIMESTAMP_FORMAT,
};
pub use engine::{BackupEngine, CycleReport};
pub use history::git::GitHistoryStore;
pub use history::memory::MemoryHistoryStore;
pub use history::{CommitId, HistoryStore};
pub use lock::{CycleLock, LOCK_FILE_NAME};
pub use retention::{plan, RetentionPlan, RetentionPolicy};
pub use sync::{list_artifacts, SkippedPrune, SyncResult, Synchronizer};
pub use telemetry::init_tracing;

/// Crate version, for binaries that report it.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
