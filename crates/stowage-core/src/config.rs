//! Configuration for backup cycles.
//!
//! One TOML file describes one source/storage pair. Everything except the two
//! directories has a default, so a minimal file is just:
//!
//! ```toml
//! source_dir = "/srv/minecraft/world"
//! storage_dir = "/srv/backups/vault"
//! ```
//!
//! The storage directory must already be a git work tree with its remote and
//! upstream configured; stowage drives the repository but never creates it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::Deserialize;

use crate::domain::{NamingScheme, Result, StowageError};
use crate::retention::RetentionPolicy;

/// Daemon schedule: one cycle per day at a fixed UTC time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Time of day as `HH:MM` (or `HH:MM:SS`), UTC.
    pub at: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            at: "03:00".to_string(),
        }
    }
}

impl ScheduleConfig {
    /// Parses the configured time of day.
    pub fn time_of_day(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.at, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&self.at, "%H:%M:%S"))
            .map_err(|_| {
                StowageError::InvalidConfig(format!(
                    "schedule.at {:?} is not a HH:MM time",
                    self.at
                ))
            })
    }
}

/// Everything a backup cycle needs, resolved at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory tree to snapshot.
    pub source_dir: PathBuf,
    /// Managed storage directory; also the history work tree.
    pub storage_dir: PathBuf,
    #[serde(default)]
    pub retention: RetentionPolicy,
    #[serde(default)]
    pub naming: NamingScheme,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| StowageError::InvalidConfig(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(StowageError::InvalidConfig(
                "source_dir must not be empty".to_string(),
            ));
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(StowageError::InvalidConfig(
                "storage_dir must not be empty".to_string(),
            ));
        }
        if self.source_dir == self.storage_dir {
            // Archiving the storage directory into itself would snapshot
            // earlier artifacts into every new one.
            return Err(StowageError::InvalidConfig(
                "source_dir and storage_dir must differ".to_string(),
            ));
        }
        if self.naming.prefix.is_empty() {
            return Err(StowageError::InvalidConfig(
                "naming.prefix must not be empty".to_string(),
            ));
        }
        if !self.naming.extension.starts_with('.') {
            return Err(StowageError::InvalidConfig(format!(
                "naming.extension {:?} must start with a dot",
                self.naming.extension
            )));
        }
        if self.retention.max_age_days == 0 {
            return Err(StowageError::InvalidConfig(
                "retention.max_age_days must be at least 1".to_string(),
            ));
        }
        self.schedule.time_of_day()?;
        Ok(())
    }
}
