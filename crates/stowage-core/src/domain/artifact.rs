//! Artifact identity: naming, timestamps, and the on-disk handle.
//!
//! An artifact's file name is its identity. The name embeds the creation
//! timestamp at second precision, so lexicographic order of names from one
//! [`NamingScheme`] equals chronological order, and two artifacts created in
//! different seconds can never collide.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::NameParseError;

/// Timestamp layout embedded in artifact names, e.g. `20260825_031500`.
///
/// Fixed-width and zero-padded, which is what makes names sortable.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// How artifact file names are built and recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingScheme {
    pub prefix: String,
    pub extension: String,
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self {
            prefix: "backup_".to_string(),
            extension: ".tar.zst".to_string(),
        }
    }
}

impl NamingScheme {
    /// Builds the file name for an artifact created at `at`.
    ///
    /// Sub-second precision is dropped; callers that need the stored
    /// timestamp back must go through [`truncate_to_seconds`] first.
    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}{}{}",
            self.prefix,
            at.format(TIMESTAMP_FORMAT),
            self.extension
        )
    }

    /// Whether `name` carries this scheme's prefix and extension.
    ///
    /// A matching name is a candidate artifact; it may still fail
    /// [`NamingScheme::parse`] if the middle is not a timestamp.
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name.ends_with(&self.extension)
    }

    /// Recovers the creation timestamp from an artifact file name.
    pub fn parse(&self, name: &str) -> Result<DateTime<Utc>, NameParseError> {
        let value = name
            .strip_prefix(&self.prefix)
            .and_then(|rest| rest.strip_suffix(&self.extension))
            .ok_or_else(|| NameParseError::NotManaged {
                name: name.to_string(),
            })?;
        let parsed = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|source| {
            NameParseError::BadTimestamp {
                name: name.to_string(),
                value: value.to_string(),
                source,
            }
        })?;
        Ok(parsed.and_utc())
    }
}

/// One backup archive under the storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// File name, unique per storage directory.
    pub name: String,
    /// Creation time recovered from (or encoded into) `name`.
    pub created_at: DateTime<Utc>,
    /// Absolute or config-relative location on disk.
    pub path: PathBuf,
}

impl Artifact {
    /// Builds an artifact handle from a file name found in `dir`.
    pub fn from_file_name(
        naming: &NamingScheme,
        dir: &Path,
        name: &str,
    ) -> Result<Self, NameParseError> {
        let created_at = naming.parse(name)?;
        Ok(Self {
            name: name.to_string(),
            created_at,
            path: dir.join(name),
        })
    }
}

/// Drops sub-second precision so a timestamp round-trips through a name.
pub fn truncate_to_seconds(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_nanosecond(0).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn file_name_round_trips() {
        let naming = NamingScheme::default();
        let stamp = at(2026, 8, 25, 3, 15, 0);
        let name = naming.file_name(stamp);
        assert_eq!(name, "backup_20260825_031500.tar.zst");
        assert_eq!(naming.parse(&name).unwrap(), stamp);
    }

    #[test]
    fn names_sort_chronologically() {
        let naming = NamingScheme::default();
        let older = naming.file_name(at(2026, 8, 9, 23, 59, 59));
        let newer = naming.file_name(at(2026, 8, 10, 0, 0, 0));
        assert!(older < newer);
    }

    #[test]
    fn custom_scheme_round_trips() {
        let naming = NamingScheme {
            prefix: "world_".to_string(),
            extension: ".zip".to_string(),
        };
        let stamp = at(2025, 1, 2, 3, 4, 5);
        let name = naming.file_name(stamp);
        assert_eq!(name, "world_20250102_030405.zip");
        assert_eq!(naming.parse(&name).unwrap(), stamp);
    }

    #[test]
    fn parse_rejects_foreign_names() {
        let naming = NamingScheme::default();
        let err = naming.parse("notes.txt").unwrap_err();
        assert!(matches!(err, NameParseError::NotManaged { .. }));
        assert!(!naming.matches("notes.txt"));
    }

    #[test]
    fn parse_rejects_mangled_timestamp() {
        let naming = NamingScheme::default();
        let err = naming.parse("backup_2026xx25_031500.tar.zst").unwrap_err();
        assert!(matches!(err, NameParseError::BadTimestamp { .. }));
        // Still a candidate by shape, which is why the scanner warns on it.
        assert!(naming.matches("backup_2026xx25_031500.tar.zst"));
    }

    #[test]
    fn truncation_drops_nanoseconds_only() {
        let precise = at(2026, 8, 25, 3, 15, 0) + chrono::TimeDelta::nanoseconds(999_999_999);
        assert_eq!(truncate_to_seconds(precise), at(2026, 8, 25, 3, 15, 0));
        assert_eq!(
            truncate_to_seconds(at(2026, 8, 25, 3, 15, 0)),
            at(2026, 8, 25, 3, 15, 0)
        );
    }

    #[test]
    fn from_file_name_builds_path_in_dir() {
        let naming = NamingScheme::default();
        let artifact =
            Artifact::from_file_name(&naming, Path::new("/vault"), "backup_20260825_031500.tar.zst")
                .unwrap();
        assert_eq!(artifact.path, PathBuf::from("/vault/backup_20260825_031500.tar.zst"));
        assert_eq!(artifact.created_at, at(2026, 8, 25, 3, 15, 0));
    }
}
