//! Archive creation: snapshot a source tree into a compressed artifact.
//!
//! The artifact is staged as a temp file in the storage directory and renamed
//! into place only after the tar stream and the zstd frame are both finished,
//! so a crash mid-write never leaves a half-artifact under a managed name.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::domain::{truncate_to_seconds, Artifact, NamingScheme, Result};
use crate::obs;

/// Compression level for artifact payloads. Zstd's default band; favours
/// throughput over ratio, which suits nightly world-sized trees.
const ZSTD_LEVEL: i32 = 3;

/// Builds artifacts from a source directory.
#[derive(Debug, Clone)]
pub struct Archiver {
    naming: NamingScheme,
}

impl Archiver {
    pub fn new(naming: NamingScheme) -> Self {
        Self { naming }
    }

    /// Archives `source_dir` into a new artifact under `storage_dir`.
    ///
    /// The artifact name is derived from `now` truncated to seconds. Running
    /// twice within the same second replaces the earlier artifact; the rename
    /// at the end makes the replacement atomic.
    ///
    /// Only regular files are captured, stored with paths relative to
    /// `source_dir`. Symlinks and other special files are skipped.
    pub fn create_artifact(
        &self,
        source_dir: &Path,
        storage_dir: &Path,
        now: DateTime<Utc>,
    ) -> Result<Artifact> {
        let meta = fs::metadata(source_dir)?;
        if !meta.is_dir() {
            return Err(io::Error::other(format!(
                "source {:?} is not a directory",
                source_dir
            ))
            .into());
        }

        let created_at = truncate_to_seconds(now);
        let name = self.naming.file_name(created_at);
        let path = storage_dir.join(&name);

        let staging = NamedTempFile::new_in(storage_dir)?;
        let encoder = zstd::Encoder::new(staging, ZSTD_LEVEL)?;
        let mut builder = tar::Builder::new(encoder);

        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(io::Error::other)?;
            builder.append_path_with_name(entry.path(), relative)?;
        }

        let encoder = builder.into_inner()?;
        let staging = encoder.finish()?;
        staging.persist(&path).map_err(|e| e.error)?;

        let bytes = fs::metadata(&path)?.len();
        obs::emit_artifact_created(&name, bytes);

        Ok(Artifact {
            name,
            created_at,
            path,
        })
    }
}
