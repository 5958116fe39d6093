//! Archive manifest
//!
//! Stored as `.archive-manifest.json` at the top of every archive:
//!
//! ```json
//! {
//!   "archive_id": "2b0c0f1e-7d6a-4b5e-9f0c-2a1d3e4f5a6b",
//!   "version": "1.1.0",
//!   "created_at": "2026-10-18T09:30:00Z",
//!   "sources": ["architecture", "features"],
//!   "missing_sources": [],
//!   "registry_file": ".version-config.json",
//!   "files": {
//!     "architecture/README.md": "crc32:0a1b2c3d"
//!   },
//!   "format_version": 1
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::checksum::parse_checksum;
use super::errors::{ArchiveError, ArchiveResult};
use crate::version::Version;

/// Manifest file name inside an archive directory
pub const MANIFEST_FILE: &str = ".archive-manifest.json";

/// Current manifest format
pub const FORMAT_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveManifest {
    /// Unique per archive run
    pub archive_id: Uuid,

    pub version: Version,

    pub created_at: DateTime<Utc>,

    /// Source directories that were copied
    pub sources: Vec<String>,

    /// Configured source directories that did not exist
    pub missing_sources: Vec<String>,

    /// Name of the registry copy inside the archive
    pub registry_file: String,

    /// Relative path (with `/` separators) -> `crc32:xxxxxxxx`
    pub files: BTreeMap<String, String>,

    pub format_version: u8,
}

impl ArchiveManifest {
    pub fn new(
        version: Version,
        sources: Vec<String>,
        missing_sources: Vec<String>,
        registry_file: impl Into<String>,
        files: BTreeMap<String, String>,
    ) -> Self {
        Self {
            archive_id: Uuid::new_v4(),
            version,
            created_at: Utc::now(),
            sources,
            missing_sources,
            registry_file: registry_file.into(),
            files,
            format_version: FORMAT_VERSION,
        }
    }

    pub fn to_json(&self) -> ArchiveResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ArchiveError::manifest_error(format!("Failed to serialize manifest: {}", e))
        })
    }

    pub fn from_json(json: &str) -> ArchiveResult<Self> {
        let manifest: Self = serde_json::from_str(json).map_err(|e| {
            ArchiveError::manifest_error(format!("Failed to parse manifest: {}", e))
        })?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(ArchiveError::manifest_error("Unsupported manifest format_version")
                .with_details(format!(
                    "found {}, expected {}",
                    manifest.format_version, FORMAT_VERSION
                )));
        }

        if let Some((path, checksum)) = manifest
            .files
            .iter()
            .find(|(_, checksum)| parse_checksum(checksum).is_none())
        {
            return Err(ArchiveError::manifest_error("Malformed checksum in manifest")
                .with_details(format!("{}: '{}'", path, checksum)));
        }

        Ok(manifest)
    }

    /// Write the manifest with fsync.
    pub fn write_to_file(&self, path: &Path) -> ArchiveResult<()> {
        let json = self.to_json()?;

        let mut file = File::create(path).map_err(|e| {
            ArchiveError::manifest_io_error(
                format!("Failed to create manifest file: {}", path.display()),
                e,
            )
        })?;

        file.write_all(json.as_bytes()).map_err(|e| {
            ArchiveError::manifest_io_error(
                format!("Failed to write manifest: {}", path.display()),
                e,
            )
        })?;

        file.sync_all().map_err(|e| {
            ArchiveError::manifest_io_error(
                format!("Failed to fsync manifest: {}", path.display()),
                e,
            )
        })
    }

    pub fn read_from_file(path: &Path) -> ArchiveResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            ArchiveError::manifest_io_error(
                format!("Failed to read manifest: {}", path.display()),
                e,
            )
        })?;

        Self::from_json(&json)
    }
}
