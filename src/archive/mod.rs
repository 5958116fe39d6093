//! Immutable, version-labelled documentation archives
//!
//! An archive is a directory `<archive root>/v{version}/` holding a copy of
//! each configured source directory, a copy of the registry file and a
//! checksum manifest. Archives are created once and never modified:
//!
//! - Creation refuses a populated destination (`DestinationExists`)
//! - The tree is built under a hidden staging name and renamed into place
//! - Missing source directories are logged and recorded, not fatal
//! - `verify` is read-only
//! - `pack` writes a tarball beside the archive and refuses to overwrite it
//!
//! Archives do not reference the live registry and the live registry does
//! not reference them.

mod checksum;
mod creator;
mod errors;
mod manifest;
mod packer;
mod verify;

pub use checksum::{format_checksum, parse_checksum};
pub use creator::{archive_dir_name, create_archive, ArchiveReport, ArchiveRequest};
pub use errors::{ArchiveError, ArchiveErrorCode, ArchiveResult, Severity};
pub use manifest::{ArchiveManifest, FORMAT_VERSION, MANIFEST_FILE};
pub use packer::{pack_archive, tarball_path};
pub use verify::{verify_archive, VerifyReport};

use std::path::{Path, PathBuf};

use crate::registry::ArchiveSettings;
use crate::version::Version;

/// Archive operations bound to one documentation root
#[derive(Debug, Clone)]
pub struct ArchiveManager {
    docs_root: PathBuf,
    archive_root: PathBuf,
    sources: Vec<String>,
    registry_path: PathBuf,
}

impl ArchiveManager {
    pub fn new(docs_root: &Path, settings: &ArchiveSettings, registry_path: &Path) -> Self {
        Self {
            docs_root: docs_root.to_path_buf(),
            archive_root: docs_root.join(&settings.root),
            sources: settings.sources.clone(),
            registry_path: registry_path.to_path_buf(),
        }
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Directory an archive of `version` lives in, whether or not it exists
    pub fn archive_path(&self, version: Version) -> PathBuf {
        self.archive_root.join(archive_dir_name(version))
    }

    /// Create the archive for `version`.
    pub fn create(&self, version: Version) -> ArchiveResult<ArchiveReport> {
        create_archive(&ArchiveRequest {
            version,
            docs_root: &self.docs_root,
            sources: &self.sources,
            registry_path: &self.registry_path,
            archive_root: &self.archive_root,
        })
    }

    /// Recompute the checksums of an existing archive.
    pub fn verify(&self, version: Version) -> ArchiveResult<VerifyReport> {
        verify_archive(&self.archive_path(version))
    }

    /// Pack an existing archive into `v{version}.tar`.
    pub fn pack(&self, version: Version) -> ArchiveResult<PathBuf> {
        pack_archive(&self.archive_path(version))
    }
}
