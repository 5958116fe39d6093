//! Archive verification
//!
//! Recomputes every checksum listed in `.archive-manifest.json` and compares
//! it with the recorded value. Files present on disk but absent from the
//! manifest are reported as unexpected. Nothing is written.

use std::path::{Path, PathBuf};

use super::checksum::{compute_file_checksum, format_checksum};
use super::creator::collect_entries;
use super::errors::{ArchiveError, ArchiveResult};
use super::manifest::{ArchiveManifest, MANIFEST_FILE};
use crate::observability::Logger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub path: PathBuf,
    /// Files whose checksum matched
    pub verified: usize,
    /// In the manifest but not on disk
    pub missing: Vec<String>,
    /// On disk with a different checksum
    pub mismatched: Vec<String>,
    /// On disk but not in the manifest
    pub unexpected: Vec<String>,
}

impl VerifyReport {
    pub fn is_intact(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty() && self.unexpected.is_empty()
    }

    /// Number of problems found
    pub fn problem_count(&self) -> usize {
        self.missing.len() + self.mismatched.len() + self.unexpected.len()
    }
}

/// Verify the archive rooted at `archive_dir`.
///
/// # Errors
///
/// `NotFound` if the directory does not exist, `Manifest` if the manifest is
/// missing or unreadable. Checksum problems are not errors; they are listed
/// in the report.
pub fn verify_archive(archive_dir: &Path) -> ArchiveResult<VerifyReport> {
    if !archive_dir.is_dir() {
        return Err(ArchiveError::not_found(archive_dir));
    }

    let manifest = ArchiveManifest::read_from_file(&archive_dir.join(MANIFEST_FILE))?;

    let mut report = VerifyReport {
        path: archive_dir.to_path_buf(),
        verified: 0,
        missing: Vec::new(),
        mismatched: Vec::new(),
        unexpected: Vec::new(),
    };

    for (relative, expected) in &manifest.files {
        let path = archive_dir.join(relative);
        if !path.is_file() {
            Logger::warn("ARCHIVE_FILE_MISSING", &[("file", relative.as_str())]);
            report.missing.push(relative.clone());
            continue;
        }

        let actual = format_checksum(compute_file_checksum(&path)?);
        if &actual == expected {
            report.verified += 1;
        } else {
            Logger::warn(
                "ARCHIVE_CHECKSUM_MISMATCH",
                &[
                    ("actual", actual.as_str()),
                    ("expected", expected.as_str()),
                    ("file", relative.as_str()),
                ],
            );
            report.mismatched.push(relative.clone());
        }
    }

    for (relative, fs_path) in collect_entries(archive_dir)? {
        if relative == MANIFEST_FILE || !fs_path.is_file() {
            continue;
        }
        if !manifest.files.contains_key(&relative) {
            Logger::warn("ARCHIVE_FILE_UNEXPECTED", &[("file", relative.as_str())]);
            report.unexpected.push(relative);
        }
    }

    Ok(report)
}
