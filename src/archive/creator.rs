//! Archive creation
//!
//! Creation follows this sequence:
//!
//! 1. Refuse if `v{version}/` already has content
//! 2. Create the hidden staging directory `.v{version}.partial/`
//! 3. Copy every configured source directory that exists (files fsynced)
//! 4. Copy the registry file
//! 5. Checksum every staged file and write `.archive-manifest.json`
//! 6. fsync the staging directory, rename it to `v{version}/`, fsync the archive root
//!
//! Any failure after step 2 removes the staging directory, so a half-built
//! archive is never visible under its final name.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::checksum::{compute_file_checksum, format_checksum};
use super::errors::{ArchiveError, ArchiveResult, Severity};
use super::manifest::{ArchiveManifest, MANIFEST_FILE};
use crate::observability::{self, Logger};
use crate::version::Version;

/// Inputs for one archive run
#[derive(Debug, Clone, Copy)]
pub struct ArchiveRequest<'a> {
    pub version: Version,
    /// Base that `sources` are relative to
    pub docs_root: &'a Path,
    pub sources: &'a [String],
    pub registry_path: &'a Path,
    /// Parent of the `v{version}/` directories
    pub archive_root: &'a Path,
}

/// Result of a completed archive run
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    pub version: Version,
    pub path: PathBuf,
    /// Sources copied into the archive
    pub archived: Vec<String>,
    /// Configured sources that did not exist
    pub missing: Vec<String>,
    pub manifest: ArchiveManifest,
}

impl ArchiveReport {
    /// Number of files recorded in the manifest
    pub fn file_count(&self) -> usize {
        self.manifest.files.len()
    }

    /// True when every configured source was archived
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// `v{version}` directory name
pub fn archive_dir_name(version: Version) -> String {
    format!("v{}", version)
}

fn staging_dir_name(version: Version) -> String {
    format!(".v{}.partial", version)
}

/// fsync a directory.
pub(super) fn fsync_dir(path: &Path) -> ArchiveResult<()> {
    let dir = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| ArchiveError::io_error_at_path(path, e))?;

    dir.sync_all().map_err(|e| {
        ArchiveError::io_error(format!("fsync directory failed: {}", path.display()), e)
    })
}

/// Copy a file byte-for-byte with fsync.
fn copy_file_with_fsync(src: &Path, dst: &Path) -> ArchiveResult<()> {
    let mut src_file = File::open(src).map_err(|e| {
        ArchiveError::io_error(format!("Failed to open source file: {}", src.display()), e)
    })?;

    let mut dst_file = File::create(dst).map_err(|e| {
        ArchiveError::io_error(
            format!("Failed to create destination file: {}", dst.display()),
            e,
        )
    })?;

    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = src_file.read(&mut buffer).map_err(|e| {
            ArchiveError::io_error(format!("Failed to read from: {}", src.display()), e)
        })?;

        if bytes_read == 0 {
            break;
        }

        dst_file.write_all(&buffer[..bytes_read]).map_err(|e| {
            ArchiveError::io_error(format!("Failed to write to: {}", dst.display()), e)
        })?;
    }

    dst_file
        .sync_all()
        .map_err(|e| ArchiveError::io_error(format!("fsync failed for: {}", dst.display()), e))
}

/// Recursively copy `src` into `dst`, never descending into `exclude`.
///
/// Symlinks and special files are skipped.
fn copy_dir_recursive(src: &Path, dst: &Path, exclude: &Path) -> ArchiveResult<()> {
    fs::create_dir_all(dst).map_err(|e| {
        ArchiveError::io_error(format!("Failed to create directory: {}", dst.display()), e)
    })?;

    let entries = fs::read_dir(src).map_err(|e| {
        ArchiveError::io_error(format!("Failed to read directory: {}", src.display()), e)
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            ArchiveError::io_error(
                format!("Failed to read directory entry in: {}", src.display()),
                e,
            )
        })?;

        let src_path = entry.path();
        if src_path == exclude {
            continue;
        }

        let file_type = entry
            .file_type()
            .map_err(|e| ArchiveError::io_error_at_path(&src_path, e))?;
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path, exclude)?;
        } else if file_type.is_file() {
            copy_file_with_fsync(&src_path, &dst_path)?;
        } else {
            let path = src_path.display().to_string();
            Logger::trace("ARCHIVE_ENTRY_SKIPPED", &[("path", path.as_str())]);
        }
    }

    fsync_dir(dst)
}

/// Every directory and file under `dir`, as (`a/b/c` relative path, fs path),
/// sorted by relative path.
pub(super) fn collect_entries(dir: &Path) -> ArchiveResult<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    collect_entries_recursive(dir, "", &mut entries)?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn collect_entries_recursive(
    current_dir: &Path,
    prefix: &str,
    entries: &mut Vec<(String, PathBuf)>,
) -> ArchiveResult<()> {
    let dir_entries = fs::read_dir(current_dir)
        .map_err(|e| ArchiveError::io_error_at_path(current_dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ArchiveError::io_error_at_path(current_dir, e))?;

    for entry in dir_entries {
        let fs_path = entry.path();
        let file_name = entry.file_name();
        let relative = if prefix.is_empty() {
            file_name.to_string_lossy().into_owned()
        } else {
            format!("{}/{}", prefix, file_name.to_string_lossy())
        };

        let file_type = entry
            .file_type()
            .map_err(|e| ArchiveError::io_error_at_path(&fs_path, e))?;

        if file_type.is_dir() {
            entries.push((relative.clone(), fs_path.clone()));
            collect_entries_recursive(&fs_path, &relative, entries)?;
        } else if file_type.is_file() {
            entries.push((relative, fs_path));
        }
    }

    Ok(())
}

/// Checksums of every regular file under `dir` except the manifest itself.
pub(super) fn compute_tree_checksums(dir: &Path) -> ArchiveResult<BTreeMap<String, String>> {
    let mut checksums = BTreeMap::new();

    for (relative, fs_path) in collect_entries(dir)? {
        if relative == MANIFEST_FILE || !fs_path.is_file() {
            continue;
        }
        let checksum = compute_file_checksum(&fs_path)?;
        checksums.insert(relative, format_checksum(checksum));
    }

    Ok(checksums)
}

/// Remove a staging directory (cleanup on failure).
fn cleanup_staging(path: &Path) {
    if path.exists() {
        let _ = fs::remove_dir_all(path);
    }
}

/// Fail with `DestinationExists` unless `target` is absent or an empty
/// directory. An empty directory is removed so the rename can take its place.
fn claim_destination(target: &Path) -> ArchiveResult<()> {
    let metadata = match fs::symlink_metadata(target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ArchiveError::io_error_at_path(target, e)),
    };

    if !metadata.is_dir() {
        return Err(ArchiveError::destination_exists(target));
    }

    let mut entries =
        fs::read_dir(target).map_err(|e| ArchiveError::io_error_at_path(target, e))?;
    if entries.next().is_some() {
        return Err(ArchiveError::destination_exists(target));
    }

    fs::remove_dir(target).map_err(|e| ArchiveError::io_error_at_path(target, e))
}

/// Create `archive_root/v{version}/`.
///
/// # Errors
///
/// `DestinationExists` if the archive is already populated; the existing
/// archive is left untouched. I/O and manifest failures abort the run and
/// remove the staging directory. Missing sources are not errors: they are
/// logged and listed in the report and the manifest.
pub fn create_archive(request: &ArchiveRequest<'_>) -> ArchiveResult<ArchiveReport> {
    let version = request.version;
    let version_str = version.to_string();
    let target = request.archive_root.join(archive_dir_name(version));
    let staging = request.archive_root.join(staging_dir_name(version));

    Logger::info(
        "ARCHIVE_START",
        &[
            ("version", version_str.as_str()),
            ("target", target.display().to_string().as_str()),
        ],
    );

    claim_destination(&target)?;

    if staging.exists() {
        Logger::warn(
            "ARCHIVE_STALE_STAGING_REMOVED",
            &[("path", staging.display().to_string().as_str())],
        );
        fs::remove_dir_all(&staging).map_err(|e| ArchiveError::io_error_at_path(&staging, e))?;
    }

    fs::create_dir_all(&staging).map_err(|e| {
        ArchiveError::io_error(
            format!("Failed to create staging directory: {}", staging.display()),
            e,
        )
    })?;

    let result = populate_staging(request, &staging).and_then(|report| {
        fs::rename(&staging, &target).map_err(|e| {
            ArchiveError::io_error(
                format!("Failed to move archive into place: {}", target.display()),
                e,
            )
        })?;
        fsync_dir(request.archive_root)?;
        Ok(report)
    });

    match result {
        Ok((archived, missing, manifest)) => {
            Logger::info(
                "ARCHIVE_CREATED",
                &[
                    ("files", manifest.files.len().to_string().as_str()),
                    ("missing", missing.len().to_string().as_str()),
                    ("version", version_str.as_str()),
                ],
            );
            Ok(ArchiveReport {
                version,
                path: target,
                archived,
                missing,
                manifest,
            })
        }
        Err(e) => {
            cleanup_staging(&staging);
            log_archive_error("ARCHIVE_FAILED", &e, &[("version", version_str.as_str())]);
            Err(e)
        }
    }
}

/// Log an archive error at the severity its code carries.
fn log_archive_error(event: &str, err: &ArchiveError, fields: &[(&str, &str)]) {
    let severity = match err.severity() {
        Severity::Warning => observability::Severity::Warn,
        Severity::Error => observability::Severity::Error,
    };
    let error = err.to_string();

    let mut all = vec![("code", err.code().code()), ("error", error.as_str())];
    all.extend_from_slice(fields);
    Logger::log(severity, event, &all);
}

/// Copy sources and registry into `staging`, then write the manifest.
fn populate_staging(
    request: &ArchiveRequest<'_>,
    staging: &Path,
) -> ArchiveResult<(Vec<String>, Vec<String>, ArchiveManifest)> {
    let mut archived = Vec::new();
    let mut missing = Vec::new();

    for source in request.sources {
        let src = request.docs_root.join(source);
        if !src.is_dir() {
            let err = ArchiveError::source_missing(&src);
            log_archive_error("ARCHIVE_SOURCE_MISSING", &err, &[("source", source.as_str())]);
            missing.push(source.clone());
            continue;
        }

        copy_dir_recursive(&src, &staging.join(source), request.archive_root)?;
        archived.push(source.clone());
    }

    let registry_file = request
        .registry_path
        .file_name()
        .ok_or_else(|| ArchiveError::source_missing(request.registry_path))?;
    if !request.registry_path.is_file() {
        return Err(ArchiveError::source_missing(request.registry_path));
    }
    copy_file_with_fsync(request.registry_path, &staging.join(registry_file))?;

    let files = compute_tree_checksums(staging)?;
    let manifest = ArchiveManifest::new(
        request.version,
        archived.clone(),
        missing.clone(),
        registry_file.to_string_lossy(),
        files,
    );
    manifest.write_to_file(&staging.join(MANIFEST_FILE))?;

    fsync_dir(staging)?;

    Ok((archived, missing, manifest))
}
