//! Tarball packing for finished archives
//!
//! - Standard uncompressed tar
//! - Entries prefixed with the archive directory name (`v1.1.0/...`)
//! - Deterministic entry order and headers
//! - Written to a temporary sibling, fsynced, then renamed into place

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tar::{Builder, HeaderMode};

use super::creator::{collect_entries, fsync_dir};
use super::errors::{ArchiveError, ArchiveResult};
use crate::observability::Logger;

/// `v1.1.0` -> `v1.1.0.tar` next to the archive directory
pub fn tarball_path(archive_dir: &Path) -> PathBuf {
    let mut name = archive_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tar");
    archive_dir.with_file_name(name)
}

fn tar_error(message: String, err: io::Error) -> ArchiveError {
    ArchiveError::io_error(message, err)
}

/// Pack `archive_dir` into a tarball beside it and return the tarball path.
///
/// # Errors
///
/// `NotFound` if the archive directory is missing, `DestinationExists` if the
/// tarball already exists. A failed write leaves no tarball behind.
pub fn pack_archive(archive_dir: &Path) -> ArchiveResult<PathBuf> {
    if !archive_dir.is_dir() {
        return Err(ArchiveError::not_found(archive_dir));
    }

    let output_path = tarball_path(archive_dir);
    if output_path.exists() {
        return Err(ArchiveError::destination_exists(&output_path));
    }

    let mut partial_name = output_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    partial_name.push(".partial");
    let partial_path = output_path.with_file_name(partial_name);

    let result = write_tarball(archive_dir, &partial_path).and_then(|()| {
        fs::rename(&partial_path, &output_path).map_err(|e| {
            tar_error(
                format!("Failed to move tarball into place: {}", output_path.display()),
                e,
            )
        })?;
        if let Some(parent) = output_path.parent() {
            fsync_dir(parent)?;
        }
        Ok(())
    });

    if let Err(e) = result {
        let _ = fs::remove_file(&partial_path);
        return Err(e);
    }

    Logger::info(
        "ARCHIVE_PACKED",
        &[("path", output_path.display().to_string().as_str())],
    );

    Ok(output_path)
}

fn write_tarball(archive_dir: &Path, output_path: &Path) -> ArchiveResult<()> {
    let prefix = archive_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::not_found(archive_dir))?;

    let file = File::create(output_path).map_err(|e| {
        tar_error(
            format!("Failed to create tarball: {}", output_path.display()),
            e,
        )
    })?;

    let mut builder = Builder::new(BufWriter::new(file));
    builder.mode(HeaderMode::Deterministic);

    builder
        .append_dir(&prefix, archive_dir)
        .map_err(|e| tar_error(format!("Failed to add directory to tarball: {}", prefix), e))?;

    for (relative, fs_path) in collect_entries(archive_dir)? {
        let entry_path = format!("{}/{}", prefix, relative);

        if fs_path.is_dir() {
            builder.append_dir(&entry_path, &fs_path).map_err(|e| {
                tar_error(format!("Failed to add directory to tarball: {}", entry_path), e)
            })?;
        } else {
            let mut file =
                File::open(&fs_path).map_err(|e| ArchiveError::io_error_at_path(&fs_path, e))?;
            builder.append_file(&entry_path, &mut file).map_err(|e| {
                tar_error(format!("Failed to add file to tarball: {}", entry_path), e)
            })?;
        }
    }

    let writer = builder
        .into_inner()
        .map_err(|e| tar_error("Failed to finish tarball".to_string(), e))?;

    let file = writer.into_inner().map_err(|e| {
        tar_error("Failed to flush tarball buffer".to_string(), e.into_error())
    })?;

    file.sync_all().map_err(|e| {
        tar_error(format!("Failed to fsync tarball: {}", output_path.display()), e)
    })
}
