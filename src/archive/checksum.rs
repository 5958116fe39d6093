//! CRC32 checksums for archived files
//!
//! Every archived file is listed in the manifest as `crc32:xxxxxxxx`
//! (IEEE polynomial via crc32fast, lowercase hex, zero-padded).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crc32fast::Hasher;

use super::errors::{ArchiveError, ArchiveResult};

/// CRC32 of a whole file, read in chunks
pub fn compute_file_checksum(path: &Path) -> ArchiveResult<u32> {
    let file = File::open(path).map_err(|e| ArchiveError::io_error_at_path(path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| ArchiveError::io_error_at_path(path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Format as `crc32:XXXXXXXX`
pub fn format_checksum(checksum: u32) -> String {
    format!("crc32:{:08x}", checksum)
}

/// Parse `crc32:XXXXXXXX`, `None` on any other shape
pub fn parse_checksum(formatted: &str) -> Option<u32> {
    let stripped = formatted.strip_prefix("crc32:")?;
    if stripped.len() != 8 {
        return None;
    }
    u32::from_str_radix(stripped, 16).ok()
}
