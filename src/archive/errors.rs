//! Archive error types
//!
//! Error codes:
//! - DOCVER_ARCHIVE_DESTINATION_EXISTS (ERROR severity)
//! - DOCVER_ARCHIVE_SOURCE_MISSING (WARNING severity)
//! - DOCVER_ARCHIVE_NOT_FOUND (ERROR severity)
//! - DOCVER_ARCHIVE_IO (ERROR severity)
//! - DOCVER_ARCHIVE_MANIFEST (ERROR severity)

use std::fmt;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Reported, remaining work continues
    Warning,
    /// Operation aborted
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Archive-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveErrorCode {
    /// Target archive (or tarball) is already populated
    DestinationExists,
    /// A required input does not exist
    SourceMissing,
    /// The archive to verify or pack does not exist
    NotFound,
    /// I/O failure while building or reading an archive
    Io,
    /// Manifest generation, write or parse failure
    Manifest,
}

impl ArchiveErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ArchiveErrorCode::DestinationExists => "DOCVER_ARCHIVE_DESTINATION_EXISTS",
            ArchiveErrorCode::SourceMissing => "DOCVER_ARCHIVE_SOURCE_MISSING",
            ArchiveErrorCode::NotFound => "DOCVER_ARCHIVE_NOT_FOUND",
            ArchiveErrorCode::Io => "DOCVER_ARCHIVE_IO",
            ArchiveErrorCode::Manifest => "DOCVER_ARCHIVE_MANIFEST",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ArchiveErrorCode::SourceMissing => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ArchiveErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Archive error with code, message and optional I/O cause
#[derive(Debug)]
pub struct ArchiveError {
    code: ArchiveErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl ArchiveError {
    fn new(code: ArchiveErrorCode, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source,
        }
    }

    /// The archive directory already has content
    pub fn destination_exists(path: &Path) -> Self {
        Self::new(
            ArchiveErrorCode::DestinationExists,
            format!("Archive already exists: {}", path.display()),
            None,
        )
    }

    pub fn source_missing(path: &Path) -> Self {
        Self::new(
            ArchiveErrorCode::SourceMissing,
            format!("Source does not exist: {}", path.display()),
            None,
        )
    }

    pub fn not_found(path: &Path) -> Self {
        Self::new(
            ArchiveErrorCode::NotFound,
            format!("No archive at {}", path.display()),
            None,
        )
    }

    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(ArchiveErrorCode::Io, message, Some(source))
    }

    /// I/O error with path context
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::new(
            ArchiveErrorCode::Io,
            format!("I/O error at path: {}", path.display()),
            Some(source),
        )
    }

    pub fn manifest_error(message: impl Into<String>) -> Self {
        Self::new(ArchiveErrorCode::Manifest, message, None)
    }

    pub fn manifest_io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(ArchiveErrorCode::Manifest, message, Some(source))
    }

    /// Add details to an error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn code(&self) -> ArchiveErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;
