//! CLI-specific error types
//!
//! Every CLI error ends the command with exit code 1. Usage errors are
//! reported by clap itself (exit code 2) and never reach this type.

use std::fmt;
use std::io;

use crate::archive::{ArchiveError, ArchiveErrorCode};
use crate::changelog::ChangelogError;
use crate::registry::RegistryError;
use crate::version::VersionError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Registry missing, unreadable or invalid
    ConfigLoadFailed,
    /// Registry could not be written back
    ConfigSaveFailed,
    /// Version argument is not MAJOR.MINOR.PATCH
    MalformedVersion,
    /// Bump kind is not major, minor or patch
    InvalidBumpKind,
    /// Bump would overflow a version component
    VersionOverflow,
    /// Command finished but some units failed or were missing
    PartialFailure,
    /// Archive or tarball already exists
    DestinationExists,
    /// No archive for the requested version
    ArchiveNotFound,
    /// Archive creation or packing failed
    ArchiveFailed,
    /// Archive contents differ from the manifest
    VerifyFailed,
    /// Changelog could not be written
    ChangelogFailed,
    /// I/O error writing command output
    IoError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigLoadFailed => "DOCVER_CLI_CONFIG_LOAD_FAILED",
            Self::ConfigSaveFailed => "DOCVER_CLI_CONFIG_SAVE_FAILED",
            Self::MalformedVersion => "DOCVER_CLI_MALFORMED_VERSION",
            Self::InvalidBumpKind => "DOCVER_CLI_INVALID_BUMP_KIND",
            Self::VersionOverflow => "DOCVER_CLI_VERSION_OVERFLOW",
            Self::PartialFailure => "DOCVER_CLI_PARTIAL_FAILURE",
            Self::DestinationExists => "DOCVER_CLI_DESTINATION_EXISTS",
            Self::ArchiveNotFound => "DOCVER_CLI_ARCHIVE_NOT_FOUND",
            Self::ArchiveFailed => "DOCVER_CLI_ARCHIVE_FAILED",
            Self::VerifyFailed => "DOCVER_CLI_VERIFY_FAILED",
            Self::ChangelogFailed => "DOCVER_CLI_CHANGELOG_FAILED",
            Self::IoError => "DOCVER_CLI_IO_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn partial_failure(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::PartialFailure, msg)
    }

    pub fn verify_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::VerifyFailed, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        let code = if e.is_load_failure() {
            CliErrorCode::ConfigLoadFailed
        } else {
            CliErrorCode::ConfigSaveFailed
        };
        Self::new(code, e.to_string())
    }
}

impl From<VersionError> for CliError {
    fn from(e: VersionError) -> Self {
        let code = match e {
            VersionError::MalformedVersion(_) => CliErrorCode::MalformedVersion,
            VersionError::InvalidBumpKind(_) => CliErrorCode::InvalidBumpKind,
            VersionError::Overflow { .. } => CliErrorCode::VersionOverflow,
        };
        Self::new(code, e.to_string())
    }
}

impl From<ArchiveError> for CliError {
    fn from(e: ArchiveError) -> Self {
        let code = match e.code() {
            ArchiveErrorCode::DestinationExists => CliErrorCode::DestinationExists,
            ArchiveErrorCode::NotFound => CliErrorCode::ArchiveNotFound,
            _ => CliErrorCode::ArchiveFailed,
        };
        Self::new(code, e.to_string())
    }
}

impl From<ChangelogError> for CliError {
    fn from(e: ChangelogError) -> Self {
        Self::new(CliErrorCode::ChangelogFailed, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
