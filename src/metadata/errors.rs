//! Metadata block error types

use thiserror::Error;

/// Result type for metadata block operations
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised while reading or rewriting a metadata block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The document does not start with a delimited block.
    ///
    /// Callers treat this as "not tracked", never as a hard failure.
    #[error("No metadata block found")]
    NotFound,

    /// The block exists but does not have the expected shape.
    #[error("Malformed metadata block at line {line}: {reason}")]
    MalformedBlock { line: usize, reason: String },
}

impl MetadataError {
    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        MetadataError::MalformedBlock {
            line,
            reason: reason.into(),
        }
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            MetadataError::NotFound => "DOCVER_BLOCK_NOT_FOUND",
            MetadataError::MalformedBlock { .. } => "DOCVER_MALFORMED_BLOCK",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MetadataError::NotFound)
    }
}
