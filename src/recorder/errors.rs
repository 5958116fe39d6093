//! Change recorder error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::MetadataError;

/// Result type for recording a bump in one document
pub type RecordResult<T> = Result<T, RecordError>;

#[derive(Debug, Error)]
pub enum RecordError {
    /// Directory entry without a README.md
    #[error("No document file in {}", .path.display())]
    NoDocumentFile { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: MetadataError,
    },
}

impl RecordError {
    /// Whether the document is simply not under version tracking.
    ///
    /// Untracked documents are skipped; everything else is a failure.
    pub fn is_untracked(&self) -> bool {
        match self {
            RecordError::NoDocumentFile { .. } => true,
            RecordError::Metadata { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untracked_classification() {
        let path = PathBuf::from("doc.md");

        assert!(RecordError::NoDocumentFile { path: path.clone() }.is_untracked());
        assert!(RecordError::Metadata {
            path: path.clone(),
            source: MetadataError::NotFound
        }
        .is_untracked());

        assert!(!RecordError::Metadata {
            path: path.clone(),
            source: MetadataError::MalformedBlock {
                line: 3,
                reason: "bad".into()
            }
        }
        .is_untracked());
        assert!(!RecordError::Read {
            path,
            source: io::Error::new(io::ErrorKind::NotFound, "gone")
        }
        .is_untracked());
    }
}
