//! Registry error types
//!
//! Load errors are fatal for every command: nothing runs against a registry
//! that cannot be read or fails validation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read registry {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid registry {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Failed to write registry {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize registry: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RegistryError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::Read { .. } | RegistryError::Invalid { .. } => {
                "DOCVER_CONFIG_LOAD_FAILED"
            }
            RegistryError::Write { .. } | RegistryError::Serialize(_) => {
                "DOCVER_CONFIG_SAVE_FAILED"
            }
        }
    }

    /// Whether the error happened while loading
    pub fn is_load_failure(&self) -> bool {
        matches!(self, RegistryError::Read { .. } | RegistryError::Invalid { .. })
    }
}
