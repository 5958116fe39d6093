//! Version error types

use thiserror::Error;

/// Result type for version operations
pub type VersionResult<T> = Result<T, VersionError>;

/// Errors raised while parsing or advancing a version
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Malformed version: '{0}' (expected MAJOR.MINOR.PATCH)")]
    MalformedVersion(String),

    #[error("Invalid bump kind: '{0}' (expected major, minor or patch)")]
    InvalidBumpKind(String),

    #[error("Cannot apply a {kind} bump to {version}: component overflow")]
    Overflow { version: String, kind: String },
}

impl VersionError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            VersionError::MalformedVersion(_) => "DOCVER_MALFORMED_VERSION",
            VersionError::InvalidBumpKind(_) => "DOCVER_INVALID_BUMP_KIND",
            VersionError::Overflow { .. } => "DOCVER_VERSION_OVERFLOW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            VersionError::MalformedVersion("x".into()).code(),
            "DOCVER_MALFORMED_VERSION"
        );
        assert_eq!(
            VersionError::InvalidBumpKind("huge".into()).code(),
            "DOCVER_INVALID_BUMP_KIND"
        );
    }

    #[test]
    fn test_display_names_offending_input() {
        let err = VersionError::MalformedVersion("1.2".into());
        assert!(err.to_string().contains("'1.2'"));
    }
}
