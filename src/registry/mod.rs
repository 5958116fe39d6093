//! Registry: the documentation project's configuration store
//!
//! Holds the global version, the tracked documents and the archival
//! settings. It is loaded once per command, passed explicitly to the
//! handlers, mutated in memory and saved back by mutating commands only.
//!
//! # Invariants (checked on load)
//!
//! - every version string is a valid `MAJOR.MINOR.PATCH`
//! - every document status is `draft`, `active` or `deprecated`
//! - no document version is ahead of `versioning.current_version`
//! - archive sources are relative paths inside the documentation root

mod errors;
mod types;

pub use errors::{RegistryError, RegistryResult};
pub use types::{
    ArchiveSettings, DocumentEntry, DocumentStatus, ProjectInfo, Registry, Versioning,
    DIRECTORY_DOCUMENT,
};

use std::fs;
use std::path::{Component, Path};

use crate::durable::write_atomic;
use crate::version::Version;

/// Registry file name inside the documentation root
pub const REGISTRY_FILE: &str = ".version-config.json";

impl Registry {
    /// Load and validate the registry file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| RegistryError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_json(&content, path)
    }

    /// Parse and validate registry JSON. `origin` is only used in messages.
    pub fn from_json(content: &str, origin: &Path) -> RegistryResult<Self> {
        let registry: Registry = serde_json::from_str(content)
            .map_err(|e| RegistryError::invalid(origin, format!("invalid JSON: {}", e)))?;

        registry
            .validate()
            .map_err(|reason| RegistryError::invalid(origin, reason))?;

        Ok(registry)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        let current = self.current_version();

        for (key, doc) in &self.documents {
            if doc.path.trim().is_empty() {
                return Err(format!("document '{}' has an empty path", key));
            }
            if !is_contained(&doc.path) {
                return Err(format!(
                    "document '{}' path '{}' must be relative and stay inside the documentation root",
                    key, doc.path
                ));
            }
            if doc.version > current {
                return Err(format!(
                    "document '{}' is at {}, ahead of current version {}",
                    key, doc.version, current
                ));
            }
        }

        if let Some(settings) = &self.archive {
            for source in settings.sources.iter().chain(std::iter::once(&settings.root)) {
                if !is_contained(source) {
                    return Err(format!(
                        "archive path '{}' must be relative and stay inside the documentation root",
                        source
                    ));
                }
            }
        }

        Ok(())
    }

    /// Serialize to pretty JSON with a trailing newline.
    pub fn to_json(&self) -> RegistryResult<String> {
        let mut json = serde_json::to_string_pretty(self).map_err(RegistryError::Serialize)?;
        json.push('\n');
        Ok(json)
    }

    /// Persist the registry atomically.
    ///
    /// Nothing is written when serialization fails.
    pub fn save(&self, path: &Path) -> RegistryResult<()> {
        let json = self.to_json()?;
        write_atomic(path, json.as_bytes()).map_err(|e| RegistryError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn current_version(&self) -> Version {
        self.versioning.current_version
    }

    pub fn set_current_version(&mut self, version: Version) {
        self.versioning.current_version = version;
    }

    pub fn project_name(&self) -> &str {
        &self.project.name
    }

    pub fn archive_settings(&self) -> ArchiveSettings {
        self.archive.clone().unwrap_or_default()
    }
}

fn is_contained(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
