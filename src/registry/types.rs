//! Registry file structure
//!
//! ```json
//! {
//!   "project": { "name": "SiCal" },
//!   "versioning": { "current_version": "1.0.0", "scheme": "semantic" },
//!   "documents": {
//!     "architecture": { "path": "architecture/", "version": "1.0.0", "status": "active" }
//!   },
//!   "archive": { "root": "versions", "sources": ["architecture", "features"] }
//! }
//! ```
//!
//! Keys this crate does not know about are kept in `extra` maps and written
//! back unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::version::Version;

/// File name of the tracked document inside a directory entry
pub const DIRECTORY_DOCUMENT: &str = "README.md";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub project: ProjectInfo,

    pub versioning: Versioning,

    /// Tracked documents by key; iterates in key order
    #[serde(default)]
    pub documents: BTreeMap<String, DocumentEntry>,

    /// Archival settings (optional, see [`ArchiveSettings::default`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveSettings>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioning {
    pub current_version: Version,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_scheme() -> String {
    "semantic".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Path relative to the documentation root; a directory means its README.md
    pub path: String,

    pub version: Version,

    pub status: DocumentStatus,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentEntry {
    pub fn new(path: impl Into<String>, version: Version, status: DocumentStatus) -> Self {
        Self {
            path: path.into(),
            version,
            status,
            extra: Map::new(),
        }
    }

    /// Resolve the file holding this document's metadata block.
    ///
    /// Returns `None` for a directory without a README.md. A path that does
    /// not exist resolves to itself so that reading it reports the I/O error.
    pub fn resolve(&self, root: &Path) -> Option<PathBuf> {
        let path = root.join(&self.path);
        if path.is_dir() {
            let readme = path.join(DIRECTORY_DOCUMENT);
            readme.is_file().then_some(readme)
        } else {
            Some(path)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Active,
    Deprecated,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Active => "active",
            DocumentStatus::Deprecated => "deprecated",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Directory under the documentation root holding `v{version}/` archives
    #[serde(default = "default_archive_root")]
    pub root: String,

    /// Directories (relative to the documentation root) copied into each archive
    #[serde(default = "default_archive_sources")]
    pub sources: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_archive_root() -> String {
    "versions".to_string()
}

fn default_archive_sources() -> Vec<String> {
    vec!["architecture".to_string(), "features".to_string()]
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            root: default_archive_root(),
            sources: default_archive_sources(),
            extra: Map::new(),
        }
    }
}
