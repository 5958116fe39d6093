//! Change recorder
//!
//! Records a version bump inside each tracked document's metadata block and
//! drives the batch over the whole registry.
//!
//! # Batch semantics
//!
//! - Every document is attempted; one failure never stops the batch.
//! - Untracked documents (no metadata block, directory without README.md)
//!   are skipped with a warning.
//! - Malformed blocks and read/write errors are failures; the document is
//!   left untouched.
//! - Documents that were updated get their registry version set to the new
//!   version. Skipped and failed documents keep their old version.
//! - The global version advances regardless, so no document is ever ahead
//!   of it.

mod errors;

pub use errors::{RecordError, RecordResult};

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::durable::write_atomic;
use crate::metadata;
use crate::observability::Logger;
use crate::registry::{DocumentEntry, Registry};
use crate::version::{BumpKind, Version, VersionResult};

/// Change description used when none is given
pub const DEFAULT_CHANGE: &str = "Routine update";

/// Split a comma-separated change list, falling back to [`DEFAULT_CHANGE`].
pub fn parse_changes(arg: Option<&str>) -> Vec<String> {
    let changes: Vec<String> = arg
        .unwrap_or("")
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    if changes.is_empty() {
        vec![DEFAULT_CHANGE.to_string()]
    } else {
        changes
    }
}

/// Record a bump in one document.
///
/// Returns the path of the rewritten file. The file is replaced atomically
/// and only after the new text was produced successfully.
pub fn record_bump(
    entry: &DocumentEntry,
    root: &Path,
    new_version: Version,
    changes: &[String],
    date: NaiveDate,
) -> RecordResult<PathBuf> {
    let path = entry.resolve(root).ok_or_else(|| RecordError::NoDocumentFile {
        path: root.join(&entry.path),
    })?;

    let text = fs::read_to_string(&path).map_err(|e| RecordError::Read {
        path: path.clone(),
        source: e,
    })?;

    let updated = metadata::apply_version_bump(&text, new_version, changes, date).map_err(|e| {
        RecordError::Metadata {
            path: path.clone(),
            source: e,
        }
    })?;

    write_atomic(&path, updated.as_bytes()).map_err(|e| RecordError::Write {
        path: path.clone(),
        source: e,
    })?;

    Ok(path)
}

/// What a bump asks for
#[derive(Debug, Clone)]
pub struct BumpRequest {
    pub kind: BumpKind,
    pub changes: Vec<String>,
    /// Restrict the batch to these document keys
    pub only: Option<Vec<String>>,
    pub date: NaiveDate,
}

/// Result for a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Updated { path: PathBuf },
    Skipped { reason: String },
    Failed { reason: String },
}

/// Result of a whole bump batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpReport {
    pub previous: Version,
    pub version: Version,
    /// Per document, in processing order
    pub outcomes: Vec<(String, DocumentOutcome)>,
}

impl BumpReport {
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Updated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Failed { .. }))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Bump the global version and record the change in every targeted document.
///
/// Fails only when the version cannot be advanced, before any document or
/// the registry is touched.
pub fn bump_documents(
    registry: &mut Registry,
    root: &Path,
    request: &BumpRequest,
) -> VersionResult<BumpReport> {
    let previous = registry.current_version();
    let version = previous.increment(request.kind)?;
    let prev_str = previous.to_string();
    let version_str = version.to_string();

    Logger::info(
        "BUMP_START",
        &[("from", prev_str.as_str()), ("to", version_str.as_str()), ("kind", request.kind.as_str())],
    );

    let targets: Vec<String> = match &request.only {
        Some(keys) => {
            let mut seen = BTreeSet::new();
            keys.iter().filter(|k| seen.insert(k.as_str())).cloned().collect()
        }
        None => registry.documents.keys().cloned().collect(),
    };

    let mut outcomes = Vec::with_capacity(targets.len());

    for key in targets {
        let entry = match registry.documents.get(&key) {
            Some(entry) => entry,
            None => {
                Logger::warn("DOC_SKIPPED", &[("doc", key.as_str()), ("reason", "not in registry")]);
                outcomes.push((
                    key,
                    DocumentOutcome::Skipped {
                        reason: "not in registry".to_string(),
                    },
                ));
                continue;
            }
        };

        let outcome = match record_bump(entry, root, version, &request.changes, request.date) {
            Ok(path) => {
                let path_str = path.display().to_string();
                Logger::info(
                    "DOC_UPDATED",
                    &[("doc", key.as_str()), ("path", path_str.as_str()), ("version", version_str.as_str())],
                );
                DocumentOutcome::Updated { path }
            }
            Err(e) if e.is_untracked() => {
                let reason = e.to_string();
                Logger::warn("DOC_SKIPPED", &[("doc", key.as_str()), ("reason", reason.as_str())]);
                DocumentOutcome::Skipped { reason }
            }
            Err(e) => {
                let reason = e.to_string();
                Logger::error("DOC_FAILED", &[("doc", key.as_str()), ("reason", reason.as_str())]);
                DocumentOutcome::Failed { reason }
            }
        };

        if matches!(outcome, DocumentOutcome::Updated { .. }) {
            if let Some(entry) = registry.documents.get_mut(&key) {
                entry.version = version;
            }
        }

        outcomes.push((key, outcome));
    }

    registry.set_current_version(version);

    Ok(BumpReport {
        previous,
        version,
        outcomes,
    })
}
