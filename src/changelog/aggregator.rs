//! Merge per-document change histories into one changelog

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::metadata::{self, DATE_FORMAT};
use crate::observability::Logger;
use crate::registry::Registry;
use crate::version::Version;

/// Heading of the generated file
pub const CHANGELOG_TITLE: &str = "# Changelog";

/// All changes recorded for one version across documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedEntry {
    /// Date of the last entry merged into this bucket
    pub date: NaiveDate,
    /// `[documentKey] description`, in registry order then history order
    pub changes: Vec<String>,
}

/// Why a document contributed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Omission {
    /// No metadata block or no document file
    Untracked,
    /// Unreadable file or malformed block
    Unreadable(String),
}

/// Collected changelog buckets plus the documents that were left out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changelog {
    pub entries: BTreeMap<Version, AggregatedEntry>,
    pub omitted: Vec<(String, Omission)>,
    pub documents_read: usize,
}

/// Walk the registry and merge every document's history by version.
pub fn collect(registry: &Registry, root: &Path) -> Changelog {
    let mut changelog = Changelog::default();

    for (key, entry) in &registry.documents {
        let path = match entry.resolve(root) {
            Some(path) => path,
            None => {
                Logger::info("CHANGELOG_DOC_UNTRACKED", &[("doc", key.as_str()), ("reason", "no document file")]);
                changelog.omitted.push((key.clone(), Omission::Untracked));
                continue;
            }
        };

        let block = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))
            .and_then(|text| {
                metadata::read(&text).map_err(|e| format!("{}: {}", path.display(), e))
            });

        let block = match block {
            Ok(Some(block)) => block,
            Ok(None) => {
                Logger::info("CHANGELOG_DOC_UNTRACKED", &[("doc", key.as_str()), ("reason", "no metadata block")]);
                changelog.omitted.push((key.clone(), Omission::Untracked));
                continue;
            }
            Err(reason) => {
                Logger::warn("CHANGELOG_DOC_SKIPPED", &[("doc", key.as_str()), ("reason", reason.as_str())]);
                changelog.omitted.push((key.clone(), Omission::Unreadable(reason)));
                continue;
            }
        };

        changelog.documents_read += 1;

        for change in block.history() {
            let bucket = changelog
                .entries
                .entry(change.version)
                .or_insert_with(|| AggregatedEntry {
                    date: change.date,
                    changes: Vec::new(),
                });
            bucket.date = change.date;
            bucket
                .changes
                .extend(change.changes.iter().map(|c| format!("[{}] {}", key, c)));
        }
    }

    changelog
}

/// Render newest version first.
pub fn render(changelog: &Changelog) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}\n\n", CHANGELOG_TITLE);

    for (version, entry) in changelog.entries.iter().rev() {
        let _ = write!(out, "## [{}] - {}\n\n", version, entry.date.format(DATE_FORMAT));
        for change in &entry.changes {
            let _ = writeln!(out, "- {}", change);
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::REGISTRY_FILE;
    use tempfile::TempDir;

    fn setup(docs: &[(&str, &str)]) -> (TempDir, Registry) {
        let temp_dir = TempDir::new().unwrap();
        let mut documents = serde_json::Map::new();

        for (key, text) in docs {
            let file = format!("{}.md", key);
            fs::write(temp_dir.path().join(&file), text).unwrap();
            documents.insert(
                key.to_string(),
                serde_json::json!({ "path": file, "version": "1.0.0", "status": "active" }),
            );
        }

        let json = serde_json::json!({
            "project": { "name": "Test" },
            "versioning": { "current_version": "1.1.0" },
            "documents": documents,
        });
        let registry = Registry::from_json(&json.to_string(), Path::new(REGISTRY_FILE)).unwrap();
        (temp_dir, registry)
    }

    const ALPHA: &str = "---\nversion: 1.1.0\nchangelog:\n  - version: 1.1.0\n    date: 2026-10-18\n    changes: [\"cache\", \"index\"]\n  - version: 1.0.0\n    date: 2024-01-15\n    changes: [\"initial\"]\n---\n";
    const BETA: &str = "---\nversion: 1.1.0\nchangelog:\n  - version: 1.1.0\n    date: 2026-10-18\n    changes: [\"cache\"]\n  - version: 1.0.10\n    date: 2025-03-01\n    changes: [\"patch\"]\n---\n";

    #[test]
    fn test_collect_merges_by_version() {
        let (temp_dir, registry) = setup(&[("alpha", ALPHA), ("beta", BETA)]);
        let changelog = collect(&registry, temp_dir.path());

        assert_eq!(changelog.documents_read, 2);
        assert_eq!(changelog.entries.len(), 3);
        assert_eq!(
            changelog.entries[&Version::new(1, 1, 0)].changes,
            vec!["[alpha] cache", "[alpha] index", "[beta] cache"]
        );
    }

    #[test]
    fn test_render_orders_newest_first() {
        let (temp_dir, registry) = setup(&[("alpha", ALPHA), ("beta", BETA)]);
        let text = render(&collect(&registry, temp_dir.path()));

        assert_eq!(
            text,
            "# Changelog\n\n\
             ## [1.1.0] - 2026-10-18\n\n\
             - [alpha] cache\n\
             - [alpha] index\n\
             - [beta] cache\n\n\
             ## [1.0.10] - 2025-03-01\n\n\
             - [beta] patch\n\n\
             ## [1.0.0] - 2024-01-15\n\n\
             - [alpha] initial\n\n"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let (temp_dir, registry) = setup(&[("alpha", ALPHA), ("beta", BETA)]);
        let first = render(&collect(&registry, temp_dir.path()));
        let second = render(&collect(&registry, temp_dir.path()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_last_writer_wins_on_date() {
        let gamma = ALPHA.replace("2026-10-18", "2026-10-19");
        let (temp_dir, registry) = setup(&[("alpha", ALPHA), ("gamma", &gamma)]);
        let changelog = collect(&registry, temp_dir.path());

        assert_eq!(
            changelog.entries[&Version::new(1, 1, 0)].date,
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );
    }

    #[test]
    fn test_omits_untracked_and_malformed() {
        let broken = "---\nversion: 1.0.0\nchangelog:\n  - date: nope\n---\n";
        let (temp_dir, registry) = setup(&[("alpha", ALPHA), ("broken", broken), ("plain", "# plain\n")]);
        let changelog = collect(&registry, temp_dir.path());

        assert_eq!(changelog.documents_read, 1);
        assert_eq!(changelog.omitted.len(), 2);
        assert!(matches!(changelog.omitted[0], (ref k, Omission::Unreadable(_)) if k == "broken"));
        assert_eq!(changelog.omitted[1], ("plain".to_string(), Omission::Untracked));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&Changelog::default()), "# Changelog\n\n");
    }
}
