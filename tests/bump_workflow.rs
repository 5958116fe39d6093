//! Bump Workflow Tests
//!
//! End-to-end runs of the operator workflow against a documentation root:
//! - bump advances the project version and every healthy document
//! - a corrupted document fails alone, the batch continues, the exit is non-zero
//! - changelog merges the recorded histories into one section per version
//! - the registry never holds a document ahead of the project version

use chrono::NaiveDate;
use docver::changelog::CHANGELOG_FILE;
use docver::cli::{run_command, CliErrorCode, CliResult, Command};
use docver::metadata;
use docver::registry::{Registry, REGISTRY_FILE};
use docver::version::Version;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

const ARCHITECTURE: &str = "---\n\
version: \"1.0.0\"\n\
last_updated: \"2024-01-15\"\n\
owner: \"platform-team\"\n\
changelog:\n  - version: \"1.0.0\"\n    date: \"2024-01-15\"\n    changes: [\"Initial architecture\"]\n\
---\n\
# Architecture\n\nService layout.\n";

const FEATURES: &str = "---\n\
version: \"1.0.0\"\n\
last_updated: \"2024-01-15\"\n\
changelog:\n  - version: \"1.0.0\"\n    date: \"2024-01-15\"\n    changes: [\"Initial features\"]\n\
---\n\
# Features\n";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn create_docs_root() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    fs::create_dir_all(root.join("architecture")).unwrap();
    fs::write(root.join("architecture/README.md"), ARCHITECTURE).unwrap();
    fs::create_dir_all(root.join("features")).unwrap();
    fs::write(root.join("features/README.md"), FEATURES).unwrap();

    let registry = serde_json::json!({
        "project": { "name": "Knowledge Base" },
        "versioning": { "current_version": "1.0.0", "scheme": "semantic" },
        "documents": {
            "architecture": { "path": "architecture", "version": "1.0.0", "status": "active" },
            "features": { "path": "features/README.md", "version": "1.0.0", "status": "draft" }
        }
    });
    fs::write(
        root.join(REGISTRY_FILE),
        serde_json::to_string_pretty(&registry).unwrap(),
    )
    .unwrap();

    temp_dir
}

fn run(root: &Path, command: Command) -> (CliResult<()>, String) {
    let mut out = Vec::new();
    let result = run_command(root, Some(command), today(), &mut out);
    (result, String::from_utf8(out).unwrap())
}

fn bump(kind: &str, changes: Option<&str>) -> Command {
    Command::Bump {
        kind: kind.to_string(),
        changes: changes.map(str::to_string),
        only: None,
    }
}

fn load_registry(root: &Path) -> Registry {
    Registry::load(&root.join(REGISTRY_FILE)).unwrap()
}

// =============================================================================
// Bump + Changelog
// =============================================================================

/// A minor bump updates both documents and the changelog shows one new section.
#[test]
fn test_minor_bump_then_changelog() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();

    let (result, _) = run(root, bump("minor", Some("add caching layer")));
    result.unwrap();

    let registry = load_registry(root);
    assert_eq!(registry.current_version(), Version::new(1, 1, 0));

    for path in ["architecture/README.md", "features/README.md"] {
        let text = fs::read_to_string(root.join(path)).unwrap();
        let block = metadata::read(&text).unwrap().unwrap();
        assert_eq!(block.version(), Version::new(1, 1, 0));
        assert_eq!(block.last_updated(), Some(today()));

        let newest = block.history().next().unwrap();
        assert_eq!(newest.version, Version::new(1, 1, 0));
        assert_eq!(newest.date, today());
        assert_eq!(newest.changes, vec!["add caching layer".to_string()]);
        assert_eq!(block.history().count(), 2);
    }

    let (result, _) = run(root, Command::Changelog);
    result.unwrap();

    let changelog = fs::read_to_string(root.join(CHANGELOG_FILE)).unwrap();
    assert!(changelog.starts_with(
        "# Changelog\n\n\
         ## [1.1.0] - 2026-10-18\n\n\
         - [architecture] add caching layer\n\
         - [features] add caching layer\n\n\
         ## [1.0.0] - 2024-01-15\n\n"
    ));
    assert_eq!(changelog.matches("## [1.1.0]").count(), 1);
}

/// Unrecognized fields and the document body survive a bump byte-for-byte.
#[test]
fn test_bump_preserves_unknown_fields_and_body() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();

    run(root, bump("patch", None)).0.unwrap();

    let text = fs::read_to_string(root.join("architecture/README.md")).unwrap();
    assert!(text.contains("owner: \"platform-team\"\n"));
    assert!(text.ends_with("---\n# Architecture\n\nService layout.\n"));
    assert!(text.contains("changes: [\"Routine update\"]"));
    assert!(text.contains("    changes: [\"Initial architecture\"]\n"));
}

/// Comma-separated change descriptions become separate entries.
#[test]
fn test_bump_splits_change_list() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();

    run(root, bump("major", Some("new api, drop legacy endpoints"))).0.unwrap();

    let text = fs::read_to_string(root.join("features/README.md")).unwrap();
    let block = metadata::read(&text).unwrap().unwrap();
    assert_eq!(block.version(), Version::new(2, 0, 0));
    assert_eq!(
        block.history().next().unwrap().changes,
        vec!["new api".to_string(), "drop legacy endpoints".to_string()]
    );
}

// =============================================================================
// Partial Failure
// =============================================================================

/// One corrupted document fails alone; the global version still advances.
#[test]
fn test_corrupted_document_is_partial_failure() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let corrupted = "---\nversion: \"1.0.0\"\nchangelog:\n  - version: \"1.0.0\"\n    date: \"yesterday\"\n    changes: []\n---\n";
    fs::write(root.join("features/README.md"), corrupted).unwrap();

    let (result, out) = run(root, bump("patch", None));

    assert_eq!(result.unwrap_err().code(), CliErrorCode::PartialFailure);
    assert!(out.contains("updated  architecture"));
    assert!(out.contains("FAILED   features"));
    assert!(out.trim_end().ends_with("1 updated, 0 skipped, 1 failed"));

    // The corrupted document is left untouched
    assert_eq!(fs::read_to_string(root.join("features/README.md")).unwrap(), corrupted);

    let registry = load_registry(root);
    assert_eq!(registry.current_version(), Version::new(1, 0, 1));
    assert_eq!(registry.documents["architecture"].version, Version::new(1, 0, 1));
    assert_eq!(registry.documents["features"].version, Version::new(1, 0, 0));
}

/// A document without a metadata block is skipped, not failed.
#[test]
fn test_untracked_document_is_skipped() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    fs::write(root.join("features/README.md"), "# Features\n\nNo block yet.\n").unwrap();

    let (result, out) = run(root, bump("patch", None));
    result.unwrap();
    assert!(out.contains("skipped  features"));
    assert!(out.trim_end().ends_with("1 updated, 1 skipped, 0 failed"));
}

// =============================================================================
// Targeted Bump
// =============================================================================

/// `--only` restricts the batch; untargeted documents keep their version.
#[test]
fn test_only_restricts_batch() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();

    let (result, out) = run(
        root,
        Command::Bump {
            kind: "minor".into(),
            changes: Some("architecture only".into()),
            only: Some(vec!["architecture".into(), "glossary".into()]),
        },
    );
    result.unwrap();
    assert!(out.contains("skipped  glossary  not in registry"));

    let registry = load_registry(root);
    assert_eq!(registry.current_version(), Version::new(1, 1, 0));
    assert_eq!(registry.documents["architecture"].version, Version::new(1, 1, 0));
    assert_eq!(registry.documents["features"].version, Version::new(1, 0, 0));

    assert_eq!(fs::read_to_string(root.join("features/README.md")).unwrap(), FEATURES);
}

// =============================================================================
// Registry Invariants
// =============================================================================

/// No document version is ever ahead of the project version after bumps.
#[test]
fn test_document_versions_never_exceed_project_version() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();

    run(root, bump("patch", None)).0.unwrap();
    run(
        root,
        Command::Bump {
            kind: "minor".into(),
            changes: None,
            only: Some(vec!["features".into()]),
        },
    )
    .0
    .unwrap();
    run(root, bump("major", None)).0.unwrap();

    let registry = load_registry(root);
    assert_eq!(registry.current_version(), Version::new(2, 0, 0));
    for entry in registry.documents.values() {
        assert!(entry.version <= registry.current_version());
    }
}

/// A registry holding a document ahead of the project version is rejected.
#[test]
fn test_registry_with_document_ahead_is_rejected() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let text = fs::read_to_string(root.join(REGISTRY_FILE)).unwrap();
    let text = text.replacen("\"version\": \"1.0.0\"", "\"version\": \"3.0.0\"", 1);
    fs::write(root.join(REGISTRY_FILE), text).unwrap();

    let (result, out) = run(root, Command::Status);
    assert_eq!(result.unwrap_err().code(), CliErrorCode::ConfigLoadFailed);
    assert!(out.is_empty());
}

/// Extra registry keys survive a bump.
#[test]
fn test_registry_preserves_extra_keys() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join(REGISTRY_FILE)).unwrap()).unwrap();
    value["maintainers"] = serde_json::json!(["docs-team"]);
    fs::write(root.join(REGISTRY_FILE), value.to_string()).unwrap();

    run(root, bump("patch", None)).0.unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(root.join(REGISTRY_FILE)).unwrap()).unwrap();
    assert_eq!(saved["maintainers"][0], "docs-team");
    assert_eq!(saved["versioning"]["current_version"], "1.0.1");
}
