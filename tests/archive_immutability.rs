//! Archive Immutability Tests
//!
//! Tests for the archive guarantees:
//! - an archive is created once per version and never overwritten
//! - a failed archive run leaves nothing under the final name
//! - missing sources are reported, other sources are still archived
//! - verification detects any change made after creation
//! - archives are independent of the live registry

use docver::archive::{
    ArchiveErrorCode, ArchiveManager, ArchiveManifest, MANIFEST_FILE,
};
use docver::registry::{ArchiveSettings, REGISTRY_FILE};
use docver::version::Version;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_docs_root() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    fs::create_dir_all(root.join("architecture/diagrams")).unwrap();
    fs::write(root.join("architecture/README.md"), "---\nversion: \"1.1.0\"\n---\n# Architecture\n").unwrap();
    fs::write(root.join("architecture/diagrams/system.txt"), "client -> api -> db\n").unwrap();
    fs::create_dir_all(root.join("features/search")).unwrap();
    fs::write(root.join("features/README.md"), "# Features\n").unwrap();
    fs::write(root.join("features/search/ranking.md"), "# Ranking\n").unwrap();
    fs::write(
        root.join(REGISTRY_FILE),
        r#"{"project":{"name":"KB"},"versioning":{"current_version":"1.1.0"},"documents":{}}"#,
    )
    .unwrap();

    temp_dir
}

fn manager(root: &Path) -> ArchiveManager {
    ArchiveManager::new(root, &ArchiveSettings::default(), &root.join(REGISTRY_FILE))
}

fn snapshot_tree(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    walk(dir, dir, &mut files);
    files.sort();
    files
}

fn walk(base: &Path, dir: &Path, files: &mut Vec<(String, Vec<u8>)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            walk(base, &path, files);
        } else {
            let relative = path.strip_prefix(base).unwrap().to_string_lossy().into_owned();
            files.push((relative, fs::read(&path).unwrap()));
        }
    }
}

// =============================================================================
// Creation
// =============================================================================

/// A fresh archive holds a full copy of every configured source directory.
#[test]
fn test_archive_copies_full_subtrees() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();

    let report = manager(root).create(Version::new(1, 1, 0)).unwrap();
    let archive_dir = root.join("versions/v1.1.0");

    assert_eq!(report.path, archive_dir);
    assert!(report.is_complete());
    assert_eq!(
        fs::read_to_string(archive_dir.join("architecture/diagrams/system.txt")).unwrap(),
        "client -> api -> db\n"
    );
    assert_eq!(
        fs::read_to_string(archive_dir.join("features/search/ranking.md")).unwrap(),
        "# Ranking\n"
    );
    assert_eq!(
        fs::read(archive_dir.join(REGISTRY_FILE)).unwrap(),
        fs::read(root.join(REGISTRY_FILE)).unwrap()
    );

    let manifest = ArchiveManifest::read_from_file(&archive_dir.join(MANIFEST_FILE)).unwrap();
    assert_eq!(manifest.version, Version::new(1, 1, 0));
    assert_eq!(manifest.files.len(), 5);
    assert!(manifest.missing_sources.is_empty());
}

// =============================================================================
// Immutability
// =============================================================================

/// Archiving the same version twice fails and leaves the first archive untouched.
#[test]
fn test_second_archive_fails_with_destination_exists() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let manager = manager(root);
    let version = Version::new(1, 1, 0);

    manager.create(version).unwrap();
    let before = snapshot_tree(&manager.archive_path(version));

    // Live docs move on
    fs::write(root.join("architecture/README.md"), "# Rewritten\n").unwrap();
    fs::write(root.join("features/new.md"), "# New\n").unwrap();

    let err = manager.create(version).unwrap_err();
    assert_eq!(err.code(), ArchiveErrorCode::DestinationExists);

    assert_eq!(snapshot_tree(&manager.archive_path(version)), before);
    assert!(manager.verify(version).unwrap().is_intact());
}

/// Archives are independent of later changes to the live registry.
#[test]
fn test_archive_independent_of_live_registry() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let manager = manager(root);

    manager.create(Version::new(1, 1, 0)).unwrap();
    let archived_registry = fs::read(root.join("versions/v1.1.0").join(REGISTRY_FILE)).unwrap();

    fs::write(
        root.join(REGISTRY_FILE),
        r#"{"project":{"name":"KB"},"versioning":{"current_version":"2.0.0"},"documents":{}}"#,
    )
    .unwrap();

    assert_eq!(
        fs::read(root.join("versions/v1.1.0").join(REGISTRY_FILE)).unwrap(),
        archived_registry
    );
}

/// Tampering after creation is caught by verification.
#[test]
fn test_verification_detects_tampering() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let manager = manager(root);
    let version = Version::new(1, 1, 0);

    manager.create(version).unwrap();
    fs::write(
        manager.archive_path(version).join("features/search/ranking.md"),
        "# Ranking (edited)\n",
    )
    .unwrap();

    let report = manager.verify(version).unwrap();
    assert!(!report.is_intact());
    assert_eq!(report.mismatched, vec!["features/search/ranking.md".to_string()]);
}

// =============================================================================
// Missing Sources
// =============================================================================

/// A missing source is skipped and reported; other sources are archived.
#[test]
fn test_missing_source_is_reported() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let settings = ArchiveSettings {
        sources: vec!["architecture".into(), "runbooks".into(), "features".into()],
        ..ArchiveSettings::default()
    };
    let manager = ArchiveManager::new(root, &settings, &root.join(REGISTRY_FILE));

    let report = manager.create(Version::new(1, 1, 0)).unwrap();

    assert_eq!(report.archived, vec!["architecture".to_string(), "features".to_string()]);
    assert_eq!(report.missing, vec!["runbooks".to_string()]);
    assert_eq!(report.manifest.missing_sources, vec!["runbooks".to_string()]);
    assert!(report.path.join("features/README.md").is_file());
}

/// A run that fails after staging started leaves no archive and no staging directory.
#[test]
fn test_failed_run_leaves_no_partial_archive() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let manager = ArchiveManager::new(
        root,
        &ArchiveSettings::default(),
        &root.join("does-not-exist.json"),
    );

    assert!(manager.create(Version::new(1, 1, 0)).is_err());
    assert!(!root.join("versions/v1.1.0").exists());
    assert!(!root.join("versions/.v1.1.0.partial").exists());

    // A later, correct run succeeds
    let manager = self::manager(root);
    assert!(manager.create(Version::new(1, 1, 0)).is_ok());
}

// =============================================================================
// Packing
// =============================================================================

/// Packing never overwrites an existing tarball.
#[test]
fn test_pack_refuses_overwrite() {
    let temp_dir = create_docs_root();
    let root = temp_dir.path();
    let manager = manager(root);
    let version = Version::new(1, 1, 0);

    manager.create(version).unwrap();
    let tar_path = manager.pack(version).unwrap();
    let first = fs::read(&tar_path).unwrap();

    let err = manager.pack(version).unwrap_err();
    assert_eq!(err.code(), ArchiveErrorCode::DestinationExists);
    assert_eq!(fs::read(&tar_path).unwrap(), first);
}
