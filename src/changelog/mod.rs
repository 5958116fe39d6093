//! Consolidated changelog generation
//!
//! Every tracked document carries its own change history. This module merges
//! all of them into `CHANGELOG.md` at the documentation root:
//!
//! ```text
//! # Changelog
//!
//! ## [1.1.0] - 2026-10-18
//!
//! - [architecture] add caching layer
//! - [features] add caching layer
//! ```
//!
//! The file is regenerated from scratch on every run. Output depends only on
//! the on-disk state: versions are ordered newest first and changes within a
//! version follow registry key order, then per-document history order.

mod aggregator;

pub use aggregator::{collect, render, AggregatedEntry, Changelog, Omission, CHANGELOG_TITLE};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::durable::write_atomic;
use crate::registry::Registry;

/// Generated file name inside the documentation root
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

#[derive(Debug, Error)]
pub enum ChangelogError {
    #[error("Failed to write changelog {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type ChangelogResult<T> = Result<T, ChangelogError>;

/// Summary of a changelog run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogReport {
    pub path: PathBuf,
    pub changelog: Changelog,
}

/// Collect, render and write the changelog artifact.
pub fn generate(registry: &Registry, root: &Path) -> ChangelogResult<ChangelogReport> {
    let changelog = collect(registry, root);
    let text = render(&changelog);
    let path = root.join(CHANGELOG_FILE);

    write_atomic(&path, text.as_bytes()).map_err(|e| ChangelogError::Write {
        path: path.clone(),
        source: e,
    })?;

    Ok(ChangelogReport { path, changelog })
}
