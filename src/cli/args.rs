//! CLI argument definitions using clap
//!
//! Commands:
//! - docver status
//! - docver bump <major|minor|patch> [CHANGES] [--only KEYS]
//! - docver archive [VERSION] [--pack]
//! - docver verify [VERSION]
//! - docver changelog

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docver - keep documentation versions, changelog and archives in sync
#[derive(Parser, Debug)]
#[command(name = "docver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Documentation root containing .version-config.json
    #[arg(long, global = true, env = "DOCVER_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Log everything down to TRACE on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the project version and every tracked document
    Status,

    /// Advance the version and record a change in every tracked document
    Bump {
        /// major, minor or patch
        kind: String,

        /// Comma-separated change descriptions
        changes: Option<String>,

        /// Only bump these document keys (comma-separated)
        #[arg(long, value_delimiter = ',')]
        only: Option<Vec<String>>,
    },

    /// Snapshot the archive sources and registry into versions/v{VERSION}
    Archive {
        /// Defaults to the current version
        version: Option<String>,

        /// Also write v{VERSION}.tar next to the archive
        #[arg(long)]
        pack: bool,
    },

    /// Check an archive against its checksum manifest
    Verify {
        /// Defaults to the current version
        version: Option<String>,
    },

    /// Regenerate CHANGELOG.md from every document's history
    Changelog,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
