//! CLI module for docver
//!
//! Provides command-line interface for:
//! - status: Show project version and tracked documents
//! - bump: Advance the version and record changes in every document
//! - archive: Snapshot documentation into versions/v{version}
//! - verify: Check an archive against its manifest
//! - changelog: Regenerate CHANGELOG.md

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{
    archive, bump, generate_changelog, run, run_command, status, verify, Workspace,
};
pub use errors::{CliError, CliErrorCode, CliResult};
