//! CLI command implementations
//!
//! Every command:
//! 1. Loads the registry from `<root>/.version-config.json` (fatal on failure)
//! 2. Runs against the loaded registry
//! 3. Lists every updated, skipped, failed or missing unit
//! 4. Ends with a single summary line
//!
//! Only `bump` writes the registry back. Output goes to the supplied writer;
//! structured logs go to stderr through the logger.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use clap::CommandFactory;

use crate::archive::ArchiveManager;
use crate::changelog::{self, Omission, CHANGELOG_FILE};
use crate::observability::{Logger, Severity};
use crate::recorder::{self, BumpRequest, DocumentOutcome};
use crate::registry::{Registry, REGISTRY_FILE};
use crate::version::{BumpKind, Version};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Registry plus the paths it was loaded from
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    registry_path: PathBuf,
    registry: Registry,
}

impl Workspace {
    /// Load the registry of the documentation root.
    pub fn open(root: &Path) -> CliResult<Self> {
        let registry_path = root.join(REGISTRY_FILE);
        let registry = Registry::load(&registry_path)?;

        Ok(Self {
            root: root.to_path_buf(),
            registry_path,
            registry,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn archive_manager(&self) -> ArchiveManager {
        ArchiveManager::new(
            &self.root,
            &self.registry.archive_settings(),
            &self.registry_path,
        )
    }

    /// Explicit version argument or the current version
    fn target_version(&self, arg: Option<&str>) -> CliResult<Version> {
        match arg {
            Some(s) => Ok(Version::parse(s)?),
            None => Ok(self.registry.current_version()),
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_command(&cli.root, cli.command, Utc::now().date_naive(), &mut out)
}

/// Run one command against `root`, writing human-readable output to `out`.
///
/// `today` is the date recorded by `bump`.
pub fn run_command(
    root: &Path,
    command: Option<Command>,
    today: NaiveDate,
    out: &mut impl Write,
) -> CliResult<()> {
    let command = match command {
        Some(command) => command,
        None => {
            writeln!(out, "{}", Cli::command().render_help())?;
            return Ok(());
        }
    };

    let root_str = root.display().to_string();
    Logger::trace("COMMAND_START", &[("command", command_name(&command)), ("root", root_str.as_str())]);

    let mut workspace = Workspace::open(root).map_err(|e| {
        Logger::fatal("CONFIG_LOAD_FAILED", &[("error", e.message()), ("root", root_str.as_str())]);
        e
    })?;

    match command {
        Command::Status => status(&workspace, out),
        Command::Bump { kind, changes, only } => {
            bump(&mut workspace, &kind, changes.as_deref(), only, today, out)
        }
        Command::Archive { version, pack } => archive(&workspace, version.as_deref(), pack, out),
        Command::Verify { version } => verify(&workspace, version.as_deref(), out),
        Command::Changelog => generate_changelog(&workspace, out),
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Status => "status",
        Command::Bump { .. } => "bump",
        Command::Archive { .. } => "archive",
        Command::Verify { .. } => "verify",
        Command::Changelog => "changelog",
    }
}

/// Print project, version and tracked documents. Read-only.
pub fn status(workspace: &Workspace, out: &mut impl Write) -> CliResult<()> {
    let registry = workspace.registry();

    writeln!(out, "Project: {}", registry.project_name())?;
    writeln!(out, "Version: {}", registry.current_version())?;
    writeln!(out, "Documents:")?;

    let width = registry.documents.keys().map(|k| k.len()).max().unwrap_or(0);
    for (key, entry) in &registry.documents {
        writeln!(
            out,
            "  {:<width$}  {:<9}  {:<10}  {}",
            key,
            entry.version.to_string(),
            entry.status.as_str(),
            entry.path,
            width = width
        )?;
    }

    writeln!(
        out,
        "{} documents tracked, project at version {}",
        registry.documents.len(),
        registry.current_version()
    )?;
    Ok(())
}

/// Advance the version, rewrite every targeted document and save the registry.
pub fn bump(
    workspace: &mut Workspace,
    kind: &str,
    changes: Option<&str>,
    only: Option<Vec<String>>,
    today: NaiveDate,
    out: &mut impl Write,
) -> CliResult<()> {
    let kind = BumpKind::from_str(kind)?;
    let request = BumpRequest {
        kind,
        changes: recorder::parse_changes(changes),
        only,
        date: today,
    };

    let report = recorder::bump_documents(&mut workspace.registry, &workspace.root, &request)?;

    for (key, outcome) in &report.outcomes {
        match outcome {
            DocumentOutcome::Updated { path } => {
                writeln!(out, "  updated  {}  {}", key, path.display())?
            }
            DocumentOutcome::Skipped { reason } => writeln!(out, "  skipped  {}  {}", key, reason)?,
            DocumentOutcome::Failed { reason } => writeln!(out, "  FAILED   {}  {}", key, reason)?,
        }
    }

    workspace.registry.save(&workspace.registry_path)?;

    writeln!(
        out,
        "Bumped {} -> {}: {} updated, {} skipped, {} failed",
        report.previous,
        report.version,
        report.updated(),
        report.skipped(),
        report.failed()
    )?;

    if !report.is_success() {
        return Err(CliError::partial_failure(format!(
            "{} of {} documents failed to update",
            report.failed(),
            report.outcomes.len()
        )));
    }

    Ok(())
}

/// Create `versions/v{version}/`, optionally packing it.
pub fn archive(
    workspace: &Workspace,
    version: Option<&str>,
    pack: bool,
    out: &mut impl Write,
) -> CliResult<()> {
    let version = workspace.target_version(version)?;
    let manager = workspace.archive_manager();

    let report = manager.create(version)?;

    for source in &report.archived {
        writeln!(out, "  archived  {}", source)?;
    }
    for source in &report.missing {
        writeln!(out, "  MISSING   {}", source)?;
    }

    if pack {
        let tar_path = manager.pack(version)?;
        writeln!(out, "  packed    {}", tar_path.display())?;
    }

    writeln!(
        out,
        "Archived v{} to {}: {} files from {} of {} sources",
        version,
        report.path.display(),
        report.file_count(),
        report.archived.len(),
        manager.sources().len()
    )?;

    if !report.is_complete() {
        return Err(CliError::partial_failure(format!(
            "{} archive source(s) missing: {}",
            report.missing.len(),
            report.missing.join(", ")
        )));
    }

    Ok(())
}

/// Check an archive against its manifest. Read-only.
pub fn verify(workspace: &Workspace, version: Option<&str>, out: &mut impl Write) -> CliResult<()> {
    let version = workspace.target_version(version)?;
    let report = workspace.archive_manager().verify(version)?;

    for file in &report.missing {
        writeln!(out, "  missing     {}", file)?;
    }
    for file in &report.mismatched {
        writeln!(out, "  modified    {}", file)?;
    }
    for file in &report.unexpected {
        writeln!(out, "  unexpected  {}", file)?;
    }

    if report.is_intact() {
        writeln!(out, "Archive v{} intact: {} files verified", version, report.verified)?;
        Ok(())
    } else {
        writeln!(
            out,
            "Archive v{} damaged: {} files verified, {} problems",
            version,
            report.verified,
            report.problem_count()
        )?;
        Err(CliError::verify_failed(format!(
            "archive v{} does not match its manifest",
            version
        )))
    }
}

/// Regenerate `CHANGELOG.md`.
pub fn generate_changelog(workspace: &Workspace, out: &mut impl Write) -> CliResult<()> {
    let report = changelog::generate(workspace.registry(), workspace.root())?;

    for (key, omission) in &report.changelog.omitted {
        match omission {
            Omission::Untracked => writeln!(out, "  untracked  {}", key)?,
            Omission::Unreadable(reason) => writeln!(out, "  skipped    {}  {}", key, reason)?,
        }
    }

    writeln!(
        out,
        "Wrote {}: {} versions from {} documents, {} omitted",
        CHANGELOG_FILE,
        report.changelog.entries.len(),
        report.changelog.documents_read,
        report.changelog.omitted.len()
    )?;
    Ok(())
}
