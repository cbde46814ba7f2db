//! Command implementations for the LAS processor CLI
//!
//! Contains the command execution logic, logging setup, progress reporting
//! and the human-readable error report rendering.

use std::time::Instant;

use colored::Colorize;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::app::models::{LasDocument, Severity};
use crate::app::services::document::{ReadOptions, error_check, read_with_table};
use crate::cli::args::{Args, BatchArgs, CheckArgs, Commands};
use crate::config::KnownSections;
use crate::constants::LAS_FILE_EXTENSION;
use crate::error::{LasError, Result};

/// Outcome of a CLI run, reported back to `main` for the exit code
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of files read
    pub files_checked: usize,
    /// Number of files that passed under the requested strictness
    pub files_passed: usize,
    /// Total critical errors across all files
    pub critical_errors: usize,
    /// Total minor errors across all files
    pub minor_errors: usize,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.files_checked == self.files_passed
    }
}

/// Main command runner
pub async fn run(args: Args) -> Result<RunSummary> {
    setup_logging(&args);

    info!("Starting LAS processor");
    debug!("Command line arguments: {:?}", args);

    match args.command.clone() {
        Some(Commands::Check(check_args)) => check(check_args).await,
        Some(Commands::Batch(batch_args)) => batch(batch_args).await,
        None => unreachable!("main exits early when no subcommand is given"),
    }
}

/// Set up tracing with an environment-driven filter, defaulting to the
/// verbosity flags
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("las_processor={}", args.log_level())));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    debug!("Logging initialized at level: {}", args.log_level());
}

/// Read options assembled from the check flags
fn read_options(args: &CheckArgs) -> ReadOptions {
    ReadOptions {
        handle_common_errors: !args.no_version_coercion,
        accept_unknown_versions: args.accept_unknown_versions,
        ..ReadOptions::default()
    }
}

/// Single-file inspection: read, print the section summary and every
/// recorded error, and settle the verdict under the requested strictness
async fn check(args: CheckArgs) -> Result<RunSummary> {
    let table = load_table(args.sections_table.as_deref())?;
    let document = read_with_table(&args.file, read_options(&args), &table).await;

    println!("{document}");
    print_errors(&document);

    let passed = error_check(&document, !args.strict);
    let (critical, minor) = count_errors(&document);
    print_verdict(passed, critical, minor);

    Ok(RunSummary {
        files_checked: 1,
        files_passed: passed as usize,
        critical_errors: critical,
        minor_errors: minor,
    })
}

/// Directory summary: read every .las file under the tree and print a
/// one-line result per file plus the totals
async fn batch(args: BatchArgs) -> Result<RunSummary> {
    if !args.dir.is_dir() {
        return Err(LasError::FileNotFound {
            path: args.dir.clone(),
        });
    }

    let start = Instant::now();
    let mut files = Vec::new();
    for entry in WalkDir::new(&args.dir) {
        let entry = entry?;
        let is_las = entry.path().extension().is_some_and(|extension| {
            extension.eq_ignore_ascii_case(LAS_FILE_EXTENSION)
        });
        if entry.file_type().is_file() && is_las {
            files.push(entry.into_path());
        }
    }
    info!("Found {} LAS files under {}", files.len(), args.dir.display());

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid progress template")
            .progress_chars("#>-"),
    );

    let table = KnownSections::embedded();
    let mut summary = RunSummary::default();
    for path in &files {
        progress.set_message(format!("{}", path.display()));
        let document = read_with_table(path, ReadOptions::default(), table).await;

        let passed = error_check(&document, !args.strict);
        let (critical, minor) = count_errors(&document);
        summary.files_checked += 1;
        summary.files_passed += passed as usize;
        summary.critical_errors += critical;
        summary.minor_errors += minor;

        let verdict = if passed {
            "PASS".green()
        } else {
            "FAIL".red()
        };
        progress.println(format!(
            "{verdict}  {} ({critical} critical, {minor} minor)",
            path.display()
        ));
        if !passed {
            warn!(path = %path.display(), critical, minor, "file failed the check");
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    println!(
        "Checked {} files in {}: {} passed, {} failed ({} critical, {} minor errors)",
        summary.files_checked,
        HumanDuration(start.elapsed()),
        summary.files_passed,
        summary.files_checked - summary.files_passed,
        summary.critical_errors,
        summary.minor_errors,
    );
    Ok(summary)
}

fn load_table(path: Option<&std::path::Path>) -> Result<KnownSections> {
    match path {
        Some(path) => {
            info!("Using known-sections table from {}", path.display());
            KnownSections::from_path(path)
        }
        None => Ok(KnownSections::embedded().clone()),
    }
}

fn count_errors(document: &LasDocument) -> (usize, usize) {
    document.all_errors().fold((0, 0), |(critical, minor), (_, error)| {
        match error.severity {
            Severity::Critical => (critical + 1, minor),
            Severity::Minor => (critical, minor + 1),
        }
    })
}

fn print_errors(document: &LasDocument) {
    for (section, error) in document.all_errors() {
        let severity = match error.severity {
            Severity::Critical => "CRITICAL".red().bold(),
            Severity::Minor => "MINOR".yellow(),
        };
        let location = section.unwrap_or("document");
        println!("  {severity} [{}] {location}: {}", error.stage, error.message);
    }
}

fn print_verdict(passed: bool, critical: usize, minor: usize) {
    if passed {
        println!(
            "{} ({critical} critical, {minor} minor errors)",
            "PASS".green().bold()
        );
    } else {
        println!(
            "{} ({critical} critical, {minor} minor errors)",
            "FAIL".red().bold()
        );
    }
}
