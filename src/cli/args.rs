//! Command-line argument definitions for the LAS processor
//!
//! The CLI surface uses the clap derive API: a thin top-level parser with
//! verbosity flags and one subcommand per workflow.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI arguments for the LAS well-log file processor
///
/// Reads Log ASCII Standard (LAS) files in versions 1.2, 2.0 and 3.0,
/// reporting structural and validation problems without ever aborting on a
/// damaged section.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "las-processor",
    version,
    about = "Read and validate LAS well-log files (versions 1.2, 2.0 and 3.0)",
    long_about = "Reads Log ASCII Standard (LAS) well-log files, resolves their version and \
                  section structure, parses header and data sections, and reports every \
                  recorded problem classified as critical or minor. Damaged sections are \
                  isolated, so one bad block never hides the rest of the file."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging output
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Enable verbose logging (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Only log errors"
    )]
    pub quiet: bool,
}

/// Available subcommands for the LAS processor
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Read a single LAS file and report its sections and errors
    Check(CheckArgs),
    /// Read every LAS file under a directory and summarize the results
    Batch(BatchArgs),
}

/// Arguments for the check command (single-file inspection)
#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// Path to the LAS file to read
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Report minor errors as well as critical ones
    ///
    /// By default only critical errors affect the verdict; minor errors
    /// are still listed but do not fail the check.
    #[arg(long = "strict", help = "Fail the check on minor errors too")]
    pub strict: bool,

    /// Accept version numbers outside 1.2/2.0/3.0 during extraction
    #[arg(
        long = "accept-unknown-versions",
        help = "Accept unknown version numbers during version extraction"
    )]
    pub accept_unknown_versions: bool,

    /// Disable coercion of common version misspellings such as '2'
    #[arg(
        long = "no-version-coercion",
        help = "Disable coercion of common version number spellings"
    )]
    pub no_version_coercion: bool,

    /// Override the embedded known-sections table
    #[arg(
        long = "sections-table",
        value_name = "PATH",
        help = "Path to a JSON known-sections table overriding the embedded one"
    )]
    pub sections_table: Option<PathBuf>,
}

/// Arguments for the batch command (directory summary)
#[derive(Debug, Clone, Parser)]
pub struct BatchArgs {
    /// Directory to scan recursively for .las files
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Fail files on minor errors as well as critical ones
    #[arg(long = "strict", help = "Count files with minor errors as failed")]
    pub strict: bool,
}

impl Args {
    /// Log level derived from the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_command_parses() {
        let args = Args::parse_from(["las-processor", "check", "well.las", "--strict"]);
        match args.command {
            Some(Commands::Check(check)) => {
                assert_eq!(check.file, PathBuf::from("well.las"));
                assert!(check.strict);
                assert!(!check.accept_unknown_versions);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_batch_command_parses() {
        let args = Args::parse_from(["las-processor", "batch", "logs/"]);
        match args.command {
            Some(Commands::Batch(batch)) => assert_eq!(batch.dir, PathBuf::from("logs/")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["las-processor", "-vv", "check", "a.las"]);
        assert_eq!(args.log_level(), "trace");
        let args = Args::parse_from(["las-processor", "-q", "check", "a.las"]);
        assert_eq!(args.log_level(), "error");
    }
}
