use std::process;

use clap::Parser;
use las_processor::cli::{args::Args, commands};

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    // Create async runtime and run the main command logic
    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {e}");
        process::exit(1);
    });

    match runtime.block_on(commands::run(args)) {
        Ok(summary) if summary.all_passed() => process::exit(0),
        Ok(_) => {
            // Results were already reported; a failed file sets the exit code
            process::exit(1);
        }
        Err(error) => {
            eprintln!("Error: {error:#}");
            process::exit(2);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("LAS Processor - Well-Log File Reader");
    println!("====================================");
    println!();
    println!("Read and validate Log ASCII Standard (LAS) well-log files in");
    println!("versions 1.2, 2.0 and 3.0 with per-section error recovery.");
    println!();
    println!("USAGE:");
    println!("    las-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    check       Read a single LAS file and report its sections and errors");
    println!("    batch       Read every LAS file under a directory and summarize results");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Enable verbose logging (-v: debug, -vv: trace)");
    println!("    -q, --quiet      Only log errors");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Inspect a single file:");
    println!("    las-processor check path/to/well.las");
    println!();
    println!("    # Fail on minor errors too:");
    println!("    las-processor check path/to/well.las --strict");
    println!();
    println!("    # Summarize a directory of logs:");
    println!("    las-processor batch path/to/logs/");
    println!();
    println!("For detailed help on any command, use:");
    println!("    las-processor <COMMAND> --help");
}
