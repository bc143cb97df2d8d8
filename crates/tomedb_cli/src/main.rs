//! TomeDB CLI
//!
//! Command-line tools for TomeDB databases.
//!
//! # Commands
//!
//! - `check` - Check a database or a single table for consistency
//! - `version` - Show version information
//!
//! `check` exits with status 0 when nothing is wrong, 1 when problems were
//! found and 2 when the check could not run at all.

mod commands;

use clap::{Parser, Subcommand};
use commands::check::{CheckArgs, CliError, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// TomeDB command-line database tools.
#[derive(Parser)]
#[command(name = "tomedb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a database directory or a single table
    Check {
        /// Database directory, table file, or table name without suffix
        path: PathBuf,

        /// Regenerate an invalid version file if nothing else is wrong
        #[arg(long)]
        fix: bool,

        /// Report how many entries each table holds
        #[arg(long)]
        short_tree: bool,

        /// List every entry key of each table
        #[arg(long)]
        full_tree: bool,

        /// Show revision, entry count and size of each table
        #[arg(long)]
        stats: bool,

        /// Print nothing; only the exit status reports the result
        #[arg(short, long)]
        quiet: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            path,
            fix,
            short_tree,
            full_tree,
            stats,
            quiet,
            format,
        } => {
            let args = CheckArgs {
                path,
                fix,
                short_tree,
                full_tree,
                stats,
                quiet,
                format,
            };
            match commands::check::run(&args) {
                Ok(0) => ExitCode::SUCCESS,
                Ok(_) => ExitCode::from(1),
                Err(CliError::Check(e)) if e.is_fatal_for_check() => {
                    eprintln!("tomedb: {e}");
                    ExitCode::from(2)
                }
                Err(e) => {
                    eprintln!("tomedb: check aborted: {e}");
                    ExitCode::from(2)
                }
            }
        }
        Commands::Version => {
            println!("TomeDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("TomeDB Core v{}", tomedb_core::VERSION);
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_flags_parse() {
        let cli = Cli::try_parse_from([
            "tomedb", "check", "/tmp/db", "--fix", "--stats", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Check {
                path,
                fix,
                stats,
                full_tree,
                format,
                ..
            } => {
                assert_eq!(path, PathBuf::from("/tmp/db"));
                assert!(fix && stats && !full_tree);
                assert_eq!(format, OutputFormat::Json);
            }
            Commands::Version => panic!("parsed the wrong command"),
        }
    }

    #[test]
    fn check_requires_a_path() {
        assert!(Cli::try_parse_from(["tomedb", "check"]).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["tomedb", "check", "db", "--format", "xml"]).is_err());
    }
}
