//! Check command implementation.

use clap::ValueEnum;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use tomedb_core::{check, CheckOptions, CoreError};
use tracing::debug;

/// How the report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The report as the checker writes it.
    Text,
    /// One JSON object with the error count and report lines.
    Json,
}

/// Arguments of the check command.
#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub path: PathBuf,
    pub fix: bool,
    pub short_tree: bool,
    pub full_tree: bool,
    pub stats: bool,
    pub quiet: bool,
    pub format: OutputFormat,
}

impl CheckArgs {
    fn options(&self) -> CheckOptions {
        let mut options = CheckOptions::NONE;
        if self.fix {
            options |= CheckOptions::FIX;
        }
        if self.short_tree {
            options |= CheckOptions::SHORT_TREE;
        }
        if self.full_tree {
            options |= CheckOptions::FULL_TREE;
        }
        if self.stats {
            options |= CheckOptions::SHOW_STATS;
        }
        options
    }
}

/// Errors that stop the check from running.
#[derive(Debug, Error)]
pub enum CliError {
    /// The checker refused the path.
    #[error(transparent)]
    Check(#[from] CoreError),

    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),

    /// Encoding the JSON report failed.
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    path: String,
    errors: usize,
    report: Vec<&'a str>,
}

/// Runs the check command, returning the number of problems found.
pub fn run(args: &CheckArgs) -> Result<usize, CliError> {
    let stdout = io::stdout();
    run_to(args, &mut stdout.lock())
}

fn run_to(args: &CheckArgs, stdout: &mut dyn Write) -> Result<usize, CliError> {
    let options = args.options();
    debug!(path = %args.path.display(), %options, "running check");

    if args.quiet {
        return Ok(check(&args.path, options, None)?);
    }

    match args.format {
        OutputFormat::Text => {
            let errors = check(&args.path, options, Some(&mut *stdout))?;
            stdout.flush()?;
            Ok(errors)
        }
        OutputFormat::Json => {
            let mut buf = Vec::new();
            let errors = check(&args.path, options, Some(&mut buf))?;
            let text = String::from_utf8_lossy(&buf);
            let report = JsonReport {
                path: args.path.display().to_string(),
                errors,
                report: text.lines().collect(),
            };
            serde_json::to_writer_pretty(&mut *stdout, &report)?;
            writeln!(stdout)?;
            Ok(errors)
        }
    }
}
