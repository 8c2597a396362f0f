//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `scanreport report <targets> <scan>` - Correlate a scan with target ranges
//! - `scanreport summarize <dir> <output>` - Merge per-run summary CSVs
//! - `scanreport convert <input> <output>` - Flatten greppable output to CSV

mod convert;
mod report;
mod summarize;

pub use convert::ConvertCommand;
pub use report::ReportCommand;
pub use summarize::SummarizeCommand;

use clap::{ArgAction, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// scanreport - correlate masscan and nmap output with target ranges.
///
/// Reads masscan list output or nmap greppable output, groups open ports by
/// the target range they fall in, joins nmap service detections, and merges
/// per-run summaries across scan runs.
#[derive(Parser, Debug)]
#[command(name = "scanreport")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan result correlation and reporting", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom settings file
    #[arg(long, global = true, value_name = "PATH", env = "SCANREPORT_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Log filter implied by the verbosity flags.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate one scan file against a list of target ranges
    #[command(alias = "r")]
    Report(ReportCommand),

    /// Merge per-run summary CSVs into one consolidated summary
    #[command(alias = "s")]
    Summarize(SummarizeCommand),

    /// Convert nmap greppable output into a per-port CSV
    #[command(alias = "c")]
    Convert(ConvertCommand),
}

/// Output format for reports.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
        }
    }
}
