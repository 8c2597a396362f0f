//! Convert subcommand implementation.
//!
//! Handles `scanreport convert <input> <output>`.

use crate::config::AppSettings;
use crate::convert;
use crate::error::CliResult;
use crate::output;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Flatten nmap greppable output into a per-port CSV.
#[derive(Parser, Debug)]
pub struct ConvertCommand {
    /// Greppable file, or a directory of them
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// CSV file to append to
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Replace the output file instead of appending
    #[arg(long)]
    pub overwrite: bool,
}

impl ConvertCommand {
    /// Execute the convert command.
    pub fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let rows = convert::convert_path(
            &self.input,
            &self.output,
            &settings.detection_extension,
            self.overwrite,
        )?;
        info!(rows, output = %self.output.display(), "converted greppable output");

        if !quiet {
            output::print_success(&format!("Wrote {} rows to {}", rows, self.output.display()));
        }
        Ok(())
    }
}
