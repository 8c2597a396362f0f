//! Summarize subcommand implementation.
//!
//! Handles `scanreport summarize <dir> <output>`: merges every per-run
//! summary CSV in a directory into one consolidated file.

use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output;
use crate::report::SummaryMerger;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Merge per-run summary CSVs.
#[derive(Parser, Debug)]
pub struct SummarizeCommand {
    /// Directory holding per-run summary CSVs
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Consolidated summary to write
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

impl SummarizeCommand {
    /// Execute the summarize command.
    pub fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let mut merger = SummaryMerger::new();
        let files = merger.merge_dir(&self.dir, &settings.summary_extension)?;
        let rows = merger.finish();
        info!(files, rows = rows.len(), "merged summaries");

        output::write_merged(&self.output, &rows)?;
        if !quiet {
            output::print_success(&format!(
                "Merged {} files into {} rows at {}",
                files,
                rows.len(),
                self.output.display()
            ));
        }
        Ok(())
    }
}
