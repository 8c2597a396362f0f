//! Report subcommand implementation.
//!
//! Handles `scanreport report <targets> <scan>`: routes every open port in
//! the scan into the target range containing it and prints the results.

use crate::cli::OutputFormat;
use crate::config::AppSettings;
use crate::detection::ServiceStore;
use crate::error::{CliError, CliResult, ReportError};
use crate::index::TargetIndex;
use crate::output;
use crate::parser::ScanReader;
use crate::report::{self, DetailRow, ReportSet};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Aggregate a scan file against a list of target ranges.
#[derive(Parser, Debug)]
pub struct ReportCommand {
    /// File of target ranges, one CIDR or address per line
    #[arg(value_name = "TARGETS")]
    pub targets: PathBuf,

    /// masscan list (-oL) or nmap greppable (-oG) output
    #[arg(value_name = "SCAN")]
    pub scan: PathBuf,

    /// Directory of nmap greppable service detection files
    #[arg(short = 's', long = "services", value_name = "DIR")]
    pub services: Option<PathBuf>,

    /// Write a per-target summary CSV
    #[arg(short = 'c', long = "csv", value_name = "CSV")]
    pub summary_csv: Option<PathBuf>,

    /// Write a per-port detail CSV
    #[arg(short = 'C', long = "detail-csv", value_name = "CSV")]
    pub detail_csv: Option<PathBuf>,

    /// Report format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Keep reports in the order targets were declared
    #[arg(long)]
    pub declared_order: bool,

    /// Show a progress bar while reading the scan file
    #[arg(long)]
    pub progress: bool,
}

impl ReportCommand {
    /// Execute the report command.
    pub fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let index = TargetIndex::load_file(&self.targets)?;
        info!(targets = index.len(), file = %self.targets.display(), "loaded target ranges");
        if !quiet {
            output::print_targets(index.ranges());
        }

        let services = match &self.services {
            Some(dir) => {
                let mut store = ServiceStore::new();
                let stats = store.load_from_dir(dir, &settings.detection_extension)?;
                info!(
                    files = stats.files,
                    entries = stats.entries,
                    hosts = store.host_count(),
                    "loaded service detections"
                );
                if stats.files == 0 && !quiet {
                    output::print_warning(&format!(
                        "no {} files found in {}",
                        settings.detection_extension,
                        dir.display()
                    ));
                }
                Some(store)
            }
            None => None,
        };

        let file = File::open(&self.scan).map_err(|e| ReportError::io(&self.scan, e))?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        let scan = ScanReader::new(BufReader::new(file), source_name(&self.scan))?;
        let source = scan.source_name().to_string();
        if !quiet {
            output::print_info(&format!("Reading {} output from {}", scan.dialect(), source));
        }

        let pb = if (self.progress || settings.progress) && !quiet {
            Some(progress_bar(size)?)
        } else {
            None
        };

        let mut reports = ReportSet::new(index);
        let mut detail = Vec::new();
        let collect_detail = self.detail_csv.is_some() && services.is_none();
        let stats = report::aggregate(&mut reports, scan, pb.as_ref(), |record| {
            if collect_detail {
                detail.push(DetailRow::from_record(record));
            }
        })?;

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let routed = reports.stats();
        info!(
            lines = stats.lines,
            records = stats.records,
            skipped = stats.skipped,
            added = routed.added,
            out_of_scope = routed.out_of_scope,
            "aggregated scan output"
        );
        if stats.skipped > 0 && !quiet {
            output::print_warning(&format!(
                "skipped {} malformed lines in {}",
                stats.skipped, source
            ));
        }

        let by_network = settings.sort_by_network && !self.declared_order;
        let ordered = if by_network {
            reports.sorted_by_network()
        } else {
            reports.with_open_ports()
        };

        let format = self.format.unwrap_or(settings.default_format);
        output::format_reports(format, &source, &ordered, services.as_ref())?;

        if let Some(path) = &self.summary_csv {
            let rows = reports.rows(&source, by_network);
            output::write_summary(path, &rows)?;
            if !quiet {
                output::print_success(&format!(
                    "Wrote {} summary rows to {}",
                    rows.len(),
                    path.display()
                ));
            }
        }

        if let Some(path) = &self.detail_csv {
            let rows = match &services {
                Some(store) => store.entries().into_iter().map(DetailRow::from).collect(),
                None => detail,
            };
            output::write_detail(path, &rows)?;
            if !quiet {
                output::print_success(&format!(
                    "Wrote {} detail rows to {}",
                    rows.len(),
                    path.display()
                ));
            }
        }

        Ok(())
    }
}

/// Name recorded in summary rows for a scan file.
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn progress_bar(len: u64) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] \
                 {bytes}/{total_bytes} ({percent}%) {msg}",
            )
            .map_err(|e| CliError::Other(e.to_string()))?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
