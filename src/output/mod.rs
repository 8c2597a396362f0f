//! Output formatting module.
//!
//! Provides formatters for plain text and JSON reports, and the CSV writers
//! for summary, detail and consolidated files.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::{
    write_detail, write_merged, write_rows, write_summary, DETAIL_HEADER, MERGED_HEADER,
    SUMMARY_HEADER,
};
pub use json_format::print_json;
pub use plain::{
    print_error, print_info, print_plain, print_success, print_targets, print_warning,
};

use crate::cli::OutputFormat;
use crate::detection::ServiceStore;
use crate::error::ReportResult;
use crate::report::TargetReport;

/// Format and print reports according to the specified format.
pub fn format_reports(
    format: OutputFormat,
    source: &str,
    reports: &[&TargetReport],
    services: Option<&ServiceStore>,
) -> ReportResult<()> {
    match format {
        OutputFormat::Plain => plain::print_plain(source, reports, services)?,
        OutputFormat::Json => json_format::print_json(source, reports, services)?,
    }
    Ok(())
}
