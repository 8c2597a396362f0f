//! # scanreport - Scan Result Correlation and Reporting
//!
//! scanreport reads the output of network port scanners and turns it into
//! per-network reports.
//!
//! ## Features
//!
//! - **Two input dialects**: masscan list output (`-oL`) and nmap greppable
//!   output (`-oG`), detected from the first line
//! - **Target correlation**: open ports are grouped by the declared CIDR range
//!   containing the host
//! - **Service detection**: nmap version-scan results are joined onto each
//!   range's open ports
//! - **Cross-run summaries**: per-run CSVs are merged into one consolidated
//!   view keyed by network
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use scanreport::index::TargetIndex;
//! use scanreport::parser::ScanReader;
//! use scanreport::report::{aggregate, ReportSet};
//! use std::io::Cursor;
//!
//! let index = TargetIndex::load("10.0.0.0/24\n")?;
//! let mut reports = ReportSet::new(index);
//! let scan = ScanReader::new(Cursor::new("#masscan\nopen tcp 80 10.0.0.1 0\n"), "run1")?;
//! aggregate(&mut reports, scan, None, |_| {})?;
//!
//! for report in reports.sorted_by_network() {
//!     print!("{}", report.render(None));
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Protocols, port states, port sets and target ranges
//! - [`parser`] - masscan and nmap greppable line parsers
//! - [`index`] - The declared target ranges
//! - [`detection`] - Service detection store
//! - [`report`] - Per-range aggregation and summary merging
//! - [`convert`] - Greppable output to per-port CSV
//! - [`config`] - Settings file handling
//! - [`output`] - Plain, JSON and CSV output
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod convert;
pub mod detection;
pub mod error;
pub mod index;
pub mod output;
pub mod parser;
pub mod report;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ParseError, ReportError};
pub use parser::{Dialect, PortRecord, ScanReader};
pub use report::{ReportSet, SummaryMerger, TargetReport};
pub use types::{PortSet, PortState, Protocol, TargetRange};
