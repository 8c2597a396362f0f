//! Flattening nmap greppable files into a per-port CSV.
//!
//! Each host with a port list produces one row describing the host followed
//! by one row per port entry.

use crate::detection::files_with_extension;
use crate::error::{ReportError, ReportResult};
use crate::parser::nmap::{self, GreppableLine};
use crate::parser::PortRecord;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// CSV columns of a converted file.
pub const CONVERT_HEADER: [&str; 8] = [
    "source",
    "destination",
    "status",
    "port",
    "port_status",
    "protocol",
    "name",
    "service",
];

/// Host status assumed when a port list is not preceded by a status line.
const DEFAULT_STATUS: &str = "up";

/// One output row. Host rows leave the port columns empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertRow {
    pub source: String,
    pub destination: String,
    pub status: String,
    pub port: Option<u16>,
    pub port_status: Option<String>,
    pub protocol: Option<String>,
    pub name: Option<String>,
    pub service: Option<String>,
}

impl ConvertRow {
    fn host(source: &str, host: Ipv4Addr, status: &str) -> Self {
        Self {
            source: source.to_string(),
            destination: host.to_string(),
            status: status.to_string(),
            port: None,
            port_status: None,
            protocol: None,
            name: None,
            service: None,
        }
    }

    fn port(source: &str, status: &str, record: &PortRecord) -> Self {
        Self {
            port: Some(record.port),
            port_status: Some(record.state.to_string()),
            protocol: Some(record.protocol.to_string()),
            name: Some(record.service.clone().unwrap_or_default()),
            service: Some(record.banner.clone().unwrap_or_default()),
            ..Self::host(source, record.host, status)
        }
    }
}

/// Convert one greppable stream. Malformed lines and entries are logged
/// and skipped.
pub fn convert_reader<R: BufRead>(reader: R, source: &str) -> ReportResult<Vec<ConvertRow>> {
    let mut rows = Vec::new();
    let mut pending: Option<(Ipv4Addr, String)> = None;

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        match nmap::parse_host_line(&line) {
            Ok(Some(GreppableLine::Status { host, status })) => pending = Some((host, status)),
            Ok(Some(GreppableLine::Ports(parsed))) => {
                let status = match pending.take() {
                    Some((status_host, status)) if status_host == parsed.host => status,
                    _ => DEFAULT_STATUS.to_string(),
                };
                for (entry, err) in &parsed.rejected {
                    warn!(
                        source,
                        line = number + 1,
                        entry = %entry,
                        "skipping port entry: {}",
                        err
                    );
                }
                rows.push(ConvertRow::host(source, parsed.host, &status));
                rows.extend(
                    parsed
                        .records
                        .iter()
                        .map(|r| ConvertRow::port(source, &status, r)),
                );
            }
            Ok(None) => {}
            Err(err) => warn!(source, line = number + 1, "skipping malformed line: {}", err),
        }
    }

    Ok(rows)
}

/// Input files for a conversion: the file itself, or every file in a
/// directory with the given extension.
pub fn input_files(input: &Path, extension: &str) -> ReportResult<Vec<PathBuf>> {
    if input.is_dir() {
        files_with_extension(input, extension)
    } else {
        Ok(vec![input.to_path_buf()])
    }
}

/// Convert `input` (file or directory) into `output`.
///
/// Output is appended to unless `overwrite` is set. The header is written
/// when the output starts empty. Returns the number of rows written.
pub fn convert_path(
    input: &Path,
    output: &Path,
    extension: &str,
    overwrite: bool,
) -> ReportResult<usize> {
    let mut rows = Vec::new();
    for path in input_files(input, extension)? {
        debug!(file = %path.display(), "converting greppable output");
        let source = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(&path).map_err(|e| ReportError::io(&path, e))?;
        rows.extend(convert_reader(BufReader::new(file), &source)?);
    }

    let existing = fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(!overwrite)
        .truncate(overwrite)
        .open(output)
        .map_err(|e| ReportError::io(output, e))?;

    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if overwrite || existing == 0 {
        wtr.write_record(CONVERT_HEADER)?;
    }
    for row in &rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| ReportError::io(output, e))?;

    Ok(rows.len())
}
