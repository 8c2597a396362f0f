//! Scan output parsing.
//!
//! Two dialects are understood: masscan's list output (`-oL`) and nmap's
//! greppable output (`-oG`). Both are normalised into [`PortRecord`]s. The
//! dialect of a stream is fixed by its first line.

pub mod masscan;
pub mod nmap;

use crate::error::{ParseResult, ReportError, ReportResult};
use crate::types::{PortState, Protocol};
use indicatif::ProgressBar;
use serde::Serialize;
use std::io::BufRead;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

/// One port observation on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortRecord {
    pub host: Ipv4Addr,
    pub protocol: Protocol,
    pub port: u16,
    pub state: PortState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl PortRecord {
    pub fn new(host: Ipv4Addr, protocol: Protocol, port: u16, state: PortState) -> Self {
        Self {
            host,
            protocol,
            port,
            state,
            service: None,
            banner: None,
        }
    }

    /// Set service name and banner, treating empty strings as absent.
    pub fn with_service(mut self, service: &str, banner: &str) -> Self {
        self.service = non_empty(service);
        self.banner = non_empty(banner);
        self
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// The `proto/port` key used by service lookups.
    pub fn service_key(&self) -> String {
        format!("{}/{}", self.protocol, self.port)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Scan output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// masscan list output, first line `#masscan`.
    Masscan,
    /// nmap greppable output, first line `# Nmap ...`.
    NmapGreppable,
}

impl Dialect {
    /// Determine the dialect from the first line of a stream.
    pub fn detect(first_line: &str) -> Option<Self> {
        let line = first_line.trim_start();
        if line.starts_with("#masscan") {
            Some(Self::Masscan)
        } else if line.starts_with("# Nmap") {
            Some(Self::NmapGreppable)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Masscan => write!(f, "masscan list"),
            Self::NmapGreppable => write!(f, "nmap greppable"),
        }
    }
}

/// Whether a line carries no port data in either dialect.
fn is_ignorable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.contains("Status:")
}

/// Parse one line into zero or more records.
///
/// Errors only concern this line; callers are expected to log and carry on.
pub fn parse_line(line: &str, dialect: Dialect) -> ParseResult<Vec<PortRecord>> {
    if is_ignorable(line) {
        return Ok(Vec::new());
    }

    match dialect {
        Dialect::Masscan => masscan::parse_line(line).map(|record| vec![record]),
        Dialect::NmapGreppable => {
            let parsed = nmap::parse_ports_line(line)?;
            for (tuple, err) in &parsed.rejected {
                warn!(host = %parsed.host, tuple = %tuple, "skipping port entry: {}", err);
            }
            Ok(parsed.records)
        }
    }
}

/// Counters collected while reading a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read, including the header.
    pub lines: usize,
    /// Records produced.
    pub records: usize,
    /// Lines rejected as malformed.
    pub skipped: usize,
}

/// Line-by-line reader over a scan output stream.
pub struct ScanReader<R> {
    reader: R,
    source_name: String,
    dialect: Dialect,
    stats: ParseStats,
}

impl<R: BufRead> ScanReader<R> {
    /// Read the header line and fix the dialect.
    ///
    /// Fails if the stream is empty or the header is not recognized.
    pub fn new(mut reader: R, source_name: impl Into<String>) -> ReportResult<Self> {
        let source_name = source_name.into();
        let mut buf = Vec::new();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Err(ReportError::EmptyInput { source_name });
        }

        let header = String::from_utf8_lossy(&buf);
        let dialect = Dialect::detect(&header).ok_or_else(|| ReportError::UnknownDialect {
            source_name: source_name.clone(),
        })?;
        debug!(source = %source_name, %dialect, "detected scan format");

        Ok(Self {
            reader,
            source_name,
            dialect,
            stats: ParseStats {
                lines: 1,
                ..ParseStats::default()
            },
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Feed every record in the remaining stream to `sink`.
    ///
    /// Malformed lines are logged and counted, never fatal. When a progress
    /// bar is given it is advanced by the number of bytes consumed.
    pub fn read_records<F>(
        mut self,
        progress: Option<&ProgressBar>,
        mut sink: F,
    ) -> ReportResult<ParseStats>
    where
        F: FnMut(PortRecord),
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = self.reader.read_until(b'\n', &mut buf)?;
            if read == 0 {
                break;
            }
            self.stats.lines += 1;
            if let Some(pb) = progress {
                pb.inc(read as u64);
            }

            let line = String::from_utf8_lossy(&buf);
            match parse_line(&line, self.dialect) {
                Ok(records) => {
                    self.stats.records += records.len();
                    records.into_iter().for_each(&mut sink);
                }
                Err(err) => {
                    self.stats.skipped += 1;
                    warn!(
                        source = %self.source_name,
                        line = self.stats.lines,
                        "skipping malformed line: {}",
                        err
                    );
                }
            }
        }

        debug!(
            source = %self.source_name,
            lines = self.stats.lines,
            records = self.stats.records,
            skipped = self.stats.skipped,
            "finished reading scan output"
        );
        Ok(self.stats)
    }

    /// Collect all records into a vector.
    pub fn collect_records(self) -> ReportResult<(Vec<PortRecord>, ParseStats)> {
        let mut records = Vec::new();
        let stats = self.read_records(None, |r| records.push(r))?;
        Ok((records, stats))
    }
}
