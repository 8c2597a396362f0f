//! Merging per-run summary CSVs into one consolidated summary.
//!
//! Rows are merged when target, TCP port text and UDP port text are all
//! identical. Port text is compared as written, not re-parsed, which is sound
//! because every summary is written through `PortSet::render_canonical`.

use crate::detection::files_with_extension;
use crate::error::{ReportError, ReportResult};
use crate::types::TargetRange;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use super::aggregator::SummaryCsvRow;
use tracing::{debug, warn};

/// Columns in a per-run summary CSV.
const SUMMARY_COLUMNS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    target: String,
    open_tcp: String,
    open_udp: String,
}

/// One consolidated row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub network_id: u32,
    pub target: String,
    #[serde(serialize_with = "join_sources")]
    pub sources: Vec<String>,
    pub open_tcp: String,
    pub open_udp: String,
}

fn join_sources<S: Serializer>(sources: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&sources.join("; "))
}

/// Accumulates summary rows from any number of runs.
#[derive(Debug, Clone, Default)]
pub struct SummaryMerger {
    keys: HashMap<MergeKey, usize>,
    entries: Vec<(MergeKey, Vec<String>)>,
}

impl SummaryMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row: append its source to a matching entry or start a new one.
    pub fn ingest_row(&mut self, row: SummaryCsvRow) {
        let key = MergeKey {
            target: row.target,
            open_tcp: row.open_ports_tcp,
            open_udp: row.open_ports_udp,
        };
        self.add_sources(key, vec![row.source]);
    }

    fn add_sources(&mut self, key: MergeKey, sources: Vec<String>) {
        match self.keys.get(&key) {
            Some(&position) => self.entries[position].1.extend(sources),
            None => {
                self.keys.insert(key.clone(), self.entries.len());
                self.entries.push((key, sources));
            }
        }
    }

    /// Fold another accumulator into this one, keeping its source order.
    pub fn merge(&mut self, other: SummaryMerger) {
        for (key, sources) in other.entries {
            self.add_sources(key, sources);
        }
    }

    /// Read a summary CSV. The header row is skipped; rows without exactly
    /// four columns are logged and ignored. Returns the rows accepted.
    pub fn ingest_reader<R: Read>(&mut self, reader: R, source_name: &str) -> ReportResult<usize> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut accepted = 0;
        for (number, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() != SUMMARY_COLUMNS {
                warn!(
                    source = source_name,
                    row = number + 1,
                    columns = record.len(),
                    "skipping summary row with wrong column count"
                );
                continue;
            }
            self.ingest_row(SummaryCsvRow {
                target: record[0].to_string(),
                source: record[1].to_string(),
                open_ports_tcp: record[2].to_string(),
                open_ports_udp: record[3].to_string(),
            });
            accepted += 1;
        }

        Ok(accepted)
    }

    /// Read a summary file. Read and CSV errors name the file.
    pub fn ingest_file(&mut self, path: &Path) -> ReportResult<usize> {
        let file = File::open(path).map_err(|e| ReportError::io(path, e))?;
        self.ingest_reader(file, &path.display().to_string())
            .map_err(|e| match e {
                ReportError::Csv(source) => ReportError::CsvFile {
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })
    }

    /// Ingest every summary in `dir` ending with `extension`, in file name
    /// order. Returns the number of files read.
    pub fn merge_dir(&mut self, dir: &Path, extension: &str) -> ReportResult<usize> {
        let files = files_with_extension(dir, extension)?;
        for path in &files {
            let rows = self.ingest_file(path)?;
            debug!(file = %path.display(), rows, "merged summary");
        }
        Ok(files.len())
    }

    /// Number of distinct entries so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the consolidated rows ordered by network address. Entries whose
    /// target is not an IPv4 network are dropped with a warning.
    pub fn finish(self) -> Vec<SummaryRow> {
        let mut rows: Vec<SummaryRow> = self
            .entries
            .into_iter()
            .filter_map(|(key, sources)| {
                let network_id = match TargetRange::parse(&key.target) {
                    Ok(range) => range.network_id(),
                    Err(err) => {
                        warn!(target = %key.target, "dropping summary entry: {}", err);
                        return None;
                    }
                };
                Some(SummaryRow {
                    network_id,
                    target: key.target,
                    sources,
                    open_tcp: key.open_tcp,
                    open_udp: key.open_udp,
                })
            })
            .collect();

        rows.sort_by_key(|row| row.network_id);
        rows
    }
}
