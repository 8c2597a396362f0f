//! CSV output formatting.

use crate::error::{ReportError, ReportResult};
use crate::report::{DetailRow, SummaryCsvRow, SummaryRow};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Header of a per-run summary.
pub const SUMMARY_HEADER: [&str; 4] = ["target", "source", "open_ports_tcp", "open_ports_udp"];
/// Header of a detail file.
pub const DETAIL_HEADER: [&str; 6] = ["ip", "proto", "port", "status", "service", "service_info"];
/// Header of a consolidated cross-run summary.
pub const MERGED_HEADER: [&str; 5] = ["network_id", "target", "sources", "open_tcp", "open_udp"];

/// Write `rows` after an explicit header, so an empty file still has one.
pub fn write_rows<W, T>(writer: W, header: &[&str], rows: &[T]) -> ReportResult<()>
where
    W: Write,
    T: Serialize,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_file<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> ReportResult<()> {
    let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    write_rows(file, header, rows)
}

/// Write a per-run summary CSV.
pub fn write_summary(path: &Path, rows: &[SummaryCsvRow]) -> ReportResult<()> {
    write_file(path, &SUMMARY_HEADER, rows)
}

/// Write a detail CSV.
pub fn write_detail(path: &Path, rows: &[DetailRow]) -> ReportResult<()> {
    write_file(path, &DETAIL_HEADER, rows)
}

/// Write a consolidated cross-run summary CSV.
pub fn write_merged(path: &Path, rows: &[SummaryRow]) -> ReportResult<()> {
    write_file(path, &MERGED_HEADER, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SummaryMerger;
    use std::fs;

    #[test]
    fn test_empty_summary_has_header() {
        let mut buf = Vec::new();
        write_rows::<_, SummaryCsvRow>(&mut buf, &SUMMARY_HEADER, &[]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "target,source,open_ports_tcp,open_ports_udp\n"
        );
    }

    #[test]
    fn test_summary_round_trips_through_merger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run1.csv");
        let rows = vec![SummaryCsvRow {
            target: "10.0.0.0/24".to_string(),
            source: "scan1.txt".to_string(),
            open_ports_tcp: "22; 80".to_string(),
            open_ports_udp: String::new(),
        }];
        write_summary(&path, &rows).unwrap();

        let mut merger = SummaryMerger::new();
        merger.ingest_file(&path).unwrap();
        let merged = merger.finish();
        assert_eq!(merged[0].open_tcp, "22; 80");
        assert_eq!(merged[0].sources, ["scan1.txt"]);

        let out = dir.path().join("summary.csv");
        write_merged(&out, &merged).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("network_id,target,sources,open_tcp,open_udp\n"));
    }

    #[test]
    fn test_detail_columns() {
        let rows = vec![DetailRow {
            ip: "10.0.0.1".to_string(),
            proto: "tcp".to_string(),
            port: 22,
            status: "open".to_string(),
            service: "ssh".to_string(),
            service_info: "OpenSSH 8.9p1".to_string(),
        }];
        let mut buf = Vec::new();
        write_rows(&mut buf, &DETAIL_HEADER, &rows).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "ip,proto,port,status,service,service_info\n10.0.0.1,tcp,22,open,ssh,OpenSSH 8.9p1\n"
        );
    }
}
