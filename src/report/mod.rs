//! Aggregated reports: per-target port sets and cross-run summaries.

mod aggregator;
mod summary;

pub use aggregator::{
    DetailRow, ReportSet, RouteOutcome, RouteStats, SummaryCsvRow, TargetReport,
};
pub use summary::{SummaryMerger, SummaryRow};

use crate::error::ReportResult;
use crate::parser::{ParseStats, PortRecord, ScanReader};
use indicatif::ProgressBar;
use std::io::BufRead;

/// Route every record of a scan stream into `reports`.
///
/// `on_open` sees each open record whether or not it is in scope, which is
/// what the detail CSV lists when no detection data is available.
pub fn aggregate<R, F>(
    reports: &mut ReportSet,
    scan: ScanReader<R>,
    progress: Option<&ProgressBar>,
    mut on_open: F,
) -> ReportResult<ParseStats>
where
    R: BufRead,
    F: FnMut(&PortRecord),
{
    scan.read_records(progress, |record| {
        if record.is_open() {
            on_open(&record);
        }
        reports.route(&record);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TargetIndex;
    use std::io::Cursor;

    #[test]
    fn test_masscan_stream_end_to_end() {
        let index = TargetIndex::load("10.0.0.0/30\n10.0.1.0/24\n").unwrap();
        let mut reports = ReportSet::new(index);
        let scan = ScanReader::new(
            Cursor::new(
                "#masscan\n\
                 open tcp 80 10.0.0.1 12345\n\
                 open tcp 80 10.0.0.2 12345\n\
                 open udp 53 10.0.1.7 12345\n\
                 open tcp 53 8.8.8.8 12345\n\
                 # end\n",
            ),
            "run1.txt",
        )
        .unwrap();

        let mut open = Vec::new();
        let stats = aggregate(&mut reports, scan, None, |r| open.push(r.host)).unwrap();
        assert_eq!(stats.records, 4);
        assert_eq!(open.len(), 4);
        assert_eq!(reports.stats().out_of_scope, 1);

        let rows = reports.rows("run1.txt", true);
        assert_eq!(
            rows,
            [
                SummaryCsvRow {
                    target: "10.0.0.0/30".into(),
                    source: "run1.txt".into(),
                    open_ports_tcp: "80".into(),
                    open_ports_udp: "".into(),
                },
                SummaryCsvRow {
                    target: "10.0.1.0/24".into(),
                    source: "run1.txt".into(),
                    open_ports_tcp: "".into(),
                    open_ports_udp: "53".into(),
                },
            ]
        );
    }

    #[test]
    fn test_runs_merge_into_one_summary() {
        let mut merger = SummaryMerger::new();
        for source in ["fileA.txt", "fileB.txt"] {
            let mut reports = ReportSet::new(TargetIndex::load("10.0.0.0/24\n").unwrap());
            let scan = ScanReader::new(
                Cursor::new("#masscan\nopen tcp 443 10.0.0.3 1\nopen tcp 80 10.0.0.4 1\n"),
                source,
            )
            .unwrap();
            aggregate(&mut reports, scan, None, |_| {}).unwrap();
            reports.rows(source, true).into_iter().for_each(|r| merger.ingest_row(r));
        }
        let rows = merger.finish();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sources, ["fileA.txt", "fileB.txt"]);
        assert_eq!(rows[0].open_tcp, "80; 443");
    }
}
