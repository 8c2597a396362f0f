//! JSON output formatting.

use crate::detection::ServiceStore;
use crate::error::ReportResult;
use crate::report::TargetReport;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
struct ReportView<'a> {
    #[serde(flatten)]
    report: &'a TargetReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    detections: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Serialize)]
struct ScanView<'a> {
    source: &'a str,
    generated_at: chrono::DateTime<chrono::Utc>,
    reports: Vec<ReportView<'a>>,
}

pub(crate) fn to_json(
    source: &str,
    reports: &[&TargetReport],
    services: Option<&ServiceStore>,
) -> serde_json::Result<String> {
    let reports = reports
        .iter()
        .map(|report| ReportView {
            report,
            detections: services.map(|store| {
                store
                    .detections_in(&report.target)
                    .into_iter()
                    .filter(|(key, _)| match key.protocol {
                        crate::types::Protocol::Tcp => report.open_tcp.contains(key.port),
                        crate::types::Protocol::Udp => report.open_udp.contains(key.port),
                    })
                    .map(|(key, found)| (key.to_string(), found.into_iter().collect()))
                    .collect()
            }),
        })
        .collect();

    serde_json::to_string_pretty(&ScanView {
        source,
        generated_at: chrono::Utc::now(),
        reports,
    })
}

/// Print reports in JSON format.
pub fn print_json(
    source: &str,
    reports: &[&TargetReport],
    services: Option<&ServiceStore>,
) -> ReportResult<()> {
    let json = to_json(source, reports, services)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Protocol, TargetRange};
    use std::io::Cursor;

    #[test]
    fn test_json_shape() {
        let mut store = ServiceStore::new();
        store
            .load_reader(
                Cursor::new(
                    "Host: 10.0.0.5 ()\tPorts: 22/open/tcp//ssh//OpenSSH/, 25/open/tcp//smtp///\n",
                ),
                "detections",
            )
            .unwrap();
        let mut report = TargetReport::new(TargetRange::parse("10.0.0.0/24").unwrap());
        report.add_port(Protocol::Tcp, 22);

        let json = to_json("scan.txt", &[&report], Some(&store)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value["reports"][0];
        assert_eq!(first["target"], "10.0.0.0/24");
        assert_eq!(first["open_tcp"], serde_json::json!([22]));
        assert_eq!(first["detections"]["tcp/22"], serde_json::json!(["open:ssh:OpenSSH"]));
        assert!(first["detections"].get("tcp/25").is_none());
        assert_eq!(value["source"], "scan.txt");
    }
}
