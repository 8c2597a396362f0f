//! Per-target aggregation of open ports.

use crate::detection::{ServiceEntry, ServiceKey, ServiceStore};
use crate::index::TargetIndex;
use crate::parser::PortRecord;
use crate::services;
use crate::types::{PortSet, Protocol, TargetRange};
use serde::{Deserialize, Serialize};

/// Open ports found inside one declared target range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetReport {
    pub target: TargetRange,
    pub open_tcp: PortSet,
    pub open_udp: PortSet,
}

impl TargetReport {
    pub fn new(target: TargetRange) -> Self {
        Self {
            target,
            open_tcp: PortSet::new(),
            open_udp: PortSet::new(),
        }
    }

    /// Record an open port. Returns `true` if it was new.
    pub fn add_port(&mut self, protocol: Protocol, port: u16) -> bool {
        match protocol {
            Protocol::Tcp => self.open_tcp.insert(port),
            Protocol::Udp => self.open_udp.insert(port),
        }
    }

    /// Reports without open ports are left out of every output.
    pub fn has_open_ports(&self) -> bool {
        !self.open_tcp.is_empty() || !self.open_udp.is_empty()
    }

    fn open_ports(&self, protocol: Protocol) -> &PortSet {
        match protocol {
            Protocol::Tcp => &self.open_tcp,
            Protocol::Udp => &self.open_udp,
        }
    }

    /// Human readable block. With a service store, each open port is followed
    /// by the distinct detections seen on hosts inside the range.
    pub fn render(&self, services: Option<&ServiceStore>) -> String {
        let mut out = format!(
            "Target Network: {}\nOpen TCP Ports:\n{}\nOpen UDP Ports:\n{}\n",
            self.target,
            self.open_tcp.render_with(", "),
            self.open_udp.render_with(", "),
        );

        let Some(store) = services else {
            return out;
        };

        out.push_str("Unique Service Detections:\n");
        let detections = store.detections_in(&self.target);
        for protocol in [Protocol::Tcp, Protocol::Udp] {
            for port in self.open_ports(protocol).iter() {
                let key = ServiceKey::new(protocol, port);
                let Some(found) = detections.get(&key) else {
                    continue;
                };
                out.push_str(&format!("{}:\n", key));
                for detection in found {
                    out.push_str(&format!("\t{}\n", detection));
                }
            }
        }

        out
    }

    /// Flat CSV summary row. `source` names the scan file the report came from.
    pub fn to_row(&self, source: impl Into<String>) -> SummaryCsvRow {
        SummaryCsvRow {
            target: self.target.to_string(),
            source: source.into(),
            open_ports_tcp: self.open_tcp.render_canonical(),
            open_ports_udp: self.open_udp.render_canonical(),
        }
    }
}

/// One line of a per-run summary CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCsvRow {
    pub target: String,
    pub source: String,
    pub open_ports_tcp: String,
    pub open_ports_udp: String,
}

/// One line of the detail CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub ip: String,
    pub proto: String,
    pub port: u16,
    pub status: String,
    pub service: String,
    pub service_info: String,
}

impl DetailRow {
    /// Detail for a scan record without detection data; the service name
    /// comes from the well-known services table.
    pub fn from_record(record: &PortRecord) -> Self {
        Self {
            ip: record.host.to_string(),
            proto: record.protocol.to_string(),
            port: record.port,
            status: record.state.to_string(),
            service: services::get_service_name(record.protocol, record.port)
                .unwrap_or_default()
                .to_string(),
            service_info: String::new(),
        }
    }
}

impl From<&ServiceEntry> for DetailRow {
    fn from(entry: &ServiceEntry) -> Self {
        Self {
            ip: entry.host.to_string(),
            proto: entry.protocol.to_string(),
            port: entry.port,
            status: entry.state.to_string(),
            service: entry.service.clone(),
            service_info: entry.banner.clone(),
        }
    }
}

/// What happened to a routed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Added to the report at this position (possibly already present).
    Added(usize),
    /// The port is not `open`.
    NotOpen,
    /// No declared range contains the host.
    OutOfScope,
}

/// Routing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub added: usize,
    pub not_open: usize,
    pub out_of_scope: usize,
}

/// One [`TargetReport`] per declared range, in declaration order.
#[derive(Debug, Clone)]
pub struct ReportSet {
    index: TargetIndex,
    reports: Vec<TargetReport>,
    stats: RouteStats,
}

impl ReportSet {
    pub fn new(index: TargetIndex) -> Self {
        let reports = index.ranges().iter().copied().map(TargetReport::new).collect();
        Self {
            index,
            reports,
            stats: RouteStats::default(),
        }
    }

    /// Add an open record to the report of the range containing its host.
    pub fn route(&mut self, record: &PortRecord) -> RouteOutcome {
        let outcome = if !record.is_open() {
            RouteOutcome::NotOpen
        } else if let Some((position, _)) = self.index.find_containing(record.host) {
            self.reports[position].add_port(record.protocol, record.port);
            RouteOutcome::Added(position)
        } else {
            RouteOutcome::OutOfScope
        };

        match outcome {
            RouteOutcome::Added(_) => self.stats.added += 1,
            RouteOutcome::NotOpen => self.stats.not_open += 1,
            RouteOutcome::OutOfScope => self.stats.out_of_scope += 1,
        }
        outcome
    }

    pub fn stats(&self) -> RouteStats {
        self.stats
    }

    /// Every report, in declaration order.
    pub fn reports(&self) -> &[TargetReport] {
        &self.reports
    }

    /// Reports with open ports, in declaration order.
    pub fn with_open_ports(&self) -> Vec<&TargetReport> {
        self.reports.iter().filter(|r| r.has_open_ports()).collect()
    }

    /// Reports with open ports, ordered by network address.
    pub fn sorted_by_network(&self) -> Vec<&TargetReport> {
        let mut reports = self.with_open_ports();
        reports.sort_by(|a, b| a.target.cmp(&b.target));
        reports
    }

    /// CSV summary rows for reports with open ports.
    pub fn rows(&self, source: &str, by_network: bool) -> Vec<SummaryCsvRow> {
        let reports = if by_network {
            self.sorted_by_network()
        } else {
            self.with_open_ports()
        };
        reports.into_iter().map(|r| r.to_row(source)).collect()
    }
}
