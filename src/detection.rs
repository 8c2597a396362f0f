//! Service detection results, keyed by host.
//!
//! Populated from nmap greppable files produced by version scans (`-sV -oG`).
//! Every port state is kept, not just `open`. Adding the same host and
//! `proto/port` twice keeps the later entry.

use crate::error::{ReportError, ReportResult};
use crate::parser::{nmap, PortRecord};
use crate::types::{PortState, Protocol, TargetRange};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// `proto/port` lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ServiceKey {
    pub protocol: Protocol,
    pub port: u16,
}

impl ServiceKey {
    pub const fn new(protocol: Protocol, port: u16) -> Self {
        Self { protocol, port }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.port)
    }
}

/// One detection result for one host and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    pub host: Ipv4Addr,
    pub protocol: Protocol,
    pub port: u16,
    pub state: PortState,
    pub service: String,
    pub banner: String,
}

impl ServiceEntry {
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(self.protocol, self.port)
    }

    /// `state:service:banner`, the form shown in rendered reports.
    pub fn detection_string(&self) -> String {
        format!("{}:{}:{}", self.state, self.service, self.banner)
    }
}

impl From<&PortRecord> for ServiceEntry {
    fn from(record: &PortRecord) -> Self {
        Self {
            host: record.host,
            protocol: record.protocol,
            port: record.port,
            state: record.state.clone(),
            service: record.service.clone().unwrap_or_default(),
            banner: record.banner.clone().unwrap_or_default(),
        }
    }
}

/// Detection entries of a single host.
pub type HostServices = BTreeMap<ServiceKey, ServiceEntry>;

/// Counters from loading a detection directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub files: usize,
    pub entries: usize,
    pub skipped: usize,
}

/// Per-host service detection data.
///
/// Only mutated while loading; report rendering reads it afterwards.
#[derive(Debug, Clone, Default)]
pub struct ServiceStore {
    hosts: HashMap<Ipv4Addr, HostServices>,
}

impl ServiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for the record's host and `proto/port`.
    pub fn insert(&mut self, record: &PortRecord) {
        let entry = ServiceEntry::from(record);
        self.hosts
            .entry(entry.host)
            .or_default()
            .insert(entry.key(), entry);
    }

    /// Load every line with a port list from a greppable stream.
    pub fn load_reader<R: BufRead>(
        &mut self,
        reader: R,
        source_name: &str,
    ) -> ReportResult<LoadStats> {
        let mut stats = LoadStats {
            files: 1,
            ..LoadStats::default()
        };

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if !line.contains("Ports:") {
                continue;
            }

            match nmap::parse_ports_line(&line) {
                Ok(parsed) => {
                    for (entry, err) in &parsed.rejected {
                        stats.skipped += 1;
                        warn!(
                            source = source_name,
                            line = number + 1,
                            entry = %entry,
                            "skipping port entry: {}",
                            err
                        );
                    }
                    for record in &parsed.records {
                        self.insert(record);
                    }
                    stats.entries += parsed.records.len();
                }
                Err(err) => {
                    stats.skipped += 1;
                    warn!(
                        source = source_name,
                        line = number + 1,
                        "skipping malformed line: {}",
                        err
                    );
                }
            }
        }

        Ok(stats)
    }

    /// Load a single greppable file.
    pub fn load_file(&mut self, path: &Path) -> ReportResult<LoadStats> {
        let file = fs::File::open(path).map_err(|e| ReportError::io(path, e))?;
        let name = path.display().to_string();
        self.load_reader(BufReader::new(file), &name)
            .map_err(|e| match e {
                ReportError::Stream(source) => ReportError::io(path, source),
                other => other,
            })
    }

    /// Load every file in `dir` whose name ends with `extension`, in file
    /// name order.
    pub fn load_from_dir(&mut self, dir: &Path, extension: &str) -> ReportResult<LoadStats> {
        let mut totals = LoadStats::default();

        for path in files_with_extension(dir, extension)? {
            debug!(file = %path.display(), "reading service detections");
            let stats = self.load_file(&path)?;
            totals.files += stats.files;
            totals.entries += stats.entries;
            totals.skipped += stats.skipped;
        }

        Ok(totals)
    }

    /// All detections for a host.
    pub fn lookup(&self, host: Ipv4Addr) -> Option<&HostServices> {
        self.hosts.get(&host)
    }

    /// Unique `state:service:banner` strings per `proto/port` across every
    /// host inside `range`.
    pub fn detections_in(&self, range: &TargetRange) -> BTreeMap<ServiceKey, BTreeSet<String>> {
        let mut detections: BTreeMap<ServiceKey, BTreeSet<String>> = BTreeMap::new();

        for (host, services) in &self.hosts {
            if !range.contains(*host) {
                continue;
            }
            for (key, entry) in services {
                detections
                    .entry(*key)
                    .or_default()
                    .insert(entry.detection_string());
            }
        }

        detections
    }

    /// Every entry ordered by host, protocol and port.
    pub fn entries(&self) -> Vec<&ServiceEntry> {
        let mut hosts: Vec<_> = self.hosts.iter().collect();
        hosts.sort_by_key(|(host, _)| **host);
        hosts
            .into_iter()
            .flat_map(|(_, services)| services.values())
            .collect()
    }

    /// Number of hosts with at least one entry.
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Regular files in `dir` whose name ends with `extension`, sorted by name.
pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> ReportResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))? {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let path = entry.path();
        let matches = path
            .file_name()
            .map_or(false, |name| name.to_string_lossy().ends_with(extension));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn addr(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    const DETECTION: &str = "# Nmap 7.94 scan initiated as: nmap -sV -p22 -oG service_detection_tcp_22.gnmap\n\
        Host: 10.0.0.5 ()\tStatus: Up\n\
        Host: 10.0.0.5 ()\tPorts: 22/open/tcp//ssh//OpenSSH 8.9p1/, 23/filtered/tcp//telnet///\n\
        Host: 10.0.0.6 ()\tPorts: 22/open/tcp//ssh//OpenSSH 8.9p1/\n\
        Host: 10.0.1.1 ()\tPorts: 22/open/tcp//ssh//dropbear/\n\
        # Nmap done\n";

    fn store() -> ServiceStore {
        let mut store = ServiceStore::new();
        store.load_reader(Cursor::new(DETECTION), "test").unwrap();
        store
    }

    #[test]
    fn test_lookup_keeps_all_states() {
        let store = store();
        let services = store.lookup(addr("10.0.0.5")).unwrap();
        assert_eq!(services.len(), 2);
        let telnet = &services[&ServiceKey::new(Protocol::Tcp, 23)];
        assert_eq!(telnet.state, PortState::Filtered);
        assert_eq!(telnet.service, "telnet");
        assert!(store.lookup(addr("10.0.0.7")).is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = store();
        let newer = "Host: 10.0.0.5 ()\tPorts: 22/open/tcp//ssh//OpenSSH 9.6/\n";
        store.load_reader(Cursor::new(newer), "rescan").unwrap();
        let services = store.lookup(addr("10.0.0.5")).unwrap();
        assert_eq!(services.len(), 2);
        assert_eq!(services[&ServiceKey::new(Protocol::Tcp, 22)].banner, "OpenSSH 9.6");
    }

    #[test]
    fn test_detections_deduplicate_across_hosts() {
        let store = store();
        let range = TargetRange::parse("10.0.0.0/24").unwrap();
        let detections = store.detections_in(&range);
        let ssh = &detections[&ServiceKey::new(Protocol::Tcp, 22)];
        assert_eq!(ssh.len(), 1);
        assert!(ssh.contains("open:ssh:OpenSSH 8.9p1"));
        assert!(detections[&ServiceKey::new(Protocol::Tcp, 23)].contains("filtered:telnet:"));
    }

    #[test]
    fn test_entries_sorted() {
        let store = store();
        let hosts: Vec<String> = store
            .entries()
            .iter()
            .map(|e| format!("{}:{}", e.host, e.key()))
            .collect();
        assert_eq!(
            hosts,
            ["10.0.0.5:tcp/22", "10.0.0.5:tcp/23", "10.0.0.6:tcp/22", "10.0.1.1:tcp/22"]
        );
        assert_eq!(store.host_count(), 3);
    }

    #[test]
    fn test_load_from_dir_filters_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("service_detection_tcp_22.gnmap"), DETECTION).unwrap();
        fs::write(
            dir.path().join("service_detection_udp_161.gnmap"),
            "Host: 10.0.0.5 ()\tPorts: 161/open/udp//snmp//SNMPv1 server/, 162/bad/\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("notes.txt"),
            "Host: 10.9.9.9 ()\tPorts: 80/open/tcp//http///\n",
        )
        .unwrap();

        let mut store = ServiceStore::new();
        let stats = store.load_from_dir(dir.path(), ".gnmap").unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.entries, 5);
        assert_eq!(stats.skipped, 1);
        assert!(store.lookup(addr("10.9.9.9")).is_none());
        assert_eq!(store.lookup(addr("10.0.0.5")).unwrap().len(), 3);
    }
}
