//! Declared target ranges and containment lookup.

use crate::error::{ReportError, ReportResult};
use crate::types::TargetRange;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::debug;

/// The ordered, de-duplicated list of in-scope ranges.
///
/// Lookups scan linearly. Target lists hold tens to hundreds of ranges while
/// scan files hold orders of magnitude more hosts, so this stays cheap.
#[derive(Debug, Clone, Default)]
pub struct TargetIndex {
    ranges: Vec<TargetRange>,
}

impl TargetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a targets list: one CIDR or IPv4 address per line.
    ///
    /// Blank lines and `#` comments are skipped. Any other unparsable line is
    /// an error, reported with its 1-based line number.
    pub fn load(text: &str) -> ReportResult<Self> {
        let mut index = Self::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let range = TargetRange::parse(line).map_err(|_| ReportError::InvalidTarget {
                line: number + 1,
                value: line.to_string(),
            })?;
            if !index.push(range) {
                debug!(target = %range, "ignoring duplicate target");
            }
        }

        Ok(index)
    }

    /// Read and parse a targets file.
    pub fn load_file(path: &Path) -> ReportResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::load(&text)
    }

    /// Add a range unless an identical one is already declared.
    pub fn push(&mut self, range: TargetRange) -> bool {
        if self.ranges.contains(&range) {
            return false;
        }
        self.ranges.push(range);
        true
    }

    /// The first declared range containing `addr`, with its position.
    pub fn find_containing(&self, addr: Ipv4Addr) -> Option<(usize, &TargetRange)> {
        self.ranges
            .iter()
            .enumerate()
            .find(|(_, range)| range.contains(addr))
    }

    /// Ranges in declaration order.
    pub fn ranges(&self) -> &[TargetRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_load_skips_comments_and_duplicates() {
        let text = "# segment A\n\
                    10.0.0.0/24\n\
                    \n\
                    10.0.0.9/24\n\
                    192.168.1.10\n\
                    \t# indented comment\n\
                    172.16.0.0/30\n";
        let index = TargetIndex::load(text).unwrap();
        let rendered: Vec<String> = index.ranges().iter().map(|r| r.to_string()).collect();
        assert_eq!(rendered, ["10.0.0.0/24", "192.168.1.10/32", "172.16.0.0/30"]);
    }

    #[test]
    fn test_load_reports_bad_line() {
        let err = TargetIndex::load("10.0.0.0/24\nnot-a-network\n").unwrap_err();
        assert!(matches!(err, ReportError::InvalidTarget { line: 2, .. }));
    }

    #[test]
    fn test_find_containing_matches_bounds() {
        let index = TargetIndex::load("10.0.0.0/30\n10.0.1.0/24\n192.168.5.5\n").unwrap();
        for range in index.ranges() {
            let min = u32::from(range.address_min());
            let max = u32::from(range.address_max());
            for probe in min.saturating_sub(2)..=max.saturating_add(2) {
                let probe = Ipv4Addr::from(probe);
                let found = index.find_containing(probe).map(|(_, r)| *r);
                let inside = range.address_min() <= probe && probe <= range.address_max();
                assert_eq!(found == Some(*range), inside, "probe {probe} against {range}");
            }
        }
    }

    #[test]
    fn test_out_of_scope_address() {
        let index = TargetIndex::load("10.0.0.0/24\n").unwrap();
        assert!(index.find_containing(addr("8.8.8.8")).is_none());
        assert_eq!(index.find_containing(addr("10.0.0.7")).map(|(i, _)| i), Some(0));
    }
}
