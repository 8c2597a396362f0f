//! Port, protocol and port-state types.
//!
//! `PortSet` is the only place a set of ports is turned into text for a CSV
//! summary. Cross-run merging compares that text verbatim, so every writer must
//! go through [`PortSet::render_canonical`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Transport protocol of a port record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Lowercase name as it appears in scan output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            _ => Err(ParseError::InvalidProtocol(s.to_string())),
        }
    }
}

/// State of a port as reported by the scanner.
///
/// Unrecognized states are kept verbatim in `Other` so that service
/// detection output round-trips without loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
    OpenFiltered,
    ClosedFiltered,
    Unfiltered,
    Other(String),
}

impl PortState {
    /// Only `open` counts towards a target report; `open|filtered` does not.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Filtered => "filtered",
            Self::OpenFiltered => "open|filtered",
            Self::ClosedFiltered => "closed|filtered",
            Self::Unfiltered => "unfiltered",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for PortState {
    fn from(s: &str) -> Self {
        match s {
            "open" => Self::Open,
            "closed" => Self::Closed,
            "filtered" => Self::Filtered,
            "open|filtered" => Self::OpenFiltered,
            "closed|filtered" => Self::ClosedFiltered,
            "unfiltered" => Self::Unfiltered,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for PortState {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<PortState> for String {
    fn from(state: PortState) -> Self {
        state.as_str().to_string()
    }
}

/// Parse a port number field, accepting the full 0-65535 range.
pub fn parse_port(s: &str) -> Result<u16, ParseError> {
    s.trim()
        .parse()
        .map_err(|_| ParseError::InvalidPort(s.to_string()))
}

/// A sorted set of unique port numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortSet(BTreeSet<u16>);

impl PortSet {
    /// Separator used by CSV summaries.
    pub const CANONICAL_SEPARATOR: &'static str = "; ";

    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a port; returns `true` if it was not already present.
    pub fn insert(&mut self, port: u16) -> bool {
        self.0.insert(port)
    }

    pub fn contains(&self, port: u16) -> bool {
        self.0.contains(&port)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }

    /// Render ascending with an arbitrary separator.
    pub fn render_with(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// The one rendering used in CSV summaries and as a merge key.
    pub fn render_canonical(&self) -> String {
        self.render_with(Self::CANONICAL_SEPARATOR)
    }
}

impl FromIterator<u16> for PortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_canonical())
    }
}

/// Inverse of [`PortSet::render_canonical`]. Tolerates missing spaces after
/// the semicolons; an empty string is the empty set.
impl FromStr for PortSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(parse_port)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_parsing() {
        assert_eq!("tcp".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("UDP".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!(matches!(
            "sctp".parse::<Protocol>(),
            Err(ParseError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn test_port_state_verbatim() {
        assert_eq!(PortState::from("open"), PortState::Open);
        assert_eq!(PortState::from("open|filtered"), PortState::OpenFiltered);
        let odd = PortState::from("weird");
        assert_eq!(odd.to_string(), "weird");
        assert!(!odd.is_open());
        assert!(!PortState::OpenFiltered.is_open());
    }

    #[test]
    fn test_parse_port_bounds() {
        assert_eq!(parse_port("0").unwrap(), 0);
        assert_eq!(parse_port("65535").unwrap(), 65535);
        assert!(parse_port("65536").is_err());
        assert!(parse_port("http").is_err());
    }

    #[test]
    fn test_canonical_rendering_is_sorted() {
        let set: PortSet = [443, 80, 8080, 80].into_iter().collect();
        assert_eq!(set.render_canonical(), "80; 443; 8080");
        assert_eq!(set.render_with(", "), "80, 443, 8080");
        assert_eq!(PortSet::new().render_canonical(), "");
    }

    #[test]
    fn test_rendering_round_trip() {
        let set: PortSet = (0..=u16::MAX).step_by(7).collect();
        let parsed: PortSet = set.render_canonical().parse().unwrap();
        assert_eq!(parsed, set);

        let full: PortSet = (0..=u16::MAX).collect();
        assert_eq!(full.len(), 65536);
        assert_eq!(full.render_canonical().parse::<PortSet>().unwrap(), full);

        assert!("".parse::<PortSet>().unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("80; abc".parse::<PortSet>().is_err());
    }
}
