//! nmap greppable output (`-oG`).
//!
//! ```text
//! # Nmap 7.94 scan initiated ... as: nmap -sV -oG out.gnmap 10.0.0.0/24
//! Host: 10.0.0.5 ()	Status: Up
//! Host: 10.0.0.5 ()	Ports: 22/open/tcp//ssh//OpenSSH 8.9p1/, 53/open|filtered/udp//domain///	Ignored State: closed (997)
//! ```
//!
//! Each port entry has seven slash separated fields:
//! `port/state/protocol/owner/service/rpc_info/version`, usually followed by a
//! trailing slash. nmap replaces slashes inside values with `|`.

use crate::error::{ParseError, ParseResult};
use crate::types::{parse_port, PortState};
use std::net::Ipv4Addr;
use super::PortRecord;

/// Fields in one port entry.
const TUPLE_FIELDS: usize = 7;

/// A `Host:` line carrying a port list.
#[derive(Debug, Clone)]
pub struct PortsLine {
    pub host: Ipv4Addr,
    /// Every well-formed entry, in any state.
    pub records: Vec<PortRecord>,
    /// Entries that failed to parse, with the reason.
    pub rejected: Vec<(String, ParseError)>,
}

/// A classified greppable line.
#[derive(Debug, Clone)]
pub enum GreppableLine {
    /// `Host: <addr> (...)  Status: <status>`
    Status { host: Ipv4Addr, status: String },
    /// `Host: <addr> (...)  Ports: ...`
    Ports(PortsLine),
}

/// Classify a line. Comments, blank lines and host lines without a status or
/// port list give `Ok(None)`.
pub fn parse_host_line(line: &str) -> ParseResult<Option<GreppableLine>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    if let Some(idx) = trimmed.find("Status:") {
        let host = parse_host(trimmed)?;
        let status = trimmed[idx + "Status:".len()..]
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        return Ok(Some(GreppableLine::Status { host, status }));
    }

    if trimmed.contains("Ports:") {
        return parse_ports_line(trimmed).map(|ports| Some(GreppableLine::Ports(ports)));
    }

    parse_host(trimmed).map(|_| None)
}

/// Parse a `Host:` line into port records.
///
/// The line-level errors are a missing or invalid host. Individual entries
/// that are malformed end up in [`PortsLine::rejected`].
pub fn parse_ports_line(line: &str) -> ParseResult<PortsLine> {
    let host = parse_host(line)?;
    let mut parsed = PortsLine {
        host,
        records: Vec::new(),
        rejected: Vec::new(),
    };

    let Some(idx) = line.find("Ports:") else {
        return Ok(parsed);
    };

    for entry in split_entries(port_section(&line[idx + "Ports:".len()..])) {
        match parse_entry(host, &entry) {
            Ok(record) => parsed.records.push(record),
            Err(err) => parsed.rejected.push((entry, err)),
        }
    }

    Ok(parsed)
}

fn parse_host(line: &str) -> ParseResult<Ipv4Addr> {
    let idx = line.find("Host:").ok_or(ParseError::MissingHost)?;
    let token = line[idx + "Host:".len()..]
        .split_whitespace()
        .next()
        .ok_or(ParseError::MissingHost)?;
    token
        .parse()
        .map_err(|_| ParseError::InvalidAddress(token.to_string()))
}

/// Cut the port list at the next tab separated field or the
/// `Ignored State:` suffix.
fn port_section(rest: &str) -> &str {
    let rest = rest.trim_start();
    let rest = rest.split("Ignored State:").next().unwrap_or(rest);
    let rest = rest.split('\t').next().unwrap_or(rest);
    rest.trim()
}

/// Split a port list on the commas that start a new entry.
///
/// A new entry begins with `<port>/`. Any other comma belongs to a version
/// string and is kept, so a malformed entry never swallows its neighbour.
fn split_entries(section: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    let mut current = String::new();

    for piece in section.split(',') {
        if !current.is_empty() && starts_entry(piece) {
            entries.push(current.trim().to_string());
            current.clear();
        } else if !current.is_empty() {
            current.push(',');
        }
        current.push_str(piece);
    }

    entries.push(current.trim().to_string());
    entries.retain(|e| !e.is_empty());
    entries
}

/// Whether `piece` opens with a port number followed by `/`.
fn starts_entry(piece: &str) -> bool {
    let piece = piece.trim_start();
    let digits = piece.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && piece.as_bytes().get(digits) == Some(&b'/')
}

fn parse_entry(host: Ipv4Addr, entry: &str) -> ParseResult<PortRecord> {
    let mut fields: Vec<&str> = entry.split('/').collect();
    if fields.len() == TUPLE_FIELDS + 1 && fields.last() == Some(&"") {
        fields.pop();
    }
    let &[port, state, protocol, _owner, service, _rpc_info, version] = fields.as_slice() else {
        let found = match fields.last() {
            Some(&"") => fields.len() - 1,
            _ => fields.len(),
        };
        return Err(ParseError::FieldCount {
            expected: TUPLE_FIELDS,
            found,
        });
    };

    Ok(PortRecord::new(
        host,
        protocol.parse()?,
        parse_port(port)?,
        PortState::from(state),
    )
    .with_service(service, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Protocol;

    #[test]
    fn test_ports_line_with_ignored_state() {
        let line = "Host: 10.1.1.1 ()\tPorts: 21/filtered/tcp//ftp///, 80/open/tcp//http///, \
                    53/open|filtered/udp//domain///, 137/open/udp//netbios-ns///\tIgnored State: filtered (195)";
        let parsed = parse_ports_line(line).unwrap();
        assert!(parsed.rejected.is_empty());
        let ports: Vec<(u16, Protocol)> =
            parsed.records.iter().map(|r| (r.port, r.protocol)).collect();
        assert_eq!(
            ports,
            [
                (21, Protocol::Tcp),
                (80, Protocol::Tcp),
                (53, Protocol::Udp),
                (137, Protocol::Udp)
            ]
        );
        assert_eq!(parsed.records[2].state, PortState::OpenFiltered);
    }

    #[test]
    fn test_ignored_state_with_spaces() {
        let line = "Host: 10.0.0.5 ()  Ports: 22/open/tcp//ssh///  Ignored State: closed (999)";
        let parsed = parse_ports_line(line).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_banner_and_service() {
        let line = "Host: 10.0.0.9 (web.local)\tPorts: 22/open/tcp//ssh//OpenSSH 7.2p2 Ubuntu 4ubuntu2.8 (Ubuntu Linux; protocol 2.0)/";
        let parsed = parse_ports_line(line).unwrap();
        let record = &parsed.records[0];
        assert_eq!(record.service.as_deref(), Some("ssh"));
        assert_eq!(
            record.banner.as_deref(),
            Some("OpenSSH 7.2p2 Ubuntu 4ubuntu2.8 (Ubuntu Linux; protocol 2.0)")
        );
    }

    #[test]
    fn test_comma_inside_banner() {
        let line = "Host: 10.0.0.9 ()\tPorts: 80/open/tcp//http//Apache httpd 2.4, mod_ssl/, 443/open/tcp//https///";
        let parsed = parse_ports_line(line).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(
            parsed.records[0].banner.as_deref(),
            Some("Apache httpd 2.4, mod_ssl")
        );
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let line = "Host: 10.0.0.5 ()\tPorts: 22/open/tcp//ssh///, 23/open/tcp/, 25/open/tcp//smtp///";
        let parsed = parse_ports_line(line).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].0, "23/open/tcp/");
        assert!(matches!(
            parsed.rejected[0].1,
            ParseError::FieldCount { expected: 7, found: 3 }
        ));
    }

    #[test]
    fn test_short_entry_does_not_swallow_next() {
        let line = "Host: 10.0.0.5 ()\tPorts: 23/open/tcp, 25/open/tcp//smtp///";
        let parsed = parse_ports_line(line).unwrap();
        assert_eq!(parsed.host, "10.0.0.5".parse::<Ipv4Addr>().unwrap());
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].port, 25);
        assert_eq!(parsed.records[0].service.as_deref(), Some("smtp"));
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].0, "23/open/tcp");
        assert!(matches!(
            parsed.rejected[0].1,
            ParseError::FieldCount { expected: 7, found: 3 }
        ));
    }

    #[test]
    fn test_entry_starts() {
        assert!(starts_entry(" 443/open/tcp//https///"));
        assert!(starts_entry("80/"));
        assert!(!starts_entry(" mod_ssl/"));
        assert!(!starts_entry(" 2.4 beta/"));
        assert!(!starts_entry(""));
    }

    #[test]
    fn test_entry_without_trailing_slash() {
        let line = "Host: 10.0.0.5 ()\tPorts: 22/open/tcp//ssh//";
        let parsed = parse_ports_line(line).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.records[0].banner.is_none());
    }

    #[test]
    fn test_missing_host() {
        assert_eq!(
            parse_ports_line("Ports: 22/open/tcp//ssh///").unwrap_err(),
            ParseError::MissingHost
        );
        assert!(matches!(
            parse_ports_line("Host: not-an-ip ()\tPorts: 22/open/tcp//ssh///"),
            Err(ParseError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_classify_lines() {
        assert!(parse_host_line("# Nmap done").unwrap().is_none());
        match parse_host_line("Host: 10.0.0.1 ()\tStatus: Up").unwrap() {
            Some(GreppableLine::Status { host, status }) => {
                assert_eq!(host.to_string(), "10.0.0.1");
                assert_eq!(status, "Up");
            }
            other => panic!("expected status line, got {:?}", other),
        }
        assert!(matches!(
            parse_host_line("Host: 10.0.0.1 ()\tPorts: 80/open/tcp//http///").unwrap(),
            Some(GreppableLine::Ports(_))
        ));
        assert!(parse_host_line("Host: 10.0.0.1 ()\tOS: Linux").unwrap().is_none());
    }
}
