//! Well-known service names by protocol and port.
//!
//! Backed by nmap's top 1000 TCP and top 100 UDP services, embedded at build
//! time and parsed once on first use.

use crate::types::Protocol;
use std::collections::HashMap;
use std::sync::LazyLock;

static SERVICE_TABLE_TSV: &str = include_str!("data/services.tsv");

/// Static map of `(protocol, port)` to service name.
static PORT_SERVICES: LazyLock<HashMap<(Protocol, u16), &'static str>> = LazyLock::new(|| {
    SERVICE_TABLE_TSV
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (key, name) = line.split_once('\t')?;
            let (protocol, port) = key.split_once('/')?;
            Some(((protocol.parse().ok()?, port.parse().ok()?), name.trim()))
        })
        .collect()
});

/// Look up the probable service name for a protocol and port.
///
/// Returns `None` if the port is not in the well-known services table.
pub fn get_service_name(protocol: Protocol, port: u16) -> Option<&'static str> {
    PORT_SERVICES.get(&(protocol, port)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_ports() {
        assert_eq!(get_service_name(Protocol::Tcp, 22), Some("ssh"));
        assert_eq!(get_service_name(Protocol::Tcp, 80), Some("http"));
        assert_eq!(get_service_name(Protocol::Tcp, 3389), Some("ms-wbt-server"));
        assert_eq!(get_service_name(Protocol::Udp, 161), Some("snmp"));
    }

    #[test]
    fn test_protocol_matters() {
        assert_eq!(get_service_name(Protocol::Udp, 3389), None);
    }

    #[test]
    fn test_unknown_port() {
        assert_eq!(get_service_name(Protocol::Tcp, 65001), None);
    }

    #[test]
    fn test_table_loaded() {
        assert_eq!(PORT_SERVICES.len(), 1100);
        assert_eq!(get_service_name(Protocol::Tcp, 1), Some("tcpmux"));
    }
}
