//! Declared target ranges.
//!
//! A target is written either in CIDR notation (`10.0.0.0/24`) or as a bare
//! IPv4 address, which is treated as a single-host `/32`. Host bits in a CIDR
//! entry are ignored, so `10.0.0.7/24` declares `10.0.0.0/24`.

use ipnetwork::Ipv4Network;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Error type for target parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
}

/// An in-scope IPv4 network with precomputed host bounds.
///
/// For networks larger than `/31` the bounds are the first and last usable
/// host: the network and broadcast addresses never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetRange {
    network: Ipv4Network,
    address_min: Ipv4Addr,
    address_max: Ipv4Addr,
}

impl TargetRange {
    /// Build a range from a network, normalising away any host bits.
    pub fn new(network: Ipv4Network) -> Self {
        let prefix = network.prefix();
        let normalised = Ipv4Network::new(network.network(), prefix)
            .unwrap_or(network);

        let base = u32::from(normalised.network());
        let last = u32::from(normalised.broadcast());
        let (min, max) = if prefix < 31 {
            (base + 1, last - 1)
        } else {
            (base, last)
        };

        Self {
            network: normalised,
            address_min: Ipv4Addr::from(min),
            address_max: Ipv4Addr::from(max),
        }
    }

    /// A single-host range.
    pub fn host(addr: Ipv4Addr) -> Self {
        Self {
            network: Ipv4Network::from(addr),
            address_min: addr,
            address_max: addr,
        }
    }

    /// Parse a CIDR or bare address.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();

        if s.contains('/') {
            let network: Ipv4Network = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            return Ok(Self::new(network));
        }

        s.parse::<Ipv4Addr>()
            .map(Self::host)
            .map_err(|_| TargetError::InvalidAddress(s.to_string()))
    }

    pub fn network(&self) -> Ipv4Network {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn address_min(&self) -> Ipv4Addr {
        self.address_min
    }

    pub fn address_max(&self) -> Ipv4Addr {
        self.address_max
    }

    /// Numeric network address, used as the sort and summary key.
    pub fn network_id(&self) -> u32 {
        u32::from(self.network.network())
    }

    /// Whether `addr` falls within `[address_min, address_max]`.
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.address_min <= addr && addr <= self.address_max
    }

    /// Whether this range is a single host.
    pub fn is_single_host(&self) -> bool {
        self.address_min == self.address_max
    }
}

impl PartialOrd for TargetRange {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders by network address, then by prefix length.
impl Ord for TargetRange {
    fn cmp(&self, other: &Self) -> Ordering {
        self.network_id()
            .cmp(&other.network_id())
            .then(self.prefix().cmp(&other.prefix()))
    }
}

impl FromStr for TargetRange {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.network)
    }
}

impl Serialize for TargetRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
