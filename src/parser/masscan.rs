//! masscan list output (`-oL`).
//!
//! ```text
//! #masscan
//! open tcp 80 10.0.0.1 1576090000
//! # end
//! ```

use crate::error::{ParseError, ParseResult};
use crate::types::{parse_port, PortState};
use std::net::Ipv4Addr;
use super::PortRecord;

/// Number of whitespace separated fields on a record line.
const FIELD_COUNT: usize = 5;

/// Parse a single record line: `state protocol port host timestamp`.
///
/// The trailing timestamp is ignored.
pub fn parse_line(line: &str) -> ParseResult<PortRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[state, protocol, port, host, _timestamp] = fields.as_slice() else {
        return Err(ParseError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    };

    let host: Ipv4Addr = host
        .parse()
        .map_err(|_| ParseError::InvalidAddress(host.to_string()))?;

    Ok(PortRecord::new(
        host,
        protocol.parse()?,
        parse_port(port)?,
        PortState::from(state),
    ))
}
