//! Core type definitions using newtype patterns for type safety.
//!
//! These types keep the parser, index and aggregator agreeing on what a port,
//! a protocol and a target range look like.

mod port;
mod target;

pub use port::{parse_port, PortSet, PortState, Protocol};
pub use target::{TargetError, TargetRange};
