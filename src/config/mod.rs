//! Configuration management for scanreport.
//!
//! Provides XDG-compliant settings lookup.

mod settings;

pub use settings::{AppSettings, Paths};
