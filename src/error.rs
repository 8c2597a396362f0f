//! Error types for scanreport.
//!
//! Uses `thiserror` for ergonomic error definitions. Errors are split by how
//! far they reach: a [`ParseError`] only ever costs one line, a
//! [`ReportError`] stops processing of one input file.

use std::path::PathBuf;
use thiserror::Error;

/// A recoverable failure while parsing a single scan line or port tuple.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("unknown protocol: {0}")]
    InvalidProtocol(String),

    #[error("invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("line has no host field")]
    MissingHost,
}

/// Result type alias for line-level parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// A failure that stops processing of a whole input stream or file.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{source_name}: unrecognized scan format (expected a '#masscan' or '# Nmap' header)")]
    UnknownDialect { source_name: String },

    #[error("{source_name}: input is empty")]
    EmptyInput { source_name: String },

    #[error("invalid target on line {line}: '{value}'")]
    InvalidTarget { line: usize, value: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{}: {source}", path.display())]
    CsvFile {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// Attach a file path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {}: {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by CLI subcommands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
