//! Error types for delimport.

use std::io;

use thiserror::Error;

/// Structured error types for delimport.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid command-line usage.
    #[error("usage: {0}")]
    Usage(String),

    /// I/O error with context.
    #[error("{message}: {path}")]
    Io {
        /// File path where error occurred.
        path: String,
        /// Error description.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A window of the input could not be memory-mapped.
    #[error("failed to map {len} bytes at offset {offset}: {path}")]
    Map {
        /// File path of the input.
        path: String,
        /// Start of the window in bytes.
        offset: u64,
        /// Requested window length in bytes.
        len: u64,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Input ended inside a quoted field.
    #[error("unterminated quoted field in record {line}")]
    UnterminatedQuote {
        /// Zero-based record index within the pass.
        line: usize,
    },

    /// Configuration error.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// JSON serialization error.
    #[error("JSON serialization failed")]
    JsonSerialization(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV serialization failed")]
    CsvSerialization(#[from] csv::Error),

    /// A release step failed after another error had already aborted the import.
    ///
    /// Displays as the primary error; the release failure stays reachable
    /// through [`Error::secondary`].
    #[error("{primary:#}")]
    Cleanup {
        /// The error that aborted the import.
        primary: anyhow::Error,
        /// The error raised while releasing resources.
        secondary: anyhow::Error,
    },
}

impl Error {
    /// The error that aborted the import, for `Cleanup`, otherwise `None`.
    #[must_use]
    pub fn primary(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Cleanup { primary, .. } => Some(primary),
            _ => None,
        }
    }

    /// The error raised during cleanup, for `Cleanup`, otherwise `None`.
    #[must_use]
    pub fn secondary(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Cleanup { secondary, .. } => Some(secondary),
            _ => None,
        }
    }
}
