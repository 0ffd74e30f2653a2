//! Configuration options for importing.
//!
//! This module provides the [`Options`] struct, a unified container for all
//! import settings.
//!
//! # Structure
//!
//! - **Format** ([`Format`]): Input format (comma, pipe, tab)
//! - **Sizing** ([`Sizing`]): Memory budget and window length limits
//! - **Serialization** ([`Serialization`]): Row and report output (text, CSV, JSON)
//! - **Header** : `None` to infer the schema, `Some(flag)` to skip inference
//! - **Record caps** : sampled records and the ingest record cap
//!
//! # Usage
//!
//! ```
//! use delimport::{Format, Options, Sizing};
//!
//! let options = Options::default();
//! assert_eq!(options.format(), Format::Csv);
//! assert_eq!(options.header(), None);
//!
//! let options = Options::default()
//!     .with_format(Format::Tab)
//!     .with_header(true)
//!     .with_sizing(Sizing::new(1 << 30, 1 << 20).with_window_len(4096));
//! assert_eq!(options.sizing().window_len, Some(4096));
//! ```
//!
//! # Environment Variables
//!
//! Sizing can be controlled via environment variables, see [`Sizing::from_env`]:
//!
//! - `DELIMPORT_SYSTEM_MEMORY`: Memory available, in bytes (default: detected)
//! - `DELIMPORT_BUDGET_DIVISOR`: Fraction of memory for analysis (default: 4)
//! - `DELIMPORT_MAX_WINDOW`: Largest single window (default: 2147483647)
//! - `DELIMPORT_WINDOW_SIZE`: Forced window length (default: unset)

pub mod delimiter;
pub mod format;
pub mod serialization;
pub mod sizing;

use core::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use self::format::Format;
use self::serialization::Serialization;
use self::sizing::Sizing;
use crate::{metadata::SNIFF_RECORDS, parser::UNBOUNDED};

/// Unified configuration for import operations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Input format (comma, pipe, tab).
    format: Format,

    /// Window sizing policy.
    sizing: Sizing,

    /// Row and report output.
    serialization: Serialization,

    /// Records sampled by the analysis pass.
    sniff_records: usize,

    /// Known header flag; skips the analysis pass when set.
    header: Option<bool>,

    /// Record cap for an ingest-only import.
    max_records: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            format: Format::default(),
            sizing: Sizing::default(),
            serialization: Serialization::default(),
            sniff_records: SNIFF_RECORDS,
            header: None,
            max_records: UNBOUNDED,
        }
    }
}

impl Options {
    /// Set the input format.
    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Set the sizing policy.
    #[must_use]
    pub const fn with_sizing(mut self, sizing: Sizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Set the serialization settings.
    #[must_use]
    pub fn with_serialization(mut self, serialization: Serialization) -> Self {
        self.serialization = serialization;
        self
    }

    /// Set the number of records sampled by the analysis pass.
    #[must_use]
    pub const fn with_sniff_records(mut self, records: usize) -> Self {
        self.sniff_records = records;
        self
    }

    /// Declare the header flag, skipping schema inference.
    #[must_use]
    pub const fn with_header(mut self, header: bool) -> Self {
        self.header = Some(header);
        self
    }

    /// Cap the records delivered by an ingest-only import.
    #[must_use]
    pub const fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    #[must_use]
    pub const fn sizing(&self) -> &Sizing {
        &self.sizing
    }

    #[must_use]
    pub const fn serialization(&self) -> &Serialization {
        &self.serialization
    }

    #[must_use]
    pub const fn sniff_records(&self) -> usize {
        self.sniff_records
    }

    #[must_use]
    pub const fn header(&self) -> Option<bool> {
        self.header
    }

    #[must_use]
    pub const fn max_records(&self) -> usize {
        self.max_records
    }
}

impl Display for Options {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let header = self
            .header
            .map_or_else(|| "inferred".to_string(), |h| h.to_string());
        let max_records = if self.max_records == UNBOUNDED {
            "none".to_string()
        } else {
            self.max_records.to_string()
        };
        write!(
            f,
            "Options {{ format: {}, header: {header}, max_records: {max_records}, sniff: {}, serialization: {}, {} }}",
            self.format, self.sniff_records, self.serialization, self.sizing
        )
    }
}
