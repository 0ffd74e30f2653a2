//! How ingested rows and reports are written out.

use core::fmt::{self, Display, Formatter};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::options::delimiter::Delimiter;

/// Output encodings selectable from the command line.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    PartialOrd,
    Ord,
    Hash,
    ValueEnum,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Serialization settings for rows and reports.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Serialization {
    /// Plain text with a delimiter between fields and one after each entry.
    Text {
        field_delimiter: Delimiter,
        entry_delimiter: Delimiter,
    },
    /// One JSON object per row.
    Json,
    /// CSV with a header row of column names.
    Csv,
}

impl Serialization {
    /// Create a text format with default delimiters.
    #[must_use]
    pub fn text() -> Self {
        Self::Text {
            field_delimiter: Delimiter::from_literal(Delimiter::DEFAULT_FIELD),
            entry_delimiter: Delimiter::from_literal(Delimiter::DEFAULT_ENTRY),
        }
    }

    /// Settings for `format`, with an escaped text field delimiter.
    #[must_use]
    pub fn from_format(format: OutputFormat, field_delimiter: &str) -> Self {
        match format {
            OutputFormat::Text => Self::text().with_field_delimiter(field_delimiter),
            OutputFormat::Json => Self::Json,
            OutputFormat::Csv => Self::Csv,
        }
    }

    /// Set the field delimiter if this is a text format, otherwise return self unchanged.
    #[must_use]
    pub fn with_field_delimiter(self, field_delimiter: &str) -> Self {
        match self {
            Self::Text {
                entry_delimiter, ..
            } => Self::Text {
                field_delimiter: Delimiter::from_escaped(field_delimiter),
                entry_delimiter,
            },
            other => other,
        }
    }

    /// The output encoding.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        match self {
            Self::Text { .. } => OutputFormat::Text,
            Self::Json => OutputFormat::Json,
            Self::Csv => OutputFormat::Csv,
        }
    }
}

impl Default for Serialization {
    fn default() -> Self {
        Self::text()
    }
}

impl Display for Serialization {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text {
                field_delimiter,
                entry_delimiter,
            } => write!(f, "text[field={field_delimiter}, entry={entry_delimiter}]"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
