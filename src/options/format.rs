//! Input format selection.

use core::fmt::{self, Display, Formatter};
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::parser::{CsvParser, PipeParser, TabParser, TextParser};

/// Delimited format of an input file.
///
/// # Examples
///
/// ```
/// use delimport::Format;
///
/// assert_eq!(Format::default(), Format::Csv);
/// assert_eq!(Format::from_path("rows.tsv"), Some(Format::Tab));
/// assert_eq!(Format::from_path("notes.txt"), None);
/// assert_eq!(Format::Pipe.to_string(), "pipe");
/// ```
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
pub enum Format {
    /// Comma-separated values.
    #[default]
    Csv,
    /// Pipe-separated values.
    Pipe,
    /// Tab-separated values.
    Tab,
}

impl Format {
    /// Constructs the parser for this format.
    #[must_use]
    pub fn parser(self) -> Box<dyn TextParser> {
        match self {
            Self::Csv => Box::new(CsvParser::new()),
            Self::Pipe => Box::new(PipeParser::new()),
            Self::Tab => Box::new(TabParser::new()),
        }
    }

    /// Guesses the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "psv" | "pipe" => Some(Self::Pipe),
            "tsv" | "tab" => Some(Self::Tab),
            _ => None,
        }
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Pipe => write!(f, "pipe"),
            Self::Tab => write!(f, "tab"),
        }
    }
}
