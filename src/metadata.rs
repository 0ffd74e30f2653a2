//! Column metadata and the sampling listener that infers it.

use core::fmt::{self, Display, Formatter};
use std::sync::OnceLock;

use anyhow::Result;
use hashbrown::HashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Fields, Listener};

/// Records sampled by the analysis pass.
pub const SNIFF_RECORDS: usize = 100;

/// Inferred storage type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    Boolean,
    Int,
    Long,
    Double,
    Date,
    String,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Double => write!(f, "double"),
            Self::Date => write!(f, "date"),
            Self::String => write!(f, "string"),
        }
    }
}

/// A single column descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
    /// Widest sampled value, in characters.
    pub width: usize,
}

/// Column descriptors in field order, plus whether the input has a header row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    columns: Vec<Column>,
    header: bool,
}

impl Metadata {
    #[must_use]
    pub const fn new(columns: Vec<Column>, header: bool) -> Self {
        Self { columns, header }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Whether the first record holds column names.
    #[must_use]
    pub const fn header(&self) -> bool {
        self.header
    }

    /// Column names in field order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{}:{}({})", c.name, c.kind, c.width))
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{columns}] header={}", self.header)
    }
}

/// Types a sampled column may still be, narrowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidates {
    boolean: bool,
    int: bool,
    long: bool,
    double: bool,
    date: bool,
    /// At least one non-empty value was seen.
    seen: bool,
}

impl Default for Candidates {
    fn default() -> Self {
        Self {
            boolean: true,
            int: true,
            long: true,
            double: true,
            date: true,
            seen: false,
        }
    }
}

impl Candidates {
    /// Candidates that accept a single value.
    fn of(value: &str) -> Self {
        let numeric = !value.is_empty()
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));

        Self {
            boolean: value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
            int: value.parse::<i32>().is_ok(),
            long: value.parse::<i64>().is_ok(),
            double: numeric && value.parse::<f64>().is_ok(),
            date: date_pattern().is_some_and(|re| re.is_match(value)),
            seen: true,
        }
    }

    fn none() -> Self {
        Self {
            boolean: false,
            int: false,
            long: false,
            double: false,
            date: false,
            seen: true,
        }
    }

    fn narrow(&mut self, other: Self) {
        self.boolean &= other.boolean;
        self.int &= other.int;
        self.long &= other.long;
        self.double &= other.double;
        self.date &= other.date;
        self.seen |= other.seen;
    }

    fn column_type(self) -> ColumnType {
        if !self.seen {
            ColumnType::String
        } else if self.boolean {
            ColumnType::Boolean
        } else if self.int {
            ColumnType::Int
        } else if self.long {
            ColumnType::Long
        } else if self.double {
            ColumnType::Double
        } else if self.date {
            ColumnType::Date
        } else {
            ColumnType::String
        }
    }

    fn accepts(self, kind: ColumnType) -> bool {
        match kind {
            ColumnType::Boolean => self.boolean,
            ColumnType::Int => self.int,
            ColumnType::Long => self.long,
            ColumnType::Double => self.double,
            ColumnType::Date => self.date,
            ColumnType::String => true,
        }
    }
}

fn date_pattern() -> Option<&'static Regex> {
    static DATE: OnceLock<Option<Regex>> = OnceLock::new();
    DATE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d{1,9})?)?(Z|[+-]\d{2}:?\d{2})?)?$")
            .ok()
    })
    .as_ref()
}

/// Per-column statistics over a set of records.
#[derive(Clone, Debug, Default)]
struct ColumnStats {
    candidates: Candidates,
    width: usize,
}

impl ColumnStats {
    fn add(&mut self, value: Option<&str>) {
        match value {
            Some(value) if !value.is_empty() => {
                self.candidates.narrow(Candidates::of(value));
                self.width = self.width.max(value.chars().count());
            }
            Some(_) => {}
            None => self.candidates.narrow(Candidates::none()),
        }
    }
}

/// Listener that samples records and infers [`Metadata`] from them.
///
/// Only used by the analysis pass, which caps it at [`SNIFF_RECORDS`].
#[derive(Debug, Default)]
pub struct MetadataExtractor {
    /// Trimmed values of the first record; `None` marks invalid UTF-8.
    first: Option<Vec<Option<String>>>,
    /// Statistics over every record after the first.
    rest: Vec<ColumnStats>,
    records: usize,
}

impl MetadataExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records sampled so far.
    #[must_use]
    pub const fn records(&self) -> usize {
        self.records
    }

    fn decode(field: &[u8]) -> Option<String> {
        simdutf8::basic::from_utf8(field)
            .ok()
            .map(|text| text.trim().to_string())
    }

    /// Whether the first sampled record looks like column names.
    #[must_use]
    pub fn is_header(&self) -> bool {
        let Some(first) = &self.first else {
            return false;
        };
        if self.records < 2 || first.iter().any(|v| v.as_deref().is_none_or(str::is_empty)) {
            return false;
        }

        first.iter().zip(&self.rest).any(|(value, stats)| {
            let kind = stats.candidates.column_type();
            kind != ColumnType::String
                && value
                    .as_deref()
                    .is_some_and(|v| !Candidates::of(v).accepts(kind))
        })
    }

    /// Infers column metadata from the sampled records.
    #[must_use]
    pub fn metadata(&self) -> Metadata {
        let header = self.is_header();
        let first = self.first.as_deref().unwrap_or_default();
        let width = first.len().max(self.rest.len());

        let mut stats = self.rest.clone();
        stats.resize_with(width, ColumnStats::default);
        if !header {
            for (column, value) in stats.iter_mut().zip(first) {
                column.add(value.as_deref());
            }
        }

        let names = if header {
            Self::column_names(first, width)
        } else {
            (0..width).map(|index| format!("f{index}")).collect()
        };

        let columns = names
            .into_iter()
            .zip(stats)
            .map(|(name, column)| Column {
                name,
                kind: column.candidates.column_type(),
                width: column.width,
            })
            .collect();

        Metadata::new(columns, header)
    }

    /// Unique, non-blank column names from a header record.
    fn column_names(header: &[Option<String>], width: usize) -> Vec<String> {
        let mut used = HashSet::with_capacity(width);
        (0..width)
            .map(|index| {
                let base = match header.get(index).and_then(Option::as_deref) {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => format!("f{index}"),
                };
                let mut name = base.clone();
                let mut suffix = 1;
                while !used.insert(name.clone()) {
                    name = format!("{base}_{suffix}");
                    suffix += 1;
                }
                name
            })
            .collect()
    }
}

impl Listener for MetadataExtractor {
    fn on_metadata(&mut self, _metadata: &Metadata) -> Result<()> {
        Ok(())
    }

    fn on_fields(&mut self, _line: usize, fields: &Fields<'_>) -> Result<()> {
        let values = fields.iter().map(Self::decode);
        if self.first.is_none() {
            self.first = Some(values.collect());
        } else {
            let values: Vec<Option<String>> = values.collect();
            if self.rest.len() < values.len() {
                self.rest.resize_with(values.len(), ColumnStats::default);
            }
            for (column, value) in self.rest.iter_mut().zip(&values) {
                column.add(value.as_deref());
            }
        }
        self.records += 1;
        Ok(())
    }

    fn on_line_count(&mut self, _count: usize) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(extractor: &mut MetadataExtractor, rows: &[&[&str]]) {
        for (line, row) in rows.iter().enumerate() {
            let mut bytes = Vec::new();
            let mut ends = Vec::new();
            for value in *row {
                bytes.extend_from_slice(value.as_bytes());
                ends.push(bytes.len());
            }
            extractor
                .on_fields(line, &Fields::new(&bytes, &ends))
                .expect("sample record");
        }
    }

    #[test]
    fn test_infers_types_and_header() {
        let mut extractor = MetadataExtractor::new();
        sample(
            &mut extractor,
            &[
                &["id", "price", "active", "day", "label"],
                &["1", "2.5", "true", "2024-01-02", "x"],
                &["3000000000", "4", "FALSE", "2024-01-03T10:00:00Z", "yy"],
            ],
        );

        let metadata = extractor.metadata();
        assert!(metadata.header());
        let kinds: Vec<_> = metadata.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnType::Long,
                ColumnType::Double,
                ColumnType::Boolean,
                ColumnType::Date,
                ColumnType::String
            ]
        );
        assert_eq!(
            metadata.names().collect::<Vec<_>>(),
            vec!["id", "price", "active", "day", "label"]
        );
        assert_eq!(metadata.columns()[4].width, 2);
    }

    #[test]
    fn test_all_string_columns_have_no_header() {
        let mut extractor = MetadataExtractor::new();
        sample(&mut extractor, &[&["name", "city"], &["ada", "london"]]);
        let metadata = extractor.metadata();
        assert!(!metadata.header());
        assert_eq!(metadata.names().collect::<Vec<_>>(), vec!["f0", "f1"]);
    }

    #[test]
    fn test_numeric_first_row_is_data() {
        let mut extractor = MetadataExtractor::new();
        sample(&mut extractor, &[&["1", "2"], &["3", "4"]]);
        let metadata = extractor.metadata();
        assert!(!metadata.header());
        assert!(metadata.columns().iter().all(|c| c.kind == ColumnType::Int));
    }

    #[test]
    fn test_duplicate_and_blank_header_names() {
        let mut extractor = MetadataExtractor::new();
        sample(&mut extractor, &[&["a", "a", " b "], &["1", "2", "3"]]);
        let metadata = extractor.metadata();
        assert!(metadata.header());
        assert_eq!(metadata.names().collect::<Vec<_>>(), vec!["a", "a_1", "b"]);
    }

    #[test]
    fn test_empty_sample() {
        let extractor = MetadataExtractor::new();
        let metadata = extractor.metadata();
        assert!(!metadata.header());
        assert!(metadata.columns().is_empty());
    }
}
