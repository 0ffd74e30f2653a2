//! Import report written to stderr with `--verbose`.

use anyhow::{Context, Result};
use delimport::{ImportError, ImportSummary, Output, Serialization};

/// Writes the import report in the selected serialization.
#[derive(Debug)]
pub(crate) struct Verbose {
    output: Output,
}

impl Default for Verbose {
    /// Default verbose logger writes to stderr.
    fn default() -> Self {
        Self {
            output: Output::stderr(),
        }
    }
}

impl Verbose {
    /// Writes the report for a completed import.
    pub(crate) fn write_summary(
        &mut self,
        summary: &ImportSummary,
        serialization: &Serialization,
    ) -> Result<()> {
        match serialization {
            Serialization::Json => self.write_json(summary),
            Serialization::Csv => self.write_csv(summary),
            Serialization::Text {
                field_delimiter, ..
            } => self.write_text(summary, field_delimiter.as_str()),
        }?;
        self.output.flush()
    }

    /// Get all fields as name-value pairs.
    fn field_pairs(summary: &ImportSummary) -> Vec<(&'static str, String)> {
        let columns = summary.metadata.as_ref().map_or_else(
            || "none".to_string(),
            |metadata| {
                metadata
                    .columns()
                    .iter()
                    .map(|column| format!("{}:{}", column.name, column.kind))
                    .collect::<Vec<_>>()
                    .join(",")
            },
        );

        vec![
            ("source", summary.source.clone()),
            ("format", summary.format.clone()),
            ("size", summary.size.to_string()),
            ("window-len", summary.window_len.to_string()),
            ("windows", summary.windows.to_string()),
            ("sniffed", summary.sniffed.to_string()),
            ("header", summary.header.to_string()),
            ("records", summary.records.to_string()),
            ("columns", columns),
        ]
    }

    /// Write verbose info in JSON format.
    fn write_json(&mut self, summary: &ImportSummary) -> Result<()> {
        let json = serde_json::to_string(summary).map_err(ImportError::JsonSerialization)?;

        self.output
            .write_chunk(&format!("{json}\n"))
            .context("failed to write JSON report")
    }

    /// Write verbose info in CSV format.
    fn write_csv(&mut self, summary: &ImportSummary) -> Result<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let field_pairs = Self::field_pairs(summary);

        writer
            .write_record(field_pairs.iter().map(|(name, _)| *name))
            .map_err(ImportError::CsvSerialization)?;
        writer
            .write_record(field_pairs.iter().map(|(_, value)| value))
            .map_err(ImportError::CsvSerialization)?;

        let data = writer
            .into_inner()
            .context("failed to finish CSV report")?;
        let report = String::from_utf8(data).context("failed to convert report to UTF-8")?;
        self.output
            .write_chunk(&report)
            .context("failed to write CSV report")
    }

    /// Write verbose info as one name and value per line.
    fn write_text(&mut self, summary: &ImportSummary, delimiter: &str) -> Result<()> {
        Self::field_pairs(summary)
            .into_iter()
            .try_for_each(|(name, value)| {
                self.output
                    .write_chunk(&format!("{name}{delimiter}{value}\n"))
            })
    }
}
