//! Concrete listeners that store or write out imported records.

use std::{
    cell::{Ref, RefCell},
    path::PathBuf,
    rc::Rc,
};

use anyhow::{Context, Result};
use hashbrown::HashMap;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{Fields, ImportError, Listener, Metadata, Output, Serialization, SinkFactory};

/// Encoder state of a [`RowWriter`].
enum Encoder {
    Text {
        output: Output,
        field: String,
        entry: String,
    },
    Csv(csv::Writer<Output>),
    Json(Output),
}

/// Listener writing each record to an [`Output`] as soon as it arrives.
///
/// Rows come out as delimited text, CSV with a header of column names, or
/// one JSON object per line keyed by column name.
pub struct RowWriter {
    encoder: Encoder,
    names: Vec<String>,
    rows: usize,
}

impl std::fmt::Debug for RowWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoder = match self.encoder {
            Encoder::Text { .. } => "text",
            Encoder::Csv(_) => "csv",
            Encoder::Json(_) => "json",
        };
        f.debug_struct("RowWriter")
            .field("encoder", &encoder)
            .field("names", &self.names)
            .field("rows", &self.rows)
            .finish()
    }
}

impl RowWriter {
    /// Creates a writer encoding rows per `serialization`.
    #[must_use]
    pub fn new(output: Output, serialization: &Serialization) -> Self {
        let encoder = match serialization {
            Serialization::Text {
                field_delimiter,
                entry_delimiter,
            } => Encoder::Text {
                output,
                field: field_delimiter.as_str().to_string(),
                entry: entry_delimiter.as_str().to_string(),
            },
            Serialization::Csv => Encoder::Csv(csv::Writer::from_writer(output)),
            Serialization::Json => Encoder::Json(output),
        };

        Self {
            encoder,
            names: Vec::new(),
            rows: 0,
        }
    }

    /// Rows written so far.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }
}

/// One record as a JSON object, keys in column order.
struct JsonRow<'a> {
    names: &'a [String],
    fields: &'a Fields<'a>,
}

impl Serialize for JsonRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (index, field) in self.fields.iter().enumerate() {
            let value = String::from_utf8_lossy(field);
            match self.names.get(index) {
                Some(name) => map.serialize_entry(name, &value)?,
                None => map.serialize_entry(&format!("f{index}"), &value)?,
            }
        }
        map.end()
    }
}

impl Listener for RowWriter {
    fn on_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        self.names = metadata.names().map(str::to_string).collect();
        if let Encoder::Csv(writer) = &mut self.encoder {
            writer
                .write_record(&self.names)
                .map_err(ImportError::from)?;
        }
        Ok(())
    }

    fn on_fields(&mut self, _line: usize, fields: &Fields<'_>) -> Result<()> {
        match &mut self.encoder {
            Encoder::Text {
                output,
                field,
                entry,
            } => {
                let mut line = fields.to_strings().join(field);
                line.push_str(entry);
                output.write_chunk(&line)?;
            }
            Encoder::Csv(writer) => {
                writer
                    .write_record(fields.iter())
                    .map_err(ImportError::from)?;
            }
            Encoder::Json(output) => {
                let row = JsonRow {
                    names: &self.names,
                    fields,
                };
                let json = serde_json::to_string(&row).map_err(ImportError::from)?;
                output.write_chunk(&format!("{json}\n"))?;
            }
        }
        self.rows += 1;
        Ok(())
    }

    fn on_line_count(&mut self, count: usize) -> Result<()> {
        log::debug!("wrote {} rows for {count} records", self.rows);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        match &mut self.encoder {
            Encoder::Text { output, .. } | Encoder::Json(output) => output.flush(),
            Encoder::Csv(writer) => writer.flush().context("failed to flush CSV output"),
        }
    }
}

/// Opens a [`RowWriter`] on stdout or a file for each import.
#[derive(Clone, Debug, Default)]
pub struct RowWriterFactory {
    path: Option<PathBuf>,
    serialization: Serialization,
}

impl RowWriterFactory {
    /// Writes to `path`, or stdout when `None` or `-`.
    #[must_use]
    pub const fn new(path: Option<PathBuf>, serialization: Serialization) -> Self {
        Self {
            path,
            serialization,
        }
    }
}

impl SinkFactory for RowWriterFactory {
    type Listener = RowWriter;

    fn open_listener(&mut self, identity: &str) -> Result<Self::Listener> {
        log::debug!("opening {} row writer for {identity}", self.serialization);
        let output = Output::new(self.path.as_deref())?;
        Ok(RowWriter::new(output, &self.serialization))
    }
}

/// Columnar contents of a [`MemorySink`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    identity: String,
    metadata: Option<Metadata>,
    columns: Vec<Vec<String>>,
    rows: usize,
    line_count: Option<usize>,
    closed: bool,
}

impl Table {
    /// Identity of the input the table was opened for.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Metadata published by the analysis pass, if any.
    #[must_use]
    pub const fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// One buffer per column, each holding a value for every row.
    #[must_use]
    pub fn columns(&self) -> &[Vec<String>] {
        &self.columns
    }

    /// The column with `name` from the published metadata.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[String]> {
        let index = self.metadata.as_ref()?.names().position(|n| n == name)?;
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Values of row `index` across all columns.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Vec<&str>> {
        (index < self.rows).then(|| {
            self.columns
                .iter()
                .map(|column| column[index].as_str())
                .collect()
        })
    }

    /// Rows appended so far.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The final count reported by the import, once it completes.
    #[must_use]
    pub const fn line_count(&self) -> Option<usize> {
        self.line_count
    }

    /// Whether the import closed the listener.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Adds empty columns until there are `width`, padding earlier rows.
    fn widen(&mut self, width: usize) {
        if self.columns.len() < width {
            let rows = self.rows;
            self.columns.resize_with(width, || vec![String::new(); rows]);
        }
    }
}

/// Listener buffering rows in memory, one vector per column.
///
/// Clones share the same table, so a sink handed to an import can still be
/// inspected after the import closes it.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    table: Rc<RefCell<Table>>,
}

impl MemorySink {
    #[must_use]
    pub fn new(identity: &str) -> Self {
        Self {
            table: Rc::new(RefCell::new(Table {
                identity: identity.to_string(),
                ..Table::default()
            })),
        }
    }

    /// Borrows the buffered table.
    ///
    /// # Panics
    ///
    /// Panics if called from inside one of this sink's own listener callbacks.
    #[must_use]
    pub fn table(&self) -> Ref<'_, Table> {
        self.table.borrow()
    }
}

impl Listener for MemorySink {
    fn on_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        let mut table = self.table.borrow_mut();
        if table.rows > 0 && metadata.columns().len() < table.columns.len() {
            return Err(ImportError::Config(format!(
                "metadata declares {} columns but {} already hold rows",
                metadata.columns().len(),
                table.columns.len()
            ))
            .into());
        }
        table.widen(metadata.columns().len());
        table.metadata = Some(metadata.clone());
        Ok(())
    }

    fn on_fields(&mut self, _line: usize, fields: &Fields<'_>) -> Result<()> {
        let mut table = self.table.borrow_mut();
        table.widen(fields.len());
        let mut values = fields.iter();
        for column in &mut table.columns {
            let value = values
                .next()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .unwrap_or_default();
            column.push(value);
        }
        table.rows += 1;
        Ok(())
    }

    fn on_line_count(&mut self, count: usize) -> Result<()> {
        self.table.borrow_mut().line_count = Some(count);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.table.borrow_mut().closed = true;
        Ok(())
    }
}

/// Hands out one [`MemorySink`] per input identity.
#[derive(Clone, Debug, Default)]
pub struct MemorySinkFactory {
    sinks: HashMap<String, MemorySink>,
}

impl MemorySinkFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink opened for `identity`.
    #[must_use]
    pub fn sink(&self, identity: &str) -> Option<&MemorySink> {
        self.sinks.get(identity)
    }

    /// Number of sinks opened.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl SinkFactory for MemorySinkFactory {
    type Listener = MemorySink;

    fn open_listener(&mut self, identity: &str) -> Result<Self::Listener> {
        let sink = MemorySink::new(identity);
        self.sinks.insert(identity.to_string(), sink.clone());
        Ok(sink)
    }
}
