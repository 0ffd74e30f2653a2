//! Callbacks receiving the output of an import.

use anyhow::Result;

use crate::{Fields, Metadata};

/// Consumer of parsed records.
///
/// An import publishes metadata at most once, before the first record that
/// depends on it, then every record in byte order, then the final count.
pub trait Listener {
    /// Accepts the column metadata inferred by the analysis pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer cannot adopt the schema.
    fn on_metadata(&mut self, metadata: &Metadata) -> Result<()>;

    /// Accepts the fields of record `line`, a zero-based index within the pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer cannot store the record.
    fn on_fields(&mut self, line: usize, fields: &Fields<'_>) -> Result<()>;

    /// Accepts the total number of records delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer fails to finalize.
    fn on_line_count(&mut self, count: usize) -> Result<()>;

    /// Flushes anything the consumer buffered. Called once when the import ends.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered rows cannot be written.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<L: Listener + ?Sized> Listener for &mut L {
    fn on_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        (**self).on_metadata(metadata)
    }

    fn on_fields(&mut self, line: usize, fields: &Fields<'_>) -> Result<()> {
        (**self).on_fields(line, fields)
    }

    fn on_line_count(&mut self, count: usize) -> Result<()> {
        (**self).on_line_count(count)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<L: Listener + ?Sized> Listener for Box<L> {
    fn on_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        (**self).on_metadata(metadata)
    }

    fn on_fields(&mut self, line: usize, fields: &Fields<'_>) -> Result<()> {
        (**self).on_fields(line, fields)
    }

    fn on_line_count(&mut self, count: usize) -> Result<()> {
        (**self).on_line_count(count)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Opens a listener scoped to one input.
pub trait SinkFactory {
    type Listener: Listener;

    /// Opens the listener that will receive the records of `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be provisioned.
    fn open_listener(&mut self, identity: &str) -> Result<Self::Listener>;
}
