//! Streaming parsers for delimited text.
//!
//! A [`TextParser`] consumes one window of bytes at a time and emits every
//! complete record to a [`Listener`]. Records cut off by the end of a window
//! are kept in the parser's carry buffer, together with the lexer state, and
//! completed by the next call, so window boundaries may fall on any byte.
//!
//! The comma, pipe and tab formats share one implementation,
//! [`DelimitedParser`], specialized by a [`Dialect`].

pub mod delimited;

use anyhow::Result;

pub use self::delimited::{Comma, CsvParser, DelimitedParser, Dialect, Pipe, PipeParser, Tab, TabParser};
use crate::Listener;

/// Record cap meaning "no limit".
pub const UNBOUNDED: usize = usize::MAX;

/// Streaming parser shared by all delimited formats.
pub trait TextParser {
    /// Short name of the format, for display.
    fn name(&self) -> &'static str;

    /// Clears the record count, the carry buffer and any capped state.
    ///
    /// The header flag is kept, and a header record will be skipped again.
    fn reset(&mut self);

    /// Marks whether the first record of a pass holds column names.
    ///
    /// A header record is never delivered to the listener and is not counted.
    fn set_header(&mut self, header: bool);

    /// Whether the first record of a pass is treated as a header.
    fn header(&self) -> bool;

    /// Re-arms delivery from the start of the byte stream for a new pass.
    ///
    /// The header flag is kept.
    fn restart(&mut self) {
        self.reset();
    }

    /// Parses `view` from its start, delivering complete records to `listener`.
    ///
    /// Delivery stops once the pass has delivered `max_records` records. The
    /// rest of the view is still read, and records ending in it are discarded,
    /// so a later call with a higher cap resumes at a record boundary. A
    /// trailing partial record is retained and completed by the next call.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener fails.
    fn parse(&mut self, view: &[u8], max_records: usize, listener: &mut dyn Listener) -> Result<()>;

    /// Delivers a final record left without a terminating newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ended inside a quoted field, or when the
    /// listener fails.
    fn finish(&mut self, max_records: usize, listener: &mut dyn Listener) -> Result<()>;

    /// Records delivered so far in the current pass.
    fn line_count(&self) -> usize;

    /// Releases internal buffers. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Implementations that hold external resources may fail to release them.
    fn close(&mut self) -> Result<()>;
}

impl<P: TextParser + ?Sized> TextParser for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn set_header(&mut self, header: bool) {
        (**self).set_header(header);
    }

    fn header(&self) -> bool {
        (**self).header()
    }

    fn restart(&mut self) {
        (**self).restart();
    }

    fn parse(&mut self, view: &[u8], max_records: usize, listener: &mut dyn Listener) -> Result<()> {
        (**self).parse(view, max_records, listener)
    }

    fn finish(&mut self, max_records: usize, listener: &mut dyn Listener) -> Result<()> {
        (**self).finish(max_records, listener)
    }

    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// The decoded fields of one record.
///
/// Field bytes are unquoted and unescaped. The view is only valid for the
/// duration of the listener callback it is passed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fields<'a> {
    bytes: &'a [u8],
    ends: &'a [usize],
}

impl<'a> Fields<'a> {
    /// Creates a view over `bytes` split at the exclusive field `ends`.
    #[must_use]
    pub const fn new(bytes: &'a [u8], ends: &'a [usize]) -> Self {
        Self { bytes, ends }
    }

    /// Number of fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.ends.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// The field at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        let end = *self.ends.get(index)?;
        let start = index.checked_sub(1).map_or(0, |prev| self.ends[prev]);
        Some(&self.bytes[start..end])
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        let fields = *self;
        (0..fields.len()).filter_map(move |index| fields.get(index))
    }

    /// Copies the fields into owned strings, replacing invalid UTF-8.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect()
    }
}
