//! Delimited text parser with a carry buffer for records split across windows.

use core::marker::PhantomData;
use std::mem;

use anyhow::Result;
use csv_core::{ReadRecordResult, Reader, ReaderBuilder};

use super::{Fields, TextParser};
use crate::{ImportError, Listener};

/// Initial capacity of the carry buffer, in bytes.
const CARRY_LEN: usize = 1024;
/// Initial capacity of the field end buffer.
const ENDS_LEN: usize = 16;

/// Field delimiter and quoting rules of a delimited format.
pub trait Dialect {
    /// Short name of the format.
    const NAME: &'static str;
    /// Byte separating fields.
    const DELIMITER: u8;
    /// Byte enclosing quoted fields, if the format supports quoting.
    const QUOTE: Option<u8>;
}

/// Comma-separated values with `"` quoting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Comma;

impl Dialect for Comma {
    const NAME: &'static str = "csv";
    const DELIMITER: u8 = b',';
    const QUOTE: Option<u8> = Some(b'"');
}

/// Pipe-separated values with `"` quoting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pipe;

impl Dialect for Pipe {
    const NAME: &'static str = "pipe";
    const DELIMITER: u8 = b'|';
    const QUOTE: Option<u8> = Some(b'"');
}

/// Tab-separated values without quoting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tab;

impl Dialect for Tab {
    const NAME: &'static str = "tab";
    const DELIMITER: u8 = b'\t';
    const QUOTE: Option<u8> = None;
}

pub type CsvParser = DelimitedParser<Comma>;
pub type PipeParser = DelimitedParser<Pipe>;
pub type TabParser = DelimitedParser<Tab>;

/// Streaming parser for one delimited dialect.
///
/// Lexing is done by a resumable [`csv_core::Reader`]. Its state, together
/// with the decoded bytes in `carry`, is what lets a record continue across
/// views. Records are delivered straight out of `carry` without a second pass.
///
/// Every call lexes its whole view, so the reader never loses its place in
/// the input. A record is delivered when its end is reached and the pass is
/// still under the record cap of that call; records ending past the cap are
/// discarded.
#[derive(Debug)]
pub struct DelimitedParser<D> {
    reader: Reader,
    /// Whether the first record of a pass holds column names.
    header: bool,
    /// A header record is still expected in this pass.
    header_pending: bool,
    /// Records delivered in this pass.
    line_count: usize,
    /// Decoded field bytes of the record in progress.
    carry: Vec<u8>,
    /// Bytes of `carry` in use.
    carry_len: usize,
    /// Exclusive field ends into `carry`.
    ends: Vec<usize>,
    /// Entries of `ends` in use.
    ends_len: usize,
    /// A record has been discarded at the cap since the last raise.
    capped: bool,
    closed: bool,
    dialect: PhantomData<D>,
}

impl<D: Dialect> Default for DelimitedParser<D> {
    fn default() -> Self {
        Self {
            reader: Self::reader(),
            header: false,
            header_pending: false,
            line_count: 0,
            carry: vec![0; CARRY_LEN],
            carry_len: 0,
            ends: vec![0; ENDS_LEN],
            ends_len: 0,
            capped: false,
            closed: false,
            dialect: PhantomData,
        }
    }
}

impl<D: Dialect> DelimitedParser<D> {
    /// Creates a parser with no header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded field bytes of the record currently held across a view
    /// boundary.
    #[must_use]
    pub fn carry(&self) -> &[u8] {
        &self.carry[..self.carry_len]
    }

    /// Whether the parser has been closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn reader() -> Reader {
        let mut builder = ReaderBuilder::new();
        builder.delimiter(D::DELIMITER);
        if let Some(quote) = D::QUOTE {
            builder.quote(quote);
        } else {
            builder.quoting(false);
        }
        builder.build()
    }

    /// Feeds `input` to the reader, handling every record it completes.
    ///
    /// An empty `input` marks the end of the stream.
    fn read(
        &mut self,
        mut input: &[u8],
        max_records: usize,
        listener: &mut dyn Listener,
    ) -> Result<ReadRecordResult> {
        loop {
            let (result, read, written, ended) = self.reader.read_record(
                input,
                &mut self.carry[self.carry_len..],
                &mut self.ends[self.ends_len..],
            );
            input = &input[read..];
            self.carry_len += written;
            self.ends_len += ended;

            match result {
                ReadRecordResult::OutputFull => {
                    let len = (self.carry.len() * 2).max(CARRY_LEN);
                    self.carry.resize(len, 0);
                }
                ReadRecordResult::OutputEndsFull => {
                    let len = (self.ends.len() * 2).max(ENDS_LEN);
                    self.ends.resize(len, 0);
                }
                ReadRecordResult::Record => {
                    self.emit(max_records, listener)?;
                    if input.is_empty() {
                        return Ok(result);
                    }
                }
                ReadRecordResult::InputEmpty | ReadRecordResult::End => return Ok(result),
            }
        }
    }

    /// Delivers the record completed in `carry`, unless it is the header or
    /// the pass is at its cap.
    fn emit(&mut self, max_records: usize, listener: &mut dyn Listener) -> Result<()> {
        let len = mem::take(&mut self.carry_len);
        let ends = mem::take(&mut self.ends_len);

        if self.header_pending {
            self.header_pending = false;
            return Ok(());
        }

        if self.line_count >= max_records {
            if !self.capped {
                log::debug!(
                    "{} parser reached its record cap at {} records, skipping until it is raised",
                    D::NAME,
                    self.line_count
                );
                self.capped = true;
            }
            return Ok(());
        }
        self.capped = false;

        listener.on_fields(self.line_count, &Fields::new(&self.carry[..len], &self.ends[..ends]))?;
        self.line_count += 1;
        Ok(())
    }

    /// Makes room for at least one more decoded byte and field end.
    fn reserve(&mut self) {
        if self.carry_len == self.carry.len() {
            self.carry.resize((self.carry.len() * 2).max(CARRY_LEN), 0);
        }
        if self.ends_len == self.ends.len() {
            self.ends.resize((self.ends.len() * 2).max(ENDS_LEN), 0);
        }
    }

    /// Returns the reader to the start of a record.
    fn clear(&mut self) {
        self.reader.reset();
        self.carry_len = 0;
        self.ends_len = 0;
    }
}

impl<D: Dialect> TextParser for DelimitedParser<D> {
    fn name(&self) -> &'static str {
        D::NAME
    }

    fn reset(&mut self) {
        self.clear();
        self.line_count = 0;
        self.capped = false;
        self.header_pending = self.header;
    }

    fn set_header(&mut self, header: bool) {
        self.header = header;
        if self.line_count == 0 && self.carry_len == 0 && self.ends_len == 0 {
            self.header_pending = header;
        }
    }

    fn header(&self) -> bool {
        self.header
    }

    fn parse(&mut self, view: &[u8], max_records: usize, listener: &mut dyn Listener) -> Result<()> {
        if view.is_empty() {
            return Ok(());
        }
        self.read(view, max_records, listener)?;
        Ok(())
    }

    fn finish(&mut self, max_records: usize, listener: &mut dyn Listener) -> Result<()> {
        // A newline completes any pending record that is not inside quotes.
        let result = self.read(b"\n", max_records, listener)?;
        if result == ReadRecordResult::Record {
            self.clear();
            return Ok(());
        }

        // Only an open quoted field still holds a record at end of input.
        self.reserve();
        let (result, ..) = self.reader.read_record(
            &[],
            &mut self.carry[self.carry_len..],
            &mut self.ends[self.ends_len..],
        );
        self.clear();
        if result == ReadRecordResult::Record {
            return Err(ImportError::UnterminatedQuote {
                line: self.line_count,
            }
            .into());
        }
        Ok(())
    }

    fn line_count(&self) -> usize {
        self.line_count
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.clear();
            self.carry = Vec::new();
            self.ends = Vec::new();
            self.closed = true;
        }
        Ok(())
    }
}
