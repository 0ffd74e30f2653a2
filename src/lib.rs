//! Bulk-load large delimited text files through memory-mapped windows.
//!
//! `delimport` reads comma, pipe and tab separated files that may be far
//! larger than a single memory mapping. A file is visited as a sequence of
//! contiguous mapped [`Window`]s, and a streaming [`TextParser`] carries any
//! record cut off at a window's end into the next window, so consumers see
//! one continuous stream of records.
//!
//! Every import follows the same two-phase protocol:
//!
//! 1. **Analyze**: the first window is parsed with a cap of 100 records
//!    through a [`MetadataExtractor`], which infers column names, types and
//!    widths and whether the first record is a header. The resulting
//!    [`Metadata`] is published to the consumer [`Listener`].
//! 2. **Ingest**: the parser is rewound and every window, starting again
//!    from the first, is parsed without a cap. The final record count is
//!    published once the last window is done.
//!
//! The listener, parser, source and each window are released in reverse
//! order of acquisition on every exit path, including failures.
//!
//! ## Module structure
//!
//! - `error.rs`: Structured error types
//! - `exit_code.rs`: Exit code definitions and handling
//! - `import.rs`: The two-phase import protocol
//! - `listener.rs`: Callbacks receiving records and the sink factory
//! - `metadata.rs`: Column metadata and schema inference
//! - `options/`: Configuration options
//!   - `options/delimiter.rs`: Text output delimiters
//!   - `options/format.rs`: Input format selection
//!   - `options/serialization.rs`: Row and report serialization
//!   - `options/sizing.rs`: Window sizing policy
//! - `output.rs`: Output writer for stdout, stderr and files
//! - `parser/`: Streaming parsers with a carry buffer
//! - `scope.rs`: Resource journal and release bookkeeping
//! - `sink.rs`: Row writer and in-memory sinks
//! - `source.rs`: Sized input files
//! - `window.rs`: Mapped windows and the window provider
//!
//! # Options
//!
//! The [`Options`] struct configures an import:
//!
//! * [`Format`]: The input format (`Csv`, `Pipe` or `Tab`)
//! * [`Sizing`]: The memory budget and window length limits
//! * [`Serialization`]: How rows and reports are written out
//! * A known header flag, which skips the analysis pass, and a record cap
//!
//! # Examples
//!
//! ```
//! use delimport::{MemorySinkFactory, Options, Sizing, import_csv_file};
//! use std::io::Write;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut file = tempfile::NamedTempFile::new()?;
//! write!(file, "id,price\n1,2.5\n2,3.75\n")?;
//!
//! // A tiny window forces the second record across a window boundary.
//! let options = Options::default().with_sizing(Sizing::new(1 << 30, 1 << 20).with_window_len(16));
//! let mut factory = MemorySinkFactory::new();
//! let summary = import_csv_file(&mut factory, file.path(), &options)?;
//!
//! assert_eq!(summary.records, 2);
//! assert!(summary.header);
//!
//! let identity = delimport::source_identity(file.path());
//! let sink = factory.sink(&identity).expect("sink opened");
//! let table = sink.table();
//! assert_eq!(table.column("price"), Some(&["2.5".to_string(), "3.75".to_string()][..]));
//! assert!(table.is_closed());
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use anyhow::Result;

pub mod error;
pub mod exit_code;
pub mod import;
pub mod listener;
pub mod metadata;
pub mod options;
pub mod output;
pub mod parser;
pub mod scope;
pub mod sink;
pub mod source;
pub mod window;

pub use error::Error as ImportError;
pub use exit_code::ExitCode;
pub use import::{ImportSummary, Importer};
pub use listener::{Listener, SinkFactory};
pub use metadata::{Column, ColumnType, Metadata, MetadataExtractor, SNIFF_RECORDS};
pub use options::{
    Options,
    delimiter::Delimiter,
    format::Format,
    serialization::{OutputFormat, Serialization},
    sizing::Sizing,
};
pub use output::Output;
pub use parser::{
    Comma, CsvParser, DelimitedParser, Dialect, Fields, Pipe, PipeParser, Tab, TabParser,
    TextParser, UNBOUNDED,
};
pub use scope::{Event, Journal, Resource};
pub use sink::{MemorySink, MemorySinkFactory, RowWriter, RowWriterFactory, Table};
pub use source::{Source, source_identity};
pub use window::{Window, Windows, window_count};

/// Imports a comma-separated file into a listener opened from `factory`.
///
/// # Errors
///
/// Returns an error if the listener cannot be opened, the file cannot be
/// opened or mapped, a record cannot be parsed, or the listener fails.
pub fn import_csv_file<F: SinkFactory>(
    factory: &mut F,
    path: impl AsRef<Path>,
    options: &Options,
) -> Result<ImportSummary> {
    Importer::new(options.clone().with_format(Format::Csv)).import_with(
        factory,
        path,
        CsvParser::new(),
    )
}

/// Imports a pipe-separated file into a listener opened from `factory`.
///
/// # Errors
///
/// Returns an error if the listener cannot be opened, the file cannot be
/// opened or mapped, a record cannot be parsed, or the listener fails.
pub fn import_pipe_file<F: SinkFactory>(
    factory: &mut F,
    path: impl AsRef<Path>,
    options: &Options,
) -> Result<ImportSummary> {
    Importer::new(options.clone().with_format(Format::Pipe)).import_with(
        factory,
        path,
        PipeParser::new(),
    )
}

/// Imports a tab-separated file into a listener opened from `factory`.
///
/// # Errors
///
/// Returns an error if the listener cannot be opened, the file cannot be
/// opened or mapped, a record cannot be parsed, or the listener fails.
pub fn import_tab_file<F: SinkFactory>(
    factory: &mut F,
    path: impl AsRef<Path>,
    options: &Options,
) -> Result<ImportSummary> {
    Importer::new(options.clone().with_format(Format::Tab)).import_with(
        factory,
        path,
        TabParser::new(),
    )
}

/// Imports a file in the format named by `options`.
///
/// # Errors
///
/// Returns an error if the listener cannot be opened, the file cannot be
/// opened or mapped, a record cannot be parsed, or the listener fails.
pub fn import_file<F: SinkFactory>(
    factory: &mut F,
    path: impl AsRef<Path>,
    options: &Options,
) -> Result<ImportSummary> {
    Importer::new(options.clone()).import(factory, path)
}
