//! The two-phase import protocol.
//!
//! An import first samples the start of the first window to infer column
//! [`Metadata`], publishes it, then rewinds the parser and delivers every
//! record of every window to the consumer. Resources are acquired in the
//! order listener, parser, source, window and released in reverse on every
//! exit path; the [`Journal`] keeps the record.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::{
    Listener, Metadata, MetadataExtractor, Options, SinkFactory, Source, TextParser, Window,
    Windows,
    parser::UNBOUNDED,
    scope::{self, Journal, Resource},
    source::source_identity,
    window::window_count,
};

/// Bytes of the first window handed to the parser per call during analysis.
const ANALYSIS_SLICE_LEN: usize = 64 * 1024;

/// What an import did, for reporting.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Identity of the input, its file name.
    pub source: String,
    /// Format of the parser used.
    pub format: String,
    /// Size of the input in bytes.
    pub size: u64,
    /// Length of every window but the last.
    pub window_len: u64,
    /// Windows mapped, counting the first window once.
    pub windows: usize,
    /// Records sampled by the analysis pass.
    pub sniffed: usize,
    /// Whether the first record was skipped as a header.
    pub header: bool,
    /// Records delivered by the ingest pass.
    pub records: usize,
    /// Metadata published, if the analysis pass ran on a non-empty input.
    pub metadata: Option<Metadata>,
}

impl ImportSummary {
    fn new(source: &Source, format: &str, window_len: u64) -> Self {
        Self {
            source: source.identity(),
            format: format.to_string(),
            size: source.size(),
            window_len,
            ..Self::default()
        }
    }
}

/// Runs imports with one set of [`Options`].
///
/// # Examples
///
/// ```no_run
/// use delimport::{Importer, MemorySinkFactory, Options};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut factory = MemorySinkFactory::new();
/// let mut importer = Importer::new(Options::default());
/// let summary = importer.import(&mut factory, "trades.csv")?;
///
/// assert!(importer.journal().is_balanced());
/// println!("{} records", summary.records);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct Importer {
    options: Options,
    journal: Journal,
}

impl Importer {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            journal: Journal::new(),
        }
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Resource events of the most recent import, complete even when it failed.
    #[must_use]
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Imports `path` into a listener opened from `factory`, with the parser
    /// of the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be opened, the input cannot be
    /// opened or mapped, a record cannot be parsed, or the listener fails.
    pub fn import<F: SinkFactory>(
        &mut self,
        factory: &mut F,
        path: impl AsRef<Path>,
    ) -> Result<ImportSummary> {
        let parser = self.options.format().parser();
        self.import_with(factory, path, parser)
    }

    /// Imports `path` into a listener opened from `factory`, with `parser`.
    ///
    /// Runs both phases unless the options declare the header flag, in which
    /// case only the ingest pass runs, capped at the configured record limit.
    /// The parser and listener are closed once the import ends.
    ///
    /// Only records complete within the first window are sampled. When that
    /// window is too small to hold at least two records, no header is
    /// inferred and the first record is delivered as data.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be opened, the input cannot be
    /// opened or mapped, a record cannot be parsed, or the listener fails.
    /// When closing fails after another error, the result is
    /// `ImportError::Cleanup` carrying both.
    pub fn import_with<F: SinkFactory, P: TextParser>(
        &mut self,
        factory: &mut F,
        path: impl AsRef<Path>,
        mut parser: P,
    ) -> Result<ImportSummary> {
        let path = path.as_ref();
        self.journal.clear();

        let mut listener = factory.open_listener(&source_identity(path))?;
        self.journal.acquire(Resource::Listener);
        self.journal.acquire(Resource::Parser);

        let outcome = match self.options.header() {
            None => self.run(path, |importer, source| {
                importer.analyze_and_ingest(source, &mut parser, &mut listener)
            }),
            Some(header) => {
                let max_records = self.options.max_records();
                self.run(path, |importer, source| {
                    importer.ingest_only(source, &mut parser, header, max_records, &mut listener)
                })
            }
        };

        let closed = parser.close();
        self.journal.release(Resource::Parser);
        let outcome = scope::settle(outcome, closed);

        let closed = listener.close();
        self.journal.release(Resource::Listener);
        scope::settle(outcome, closed)
    }

    /// Runs both phases over `path` with a caller-owned parser and listener.
    ///
    /// Neither is closed; the journal records only the source and windows.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or mapped, a record
    /// cannot be parsed, or the listener fails.
    pub fn analyze_and_parse(
        &mut self,
        path: impl AsRef<Path>,
        parser: &mut dyn TextParser,
        listener: &mut dyn Listener,
    ) -> Result<ImportSummary> {
        self.journal.clear();
        self.run(path.as_ref(), |importer, source| {
            importer.analyze_and_ingest(source, parser, listener)
        })
    }

    /// Runs only the ingest pass over `path`, with a known header flag and at
    /// most `max_records` records delivered.
    ///
    /// No metadata is published. Windows after the one where the cap is
    /// reached are not mapped.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or mapped, a record
    /// cannot be parsed, or the listener fails.
    pub fn parse(
        &mut self,
        path: impl AsRef<Path>,
        parser: &mut dyn TextParser,
        header: bool,
        max_records: usize,
        listener: &mut dyn Listener,
    ) -> Result<ImportSummary> {
        self.journal.clear();
        self.run(path.as_ref(), |importer, source| {
            importer.ingest_only(source, parser, header, max_records, listener)
        })
    }

    /// Holds the source open for the duration of `import`.
    fn run<T>(
        &mut self,
        path: &Path,
        import: impl FnOnce(&mut Self, &Source) -> Result<T>,
    ) -> Result<T> {
        let source = Source::open(path)?;
        self.journal.acquire(Resource::Source);

        let outcome = import(self, &source);

        source.close();
        self.journal.release(Resource::Source);
        outcome
    }

    fn analyze_and_ingest(
        &mut self,
        source: &Source,
        parser: &mut dyn TextParser,
        listener: &mut dyn Listener,
    ) -> Result<ImportSummary> {
        let window_len = self.options.sizing().analysis_window_len(source.size());
        let mut summary = ImportSummary::new(source, parser.name(), window_len);
        log::debug!(
            "importing {source} ({} bytes) as {} in {} windows of {window_len} bytes",
            source.size(),
            parser.name(),
            window_count(source.size(), window_len)
        );

        let mut windows = Windows::new(source, window_len)?;
        let Some(first) = windows.next() else {
            log::debug!("{source} is empty, nothing to analyze");
            listener.on_line_count(0)?;
            return Ok(summary);
        };
        let first = first?;
        self.acquire(&first, &mut summary);

        let whole = windows.remaining() == 0;
        let outcome = self
            .analyze(&first, whole, parser, listener, &mut summary)
            .and_then(|()| {
                log::debug!("ingesting {source} from the start of {first}");
                parser.parse(&first, UNBOUNDED, &mut *listener)
            });
        self.release(first);
        outcome?;

        self.ingest(&mut windows, parser, UNBOUNDED, listener, &mut summary)?;
        self.complete(parser, UNBOUNDED, listener, summary)
    }

    /// Samples the first window and publishes the inferred metadata.
    ///
    /// Leaves the parser rewound, with the header flag from the sample.
    fn analyze(
        &self,
        window: &Window,
        whole: bool,
        parser: &mut dyn TextParser,
        listener: &mut dyn Listener,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        let cap = self.options.sniff_records();
        let mut extractor = MetadataExtractor::new();

        parser.set_header(false);
        parser.reset();
        for slice in window.chunks(ANALYSIS_SLICE_LEN) {
            if parser.line_count() >= cap {
                break;
            }
            parser.parse(slice, cap, &mut extractor)?;
        }
        if whole && parser.line_count() < cap {
            parser.finish(cap, &mut extractor)?;
        }
        extractor.on_line_count(parser.line_count())?;

        let metadata = extractor.metadata();
        log::debug!("sampled {} records: {metadata}", extractor.records());
        listener.on_metadata(&metadata)?;

        parser.set_header(metadata.header());
        parser.restart();

        summary.sniffed = extractor.records();
        summary.header = metadata.header();
        summary.metadata = Some(metadata);
        Ok(())
    }

    fn ingest_only(
        &mut self,
        source: &Source,
        parser: &mut dyn TextParser,
        header: bool,
        max_records: usize,
        listener: &mut dyn Listener,
    ) -> Result<ImportSummary> {
        let window_len = self.options.sizing().ingest_window_len(source.size());
        let mut summary = ImportSummary::new(source, parser.name(), window_len);
        summary.header = header;
        log::debug!(
            "ingesting {source} ({} bytes) as {} with header={header} in windows of {window_len} bytes",
            source.size(),
            parser.name()
        );

        parser.set_header(header);
        parser.reset();

        let mut windows = Windows::new(source, window_len)?;
        self.ingest(&mut windows, parser, max_records, listener, &mut summary)?;
        self.complete(parser, max_records, listener, summary)
    }

    /// Parses the remaining windows in order, one mapped at a time.
    fn ingest(
        &mut self,
        windows: &mut Windows<'_>,
        parser: &mut dyn TextParser,
        max_records: usize,
        listener: &mut dyn Listener,
        summary: &mut ImportSummary,
    ) -> Result<()> {
        while parser.line_count() < max_records {
            let Some(window) = windows.next() else {
                return Ok(());
            };
            let window = window?;
            self.acquire(&window, summary);

            let outcome = parser.parse(&window, max_records, &mut *listener);
            self.release(window);
            outcome?;
        }

        if windows.remaining() > 0 {
            log::warn!(
                "record cap of {max_records} reached, skipping the last {} bytes",
                windows.remaining()
            );
        }
        Ok(())
    }

    /// Flushes a final unterminated record and reports the count.
    fn complete(
        &self,
        parser: &mut dyn TextParser,
        max_records: usize,
        listener: &mut dyn Listener,
        mut summary: ImportSummary,
    ) -> Result<ImportSummary> {
        parser.finish(max_records, &mut *listener)?;
        summary.records = parser.line_count();
        listener.on_line_count(summary.records)?;
        log::debug!(
            "imported {} records from {} in {} windows",
            summary.records,
            summary.source,
            summary.windows
        );
        Ok(summary)
    }

    fn acquire(&mut self, window: &Window, summary: &mut ImportSummary) {
        self.journal.acquire(window_resource(window));
        summary.windows += 1;
    }

    fn release(&mut self, window: Window) {
        let resource = window_resource(&window);
        window.release();
        self.journal.release(resource);
    }
}

fn window_resource(window: &Window) -> Resource {
    Resource::Window {
        index: window.index(),
        offset: window.offset(),
        len: window.end() - window.offset(),
    }
}
