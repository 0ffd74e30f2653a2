//! Command-line argument parsing.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use delimport::{Format, ImportError, Options, OutputFormat, Serialization, Sizing};

#[derive(Debug, Parser)]
#[command(about, version)]
pub(crate) struct Args {
    /// Delimited file to import.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Input format [default: guessed from the file extension, else csv].
    #[arg(short, long, value_enum, value_name = "FORMAT")]
    pub format: Option<Format>,

    /// The first record is a header; skips schema inference.
    #[arg(long, conflicts_with = "no_header")]
    pub header: bool,

    /// Every record is data; skips schema inference.
    #[arg(long)]
    pub no_header: bool,

    /// Stop after this many records (requires --header or --no-header).
    #[arg(short, long, value_name = "COUNT")]
    pub max_records: Option<usize>,

    /// Window length in bytes [default: sized from available memory].
    #[arg(
        short,
        long,
        value_name = "BYTES",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub window_size: Option<u64>,

    /// Write rows to file rather than stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Row and report serialization.
    #[arg(short, long, default_value_t, value_enum, value_name = "FORMAT")]
    pub serialization: OutputFormat,

    /// Delimiter between fields of text output.
    #[arg(short, long, default_value = "\\t", value_name = "VALUE")]
    pub delimiter: String,

    /// Print an import report to stderr.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Args {
    /// The declared header flag, if any.
    pub(crate) const fn header(&self) -> Option<bool> {
        if self.header {
            Some(true)
        } else if self.no_header {
            Some(false)
        } else {
            None
        }
    }

    /// The input format, explicit or guessed from the path.
    pub(crate) fn format(&self) -> Format {
        self.format
            .or_else(|| Format::from_path(&self.input))
            .unwrap_or_default()
    }

    pub(crate) fn serialization(&self) -> Serialization {
        Serialization::from_format(self.serialization, &self.delimiter)
    }

    /// Builds import options from the arguments and the environment.
    pub(crate) fn to_options(&self) -> Result<Options> {
        let mut sizing = Sizing::from_env();
        if let Some(window_size) = self.window_size {
            sizing = sizing.with_window_len(window_size);
        }

        let mut options = Options::default()
            .with_format(self.format())
            .with_sizing(sizing)
            .with_serialization(self.serialization());

        match (self.header(), self.max_records) {
            (Some(header), Some(max_records)) => {
                options = options.with_header(header).with_max_records(max_records);
            }
            (Some(header), None) => options = options.with_header(header),
            (None, Some(_)) => {
                return Err(ImportError::Usage(
                    "--max-records requires --header or --no-header".into(),
                )
                .into());
            }
            (None, None) => {}
        }

        Ok(options)
    }
}
