//! `delimport` imports a delimited file and writes out its rows.

pub(crate) mod args;
pub(crate) mod verbose;

use std::process;

use anyhow::Result;
use args::Args;
use clap::Parser;
use delimport::{ExitCode, RowWriterFactory, import_file};
use env_logger::Env;
use verbose::Verbose;

fn main() -> process::ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = ExitCode::from(&err);
            // Help and version go to stdout, usage errors to stderr.
            let _ = err.print();
            return code.into();
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(&err).into()
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let options = args.to_options()?;
    log::debug!("{options}");

    let mut factory = RowWriterFactory::new(args.output.clone(), options.serialization().clone());
    let summary = import_file(&mut factory, &args.input, &options)?;

    if args.verbose {
        Verbose::default().write_summary(&summary, options.serialization())?;
    }

    Ok(())
}
