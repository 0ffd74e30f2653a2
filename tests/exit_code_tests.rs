use std::io;

use anyhow::{Error, anyhow};
use delimport::{ExitCode, ImportError};

fn io_error(kind: io::ErrorKind) -> Error {
    io::Error::new(kind, "test I/O error").into()
}

fn io_source(kind: io::ErrorKind) -> ImportError {
    ImportError::Io {
        path: "rows.csv".to_string(),
        message: "failed to open".to_string(),
        source: io::Error::new(kind, "test I/O error"),
    }
}

#[test]
fn test_io_error_kinds() {
    let cases = [
        (io::ErrorKind::NotFound, ExitCode::InputNotFound),
        (io::ErrorKind::PermissionDenied, ExitCode::PermissionDenied),
        (io::ErrorKind::AlreadyExists, ExitCode::OutputFailed),
        (io::ErrorKind::ConnectionRefused, ExitCode::IoError),
    ];
    for (kind, code) in cases {
        assert_eq!(ExitCode::from(&io_error(kind)), code, "{kind:?}");
    }
}

#[test]
fn test_clap_help_and_version_succeed() {
    let help = clap::Command::new("test")
        .try_get_matches_from(["test", "--help"])
        .expect_err("help exits early");
    assert_eq!(ExitCode::from(&anyhow!(help)), ExitCode::Success);

    let version = clap::Command::new("test")
        .version("1.0")
        .try_get_matches_from(["test", "--version"])
        .expect_err("version exits early");
    assert_eq!(ExitCode::from(&anyhow!(version)), ExitCode::Success);
}

#[test]
fn test_clap_usage_error() {
    let err = clap::Command::new("test")
        .try_get_matches_from(["test", "--bogus"])
        .expect_err("unknown flag");
    assert_eq!(ExitCode::from(&err), ExitCode::UsageError);
}

#[test]
fn test_import_errors() {
    let usage: Error = ImportError::Usage("bad flags".to_string()).into();
    assert_eq!(ExitCode::from(&usage), ExitCode::UsageError);

    let config: Error = ImportError::Config("zero window".to_string()).into();
    assert_eq!(ExitCode::from(&config), ExitCode::UsageError);

    let quote: Error = ImportError::UnterminatedQuote { line: 0 }.into();
    assert_eq!(ExitCode::from(&quote), ExitCode::DataFormat);

    let missing: Error = io_source(io::ErrorKind::NotFound).into();
    assert_eq!(ExitCode::from(&missing), ExitCode::InputNotFound);
}

#[test]
fn test_import_error_through_context() {
    let err = Error::from(ImportError::UnterminatedQuote { line: 3 }).context("importing rows.csv");
    assert_eq!(ExitCode::from(&err), ExitCode::DataFormat);
}

#[test]
fn test_cleanup_uses_primary_error() {
    let err: Error = ImportError::Cleanup {
        primary: ImportError::UnterminatedQuote { line: 0 }.into(),
        secondary: io_error(io::ErrorKind::BrokenPipe),
    }
    .into();
    assert_eq!(ExitCode::from(&err), ExitCode::DataFormat);
}

#[test]
fn test_generic_error_is_failure() {
    assert_eq!(ExitCode::from(&anyhow!("generic error")), ExitCode::Failure);
    assert_eq!(ExitCode::DataFormat as u8, 65);
}
