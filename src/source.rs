//! Seekable, sized input file that windows are mapped from.

use std::{
    fmt::{self, Display, Formatter},
    fs::File,
    io,
    path::{Path, PathBuf},
};

use crate::ImportError;

/// An open input file with its size fixed at open time.
///
/// The file handle doubles as the channel windows are mapped through. It is
/// closed when the `Source` is dropped or explicitly [`closed`](Self::close).
#[derive(Debug)]
pub struct Source {
    path: PathBuf,
    file: File,
    size: u64,
}

impl Source {
    /// Opens `path` read-only and determines its size.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Io` with specific messages for:
    /// - File not found
    /// - Permission denied
    /// - A size that cannot be determined
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let file = open_file_with_error_context(path)?;
        let size = file
            .metadata()
            .map_err(|source| ImportError::Io {
                path: path.display().to_string(),
                message: "failed to read file size".into(),
                source,
            })?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
        })
    }

    /// Total size of the input in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Path the source was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying file handle.
    #[must_use]
    pub const fn file(&self) -> &File {
        &self.file
    }

    /// The file name, used as the identity handed to sinks.
    #[must_use]
    pub fn identity(&self) -> String {
        source_identity(&self.path)
    }

    /// Closes the file handle.
    pub fn close(self) {
        drop(self.file);
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Returns the file name of `path`, or the full path when it has none.
#[must_use]
pub fn source_identity(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Opens a file with enhanced error context.
///
/// # Errors
///
/// Returns `ImportError::Io` with specific messages for:
/// - File not found
/// - Permission denied
/// - Other I/O errors
pub(crate) fn open_file_with_error_context(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| {
        let path_buf = path.to_path_buf();
        let message = match source.kind() {
            io::ErrorKind::NotFound => "no such file".to_string(),
            io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => "failed to open file".to_string(),
        };

        ImportError::Io {
            path: path_buf.display().to_string(),
            message,
            source,
        }
    })
}
