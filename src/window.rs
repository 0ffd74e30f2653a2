//! Memory-mapped windows over an input source.
//!
//! A file larger than a single mapping is visited as a sequence of
//! contiguous, non-overlapping windows produced by [`Windows`]. Every window
//! owns its mapping until [`Window::release`] unmaps it.

use std::{
    fmt::{self, Display, Formatter},
    ops::Deref,
};

use memmap2::{Mmap, MmapOptions};

use crate::{ImportError, Source};

/// A directly addressable view over `[offset, offset + len)` of a source.
#[derive(Debug)]
pub struct Window {
    index: usize,
    offset: u64,
    mmap: Mmap,
}

impl Window {
    /// Maps `len` bytes of `source` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Map` if the range cannot be mapped, and
    /// `ImportError::Config` if `len` does not fit the address space.
    pub fn map(source: &Source, index: usize, offset: u64, len: u64) -> Result<Self, ImportError> {
        let map_len = usize::try_from(len).map_err(|_| {
            ImportError::Config(format!(
                "window of {len} bytes exceeds the addressable limit of {} bytes",
                usize::MAX
            ))
        })?;

        // Safety: Memory mapping requires `unsafe` per memmap2 crate. The
        // source is not mutated for the duration of an import.
        #[allow(unsafe_code)]
        let mmap = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(map_len)
                .map(source.file())
        }
        .map_err(|e| ImportError::Map {
            path: source.path().display().to_string(),
            offset,
            len,
            source: e,
        })?;

        Ok(Self {
            index,
            offset,
            mmap,
        })
    }

    /// Position of this window in the visitation order.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Start of the window within the source.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Exclusive end of the window within the source.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.mmap.len() as u64
    }

    /// Unmaps the window. The view is revoked once this returns.
    pub fn release(self) {
        drop(self.mmap);
    }
}

impl Deref for Window {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.mmap
    }
}

impl AsRef<[u8]> for Window {
    fn as_ref(&self) -> &[u8] {
        &self.mmap
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "window {} [{}, {})", self.index, self.offset, self.end())
    }
}

/// Produces the windows covering a source in increasing offset order.
///
/// Every window has the fixed length chosen up front except the last, which
/// is truncated to the remaining bytes. An empty source yields no windows.
/// Iteration stops after the first mapping failure.
#[derive(Debug)]
pub struct Windows<'s> {
    source: &'s Source,
    window_len: u64,
    next_offset: u64,
    next_index: usize,
}

impl<'s> Windows<'s> {
    /// Creates a provider over `source` using windows of `window_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Config` for a zero window length on a non-empty source.
    pub fn new(source: &'s Source, window_len: u64) -> Result<Self, ImportError> {
        if window_len == 0 && source.size() > 0 {
            return Err(ImportError::Config("window length must be at least 1 byte".into()));
        }

        Ok(Self {
            source,
            window_len,
            next_offset: 0,
            next_index: 0,
        })
    }

    /// The fixed window length.
    #[must_use]
    pub const fn window_len(&self) -> u64 {
        self.window_len
    }

    /// Bytes not yet covered by a produced window.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.source.size() - self.next_offset
    }
}

impl Iterator for Windows<'_> {
    type Item = Result<Window, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        let size = self.source.size();
        if self.next_offset >= size {
            return None;
        }

        let offset = self.next_offset;
        let len = self.window_len.min(size - offset);
        let index = self.next_index;

        match Window::map(self.source, index, offset, len) {
            Ok(window) => {
                self.next_offset += len;
                self.next_index += 1;
                Some(Ok(window))
            }
            Err(e) => {
                self.next_offset = size;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = usize::try_from(window_count(self.remaining(), self.window_len)).ok();
        (0, count)
    }
}

impl std::iter::FusedIterator for Windows<'_> {}

/// Number of windows of `window_len` bytes needed to cover `size` bytes.
#[must_use]
pub const fn window_count(size: u64, window_len: u64) -> u64 {
    if size == 0 || window_len == 0 {
        return 0;
    }

    size.div_ceil(window_len)
}
