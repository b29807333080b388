//! Bounds-checked positional reads from an untrusted image file
//!
//! Every offset and size handed to [`ImageReader`] comes from the file being
//! parsed, so each read is validated against the file length before any
//! buffer is allocated.

use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::domain::ElfError;

/// Largest single table we are willing to load (section headers, string
/// tables, dynamic arrays). Real images stay far below this.
pub const MAX_TABLE_BYTES: u64 = 16 * 1024 * 1024;

/// Read-only handle on an image file with its length captured at open time
pub struct ImageReader {
    file: File,
    len: u64,
    path: PathBuf,
}

impl ImageReader {
    /// Open `path` for reading.
    ///
    /// # Errors
    /// Returns [`ElfError::Open`] if the file cannot be opened or stat'ed.
    pub fn open(path: &Path) -> Result<Self, ElfError> {
        let open_err = |source| ElfError::Open { path: path.to_path_buf(), source };
        let file = File::open(path).map_err(open_err)?;
        let len = file.metadata().map_err(open_err)?.len();
        Ok(Self { file, len, path: path.to_path_buf() })
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Build a [`ElfError::Format`] for this image
    pub fn format_error(&self, reason: impl Into<String>) -> ElfError {
        ElfError::Format { path: self.path.clone(), reason: reason.into() }
    }

    /// Read exactly `size` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns [`ElfError::Format`] if the range overflows, lies outside the
    /// file, exceeds [`MAX_TABLE_BYTES`], or the read comes up short.
    pub fn read_at(&self, offset: u64, size: u64, what: &str) -> Result<Vec<u8>, ElfError> {
        if size > MAX_TABLE_BYTES {
            return Err(self.format_error(format!("{what} is too large ({size} bytes)")));
        }
        let end = offset
            .checked_add(size)
            .ok_or_else(|| self.format_error(format!("{what} range overflows")))?;
        if end > self.len {
            return Err(self.format_error(format!(
                "{what} at 0x{offset:x}+0x{size:x} extends past end of file (0x{:x})",
                self.len
            )));
        }

        // Bounded by MAX_TABLE_BYTES above
        #[allow(clippy::cast_possible_truncation)]
        let mut buf = vec![0u8; size as usize];
        self.file
            .read_exact_at(&mut buf, offset)
            .map_err(|e| self.format_error(format!("short read of {what}: {e}")))?;
        Ok(buf)
    }

    /// Read a table of `count` entries of `entsize` bytes at `offset`.
    ///
    /// # Errors
    /// Same as [`ImageReader::read_at`], plus overflow of `count * entsize`.
    pub fn read_table(
        &self,
        offset: u64,
        count: u64,
        entsize: u64,
        what: &str,
    ) -> Result<Vec<u8>, ElfError> {
        let size = count
            .checked_mul(entsize)
            .ok_or_else(|| self.format_error(format!("{what} size overflows")))?;
        self.read_at(offset, size, what)
    }
}
