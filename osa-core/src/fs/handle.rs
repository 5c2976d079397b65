//! Handles returned by `open`.
//!
//! A handle reads from a snapshot taken when it was opened; later changes to
//! the filesystem are not visible through it.

use std::io;

use super::entry::{DirEntry, Entry, FileInfo};
use crate::error::{ErrorKind, OsaError, OsaResult};

/// An open file or directory.
///
/// Handles start open and can be closed exactly once. Reading past the end
/// yields [`OsaError::Eof`].
pub trait Handle: Send {
    /// Describe the opened entry. Works on closed handles too.
    fn stat(&self) -> OsaResult<FileInfo>;

    /// Read up to `buf.len()` bytes at the cursor and advance it.
    fn read(&mut self, buf: &mut [u8]) -> OsaResult<usize>;

    /// Read the next `n` directory entries, or all remaining when `n == 0`.
    ///
    /// With `n > 0`, an exhausted listing yields [`OsaError::Eof`]; with
    /// `n == 0` it yields an empty list.
    fn read_dir(&mut self, n: usize) -> OsaResult<Vec<DirEntry>>;

    fn close(&mut self) -> OsaResult<()>;
}

impl io::Read for dyn Handle + '_ {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Handle::read(self, buf) {
            Ok(n) => Ok(n),
            Err(OsaError::Eof) => Ok(0),
            Err(err) => Err(io::Error::other(err)),
        }
    }
}

/// Take the next page of a listing.
pub(crate) fn next_page(
    entries: &[DirEntry],
    cursor: &mut usize,
    n: usize,
) -> OsaResult<Vec<DirEntry>> {
    let remaining = &entries[(*cursor).min(entries.len())..];
    if n > 0 && remaining.is_empty() {
        return Err(OsaError::Eof);
    }
    let take = if n == 0 { remaining.len() } else { n.min(remaining.len()) };
    *cursor += take;
    Ok(remaining[..take].to_vec())
}

#[derive(Debug, Clone)]
enum Snapshot {
    File(Vec<u8>),
    Dir(Vec<DirEntry>),
}

/// Handle onto a snapshot of an in-memory entry.
#[derive(Debug, Clone)]
pub struct MemHandle {
    name: String,
    snapshot: Snapshot,
    cursor: usize,
    open: bool,
}

impl MemHandle {
    pub(crate) fn new(name: impl Into<String>, entry: &Entry) -> Self {
        let snapshot = match entry {
            Entry::File(data) => Snapshot::File(data.clone()),
            Entry::Dir(dir) => Snapshot::Dir(dir.list()),
        };
        Self {
            name: name.into(),
            snapshot,
            cursor: 0,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Handle for MemHandle {
    fn stat(&self) -> OsaResult<FileInfo> {
        let (is_dir, size) = match &self.snapshot {
            Snapshot::File(data) => (false, data.len() as u64),
            Snapshot::Dir(_) => (true, 0),
        };
        Ok(FileInfo {
            name: self.name.clone(),
            is_dir,
            size,
        })
    }

    fn read(&mut self, buf: &mut [u8]) -> OsaResult<usize> {
        if !self.open {
            return Err(OsaError::Closed);
        }
        let Snapshot::File(data) = &self.snapshot else {
            return Err(OsaError::path("read", &self.name, ErrorKind::NotFile));
        };

        let remaining = &data[self.cursor..];
        if remaining.is_empty() {
            return Err(OsaError::Eof);
        }
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.cursor += n;
        Ok(n)
    }

    fn read_dir(&mut self, n: usize) -> OsaResult<Vec<DirEntry>> {
        if !self.open {
            return Err(OsaError::Closed);
        }
        match &self.snapshot {
            Snapshot::Dir(entries) => next_page(entries, &mut self.cursor, n),
            Snapshot::File(_) => Err(OsaError::path(
                "readdir",
                &self.name,
                ErrorKind::NotDirectory,
            )),
        }
    }

    fn close(&mut self) -> OsaResult<()> {
        if !self.open {
            return Err(OsaError::Closed);
        }
        self.open = false;
        Ok(())
    }
}

impl io::Read for MemHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self as &mut dyn Handle, buf)
    }
}
