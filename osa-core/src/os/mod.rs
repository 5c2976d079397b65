//! The OS facade and its implementations.
//!
//! Code that touches files takes a `&dyn Os` (or `&mut dyn Os`) instead of
//! calling `std::fs` directly, so tests can hand it a [`MemOs`].

mod host;
mod mem;
mod registry;

use std::io::{Read, Write};

pub use host::{HostHandle, HostOs};
pub use mem::MemOs;
pub use registry::{Registry, SwapGuard};

use crate::error::OsaResult;
use crate::fs::{DirEntry, FileInfo, Handle, SEPARATOR};
use crate::ExitRequest;

/// Operating system services used by the rest of a program.
///
/// Both the host-backed and the in-memory implementation satisfy this
/// contract. Errors carry an [`ErrorKind`](crate::ErrorKind) so callers can
/// test for "exists" or "does not exist" without matching messages.
///
/// Permission arguments are passed through to the host and ignored by the
/// in-memory implementation.
pub trait Os: Send {
    /// Describe the entry at `path`. Directories report size 0.
    fn stat(&self, path: &str) -> OsaResult<FileInfo>;

    /// Open a file or directory for reading.
    fn open(&self, path: &str) -> OsaResult<Box<dyn Handle>>;

    /// Create a directory. Its parent must exist.
    fn mkdir(&mut self, path: &str, perm: u32) -> OsaResult<()>;

    /// Create a directory and any missing parents.
    fn mkdir_all(&mut self, path: &str, perm: u32) -> OsaResult<()>;

    /// Create a new, uniquely named directory in `dir` and return its path.
    ///
    /// An empty `dir` means the temp root. A `*` in `pattern` marks where the
    /// unique part goes; otherwise it is appended.
    fn mkdir_temp(&mut self, dir: &str, pattern: &str) -> OsaResult<String>;

    /// List a directory, sorted by name.
    fn read_dir(&self, path: &str) -> OsaResult<Vec<DirEntry>>;

    /// Create or overwrite a file.
    fn write_file(&mut self, path: &str, data: &[u8], perm: u32) -> OsaResult<()>;

    fn read_file(&self, path: &str) -> OsaResult<Vec<u8>>;

    /// Move an entry. Existing files at `new` are replaced, existing
    /// directories are not.
    fn rename(&mut self, old: &str, new: &str) -> OsaResult<()>;

    /// Remove a file or empty directory.
    fn remove(&mut self, path: &str) -> OsaResult<()>;

    /// Remove a path and everything below it. Missing paths are fine.
    fn remove_all(&mut self, path: &str) -> OsaResult<()>;

    fn getwd(&self) -> OsaResult<String>;
    fn user_cache_dir(&self) -> OsaResult<String>;
    fn user_config_dir(&self) -> OsaResult<String>;
    fn user_home_dir(&self) -> OsaResult<String>;

    fn stdin(&self) -> Box<dyn Read + Send>;
    fn stdout(&self) -> Box<dyn Write + Send>;
    fn stderr(&self) -> Box<dyn Write + Send>;

    /// Ask for the program to end with `request.code`.
    fn exit(&mut self, request: ExitRequest);

    fn path_separator(&self) -> char {
        SEPARATOR
    }

    fn is_path_separator(&self, c: char) -> bool {
        c == self.path_separator()
    }
}
