//! Substitutable OS abstraction
//!
//! This crate lets code depend on an [`Os`] trait instead of calling the
//! host directly:
//! - `HostOs`: forwards every call to the real filesystem and process
//! - `MemOs`: an in-memory filesystem with captured standard streams
//! - `Registry`: holds the active implementation and swaps it for a scope
//!
//! # Architecture
//!
//! The in-memory side is layered:
//! - `fs::Entry`/`fs::Dir`: tree nodes
//! - `fs::path`: absolute path normalization
//! - `MemFs`: the operation set (stat, mkdir, rename, ...)
//! - `fs::Handle`: snapshot handles returned by `open`
//! - `MemStdio`: in-memory stdin/stdout/stderr

mod archive;
pub mod error;
pub mod fs;
pub mod layout;
pub mod os;
pub mod stdio;

pub use error::{ErrorKind, OsaError, OsaResult};
pub use fs::{DirEntry, FileInfo, Handle, MemFs, MemHandle};
pub use layout::Layout;
pub use os::{HostHandle, HostOs, MemOs, Os, Registry, SwapGuard};
pub use stdio::{MemStdio, Pipe};

/// Request to end the program with an exit code.
///
/// Passed to [`Os::exit`] and handled once at the top level: the host
/// implementation terminates the process, the in-memory one records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRequest {
    pub code: i32,
}

impl ExitRequest {
    pub fn new(code: i32) -> Self {
        Self { code }
    }

    pub fn success() -> Self {
        Self::new(0)
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}
