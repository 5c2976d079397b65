//! In-memory standard streams.
//!
//! `MemStdio` stands in for stdin/stdout/stderr. Each stream is a `Pipe`:
//! a shared byte queue whose clones all see the same data, so a test can keep
//! one end and hand the other to the code under test.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared in-memory byte queue, readable and writable from any clone.
#[derive(Debug, Clone, Default)]
pub struct Pipe {
    buf: Arc<Mutex<VecDeque<u8>>>,
}

impl Pipe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-queued data.
    pub fn with_data(data: &[u8]) -> Self {
        Self {
            buf: Arc::new(Mutex::new(data.iter().copied().collect())),
        }
    }

    /// Poisoning is ignored: the queue only ever holds whole bytes.
    fn lock(&self) -> MutexGuard<'_, VecDeque<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Unread bytes, without consuming them.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().iter().copied().collect()
    }

    /// Unread bytes as a string (lossy UTF-8 conversion).
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Read for Pipe {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let mut buf = self.lock();
        let n = out.len().min(buf.len());
        for (slot, byte) in out.iter_mut().zip(buf.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for Pipe {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.lock().extend(data.iter().copied());
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The three standard streams, kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemStdio {
    pub stdin: Pipe,
    pub stdout: Pipe,
    pub stderr: Pipe,
}

impl MemStdio {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ends a test holds: a writer into stdin and readers of stdout and
    /// stderr.
    pub fn ends(&self) -> (Pipe, Pipe, Pipe) {
        (self.stdin.clone(), self.stdout.clone(), self.stderr.clone())
    }

    /// Empty all three streams.
    pub fn clear(&self) {
        self.stdin.clear();
        self.stdout.clear();
        self.stderr.clear();
    }
}
