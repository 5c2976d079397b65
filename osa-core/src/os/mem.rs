use std::io::{Read, Seek, Write};

use tracing::debug;

use super::Os;
use crate::error::OsaResult;
use crate::fs::{DirEntry, FileInfo, Handle, MemFs};
use crate::layout::Layout;
use crate::stdio::MemStdio;
use crate::ExitRequest;

/// In-memory OS: a [`MemFs`] plus captured standard streams.
///
/// Exit requests are recorded rather than acted on; see [`MemOs::exit_code`].
#[derive(Debug, Clone, Default)]
pub struct MemOs {
    fs: MemFs,
    stdio: MemStdio,
    exit_code: Option<i32>,
}

impl MemOs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: Layout) -> OsaResult<Self> {
        Ok(Self::from_fs(MemFs::with_layout(layout)?))
    }

    /// Create with initial files. Parent directories are created as needed.
    pub fn with_files<I, P, D>(files: I) -> OsaResult<Self>
    where
        I: IntoIterator<Item = (P, D)>,
        P: AsRef<str>,
        D: AsRef<[u8]>,
    {
        Ok(Self::from_fs(MemFs::with_files(files)?))
    }

    pub fn from_fs(fs: MemFs) -> Self {
        Self {
            fs,
            stdio: MemStdio::default(),
            exit_code: None,
        }
    }

    pub fn fs(&self) -> &MemFs {
        &self.fs
    }

    pub fn fs_mut(&mut self) -> &mut MemFs {
        &mut self.fs
    }

    pub fn stdio(&self) -> &MemStdio {
        &self.stdio
    }

    /// Seed the filesystem from a ZIP archive; see [`MemFs::import_zip`].
    pub fn import_zip<R: Read + Seek>(&mut self, reader: R, at: &str) -> OsaResult<usize> {
        self.fs.import_zip(reader, at)
    }

    pub fn export_zip<W: Write + Seek>(&self, dir: &str, writer: W) -> OsaResult<usize> {
        self.fs.export_zip(dir, writer)
    }

    /// Code of the last exit request, if any.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

impl Os for MemOs {
    fn stat(&self, path: &str) -> OsaResult<FileInfo> {
        self.fs.stat(path)
    }

    fn open(&self, path: &str) -> OsaResult<Box<dyn Handle>> {
        Ok(Box::new(self.fs.open(path)?))
    }

    fn mkdir(&mut self, path: &str, perm: u32) -> OsaResult<()> {
        self.fs.mkdir(path, perm)
    }

    fn mkdir_all(&mut self, path: &str, perm: u32) -> OsaResult<()> {
        self.fs.mkdir_all(path, perm)
    }

    fn mkdir_temp(&mut self, dir: &str, pattern: &str) -> OsaResult<String> {
        self.fs.mkdir_temp(dir, pattern)
    }

    fn read_dir(&self, path: &str) -> OsaResult<Vec<DirEntry>> {
        self.fs.read_dir(path)
    }

    fn write_file(&mut self, path: &str, data: &[u8], perm: u32) -> OsaResult<()> {
        self.fs.write_file(path, data, perm)
    }

    fn read_file(&self, path: &str) -> OsaResult<Vec<u8>> {
        self.fs.read_file(path)
    }

    fn rename(&mut self, old: &str, new: &str) -> OsaResult<()> {
        self.fs.rename(old, new)
    }

    fn remove(&mut self, path: &str) -> OsaResult<()> {
        self.fs.remove(path)
    }

    fn remove_all(&mut self, path: &str) -> OsaResult<()> {
        self.fs.remove_all(path)
    }

    fn getwd(&self) -> OsaResult<String> {
        self.fs.getwd()
    }

    fn user_cache_dir(&self) -> OsaResult<String> {
        self.fs.user_cache_dir()
    }

    fn user_config_dir(&self) -> OsaResult<String> {
        self.fs.user_config_dir()
    }

    fn user_home_dir(&self) -> OsaResult<String> {
        self.fs.user_home_dir()
    }

    fn stdin(&self) -> Box<dyn Read + Send> {
        Box::new(self.stdio.stdin.clone())
    }

    fn stdout(&self) -> Box<dyn Write + Send> {
        Box::new(self.stdio.stdout.clone())
    }

    fn stderr(&self) -> Box<dyn Write + Send> {
        Box::new(self.stdio.stderr.clone())
    }

    fn exit(&mut self, request: ExitRequest) {
        debug!(code = request.code, "exit requested");
        self.exit_code = Some(request.code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_reach_stdio() {
        let os = MemOs::new();
        os.stdout().write_all(b"out").unwrap();
        os.stderr().write_all(b"err").unwrap();

        assert_eq!(os.stdio().stdout.contents_string(), "out");
        assert_eq!(os.stdio().stderr.contents_string(), "err");
    }

    #[test]
    fn test_stdin_from_test_end() {
        let os = MemOs::new();
        let (mut stdin, _, _) = os.stdio().ends();
        stdin.write_all(b"typed").unwrap();

        let mut text = String::new();
        os.stdin().read_to_string(&mut text).unwrap();
        assert_eq!(text, "typed");
    }

    #[test]
    fn test_exit_is_recorded() {
        let mut os = MemOs::new();
        assert_eq!(os.exit_code(), None);
        os.exit(ExitRequest::new(3));
        assert_eq!(os.exit_code(), Some(3));
    }

    #[test]
    fn test_open_through_facade() {
        let mut os = MemOs::new();
        os.write_file("/home/note", b"abc", 0o600).unwrap();

        let mut handle = os.open("/home/note").unwrap();
        let mut text = String::new();
        handle.read_to_string(&mut text).unwrap();
        assert_eq!(text, "abc");
        handle.close().unwrap();
    }
}
