use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Read as _, Write};
#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{self, Path, PathBuf, MAIN_SEPARATOR};

use tracing::debug;

use super::Os;
use crate::error::{ErrorKind, OsaError, OsaResult};
use crate::fs::{clean, next_page, DirEntry, FileInfo, Handle};
use crate::ExitRequest;

/// The real operating system.
///
/// Every call is forwarded to `std::fs`/`std::env`, so this type has no
/// state and is safe to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostOs;

impl HostOs {
    pub fn new() -> Self {
        Self
    }

    /// Terminate the process right away.
    pub fn exit_process(request: ExitRequest) -> ! {
        debug!(code = request.code, "exiting");
        std::process::exit(request.code)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| MAIN_SEPARATOR.to_string())
}

fn info(name: String, meta: &fs::Metadata) -> FileInfo {
    FileInfo {
        name,
        is_dir: meta.is_dir(),
        size: if meta.is_dir() { 0 } else { meta.len() },
    }
}

fn list(path: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = fs::read_dir(path)?
        .map(|entry| {
            let entry = entry?;
            let meta = entry.metadata()?;
            Ok(info(entry.file_name().to_string_lossy().into_owned(), &meta))
        })
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn dir_builder(perm: u32) -> DirBuilder {
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    builder.mode(perm);
    #[cfg(not(unix))]
    let _ = perm;
    builder
}

impl Os for HostOs {
    fn stat(&self, path: &str) -> OsaResult<FileInfo> {
        let meta = fs::metadata(path).map_err(|e| OsaError::io("stat", path, e))?;
        Ok(info(file_name(Path::new(path)), &meta))
    }

    fn open(&self, path: &str) -> OsaResult<Box<dyn Handle>> {
        Ok(Box::new(HostHandle::open(path)?))
    }

    fn mkdir(&mut self, path: &str, perm: u32) -> OsaResult<()> {
        dir_builder(perm)
            .create(path)
            .map_err(|e| OsaError::io("mkdir", path, e))?;
        debug!(path, "mkdir");
        Ok(())
    }

    fn mkdir_all(&mut self, path: &str, perm: u32) -> OsaResult<()> {
        // The deepest existing ancestor decides whether the path is blocked.
        for ancestor in Path::new(path).ancestors() {
            if let Ok(meta) = fs::metadata(ancestor) {
                if !meta.is_dir() {
                    return Err(OsaError::path("mkdir", path, ErrorKind::NotDirectory));
                }
                break;
            }
        }
        dir_builder(perm)
            .recursive(true)
            .create(path)
            .map_err(|e| OsaError::io("mkdir", path, e))?;
        debug!(path, "mkdir -p");
        Ok(())
    }

    fn mkdir_temp(&mut self, dir: &str, pattern: &str) -> OsaResult<String> {
        let dir: PathBuf = if dir.is_empty() {
            std::env::temp_dir()
        } else {
            dir.into()
        };
        if pattern.chars().any(path::is_separator) {
            return Err(OsaError::path(
                "mkdirtemp",
                dir.join(pattern).to_string_lossy(),
                ErrorKind::OperationFailed,
            ));
        }
        let (prefix, suffix) = match pattern.rfind('*') {
            Some(pos) => (&pattern[..pos], &pattern[pos + 1..]),
            None => (pattern, ""),
        };

        let created = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempdir_in(&dir)
            .map_err(|e| OsaError::io("mkdirtemp", dir.to_string_lossy(), e))?
            .keep();
        let created = created.to_string_lossy().into_owned();
        debug!(path = %created, "mkdirtemp");
        Ok(created)
    }

    fn read_dir(&self, path: &str) -> OsaResult<Vec<DirEntry>> {
        list(Path::new(path)).map_err(|e| OsaError::io("readdir", path, e))
    }

    fn write_file(&mut self, path: &str, data: &[u8], perm: u32) -> OsaResult<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(perm);
        #[cfg(not(unix))]
        let _ = perm;

        options
            .open(path)
            .and_then(|mut file| file.write_all(data))
            .map_err(|e| OsaError::io("write", path, e))?;
        debug!(path, len = data.len(), "write");
        Ok(())
    }

    fn read_file(&self, path: &str) -> OsaResult<Vec<u8>> {
        fs::read(path).map_err(|e| OsaError::io("read", path, e))
    }

    fn rename(&mut self, old: &str, new: &str) -> OsaResult<()> {
        fs::symlink_metadata(old).map_err(|e| OsaError::io("rename", old, e))?;
        if clean(old) == clean(new) {
            return Ok(());
        }
        // Refuse to replace a directory, even an empty one.
        if fs::metadata(new).is_ok_and(|meta| meta.is_dir()) {
            return Err(OsaError::path("rename", new, ErrorKind::Exists));
        }
        fs::rename(old, new).map_err(|e| OsaError::io("rename", new, e))?;
        debug!(old, new, "rename");
        Ok(())
    }

    fn remove(&mut self, path: &str) -> OsaResult<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| OsaError::io("remove", path, e))?;
        let result = if meta.is_dir() {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| OsaError::io("remove", path, e))?;
        debug!(path, "remove");
        Ok(())
    }

    fn remove_all(&mut self, path: &str) -> OsaResult<()> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotADirectory => return Ok(()),
            Err(e) => return Err(OsaError::io("remove", path, e)),
        };
        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| OsaError::io("remove", path, e))?;
        debug!(path, "remove -r");
        Ok(())
    }

    fn getwd(&self) -> OsaResult<String> {
        let dir = std::env::current_dir().map_err(|e| OsaError::io("getwd", ".", e))?;
        Ok(dir.to_string_lossy().into_owned())
    }

    fn user_cache_dir(&self) -> OsaResult<String> {
        well_known("usercachedir", dirs::cache_dir())
    }

    fn user_config_dir(&self) -> OsaResult<String> {
        well_known("userconfigdir", dirs::config_dir())
    }

    fn user_home_dir(&self) -> OsaResult<String> {
        well_known("userhomedir", dirs::home_dir())
    }

    fn stdin(&self) -> Box<dyn io::Read + Send> {
        Box::new(io::stdin())
    }

    fn stdout(&self) -> Box<dyn Write + Send> {
        Box::new(io::stdout())
    }

    fn stderr(&self) -> Box<dyn Write + Send> {
        Box::new(io::stderr())
    }

    fn exit(&mut self, request: ExitRequest) {
        Self::exit_process(request)
    }

    fn path_separator(&self) -> char {
        MAIN_SEPARATOR
    }

    fn is_path_separator(&self, c: char) -> bool {
        path::is_separator(c)
    }
}

fn well_known(op: &'static str, dir: Option<PathBuf>) -> OsaResult<String> {
    dir.map(|dir| dir.to_string_lossy().into_owned())
        .ok_or_else(|| OsaError::path(op, "", ErrorKind::NotExist))
}

enum Source {
    File(File),
    Dir { entries: Vec<DirEntry>, cursor: usize },
}

/// Handle onto a host file or directory.
///
/// File reads go straight to the open file. Directory listings are read
/// once when the handle is opened.
pub struct HostHandle {
    info: FileInfo,
    source: Source,
    open: bool,
}

impl HostHandle {
    fn open(path: &str) -> OsaResult<Self> {
        let fail = |e| OsaError::io("open", path, e);
        let meta = fs::metadata(path).map_err(fail)?;
        let source = if meta.is_dir() {
            Source::Dir {
                entries: list(Path::new(path)).map_err(fail)?,
                cursor: 0,
            }
        } else {
            Source::File(File::open(path).map_err(fail)?)
        };
        Ok(Self {
            info: info(file_name(Path::new(path)), &meta),
            source,
            open: true,
        })
    }
}

impl Handle for HostHandle {
    fn stat(&self) -> OsaResult<FileInfo> {
        Ok(self.info.clone())
    }

    fn read(&mut self, buf: &mut [u8]) -> OsaResult<usize> {
        if !self.open {
            return Err(OsaError::Closed);
        }
        let Source::File(file) = &mut self.source else {
            return Err(OsaError::path("read", &self.info.name, ErrorKind::NotFile));
        };
        match file.read(buf) {
            Ok(0) if !buf.is_empty() => Err(OsaError::Eof),
            Ok(n) => Ok(n),
            Err(e) => Err(OsaError::io("read", &self.info.name, e)),
        }
    }

    fn read_dir(&mut self, n: usize) -> OsaResult<Vec<DirEntry>> {
        if !self.open {
            return Err(OsaError::Closed);
        }
        match &mut self.source {
            Source::Dir { entries, cursor } => next_page(entries, cursor, n),
            Source::File(_) => Err(OsaError::path(
                "readdir",
                &self.info.name,
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn at(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_mkdir_all_blocked_by_file() {
        let tmp = TempDir::new().unwrap();
        let mut os = HostOs::new();
        os.write_file(&at(&tmp, "file"), b"", 0o600).unwrap();

        let err = os.mkdir_all(&at(&tmp, "file/sub/dir"), 0o700).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotDirectory));
    }

    #[test]
    fn test_rename_onto_empty_dir_refused() {
        let tmp = TempDir::new().unwrap();
        let mut os = HostOs::new();
        os.mkdir(&at(&tmp, "a"), 0o700).unwrap();
        os.mkdir(&at(&tmp, "b"), 0o700).unwrap();

        assert!(os.rename(&at(&tmp, "a"), &at(&tmp, "b")).unwrap_err().is_exist());
        assert!(os.stat(&at(&tmp, "a")).unwrap().is_dir);
    }

    #[test]
    fn test_mkdir_temp_star_pattern() {
        let tmp = TempDir::new().unwrap();
        let mut os = HostOs::new();
        let dir = tmp.path().to_string_lossy().into_owned();

        let created = os.mkdir_temp(&dir, "build-*.d").unwrap();
        let name = file_name(Path::new(&created));
        assert!(name.starts_with("build-"), "{}", name);
        assert!(name.ends_with(".d"), "{}", name);
        assert!(os.stat(&created).unwrap().is_dir);
    }

    #[test]
    fn test_separators() {
        let os = HostOs::new();
        assert_eq!(os.path_separator(), MAIN_SEPARATOR);
        assert!(os.is_path_separator('/'));
    }

    #[test]
    fn test_well_known_dirs_resolve() {
        let os = HostOs::new();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(os.user_home_dir().unwrap(), home.to_string_lossy().into_owned());
        }
        assert!(os.getwd().is_ok());
    }
}
