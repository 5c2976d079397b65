//! In-memory filesystem engine.

use tracing::{debug, trace, warn};

use super::entry::{Dir, DirEntry, Entry, FileInfo};
use super::handle::MemHandle;
use super::path::{base_name, dir_name, join, split, split_parent, SEPARATOR};
use crate::error::{ErrorKind, OsaError, OsaResult};
use crate::layout::Layout;

/// Upper bound on numeric suffixes tried by [`MemFs::mkdir_temp`].
const TEMP_SUFFIX_LIMIT: u32 = u32::MAX;

/// Virtual filesystem kept entirely in memory.
///
/// Every path must be absolute. Well-known directories from the [`Layout`]
/// are created up front and live in the same tree as everything else.
///
/// There is no internal locking: callers sharing one instance across
/// threads must serialize access themselves.
#[derive(Debug, Clone)]
pub struct MemFs {
    root: Entry,
    layout: Layout,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::with_layout(Layout::default())
            .unwrap_or_else(|err| panic!("default layout must be valid: {}", err))
    }
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filesystem whose well-known directories follow `layout`.
    pub fn with_layout(layout: Layout) -> OsaResult<Self> {
        layout.validate()?;
        let mut fs = Self {
            root: Entry::dir(),
            layout: layout.normalized(),
        };
        for dir in fs.layout.dirs() {
            fs.mkdir_all(&dir, 0o700)?;
        }
        Ok(fs)
    }

    /// Create with initial files. Parent directories are created as needed.
    pub fn with_files<I, P, D>(files: I) -> OsaResult<Self>
    where
        I: IntoIterator<Item = (P, D)>,
        P: AsRef<str>,
        D: AsRef<[u8]>,
    {
        let mut fs = Self::new();
        for (path, data) in files {
            let path = path.as_ref();
            fs.mkdir_all(&dir_name(path), 0o700)?;
            fs.write_file(path, data.as_ref(), 0o600)?;
        }
        Ok(fs)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn lookup(&self, parts: &[String]) -> Result<&Entry, ErrorKind> {
        let mut current = &self.root;
        for name in parts {
            current = match current {
                Entry::Dir(dir) => dir.get(name)?,
                Entry::File(_) => return Err(ErrorKind::NotDirectory),
            };
        }
        Ok(current)
    }

    fn lookup_dir(&self, parts: &[String]) -> Result<&Dir, ErrorKind> {
        match self.lookup(parts)? {
            Entry::Dir(dir) => Ok(dir),
            Entry::File(_) => Err(ErrorKind::NotDirectory),
        }
    }

    fn lookup_dir_mut(&mut self, parts: &[String]) -> Result<&mut Dir, ErrorKind> {
        let mut current = &mut self.root;
        for name in parts {
            current = match current {
                Entry::Dir(dir) => dir.get_mut(name)?,
                Entry::File(_) => return Err(ErrorKind::NotDirectory),
            };
        }
        match current {
            Entry::Dir(dir) => Ok(dir),
            Entry::File(_) => Err(ErrorKind::NotDirectory),
        }
    }

    /// Resolve a path to its entry. Failures are reported under `op`.
    pub fn entry(&self, op: &'static str, path: &str) -> OsaResult<&Entry> {
        trace!(op, path, "resolve");
        self.lookup(&split(path))
            .map_err(|kind| OsaError::path(op, path, kind))
    }

    pub fn stat(&self, path: &str) -> OsaResult<FileInfo> {
        let entry = self.entry("stat", path)?;
        Ok(FileInfo::new(base_name(path), entry))
    }

    pub fn open(&self, path: &str) -> OsaResult<MemHandle> {
        let entry = self
            .lookup(&split(path))
            .map_err(|kind| OsaError::path("open", path, kind))?;
        Ok(MemHandle::new(base_name(path), entry))
    }

    /// Create a single directory. The parent must already exist.
    pub fn mkdir(&mut self, path: &str, _perm: u32) -> OsaResult<()> {
        let fail = |kind| OsaError::path("mkdir", path, kind);
        let (parent, base) = split_parent(path).ok_or_else(|| fail(ErrorKind::Exists))?;
        self.lookup_dir_mut(&parent)
            .and_then(|dir| dir.add(&base, Entry::dir()))
            .map_err(fail)?;
        debug!(path, "mkdir");
        Ok(())
    }

    /// Create a directory along with any missing parents.
    ///
    /// Succeeds without changes if the whole path already exists as
    /// directories. Nothing is created if a file blocks the path.
    pub fn mkdir_all(&mut self, path: &str, _perm: u32) -> OsaResult<()> {
        let fail = |kind| OsaError::path("mkdir", path, kind);
        let parts = split(path);

        let mut current = &self.root;
        for name in &parts {
            match current {
                Entry::Dir(dir) => match dir.get(name) {
                    Ok(entry) => current = entry,
                    Err(_) => break,
                },
                Entry::File(_) => return Err(fail(ErrorKind::NotDirectory)),
            }
        }
        if !current.is_dir() {
            return Err(fail(ErrorKind::NotDirectory));
        }

        let mut dir = self.lookup_dir_mut(&[]).map_err(fail)?;
        for name in &parts {
            if !dir.has(name) {
                dir.add(name, Entry::dir()).map_err(fail)?;
            }
            dir = match dir.get_mut(name).map_err(fail)? {
                Entry::Dir(child) => child,
                Entry::File(_) => return Err(fail(ErrorKind::NotDirectory)),
            };
        }
        debug!(path, "mkdir -p");
        Ok(())
    }

    /// Create a uniquely named directory inside `dir` (the temp root when
    /// empty) and return its path.
    ///
    /// Names are `pattern` followed by an increasing number starting at 1.
    /// If the pattern contains `*`, the number replaces the last `*` instead.
    pub fn mkdir_temp(&mut self, dir: &str, pattern: &str) -> OsaResult<String> {
        self.mkdir_temp_bounded(dir, pattern, TEMP_SUFFIX_LIMIT)
    }

    fn mkdir_temp_bounded(&mut self, dir: &str, pattern: &str, limit: u32) -> OsaResult<String> {
        let dir = if dir.is_empty() {
            self.layout.temp_dir.clone()
        } else {
            dir.to_string()
        };
        if pattern.contains(SEPARATOR) {
            return Err(OsaError::path(
                "mkdirtemp",
                join(&dir, pattern),
                ErrorKind::OperationFailed,
            ));
        }
        let (prefix, suffix) = match pattern.rfind('*') {
            Some(pos) => (&pattern[..pos], &pattern[pos + 1..]),
            None => (pattern, ""),
        };

        for n in 1..=limit {
            let candidate = join(&dir, &format!("{}{}{}", prefix, n, suffix));
            match self.mkdir(&candidate, 0o700) {
                Err(err) if err.is_exist() => continue,
                result => return result.map(|()| candidate),
            }
        }

        warn!(dir = %dir, pattern, "temp directory names exhausted");
        Err(OsaError::path(
            "mkdirtemp",
            join(&dir, pattern),
            ErrorKind::OperationFailed,
        ))
    }

    /// List a directory, sorted by name.
    pub fn read_dir(&self, path: &str) -> OsaResult<Vec<DirEntry>> {
        let dir = self
            .lookup_dir(&split(path))
            .map_err(|kind| OsaError::path("readdir", path, kind))?;
        Ok(dir.list())
    }

    /// Create or overwrite a file. An existing directory is never replaced.
    pub fn write_file(&mut self, path: &str, data: &[u8], _perm: u32) -> OsaResult<()> {
        let fail = |kind| OsaError::path("write", path, kind);
        let (parent, base) = split_parent(path).ok_or_else(|| fail(ErrorKind::NotFile))?;
        self.lookup_dir_mut(&parent)
            .and_then(|dir| dir.update(&base, Entry::file(data)))
            .map_err(fail)?;
        debug!(path, len = data.len(), "write");
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> OsaResult<Vec<u8>> {
        match self.lookup(&split(path)) {
            Ok(Entry::File(data)) => Ok(data.clone()),
            Ok(Entry::Dir(_)) => Err(OsaError::path("read", path, ErrorKind::NotFile)),
            Err(kind) => Err(OsaError::path("open", path, kind)),
        }
    }

    /// Move `old` to `new`, keeping the entry (and any children) intact.
    ///
    /// An existing file at `new` is replaced; an existing directory is not.
    /// Either the move happens completely or the tree is left untouched.
    pub fn rename(&mut self, old: &str, new: &str) -> OsaResult<()> {
        let fail = |path: &str, kind| OsaError::path("rename", path, kind);
        let old_parts = split(old);
        let new_parts = split(new);

        let entry = self.lookup(&old_parts).map_err(|kind| fail(old, kind))?;
        if old_parts == new_parts {
            return Ok(());
        }
        let Some((old_base, old_parent)) = old_parts.split_last() else {
            return Err(fail(old, ErrorKind::OperationFailed));
        };
        if new_parts.starts_with(&old_parts) {
            return Err(fail(new, ErrorKind::OperationFailed));
        }
        let Some((new_base, new_parent)) = new_parts.split_last() else {
            return Err(fail(new, ErrorKind::Exists));
        };

        let target = self.lookup_dir(new_parent).map_err(|kind| fail(new, kind))?;
        if matches!(target.get(new_base), Ok(existing) if existing.is_dir()) {
            return Err(fail(new, ErrorKind::Exists));
        }
        target
            .check_update(new_base, entry)
            .map_err(|kind| fail(new, kind))?;

        let moved = self
            .lookup_dir_mut(old_parent)
            .and_then(|dir| dir.delete(old_base).ok_or(ErrorKind::NotExist))
            .map_err(|kind| fail(old, kind))?;
        self.lookup_dir_mut(new_parent)
            .and_then(|dir| dir.update(new_base, moved))
            .map_err(|kind| fail(new, kind))?;

        debug!(old, new, "rename");
        Ok(())
    }

    /// Remove a file or an empty directory.
    pub fn remove(&mut self, path: &str) -> OsaResult<()> {
        let fail = |kind| OsaError::path("remove", path, kind);
        let (parent, base) =
            split_parent(path).ok_or_else(|| fail(ErrorKind::OperationFailed))?;
        let dir = self.lookup_dir_mut(&parent).map_err(fail)?;
        let entry = dir.get(&base).map_err(fail)?;
        if entry.is_dir() && !entry.is_empty() {
            return Err(fail(ErrorKind::NotEmpty));
        }
        dir.delete(&base);
        debug!(path, "remove");
        Ok(())
    }

    /// Remove a path and everything below it. Missing paths are not an error.
    pub fn remove_all(&mut self, path: &str) -> OsaResult<()> {
        let Some((parent, base)) = split_parent(path) else {
            return Err(OsaError::path("remove", path, ErrorKind::OperationFailed));
        };
        if let Ok(dir) = self.lookup_dir_mut(&parent) {
            if dir.delete(&base).is_some() {
                debug!(path, "remove -r");
            }
        }
        Ok(())
    }

    pub fn getwd(&self) -> OsaResult<String> {
        Ok(self.layout.work_dir().to_string())
    }

    pub fn user_cache_dir(&self) -> OsaResult<String> {
        Ok(self.layout.cache_dir.clone())
    }

    pub fn user_config_dir(&self) -> OsaResult<String> {
        Ok(self.layout.config_dir.clone())
    }

    pub fn user_home_dir(&self) -> OsaResult<String> {
        Ok(self.layout.home_dir.clone())
    }

    /// Temp root used when [`MemFs::mkdir_temp`] gets no directory.
    pub fn temp_dir(&self) -> &str {
        &self.layout.temp_dir
    }
}
