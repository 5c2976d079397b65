//! Entry model - the nodes of the in-memory tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Name, kind and size of an entry, as reported by stat and directory listings.
///
/// Directories always report a size of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

impl FileInfo {
    pub(crate) fn new(name: impl Into<String>, entry: &Entry) -> Self {
        Self {
            name: name.into(),
            is_dir: entry.is_dir(),
            size: entry.size(),
        }
    }
}

/// A directory listing element.
pub type DirEntry = FileInfo;

/// A node in the tree: either a directory or a file.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Dir(Dir),
    File(Vec<u8>),
}

impl Entry {
    pub fn file(data: impl Into<Vec<u8>>) -> Self {
        Entry::File(data.into())
    }

    pub fn dir() -> Self {
        Entry::Dir(Dir::default())
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Entry::Dir(_))
    }

    pub fn size(&self) -> u64 {
        match self {
            Entry::Dir(_) => 0,
            Entry::File(data) => data.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Entry::Dir(dir) => dir.is_empty(),
            Entry::File(data) => data.is_empty(),
        }
    }
}

/// Directory contents, keyed by child name.
///
/// Children are kept ordered so listings come out sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dir {
    children: BTreeMap<String, Entry>,
}

impl Dir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Entry, ErrorKind> {
        self.children.get(name).ok_or(ErrorKind::NotExist)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Entry, ErrorKind> {
        self.children.get_mut(name).ok_or(ErrorKind::NotExist)
    }

    /// Insert a new child. Fails if the name is taken.
    pub fn add(&mut self, name: &str, entry: Entry) -> Result<(), ErrorKind> {
        if self.has(name) {
            return Err(ErrorKind::Exists);
        }
        self.children.insert(name.to_owned(), entry);
        Ok(())
    }

    /// Check whether `entry` may replace the child called `name`.
    ///
    /// The kind of an existing child cannot change, and a non-empty
    /// directory is never replaced.
    pub fn check_update(&self, name: &str, entry: &Entry) -> Result<(), ErrorKind> {
        let Some(existing) = self.children.get(name) else {
            return Ok(());
        };
        match (entry.is_dir(), existing.is_dir()) {
            (true, false) => Err(ErrorKind::NotDirectory),
            (false, true) => Err(ErrorKind::NotFile),
            (true, true) if !existing.is_empty() => Err(ErrorKind::NotEmpty),
            _ => Ok(()),
        }
    }

    /// Insert or replace a child, subject to [`Dir::check_update`].
    pub fn update(&mut self, name: &str, entry: Entry) -> Result<(), ErrorKind> {
        self.check_update(name, &entry)?;
        self.children.insert(name.to_owned(), entry);
        Ok(())
    }

    /// Remove a child, returning it. Absent names are a no-op.
    pub fn delete(&mut self, name: &str) -> Option<Entry> {
        self.children.remove(name)
    }

    /// Listing sorted by name.
    pub fn list(&self) -> Vec<DirEntry> {
        self.children
            .iter()
            .map(|(name, entry)| FileInfo::new(name.as_str(), entry))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.children.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}
