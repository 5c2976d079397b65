//! ZIP fixtures for the in-memory filesystem.
//!
//! A test can seed a `MemFs` from an archive and write a subtree back out,
//! e.g. to inspect what the code under test produced.

use std::io::{Read, Seek, Write};

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{ErrorKind, OsaError, OsaResult};
use crate::fs::{dir_name, join, Dir, Entry, MemFs};

impl MemFs {
    /// Load every entry of a ZIP archive below `at`.
    ///
    /// Missing directories are created and existing files are overwritten.
    /// Entries whose names would escape `at` are skipped. Returns the number
    /// of files written.
    pub fn import_zip<R: Read + Seek>(&mut self, reader: R, at: &str) -> OsaResult<usize> {
        let mut archive = ZipArchive::new(reader)?;
        let mut written = 0;

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let Some(relative) = file.enclosed_name() else {
                warn!(name = file.name(), "skipping archive entry outside target");
                continue;
            };
            let relative = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let target = join(at, &relative);

            if file.is_dir() {
                self.mkdir_all(&target, 0o700)?;
                continue;
            }

            let mut content = Vec::new();
            file.read_to_end(&mut content)
                .map_err(|e| OsaError::io("import", &target, e))?;
            self.mkdir_all(&dir_name(&target), 0o700)?;
            self.write_file(&target, &content, 0o600)?;
            written += 1;
        }

        debug!(at, files = written, "imported archive");
        Ok(written)
    }

    /// Write the subtree below `dir` into a ZIP archive.
    ///
    /// Names in the archive are relative to `dir`; empty directories are
    /// kept. Returns the number of files written.
    pub fn export_zip<W: Write + Seek>(&self, dir: &str, writer: W) -> OsaResult<usize> {
        let Entry::Dir(root) = self.entry("export", dir)? else {
            return Err(OsaError::path("export", dir, ErrorKind::NotDirectory));
        };

        let mut zip = ZipWriter::new(writer);
        let written = export_dir(&mut zip, root, "")?;
        zip.finish()?;

        debug!(dir, files = written, "exported archive");
        Ok(written)
    }
}

fn export_dir<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    dir: &Dir,
    prefix: &str,
) -> OsaResult<usize> {
    let mut written = 0;

    for (name, entry) in dir.iter() {
        let path = format!("{}{}", prefix, name);
        match entry {
            Entry::Dir(child) => {
                zip.add_directory(path.as_str(), SimpleFileOptions::default())?;
                written += export_dir(zip, child, &format!("{}/", path))?;
            }
            Entry::File(data) => {
                zip.start_file(path.as_str(), SimpleFileOptions::default())?;
                zip.write_all(data)
                    .map_err(|e| OsaError::io("export", &path, e))?;
                written += 1;
            }
        }
    }
    Ok(written)
}
