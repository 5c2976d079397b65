//! Virtual filesystem.
//!
//! The filesystem is built from a few small pieces:
//! - `Entry`/`Dir`: the tree nodes and their overwrite rules
//! - `path`: normalization and splitting of absolute paths
//! - `MemFs`: the operation set on top of the tree
//! - `Handle`/`MemHandle`: snapshot handles returned by `open`

mod entry;
mod handle;
mod memory_fs;
mod path;

pub use entry::{Dir, DirEntry, Entry, FileInfo};
pub use handle::{Handle, MemHandle};
pub(crate) use handle::next_page;
pub use memory_fs::MemFs;
pub use path::{base_name, clean, dir_name, join, split, split_parent, SEPARATOR};
