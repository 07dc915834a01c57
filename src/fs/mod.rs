//! Backing filesystem for tables
//!
//! A table needs named files with byte-range seek/read/write, a durable
//! flush, and whole-file remove and rename. Rename must replace an existing
//! target atomically from the caller's point of view.
//!
//! Two implementations are provided:
//!
//! - [`DirFs`] stores tables as files under a host directory
//! - [`MemFs`] keeps a flash image in memory and can inject failures

mod dir;
mod mem;

pub use dir::{fsync_dir, DirFs};
pub use mem::{FsCall, MemFile, MemFs};

use std::io::{self, Read, Seek, Write};

/// An open table file.
pub trait TableFile: Read + Write + Seek {
    /// Forces written bytes to durable storage.
    fn sync(&mut self) -> io::Result<()>;
}

/// The filesystem a table lives on.
pub trait FileSystem {
    /// Handle type returned by `create` and `open`
    type File: TableFile;

    /// Creates `name`, truncating any existing file, opened read-write.
    fn create(&self, name: &str) -> io::Result<Self::File>;

    /// Opens an existing `name` read-write without truncation.
    fn open(&self, name: &str) -> io::Result<Self::File>;

    /// Removes `name`.
    fn remove(&self, name: &str) -> io::Result<()>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    /// Returns whether `name` exists.
    fn exists(&self, name: &str) -> bool;
}
