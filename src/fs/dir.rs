//! Host directory filesystem

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use super::{FileSystem, TableFile};

impl TableFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// fsync a directory so entries created, renamed or removed in it persist
pub fn fsync_dir(dir: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(dir)?.sync_all()
}

/// Stores each table as a file directly under `root`.
///
/// Every call that changes a directory entry syncs `root` before returning.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    /// Opens the directory at `root`, creating it and its parents if missing.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the host path of table file `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl FileSystem for DirFs {
    type File = File;

    fn create(&self, name: &str) -> io::Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.path_of(name))?;
        fsync_dir(&self.root)?;
        Ok(file)
    }

    fn open(&self, name: &str) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.path_of(name))
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.path_of(name))?;
        fsync_dir(&self.root)
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.path_of(from), self.path_of(to))?;
        fsync_dir(&self.root)
    }

    fn exists(&self, name: &str) -> bool {
        self.path_of(name).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom, Write};
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("flash").join("tables");

        let dir = DirFs::new(&root).unwrap();
        assert!(root.exists());
        assert_eq!(dir.root(), root.as_path());
    }

    #[test]
    fn test_open_missing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dir = DirFs::new(temp_dir.path()).unwrap();

        let err = dir.open("nope").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_create_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let dir = DirFs::new(temp_dir.path()).unwrap();

        {
            let mut file = dir.create("t").unwrap();
            file.write_all(b"hello").unwrap();
        }
        let file = dir.create("t").unwrap();
        assert_eq!(file.metadata().unwrap().len(), 0);
    }

    #[test]
    fn test_rename_replaces_target() {
        let temp_dir = TempDir::new().unwrap();
        let dir = DirFs::new(temp_dir.path()).unwrap();

        dir.create("a").unwrap().write_all(b"old").unwrap();
        dir.create("b").unwrap().write_all(b"new").unwrap();
        dir.rename("b", "a").unwrap();

        assert!(!dir.exists("b"));
        let mut file = dir.open("a").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "new");
    }

    #[test]
    fn test_fsync_dir() {
        let temp_dir = TempDir::new().unwrap();
        fsync_dir(temp_dir.path()).unwrap();

        let err = fsync_dir(&temp_dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_remove_and_rename_report_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let dir = DirFs::new(temp_dir.path()).unwrap();
        dir.create("a").unwrap();

        dir.remove("a").unwrap();
        assert!(!dir.exists("a"));
        assert_eq!(dir.remove("a").unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(
            dir.rename("a", "b").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
