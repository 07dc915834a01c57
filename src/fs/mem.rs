//! In-memory flash image with failure injection
//!
//! Open handles keep the bytes they were opened on. Renaming or removing a
//! name only changes what later `open` calls see, the same way an unlinked
//! file stays readable through an open descriptor.

use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{FileSystem, TableFile};

/// Filesystem calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCall {
    Create,
    Open,
    Remove,
    Rename,
    Read,
    Write,
    Sync,
}

#[derive(Debug)]
struct Fault {
    call: FsCall,
    /// Matching calls to let through before failing
    skip: u32,
}

#[derive(Debug, Default)]
struct MemState {
    files: BTreeMap<String, Arc<Mutex<Vec<u8>>>>,
    faults: VecDeque<Fault>,
}

/// Shared in-memory filesystem. Clones see the same files.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    state: Arc<Mutex<MemState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `call` fail with an I/O error.
    pub fn fail_next(&self, call: FsCall) {
        self.fail_after(call, 0);
    }

    /// Lets `skip` matching calls succeed, then fails the next one.
    pub fn fail_after(&self, call: FsCall, skip: u32) {
        lock(&self.state).faults.push_back(Fault { call, skip });
    }

    /// Drops all pending faults.
    pub fn clear_faults(&self) {
        lock(&self.state).faults.clear();
    }

    /// Returns a copy of the current bytes stored under `name`.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        let state = lock(&self.state);
        state.files.get(name).map(|data| lock(data).clone())
    }

    /// Replaces the bytes stored under `name`, creating it if needed.
    pub fn put(&self, name: &str, bytes: Vec<u8>) {
        lock(&self.state)
            .files
            .insert(name.to_string(), Arc::new(Mutex::new(bytes)));
    }

    /// Returns all file names in sorted order.
    pub fn names(&self) -> Vec<String> {
        lock(&self.state).files.keys().cloned().collect()
    }

    fn check(&self, call: FsCall) -> io::Result<()> {
        let mut state = lock(&self.state);
        let hit = state.faults.iter_mut().position(|fault| {
            if fault.call != call {
                return false;
            }
            if fault.skip == 0 {
                return true;
            }
            fault.skip -= 1;
            false
        });
        match hit {
            Some(index) => {
                state.faults.remove(index);
                Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("injected {:?} failure", call),
                ))
            }
            None => Ok(()),
        }
    }

    fn not_found(name: &str) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("no such file: {}", name))
    }
}

impl FileSystem for MemFs {
    type File = MemFile;

    fn create(&self, name: &str) -> io::Result<MemFile> {
        self.check(FsCall::Create)?;
        let data = Arc::new(Mutex::new(Vec::new()));
        lock(&self.state)
            .files
            .insert(name.to_string(), Arc::clone(&data));
        Ok(MemFile {
            fs: self.clone(),
            data,
            pos: 0,
        })
    }

    fn open(&self, name: &str) -> io::Result<MemFile> {
        self.check(FsCall::Open)?;
        let data = lock(&self.state)
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| Self::not_found(name))?;
        Ok(MemFile {
            fs: self.clone(),
            data,
            pos: 0,
        })
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        self.check(FsCall::Remove)?;
        lock(&self.state)
            .files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(name))
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        self.check(FsCall::Rename)?;
        let mut state = lock(&self.state);
        let data = state.files.remove(from).ok_or_else(|| Self::not_found(from))?;
        state.files.insert(to.to_string(), data);
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        lock(&self.state).files.contains_key(name)
    }
}

/// Handle to a file in a [`MemFs`].
#[derive(Debug)]
pub struct MemFile {
    fs: MemFs,
    data: Arc<Mutex<Vec<u8>>>,
    pos: u64,
}

impl Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fs.check(FsCall::Read)?;
        let data = lock(&self.data);
        let start = (self.pos as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        drop(data);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.fs.check(FsCall::Write)?;
        let mut data = lock(&self.data);
        let start = self.pos as usize;
        let end = start + buf.len();
        // Writing past the end zero-fills the gap, like a sparse seek
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        drop(data);
        self.pos = end as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for MemFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = lock(&self.data).len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => len + delta,
            SeekFrom::Current(delta) => self.pos as i64 + delta,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl TableFile for MemFile {
    fn sync(&mut self) -> io::Result<()> {
        self.fs.check(FsCall::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_past_end_zero_fills() {
        let fs = MemFs::new();
        let mut file = fs.create("t").unwrap();
        file.seek(SeekFrom::Start(4)).unwrap();
        file.write_all(b"ab").unwrap();

        assert_eq!(fs.contents("t").unwrap(), vec![0, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_read_stops_at_end() {
        let fs = MemFs::new();
        fs.put("t", b"xyz".to_vec());
        let mut file = fs.open("t").unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 3);
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_rename_replaces_and_keeps_open_handles() {
        let fs = MemFs::new();
        fs.put("a", b"old".to_vec());
        fs.put("b", b"new".to_vec());

        let mut old_handle = fs.open("a").unwrap();
        fs.rename("b", "a").unwrap();

        assert!(!fs.exists("b"));
        assert_eq!(fs.contents("a").unwrap(), b"new");

        let mut buf = Vec::new();
        old_handle.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"old");
    }

    #[test]
    fn test_fail_next_fires_once() {
        let fs = MemFs::new();
        fs.fail_next(FsCall::Create);

        assert!(fs.create("t").is_err());
        assert!(fs.create("t").is_ok());
    }

    #[test]
    fn test_fail_after_skips_calls() {
        let fs = MemFs::new();
        let mut file = fs.create("t").unwrap();
        fs.fail_after(FsCall::Write, 2);

        assert!(file.write(b"a").is_ok());
        assert!(file.write(b"b").is_ok());
        assert!(file.write(b"c").is_err());
        assert!(file.write(b"d").is_ok());
    }

    #[test]
    fn test_missing_file_errors() {
        let fs = MemFs::new();
        assert_eq!(fs.open("x").unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(fs.remove("x").unwrap_err().kind(), io::ErrorKind::NotFound);
        assert_eq!(
            fs.rename("x", "y").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
