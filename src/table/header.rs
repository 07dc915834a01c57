//! Table header codec
//!
//! The header sits at byte 0 of every table file. Layout (little-endian,
//! packed):
//!
//! ```text
//! +--------------+  offset 0
//! | Flag         |  (u8, 0xDB)
//! +--------------+  offset 1
//! | Record Count |  (u32 LE)
//! +--------------+  offset 5
//! | Record Size  |  (u16 LE)
//! +--------------+  offset 7
//! | Table Size   |  (u32 LE)
//! +--------------+  offset 11
//! | Version      |  (32 bytes + NUL terminator)
//! +--------------+  offset 44
//! ```

use std::io::{self, SeekFrom};

use super::errors::{TableError, TableResult};
use crate::crash_point::{maybe_crash, points};
use crate::fs::TableFile;

/// Sentinel marking an initialized table
pub const TABLE_FLAG: u8 = 0b1101_1011;

/// Maximum version length in bytes, excluding the terminator
pub const VERSION_LEN: usize = 32;

/// Encoded header size in bytes
pub const HEADER_SIZE: usize = 1 + 4 + 2 + 4 + VERSION_LEN + 1;

/// In-memory mirror of the on-disk table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub flag: u8,
    pub record_count: u32,
    pub record_size: u16,
    pub table_size: u32,
    version: String,
}

impl TableHeader {
    /// Header for a freshly created, empty table.
    pub fn new(table_size: u32, record_size: u16) -> Self {
        Self {
            flag: TABLE_FLAG,
            record_count: 0,
            record_size,
            table_size,
            version: String::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.flag == TABLE_FLAG
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets the version string. It must fit in [`VERSION_LEN`] bytes and
    /// contain no NUL.
    pub fn set_version(&mut self, version: &str) -> TableResult<()> {
        if version.len() > VERSION_LEN {
            return Err(TableError::invalid_version(format!(
                "Version is {} bytes, at most {} allowed",
                version.len(),
                VERSION_LEN
            )));
        }
        if version.contains('\0') {
            return Err(TableError::invalid_version("Version contains NUL"));
        }
        self.version = version.to_string();
        Ok(())
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.flag;
        buf[1..5].copy_from_slice(&self.record_count.to_le_bytes());
        buf[5..7].copy_from_slice(&self.record_size.to_le_bytes());
        buf[7..11].copy_from_slice(&self.table_size.to_le_bytes());
        // Lossy decoding can widen a version past the field; cut it back
        let version = self.version.as_bytes();
        let len = version.len().min(VERSION_LEN);
        buf[11..11 + len].copy_from_slice(&version[..len]);
        buf
    }

    /// Decodes a header. The flag is not checked here.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Self {
        let field = &buf[11..11 + VERSION_LEN];
        let end = field.iter().position(|&b| b == 0).unwrap_or(VERSION_LEN);
        Self {
            flag: buf[0],
            record_count: u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]),
            record_size: u16::from_le_bytes([buf[5], buf[6]]),
            table_size: u32::from_le_bytes([buf[7], buf[8], buf[9], buf[10]]),
            version: String::from_utf8_lossy(&field[..end]).into_owned(),
        }
    }
}

/// Writes `header` at byte 0 and syncs it.
pub fn write_header<F: TableFile>(file: &mut F, header: &TableHeader) -> io::Result<()> {
    maybe_crash(points::HEADER_BEFORE_WRITE);
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&header.encode())?;
    file.sync()
}

/// Reads the header at byte 0.
///
/// A file shorter than [`HEADER_SIZE`] yields `UnexpectedEof`.
pub fn read_header<F: TableFile>(file: &mut F) -> io::Result<TableHeader> {
    let mut buf = [0u8; HEADER_SIZE];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut buf)?;
    Ok(TableHeader::decode(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, MemFs};
    use std::io::Seek;

    #[test]
    fn test_header_size() {
        assert_eq!(HEADER_SIZE, 44);
    }

    #[test]
    fn test_encode_layout() {
        let mut header = TableHeader::new(1024, 16);
        header.record_count = 3;
        header.set_version("1.2").unwrap();
        let buf = header.encode();

        assert_eq!(buf[0], 0xDB);
        assert_eq!(&buf[1..5], &[3, 0, 0, 0]);
        assert_eq!(&buf[5..7], &[16, 0]);
        assert_eq!(&buf[7..11], &[0x00, 0x04, 0, 0]);
        assert_eq!(&buf[11..14], b"1.2");
        assert!(buf[14..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_full_width_version() {
        let mut header = TableHeader::new(4096, 8);
        let version = "v".repeat(VERSION_LEN);
        header.set_version(&version).unwrap();

        let decoded = TableHeader::decode(&header.encode());
        assert_eq!(decoded.version(), version);
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_version_limits() {
        let mut header = TableHeader::new(4096, 8);
        assert!(header.set_version(&"x".repeat(VERSION_LEN + 1)).is_err());
        assert!(header.set_version("a\0b").is_err());
        assert_eq!(header.version(), "");
    }

    #[test]
    fn test_read_write_header_at_offset_zero() {
        let fs = MemFs::new();
        let mut file = fs.create("t").unwrap();
        let mut header = TableHeader::new(512, 4);
        header.record_count = 9;

        file.seek(SeekFrom::Start(100)).unwrap();
        write_header(&mut file, &header).unwrap();

        assert_eq!(fs.contents("t").unwrap().len(), HEADER_SIZE);
        assert_eq!(read_header(&mut file).unwrap(), header);
    }

    #[test]
    fn test_read_header_short_file() {
        let fs = MemFs::new();
        fs.put("t", vec![TABLE_FLAG, 1, 2]);
        let mut file = fs.open("t").unwrap();

        let err = read_header(&mut file).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
