//! Record store and table lifecycle
//!
//! A [`Table`] exclusively owns the open file handle and the in-memory
//! header mirror for its lifetime. Every range, capacity and size check runs
//! before the file is touched, so a rejected call changes nothing.

use std::io::{self, Seek, SeekFrom, Write};

use super::errors::{TableError, TableResult};
use super::header::{read_header, write_header, TableHeader, HEADER_SIZE};
use super::slot;
use crate::config::TableOptions;
use crate::crash_point::{maybe_crash, points};
use crate::fs::{DirFs, FileSystem, TableFile};
use crate::observability::{log_event_with_fields, Event, Logger, MetricsSnapshot, TableMetrics};

/// A fixed-record-size table stored in one file.
pub struct Table<FS: FileSystem = DirFs> {
    pub(super) fs: FS,
    pub(super) name: String,
    pub(super) file: FS::File,
    pub(super) header: TableHeader,
    pub(super) options: TableOptions,
    pub(super) metrics: TableMetrics,
    /// Set when `file` no longer refers to the file named `name`
    pub(super) detached: bool,
}

impl<FS: FileSystem> Table<FS> {
    /// Creates (or truncates) table `name` with default options.
    pub fn create(fs: FS, name: &str, table_size: u32, record_size: u16) -> TableResult<Self> {
        Self::create_with(fs, name, table_size, record_size, TableOptions::default())
    }

    /// Creates (or truncates) table `name`.
    ///
    /// `table_size` is the total reserved size including the header. It must
    /// be at least [`HEADER_SIZE`], and `record_size` must be non-zero.
    ///
    /// # Errors
    ///
    /// `InvalidShape` for bad dimensions, `Io` if the file cannot be created
    /// or the header cannot be written.
    pub fn create_with(
        fs: FS,
        name: &str,
        table_size: u32,
        record_size: u16,
        options: TableOptions,
    ) -> TableResult<Self> {
        if record_size == 0 {
            return Err(TableError::invalid_shape("record_size must be > 0"));
        }
        if (table_size as usize) < HEADER_SIZE {
            return Err(TableError::invalid_shape(format!(
                "table_size {} is smaller than the {} byte header",
                table_size, HEADER_SIZE
            )));
        }

        let file = fs
            .create(name)
            .map_err(|e| TableError::io(format!("Failed to create table: {}", name), e))?;

        let mut table = Self {
            fs,
            name: name.to_string(),
            file,
            header: TableHeader::new(table_size, record_size),
            options,
            metrics: TableMetrics::new(),
            detached: false,
        };
        table.persist_header()?;

        log_event_with_fields(
            Event::TableCreate,
            &[
                ("table", name),
                ("table_size", &table_size.to_string()),
                ("record_size", &record_size.to_string()),
                ("limit", &table.limit().to_string()),
            ],
        );
        Ok(table)
    }

    /// Opens existing table `name` with default options.
    pub fn open(fs: FS, name: &str) -> TableResult<Self> {
        Self::open_with(fs, name, TableOptions::default())
    }

    /// Opens existing table `name` and loads its header.
    ///
    /// A rebuild file left behind by an interrupted insert or delete is
    /// removed; the table file itself is always the committed state.
    ///
    /// # Errors
    ///
    /// `Io` if the file does not exist or cannot be opened. `NotATable` if
    /// the header is truncated or, with `validate_on_open`, the flag or
    /// dimensions are not those of a table.
    pub fn open_with(fs: FS, name: &str, options: TableOptions) -> TableResult<Self> {
        let mut file = fs
            .open(name)
            .map_err(|e| TableError::io(format!("Failed to open table: {}", name), e))?;

        let header = match read_header(&mut file) {
            Ok(header) => header,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                log_event_with_fields(Event::NotATable, &[("table", name), ("reason", "short")]);
                return Err(TableError::not_a_table(name, "File is shorter than a header"));
            }
            Err(e) => {
                return Err(TableError::io(
                    format!("Failed to read header: {}", name),
                    e,
                ))
            }
        };

        if options.validate_on_open {
            Self::validate_header(name, &header)?;
        }

        let temp_name = options.temp_name(name);
        if fs.exists(&temp_name) {
            match fs.remove(&temp_name) {
                Ok(()) => log_event_with_fields(
                    Event::StaleRebuildRemoved,
                    &[("table", name), ("file", &temp_name)],
                ),
                Err(e) => Logger::warn(
                    "STALE_REBUILD_REMOVE_FAILED",
                    &[("file", &temp_name), ("error", &e.to_string())],
                ),
            }
        }

        let table = Self {
            fs,
            name: name.to_string(),
            file,
            header,
            options,
            metrics: TableMetrics::new(),
            detached: false,
        };
        log_event_with_fields(
            Event::TableOpen,
            &[
                ("table", name),
                ("count", &table.count().to_string()),
                ("limit", &table.limit().to_string()),
            ],
        );
        Ok(table)
    }

    fn validate_header(name: &str, header: &TableHeader) -> TableResult<()> {
        let reason = if !header.is_valid() {
            Some("Header flag is not a table sentinel")
        } else if header.record_size == 0 || (header.table_size as usize) < HEADER_SIZE {
            Some("Header dimensions are invalid")
        } else if header.record_count > slot::limit(header) {
            Some("Header record count exceeds table limit")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                log_event_with_fields(Event::NotATable, &[("table", name), ("reason", reason)]);
                Err(TableError::not_a_table(name, reason))
            }
            None => Ok(()),
        }
    }

    /// Syncs and releases the table file.
    ///
    /// A detached handle is released without syncing.
    pub fn close(mut self) -> TableResult<()> {
        if self.detached {
            return Ok(());
        }
        self.file
            .sync()
            .map_err(|e| TableError::io(format!("Failed to sync table: {}", self.name), e))?;
        log_event_with_fields(Event::TableClose, &[("table", &self.name)]);
        Ok(())
    }

    /// Number of populated records.
    pub fn count(&self) -> u32 {
        self.header.record_count
    }

    /// Maximum number of records the table can hold.
    pub fn limit(&self) -> u32 {
        slot::limit(&self.header)
    }

    pub fn record_size(&self) -> u16 {
        self.header.record_size
    }

    pub fn table_size(&self) -> u32 {
        self.header.table_size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn version(&self) -> &str {
        self.header.version()
    }

    /// Whether a failed reopen after a rebuild left this handle unusable.
    ///
    /// A detached handle refuses every operation with `Detached`; open the
    /// table again to continue.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Sets the informational version string and persists the header.
    pub fn set_version(&mut self, version: &str) -> TableResult<()> {
        self.check_attached()?;
        if let Err(e) = self.header.set_version(version) {
            return Err(self.reject(e));
        }
        self.persist_header()?;
        log_event_with_fields(
            Event::VersionSet,
            &[("table", &self.name), ("version", version)],
        );
        Ok(())
    }

    /// Reads record `recno` into `out`, which must be `record_size` bytes.
    pub fn read(&mut self, recno: u32, out: &mut [u8]) -> TableResult<()> {
        self.check_attached()?;
        self.check_range(recno)?;
        self.check_len(out.len())?;
        read_slot(&mut self.file, &self.header, recno, out).map_err(|e| {
            TableError::io(format!("Failed to read record {}", recno), e)
        })?;
        self.metrics.increment_records_read();
        Ok(())
    }

    /// Reads record `recno` into a new buffer.
    pub fn read_vec(&mut self, recno: u32) -> TableResult<Vec<u8>> {
        let mut buf = vec![0u8; self.header.record_size as usize];
        self.read(recno, &mut buf)?;
        Ok(buf)
    }

    /// Overwrites record `recno` in place. The header is not rewritten.
    pub fn update(&mut self, recno: u32, record: &[u8]) -> TableResult<()> {
        self.check_attached()?;
        self.check_range(recno)?;
        self.check_len(record.len())?;
        self.write_record(recno, record)?;
        Logger::trace(
            Event::RecordUpdate.as_str(),
            &[("table", &self.name), ("recno", &recno.to_string())],
        );
        Ok(())
    }

    /// Adds `record` after the last populated slot.
    pub fn append(&mut self, record: &[u8]) -> TableResult<()> {
        self.check_attached()?;
        self.check_len(record.len())?;
        let limit = self.limit();
        if self.header.record_count >= limit {
            return Err(self.reject(TableError::table_full(limit)));
        }

        let recno = self.header.record_count;
        self.write_record(recno, record)?;
        self.header.record_count += 1;
        if let Err(e) = self.persist_header() {
            self.header.record_count -= 1;
            return Err(e);
        }
        Logger::trace(
            Event::RecordAppend.as_str(),
            &[("table", &self.name), ("recno", &recno.to_string())],
        );
        Ok(())
    }

    /// Discards every record, keeping record size, table size and version.
    ///
    /// The dimensions are taken from the header on disk.
    pub fn clear(&mut self) -> TableResult<()> {
        self.check_attached()?;
        let on_disk = read_header(&mut self.file).map_err(|e| {
            TableError::io(format!("Failed to read header: {}", self.name), e)
        })?;

        self.file = self
            .fs
            .create(&self.name)
            .map_err(|e| TableError::io(format!("Failed to recreate table: {}", self.name), e))?;

        let mut header = on_disk;
        header.flag = super::header::TABLE_FLAG;
        header.record_count = 0;
        self.header = header;
        self.persist_header()?;

        log_event_with_fields(
            Event::TableClear,
            &[("table", &self.name), ("limit", &self.limit().to_string())],
        );
        Ok(())
    }

    /// Iterates over all records in ordinal order.
    pub fn iter(&mut self) -> Records<'_, FS> {
        Records {
            table: self,
            next: 0,
        }
    }

    pub(super) fn check_attached(&self) -> TableResult<()> {
        if self.detached {
            Err(TableError::detached(&self.name))
        } else {
            Ok(())
        }
    }

    pub(super) fn check_range(&self, recno: u32) -> TableResult<()> {
        if slot::in_range(&self.header, recno) {
            Ok(())
        } else {
            Err(self.reject(TableError::out_of_range(recno, self.header.record_count)))
        }
    }

    pub(super) fn check_len(&self, len: usize) -> TableResult<()> {
        if len == self.header.record_size as usize {
            Ok(())
        } else {
            Err(self.reject(TableError::record_size(self.header.record_size, len)))
        }
    }

    /// Counts and logs a refused operation.
    pub(super) fn reject(&self, err: TableError) -> TableError {
        self.metrics.increment_rejected();
        log_event_with_fields(
            Event::OperationRejected,
            &[("table", &self.name), ("code", err.code().code())],
        );
        err
    }

    fn write_record(&mut self, recno: u32, record: &[u8]) -> TableResult<()> {
        let offset = slot::offset(&self.header, recno);
        let result = self
            .file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.file.write_all(record))
            .and_then(|_| {
                if self.options.sync_writes {
                    self.file.sync()
                } else {
                    Ok(())
                }
            });
        result.map_err(|e| TableError::io(format!("Failed to write record {}", recno), e))?;
        maybe_crash(points::RECORD_AFTER_WRITE);
        self.metrics.increment_records_written();
        Ok(())
    }

    pub(super) fn persist_header(&mut self) -> TableResult<()> {
        write_header(&mut self.file, &self.header)
            .map_err(|e| TableError::io(format!("Failed to write header: {}", self.name), e))?;
        self.metrics.increment_header_writes();
        Logger::trace(
            Event::HeaderWrite.as_str(),
            &[
                ("table", &self.name),
                ("count", &self.header.record_count.to_string()),
            ],
        );
        Ok(())
    }
}

/// Reads slot `recno` of `file` into `buf`.
pub(super) fn read_slot<F: TableFile>(
    file: &mut F,
    header: &TableHeader,
    recno: u32,
    buf: &mut [u8],
) -> io::Result<()> {
    file.seek(SeekFrom::Start(slot::offset(header, recno)))?;
    file.read_exact(buf)
}

/// Iterator over a table's records, returned by [`Table::iter`].
pub struct Records<'a, FS: FileSystem> {
    table: &'a mut Table<FS>,
    next: u32,
}

impl<FS: FileSystem> Iterator for Records<'_, FS> {
    type Item = TableResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.table.count() {
            return None;
        }
        let recno = self.next;
        self.next += 1;
        Some(self.table.read_vec(recno))
    }
}
