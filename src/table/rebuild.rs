//! Insert and delete by whole-table rebuild
//!
//! Flash has no cheap byte-shift, so neither operation moves records in
//! place. The corrected table, header included, is written to a rebuild
//! file next to the original and then renamed over it:
//!
//! ```text
//! Idle -> Rebuilding -> Swapping -> Committed
//!             |             |
//!             +-------------+--> Idle (rebuild file removed)
//! ```
//!
//! The original file is not written until the rename replaces it. A failure
//! before or during the rename leaves the original and the in-memory header
//! exactly as they were.

use std::io::{Seek, SeekFrom, Write};

use super::errors::{TableError, TableResult};
use super::header::{write_header, HEADER_SIZE};
use super::store::{read_slot, Table};
use crate::crash_point::{maybe_crash, points};
use crate::fs::FileSystem;
use crate::observability::{log_event_with_fields, Event, Logger};

/// Phase of a rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
    Idle,
    /// Writing the rebuild file; the original is untouched
    Rebuilding,
    /// Renaming the rebuild file over the original
    Swapping,
    Committed,
}

/// The single change a rebuild applies.
#[derive(Debug, Clone, Copy)]
enum Edit<'a> {
    Insert { recno: u32, record: &'a [u8] },
    Delete { recno: u32 },
}

impl Edit<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Edit::Insert { .. } => "insert",
            Edit::Delete { .. } => "delete",
        }
    }

    fn recno(&self) -> u32 {
        match *self {
            Edit::Insert { recno, .. } | Edit::Delete { recno } => recno,
        }
    }
}

/// Tracks one rebuild from start to commit or abort.
struct Rebuild<F> {
    temp_name: String,
    temp: Option<F>,
    state: RebuildState,
}

impl<F> Rebuild<F> {
    fn new(temp_name: String) -> Self {
        Self {
            temp_name,
            temp: None,
            state: RebuildState::Idle,
        }
    }

    fn advance(&mut self, next: RebuildState) {
        debug_assert!(
            matches!(
                (self.state, next),
                (RebuildState::Idle, RebuildState::Rebuilding)
                    | (RebuildState::Rebuilding, RebuildState::Swapping)
                    | (RebuildState::Swapping, RebuildState::Committed)
            ),
            "invalid rebuild transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Drops the rebuild file and returns to `Idle`. Only valid before the
    /// swap has succeeded.
    fn abort<FS: FileSystem<File = F>>(&mut self, fs: &FS) {
        debug_assert_ne!(self.state, RebuildState::Committed);
        self.temp = None;
        if fs.exists(&self.temp_name) {
            if let Err(e) = fs.remove(&self.temp_name) {
                Logger::warn(
                    "REBUILD_CLEANUP_FAILED",
                    &[("file", &self.temp_name), ("error", &e.to_string())],
                );
            }
        }
        self.state = RebuildState::Idle;
    }
}

impl<FS: FileSystem> Table<FS> {
    /// Inserts `record` at `recno`, shifting that record and every later one
    /// up by one.
    ///
    /// On an empty table `recno` must be 0 and the insert is an append.
    /// Otherwise `recno` must name an existing record.
    ///
    /// # Errors
    ///
    /// `TableFull` when `count() == limit()`, `OutOfRange` for a bad `recno`,
    /// `RecordSize` for a wrong-length record, `Io` if the rebuild fails.
    /// If the rebuild commits but the table cannot be reopened, the call
    /// returns `Io` and the handle is detached.
    pub fn insert(&mut self, recno: u32, record: &[u8]) -> TableResult<()> {
        self.check_attached()?;
        self.check_len(record.len())?;
        let limit = self.limit();
        if self.header.record_count >= limit {
            return Err(self.reject(TableError::table_full(limit)));
        }
        if self.header.record_count == 0 && recno == 0 {
            return self.append(record);
        }
        self.check_range(recno)?;

        self.rebuild(Edit::Insert { recno, record })
    }

    /// Deletes the record at `recno`, shifting every later record down by
    /// one.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `recno >= count()`, `Io` if the rebuild fails.
    pub fn delete(&mut self, recno: u32) -> TableResult<()> {
        self.check_attached()?;
        self.check_range(recno)?;
        self.rebuild(Edit::Delete { recno })
    }

    fn rebuild(&mut self, edit: Edit<'_>) -> TableResult<()> {
        let old_count = self.header.record_count;
        let new_count = match edit {
            Edit::Insert { .. } => old_count + 1,
            Edit::Delete { .. } => old_count - 1,
        };

        let mut rebuild = Rebuild::new(self.options.temp_name(&self.name));
        log_event_with_fields(
            Event::RebuildBegin,
            &[
                ("table", &self.name),
                ("op", edit.kind()),
                ("recno", &edit.recno().to_string()),
                ("count", &old_count.to_string()),
            ],
        );

        rebuild.advance(RebuildState::Rebuilding);
        if let Err(e) = self.write_rebuild_file(&mut rebuild, edit, new_count) {
            return Err(self.abort_rebuild(&mut rebuild, e));
        }
        maybe_crash(points::REBUILD_AFTER_COPY);

        rebuild.advance(RebuildState::Swapping);
        // Close the rebuild file before it replaces the table
        rebuild.temp = None;
        maybe_crash(points::REBUILD_BEFORE_SWAP);
        if let Err(e) = self.fs.rename(&rebuild.temp_name, &self.name) {
            let err = TableError::io(
                format!("Failed to swap rebuilt table into place: {}", self.name),
                e,
            );
            return Err(self.abort_rebuild(&mut rebuild, err));
        }
        maybe_crash(points::REBUILD_AFTER_SWAP);
        log_event_with_fields(Event::RebuildSwap, &[("table", &self.name)]);

        // The swapped-in file already holds the new count
        rebuild.advance(RebuildState::Committed);
        self.header.record_count = new_count;
        self.metrics.increment_rebuilds_committed();

        // The old handle now points at the replaced file
        self.file = match self.fs.open(&self.name) {
            Ok(file) => file,
            Err(e) => {
                self.detached = true;
                log_event_with_fields(
                    Event::HandleDetached,
                    &[("table", &self.name), ("error", &e.to_string())],
                );
                return Err(TableError::io(
                    format!("Failed to reopen rebuilt table: {}", self.name),
                    e,
                ));
            }
        };
        self.persist_header()?;

        log_event_with_fields(
            Event::RebuildCommit,
            &[
                ("table", &self.name),
                ("op", edit.kind()),
                ("count", &new_count.to_string()),
            ],
        );
        Ok(())
    }

    /// Writes the edited record sequence and final header into the rebuild
    /// file. Only the rebuild file is written.
    fn write_rebuild_file(
        &mut self,
        rebuild: &mut Rebuild<FS::File>,
        edit: Edit<'_>,
        new_count: u32,
    ) -> TableResult<()> {
        let temp_name = rebuild.temp_name.clone();
        let io_err = |what: &str, e| TableError::io(format!("{}: {}", what, temp_name), e);

        let temp = rebuild.temp.insert(
            self.fs
                .create(&temp_name)
                .map_err(|e| io_err("Failed to create rebuild file", e))?,
        );
        temp.seek(SeekFrom::Start(HEADER_SIZE as u64))
            .map_err(|e| io_err("Failed to seek rebuild file", e))?;

        let mut buf = vec![0u8; self.header.record_size as usize];
        for i in 0..self.header.record_count {
            match edit {
                Edit::Insert { recno, record } if recno == i => {
                    temp.write_all(record)
                        .map_err(|e| io_err("Failed to write rebuild file", e))?;
                    self.metrics.increment_records_written();
                }
                Edit::Delete { recno } if recno == i => continue,
                _ => {}
            }
            read_slot(&mut self.file, &self.header, i, &mut buf).map_err(|e| {
                TableError::io(format!("Failed to read record {} of {}", i, self.name), e)
            })?;
            temp.write_all(&buf)
                .map_err(|e| io_err("Failed to write rebuild file", e))?;
            self.metrics.increment_records_read();
            self.metrics.increment_records_written();
        }

        let mut header = self.header.clone();
        header.record_count = new_count;
        write_header(temp, &header).map_err(|e| io_err("Failed to write rebuild header", e))?;
        Ok(())
    }

    fn abort_rebuild(&mut self, rebuild: &mut Rebuild<FS::File>, err: TableError) -> TableError {
        rebuild.abort(&self.fs);
        self.metrics.increment_rebuilds_aborted();
        Logger::error(
            Event::RebuildAbort.as_str(),
            &[("table", &self.name), ("error", &err.to_string())],
        );
        err
    }
}
