//! Fixed-record-size tables
//!
//! A table is one file: a 44-byte header followed by `count` contiguous
//! slots of `record_size` bytes, padded with unused space up to
//! `table_size`. Records are addressed by a dense zero-based ordinal that
//! shifts on insert and delete.
//!
//! # Operations
//!
//! - `append` and `update` write a single slot
//! - `insert` and `delete` rebuild the table into a new file and rename it
//!   over the original
//! - `clear` recreates the file empty with the same dimensions

mod errors;
mod header;
mod rebuild;
mod slot;
mod store;

pub use errors::{Severity, TableError, TableErrorCode, TableResult};
pub use header::{TableHeader, HEADER_SIZE, TABLE_FLAG, VERSION_LEN};
pub use rebuild::RebuildState;
pub use store::{Records, Table};
