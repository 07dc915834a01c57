//! flashtable - fixed-record-size tables on flash-resident filesystems
//!
//! Records of one fixed byte width live in a single file behind a small
//! header and are addressed by ordinal position. There is no schema, index
//! or query layer.
//!
//! ```ignore
//! use flashtable::fs::DirFs;
//! use flashtable::table::Table;
//!
//! let fs = DirFs::new("/flash")?;
//! let mut table = Table::create(fs, "readings.db", 4096, 16)?;
//! table.append(&[0u8; 16])?;
//! table.insert(0, &[1u8; 16])?;
//! assert_eq!(table.count(), 2);
//! ```

pub mod cli;
pub mod config;
pub mod crash_point;
pub mod fs;
pub mod observability;
pub mod table;

pub use config::TableOptions;
pub use table::{Table, TableError, TableErrorCode, TableResult};
