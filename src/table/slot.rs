//! Slot addressing
//!
//! Record `recno` occupies `record_size` bytes starting at
//! `HEADER_SIZE + recno * record_size`.

use super::header::{TableHeader, HEADER_SIZE};

/// Byte offset of slot `recno`.
pub fn offset(header: &TableHeader, recno: u32) -> u64 {
    HEADER_SIZE as u64 + recno as u64 * header.record_size as u64
}

/// Maximum number of records the table can hold.
///
/// Trailing bytes smaller than one record are left unused.
pub fn limit(header: &TableHeader) -> u32 {
    if header.record_size == 0 {
        return 0;
    }
    let region = (header.table_size as u64).saturating_sub(HEADER_SIZE as u64);
    (region / header.record_size as u64) as u32
}

/// Returns whether `recno` names a populated slot.
pub fn in_range(header: &TableHeader, recno: u32) -> bool {
    recno < header.record_count
}
