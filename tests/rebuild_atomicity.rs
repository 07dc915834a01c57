//! Rebuild Atomicity Tests
//!
//! Insert and delete write a complete replacement file before renaming it
//! over the table. Failures injected at each filesystem call must leave the
//! original file and the handle's view of it unchanged.

use flashtable::fs::{FileSystem, FsCall, MemFs};
use flashtable::table::{Table, TableErrorCode, HEADER_SIZE};

// =============================================================================
// Test Utilities
// =============================================================================

fn record(tag: u8) -> Vec<u8> {
    vec![tag; 4]
}

fn seeded_table(fs: &MemFs, tags: &[u8]) -> Table<MemFs> {
    let mut table = Table::create(fs.clone(), "t", 128, 4).unwrap();
    for &tag in tags {
        table.append(&record(tag)).unwrap();
    }
    table
}

fn tags(table: &mut Table<MemFs>) -> Vec<u8> {
    table.iter().map(|r| r.unwrap()[0]).collect()
}

/// Runs `op` with `call` failing after `skip` successes and checks that
/// nothing observable changed.
fn assert_untouched_on_failure(
    call: FsCall,
    skip: u32,
    op: impl FnOnce(&mut Table<MemFs>) -> flashtable::TableResult<()>,
) {
    let fs = MemFs::new();
    let mut table = seeded_table(&fs, &[1, 2, 3, 4]);
    let before = fs.contents("t").unwrap();

    fs.fail_after(call, skip);
    let err = op(&mut table).unwrap_err();
    fs.clear_faults();

    assert_eq!(err.code(), TableErrorCode::Io, "{:?} #{}", call, skip);
    assert_eq!(fs.contents("t").unwrap(), before, "{:?} #{}", call, skip);
    assert_eq!(table.count(), 4);
    assert_eq!(tags(&mut table), vec![1, 2, 3, 4]);
    assert!(!fs.exists("t.rebuild"));
}

// =============================================================================
// Failure before commit
// =============================================================================

#[test]
fn test_failed_create_of_rebuild_file() {
    assert_untouched_on_failure(FsCall::Create, 0, |t| t.delete(1));
    assert_untouched_on_failure(FsCall::Create, 0, |t| t.insert(1, &record(9)));
}

#[test]
fn test_failed_copy_at_every_write() {
    // insert writes 4 copied records, the new record and the header
    for skip in 0..6 {
        assert_untouched_on_failure(FsCall::Write, skip, |t| t.insert(2, &record(9)));
    }
    // delete writes 3 copied records and the header
    for skip in 0..4 {
        assert_untouched_on_failure(FsCall::Write, skip, |t| t.delete(0));
    }
}

#[test]
fn test_failed_read_of_original() {
    for skip in 0..4 {
        assert_untouched_on_failure(FsCall::Read, skip, |t| t.insert(0, &record(9)));
    }
}

#[test]
fn test_failed_sync_of_rebuild_header() {
    assert_untouched_on_failure(FsCall::Sync, 0, |t| t.delete(3));
}

#[test]
fn test_failed_rename() {
    assert_untouched_on_failure(FsCall::Rename, 0, |t| t.delete(0));
    assert_untouched_on_failure(FsCall::Rename, 0, |t| t.insert(3, &record(9)));
}

// =============================================================================
// Commit
// =============================================================================

#[test]
fn test_committed_file_is_complete_without_handle() {
    let fs = MemFs::new();
    let mut table = seeded_table(&fs, &[1, 2, 3]);
    table.insert(1, &record(7)).unwrap();
    drop(table);

    let bytes = fs.contents("t").unwrap();
    assert_eq!(bytes.len(), HEADER_SIZE + 4 * 4);
    assert_eq!(&bytes[1..5], &[4, 0, 0, 0]);
    assert_eq!(&bytes[HEADER_SIZE + 4..HEADER_SIZE + 8], &record(7)[..]);
}

#[test]
fn test_reopen_failure_after_swap_keeps_committed_data() {
    let fs = MemFs::new();
    let mut table = seeded_table(&fs, &[1, 2, 3]);

    fs.fail_next(FsCall::Open);
    let err = table.delete(0).unwrap_err();
    assert_eq!(err.code(), TableErrorCode::Io);
    assert!(table.is_detached());
    let committed = fs.contents("t").unwrap();

    // The stale handle must not read the replaced file or write past it
    let mut buf = [0u8; 4];
    for err in [
        table.read(0, &mut buf).unwrap_err(),
        table.append(&record(4)).unwrap_err(),
        table.update(0, &record(5)).unwrap_err(),
        table.set_version("v2").unwrap_err(),
        table.clear().unwrap_err(),
    ] {
        assert_eq!(err.code(), TableErrorCode::Detached);
        assert!(err.is_fatal());
    }
    assert_eq!(fs.contents("t").unwrap(), committed);
    table.close().unwrap();

    let mut reopened = Table::open(fs.clone(), "t").unwrap();
    assert_eq!(tags(&mut reopened), vec![2, 3]);
    reopened.append(&record(4)).unwrap();
    assert_eq!(tags(&mut reopened), vec![2, 3, 4]);
}

#[test]
fn test_interrupted_rebuild_file_is_discarded_on_open() {
    let fs = MemFs::new();
    let table = seeded_table(&fs, &[1, 2]);
    table.close().unwrap();

    // A partial rebuild file as a crash before the swap would leave it
    let mut stale = fs.create("t.rebuild").unwrap();
    std::io::Write::write_all(&mut stale, &[0u8; HEADER_SIZE + 4]).unwrap();
    drop(stale);

    let mut table = Table::open(fs.clone(), "t").unwrap();
    assert!(!fs.exists("t.rebuild"));
    assert_eq!(tags(&mut table), vec![1, 2]);
}

#[test]
fn test_tables_rebuild_independently() {
    let fs = MemFs::new();
    let mut a = Table::create(fs.clone(), "a", 128, 4).unwrap();
    let mut b = Table::create(fs.clone(), "b", 128, 4).unwrap();
    for tag in 1..=3 {
        a.append(&record(tag)).unwrap();
        b.append(&record(tag + 10)).unwrap();
    }

    a.delete(0).unwrap();
    b.insert(0, &record(20)).unwrap();

    assert_eq!(tags(&mut a), vec![2, 3]);
    assert_eq!(tags(&mut b), vec![20, 11, 12, 13]);
    assert_eq!(fs.names(), vec!["a".to_string(), "b".to_string()]);
}
