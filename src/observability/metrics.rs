//! Per-table operation counters
//!
//! Counters only, monotonic, reset when the table handle is created.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct TableMetrics {
    records_read: AtomicU64,
    records_written: AtomicU64,
    header_writes: AtomicU64,
    rebuilds_committed: AtomicU64,
    rebuilds_aborted: AtomicU64,
    rejected: AtomicU64,
}

impl TableMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_records_read(&self) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_records_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_header_writes(&self) {
        self.header_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rebuilds_committed(&self) {
        self.rebuilds_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rebuilds_aborted(&self) {
        self.rebuilds_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_read: self.records_read.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            header_writes: self.header_writes.load(Ordering::Relaxed),
            rebuilds_committed: self.rebuilds_committed.load(Ordering::Relaxed),
            rebuilds_aborted: self.rebuilds_aborted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`TableMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_read: u64,
    pub records_written: u64,
    pub header_writes: u64,
    pub rebuilds_committed: u64,
    pub rebuilds_aborted: u64,
    pub rejected: u64,
}
