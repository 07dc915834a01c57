//! Observable table events

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    TableCreate,
    TableOpen,
    TableClose,
    TableClear,
    /// Leftover rebuild file from an interrupted insert/delete was removed
    StaleRebuildRemoved,
    /// File opened as a table has no valid header
    NotATable,

    // Records
    RecordAppend,
    RecordUpdate,
    /// Operation refused before touching the table
    OperationRejected,

    HeaderWrite,
    VersionSet,

    // Rebuild
    RebuildBegin,
    RebuildSwap,
    RebuildCommit,
    RebuildAbort,
    /// Rebuild committed but the table could not be reopened
    HandleDetached,

    OptionsLoaded,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TableCreate => "TABLE_CREATE",
            Event::TableOpen => "TABLE_OPEN",
            Event::TableClose => "TABLE_CLOSE",
            Event::TableClear => "TABLE_CLEAR",
            Event::StaleRebuildRemoved => "STALE_REBUILD_REMOVED",
            Event::NotATable => "NOT_A_TABLE",
            Event::RecordAppend => "RECORD_APPEND",
            Event::RecordUpdate => "RECORD_UPDATE",
            Event::OperationRejected => "OPERATION_REJECTED",
            Event::HeaderWrite => "HEADER_WRITE",
            Event::VersionSet => "VERSION_SET",
            Event::RebuildBegin => "REBUILD_BEGIN",
            Event::RebuildSwap => "REBUILD_SWAP",
            Event::RebuildCommit => "REBUILD_COMMIT",
            Event::RebuildAbort => "REBUILD_ABORT",
            Event::HandleDetached => "HANDLE_DETACHED",
            Event::OptionsLoaded => "OPTIONS_LOADED",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::NotATable | Event::HandleDetached)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
