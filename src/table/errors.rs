//! Table error types
//!
//! Error codes:
//! - FLASHTABLE_IO_ERROR (ERROR severity)
//! - FLASHTABLE_OUT_OF_RANGE (ERROR severity)
//! - FLASHTABLE_TABLE_FULL (ERROR severity)
//! - FLASHTABLE_NOT_A_TABLE (FATAL severity)
//! - FLASHTABLE_INVALID_SHAPE (ERROR severity)
//! - FLASHTABLE_RECORD_SIZE_MISMATCH (ERROR severity)
//! - FLASHTABLE_INVALID_VERSION (ERROR severity)
//! - FLASHTABLE_CONFIG_ERROR (ERROR severity)
//! - FLASHTABLE_HANDLE_DETACHED (FATAL severity)
//!
//! Every rejection other than `Io` is raised before the table is touched.

use std::fmt;
use std::io;

/// Severity levels for table errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, table stays usable
    Error,
    /// Table cannot be used through this handle
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Table error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableErrorCode {
    /// Underlying filesystem call failed
    Io,
    /// Record number outside `[0, count)`
    OutOfRange,
    /// Append or insert would exceed the table limit
    TableFull,
    /// File has no valid table header
    NotATable,
    /// Requested dimensions cannot describe a table
    InvalidShape,
    /// Record buffer length differs from the table record size
    RecordSize,
    /// Version string does not fit the header field
    InvalidVersion,
    /// Options file unreadable or invalid
    Config,
    /// Handle no longer refers to the file under the table's name
    Detached,
}

impl TableErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            TableErrorCode::Io => "FLASHTABLE_IO_ERROR",
            TableErrorCode::OutOfRange => "FLASHTABLE_OUT_OF_RANGE",
            TableErrorCode::TableFull => "FLASHTABLE_TABLE_FULL",
            TableErrorCode::NotATable => "FLASHTABLE_NOT_A_TABLE",
            TableErrorCode::InvalidShape => "FLASHTABLE_INVALID_SHAPE",
            TableErrorCode::RecordSize => "FLASHTABLE_RECORD_SIZE_MISMATCH",
            TableErrorCode::InvalidVersion => "FLASHTABLE_INVALID_VERSION",
            TableErrorCode::Config => "FLASHTABLE_CONFIG_ERROR",
            TableErrorCode::Detached => "FLASHTABLE_HANDLE_DETACHED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            TableErrorCode::NotATable | TableErrorCode::Detached => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for TableErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Table error with context
#[derive(Debug)]
pub struct TableError {
    code: TableErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl TableError {
    fn new(code: TableErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a filesystem failure error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(TableErrorCode::Io, message)
        }
    }

    /// Create an out-of-range error for `recno` against the current count
    pub fn out_of_range(recno: u32, count: u32) -> Self {
        Self {
            details: Some(format!("recno: {}, count: {}", recno, count)),
            ..Self::new(TableErrorCode::OutOfRange, "Record number out of range")
        }
    }

    /// Create a table full error
    pub fn table_full(limit: u32) -> Self {
        Self {
            details: Some(format!("limit: {}", limit)),
            ..Self::new(TableErrorCode::TableFull, "Table is full")
        }
    }

    /// Create a not-a-table error
    pub fn not_a_table(name: &str, reason: impl Into<String>) -> Self {
        Self {
            details: Some(format!("table: {}", name)),
            ..Self::new(TableErrorCode::NotATable, reason)
        }
    }

    /// Create an invalid shape error
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::new(TableErrorCode::InvalidShape, reason)
    }

    /// Create a record size mismatch error
    pub fn record_size(expected: u16, actual: usize) -> Self {
        Self {
            details: Some(format!("expected: {}, actual: {}", expected, actual)),
            ..Self::new(
                TableErrorCode::RecordSize,
                "Record buffer does not match table record size",
            )
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(reason: impl Into<String>) -> Self {
        Self::new(TableErrorCode::InvalidVersion, reason)
    }

    /// Create a detached-handle error
    pub fn detached(name: &str) -> Self {
        Self {
            details: Some(format!("table: {}", name)),
            ..Self::new(
                TableErrorCode::Detached,
                "Table handle was not reattached after a rebuild; reopen the table",
            )
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(TableErrorCode::Config, message)
    }

    /// Create a configuration error caused by an I/O failure
    pub fn config_io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(TableErrorCode::Config, message)
        }
    }

    /// Returns the error code
    pub fn code(&self) -> TableErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error makes the table unusable
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
