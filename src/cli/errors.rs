//! CLI error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::table::TableError;

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Invalid record hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Cannot use table directory {}: {source}", path.display())]
    Dir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Table(e) if e.is_fatal() => 3,
            CliError::Table(_) => 2,
            _ => 1,
        }
    }
}
