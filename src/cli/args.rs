//! CLI argument definitions using clap
//!
//! Record payloads are given as hex strings of exactly `record_size` bytes.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flashtable - inspect and edit fixed-record-size tables
#[derive(Parser, Debug)]
#[command(name = "flashtable")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the table files
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Path to a JSON table options file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty table, replacing any existing file
    Create {
        name: String,
        /// Total reserved bytes, header included
        #[arg(long)]
        table_size: u32,
        /// Bytes per record
        #[arg(long)]
        record_size: u16,
    },

    /// Print table dimensions and version as JSON
    Info { name: String },

    /// Print every record as hex, one per line
    Dump { name: String },

    /// Append a record
    Append { name: String, record: String },

    /// Insert a record before position `recno`
    Insert {
        name: String,
        recno: u32,
        record: String,
    },

    /// Overwrite the record at `recno`
    Update {
        name: String,
        recno: u32,
        record: String,
    },

    /// Delete the record at `recno`
    Delete { name: String, recno: u32 },

    /// Remove all records, keeping the table dimensions
    Clear { name: String },

    /// Set the informational version string
    SetVersion { name: String, version: String },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
