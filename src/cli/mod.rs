//! Command-line interface for inspecting and editing tables
//!
//! - create: make an empty table
//! - info / dump: inspect header and records
//! - append / insert / update / delete / clear / set-version: edit a table

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliResult};
