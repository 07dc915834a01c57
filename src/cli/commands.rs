//! CLI command implementations
//!
//! Every command opens the table, performs one operation and closes it.

use std::io::Write;

use serde::Serialize;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use crate::config::TableOptions;
use crate::fs::DirFs;
use crate::observability::MetricsSnapshot;
use crate::table::{Table, HEADER_SIZE};

/// `info` output
#[derive(Debug, Serialize)]
struct TableInfo<'a> {
    name: &'a str,
    count: u32,
    limit: u32,
    record_size: u16,
    table_size: u32,
    header_size: usize,
    version: &'a str,
    metrics: MetricsSnapshot,
}

/// Parse arguments and run the selected command against stdout.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_command(cli, &mut out)
}

/// Run a parsed command, writing its output to `out`.
pub fn run_command<W: Write>(cli: Cli, out: &mut W) -> CliResult<()> {
    let options = match &cli.config {
        Some(path) => TableOptions::load(path)?,
        None => TableOptions::default(),
    };
    let fs = DirFs::new(&cli.dir).map_err(|source| CliError::Dir {
        path: cli.dir.clone(),
        source,
    })?;

    match cli.command {
        Command::Create {
            name,
            table_size,
            record_size,
        } => {
            let table = Table::create_with(fs, &name, table_size, record_size, options)?;
            writeln!(out, "created {} (limit {})", name, table.limit())?;
            table.close()?;
        }
        Command::Info { name } => {
            let table = Table::open_with(fs, &name, options)?;
            let info = TableInfo {
                name: table.name(),
                count: table.count(),
                limit: table.limit(),
                record_size: table.record_size(),
                table_size: table.table_size(),
                header_size: HEADER_SIZE,
                version: table.version(),
                metrics: table.metrics(),
            };
            let json = serde_json::to_string_pretty(&info)
                .map_err(|e| CliError::Output(e.into()))?;
            writeln!(out, "{}", json)?;
        }
        Command::Dump { name } => {
            let mut table = Table::open_with(fs, &name, options)?;
            for (recno, record) in table.iter().enumerate() {
                writeln!(out, "{}\t{}", recno, hex::encode(record?))?;
            }
        }
        Command::Append { name, record } => {
            let bytes = hex::decode(record.trim())?;
            let mut table = Table::open_with(fs, &name, options)?;
            table.append(&bytes)?;
            writeln!(out, "appended at {}", table.count() - 1)?;
            table.close()?;
        }
        Command::Insert {
            name,
            recno,
            record,
        } => {
            let bytes = hex::decode(record.trim())?;
            let mut table = Table::open_with(fs, &name, options)?;
            table.insert(recno, &bytes)?;
            writeln!(out, "inserted at {}", recno)?;
            table.close()?;
        }
        Command::Update {
            name,
            recno,
            record,
        } => {
            let bytes = hex::decode(record.trim())?;
            let mut table = Table::open_with(fs, &name, options)?;
            table.update(recno, &bytes)?;
            writeln!(out, "updated {}", recno)?;
            table.close()?;
        }
        Command::Delete { name, recno } => {
            let mut table = Table::open_with(fs, &name, options)?;
            table.delete(recno)?;
            writeln!(out, "deleted {}", recno)?;
            table.close()?;
        }
        Command::Clear { name } => {
            let mut table = Table::open_with(fs, &name, options)?;
            table.clear()?;
            writeln!(out, "cleared {}", name)?;
            table.close()?;
        }
        Command::SetVersion { name, version } => {
            let mut table = Table::open_with(fs, &name, options)?;
            table.set_version(&version)?;
            writeln!(out, "version {}", table.version())?;
            table.close()?;
        }
    }

    Ok(())
}
