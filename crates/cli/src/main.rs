///! # pgsift — table dump to sorted store
///!
///! Streams one table's data section out of a PostgreSQL dump and builds a
///! sorted key/value store from it:
///!
///! ```text
///! $ pgsift current_nodes planet.dump
///! ```
///!
///! runs `pg_restore -a -t current_nodes planet.dump`, keys every row by its
///! first column, and leaves `current_nodes/final_00000000.data` behind —
///! a gzip stream of length-prefixed (key, row) records in key order.
///!
///! ## Configuration
///!
///! All settings are controlled via environment variables:
///!
///! ```text
///! PGSIFT_KEY_COLUMN   column to key rows by     (default: first column)
///! PGSIFT_RESTORE_CMD  replacement restore command; its stdout is read
///!                     instead of pg_restore's (default: unset)
///! PGSIFT_LOG          log level                  (default: "info")
///! ```

use anyhow::{bail, Context, Result};
use engine::DumpLoader;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod row;

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    let level: Level = env_or("PGSIFT_LOG", "info")
        .parse()
        .unwrap_or(Level::INFO);
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let restore_cmd = env_or("PGSIFT_RESTORE_CMD", "");

    let (table, dump_file) = match args.as_slice() {
        [_, table, dump_file] => (table.as_str(), dump_file.as_str()),
        [_, table] if !restore_cmd.is_empty() => (table.as_str(), ""),
        _ => bail!("usage: pgsift <table> <dump_file>"),
    };

    let mut loader = if restore_cmd.is_empty() {
        DumpLoader::open(table, dump_file)?
    } else {
        DumpLoader::open_with_command(&restore_cmd, table, Path::new(table))?
    };

    let columns = loader.column_names().to_vec();
    info!(table, ?columns, "COPY section found");

    let key_column = env_or("PGSIFT_KEY_COLUMN", "");
    let key_index = if key_column.is_empty() {
        0
    } else {
        columns
            .iter()
            .position(|c| *c == key_column)
            .with_context(|| format!("table {table} has no column named {key_column:?}"))?
    };

    let mut line = Vec::new();
    let mut rows = 0u64;
    while loader.read_row(&mut line)? {
        let key = row::column(&line, key_index)
            .with_context(|| format!("row {rows} has fewer than {} columns", key_index + 1))?;
        loader.put(key.to_vec(), line.clone())?;
        rows += 1;
    }

    loader.finish()?;
    info!(rows, "store complete");
    println!("{rows} rows sorted into {table}/final_00000000.data");

    Ok(())
}
