//! # Engine — external merge-sort store builder
//!
//! Ties the [`dump`] ingest front-end and the [`spill`] block format into a
//! write-only store builder: an unbounded stream of (key, value) pairs goes
//! in, one sorted `final_00000000.data` file comes out.
//!
//! ## Architecture
//!
//! ```text
//! pg_restore stdout
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                 DumpLoader                    │
//! │                                               │
//! │ read_row() → one data line of the COPY section│
//! │ put(k, v)  → StoreWriter                      │
//! │                 |                             │
//! │                 | batch full (64 MiB)?        │
//! │                 v           yes               │
//! │          spawn sort worker → part_*.data      │
//! │                 |                             │
//! │                 | 16 stage-1 workers?         │
//! │                 v           yes               │
//! │          spawn merge worker → part2_*.data    │
//! │                 |                             │
//! │                 | 16 stage-2 workers?         │
//! │                 v           yes               │
//! │          spawn merge worker → part3_*.data    │
//! │                                               │
//! │ finish() → final merge → final_00000000.data  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Every worker runs on its own OS thread and owns its batch and its output
//! file exclusively; merge workers join their predecessors before touching
//! any file, so no locking is needed anywhere. A worker's failure travels
//! through its `JoinHandle` as a `Result` and is rethrown by the first
//! joiner, ultimately surfacing from [`StoreWriter::finish`] — which is the
//! only success signal. A crash or failure part-way leaves the output
//! directory invalid; rerun from scratch.
//!
//! ## Module responsibilities
//!
//! | Module    | Purpose                                             |
//! |-----------|-----------------------------------------------------|
//! | `lib.rs`  | `DumpLoader` facade: subprocess → rows → store      |
//! | `writer`  | `StoreWriter`: bounded batch, stage lists, `finish` |
//! | `task`    | `Worker`: sort-and-write / join-then-merge threads  |

use std::path::Path;

use anyhow::Result;

use dump::{CopyFilter, LineReader, PipeReader};

mod task;
mod writer;

pub use writer::StoreWriter;

/// In-memory batch byte budget before a spill is forced (64 MiB).
pub const MAX_BLOCK_BYTES: usize = 64 * 1024 * 1024;

/// Number of same-stage workers that triggers the next-stage merge.
pub const STAGE_FAN_IN: usize = 16;

/// Loads one table's dump section into a sorted on-disk store.
///
/// Construction spawns the restore subprocess, locates the table's COPY
/// header, and captures the column names. The caller then bridges the two
/// surfaces: [`read_row`](DumpLoader::read_row) produces raw rows, and
/// [`put`](DumpLoader::put) accepts the (key, value) pairs derived from
/// them. [`finish`](DumpLoader::finish) runs the final merge.
#[derive(Debug)]
pub struct DumpLoader {
    copy: CopyFilter<PipeReader>,
    columns: Vec<String>,
    writer: StoreWriter,
}

impl DumpLoader {
    /// Opens `table` from `dump_file` via `pg_restore -a -t <table>
    /// <dump_file>`. The store is written to a directory named after the
    /// table, relative to the working directory.
    pub fn open(table: &str, dump_file: &str) -> Result<Self> {
        let command = format!("pg_restore -a -t {table} {dump_file}");
        Self::open_with_command(&command, table, Path::new(table))
    }

    /// Opens the COPY section for `table` from the stdout of an arbitrary
    /// shell command, writing the store under `dir`. This is the seam for
    /// non-Postgres restore tools and for tests.
    pub fn open_with_command(command: &str, table: &str, dir: &Path) -> Result<Self> {
        let pipe = PipeReader::spawn(command)?;
        let mut copy = CopyFilter::new(LineReader::new(pipe), table);
        let columns = copy.init()?;
        let writer = StoreWriter::create(dir)?;

        tracing::debug!(table, columns = columns.len(), "COPY section located");

        Ok(Self {
            copy,
            columns,
            writer,
        })
    }

    /// Column names from the table's COPY header, in declaration order.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Reads the next data row into `out`; false once the section ends.
    pub fn read_row(&mut self, out: &mut Vec<u8>) -> Result<bool> {
        Ok(self.copy.read_row(out)?)
    }

    /// Adds one pair to the store.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.writer.put(key, value)
    }

    /// Runs the final merge and closes the store. Success here is the only
    /// guarantee that the output file is complete.
    pub fn finish(self) -> Result<()> {
        self.writer.finish()
    }
}

#[cfg(test)]
mod tests;
