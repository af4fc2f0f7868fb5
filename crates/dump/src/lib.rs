//! # Dump — COPY-section ingest
//!
//! Streams the row-per-line data section of a logical database dump for one
//! named table, as emitted on stdout by a restore tool (`pg_restore -a -t
//! <table> <dump_file>`).
//!
//! The stream is consumed in three layers:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ PipeReader    restore subprocess stdout        │
//! │    |                                          │
//! │    v          raw bytes                       │
//! │ LineReader    fixed 1 MiB buffer, \n framing  │
//! │    |                                          │
//! │    v          newline-terminated records      │
//! │ CopyFilter    COPY header + data rows         │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The [`CopyFilter`] scans for the table's section header
//!
//! ```text
//! COPY <table> (col_a, col_b, ...) FROM stdin;
//! ```
//!
//! captures the column names, and then yields data rows one line at a time
//! until the terminator line `\.`. The terminator itself is never delivered;
//! after it, the remaining subprocess output is drained so the restore tool
//! is never left blocked on a full pipe.
//!
//! Rows are opaque byte strings. Nothing in this crate interprets row
//! contents — deriving a (key, value) pair from a row is the caller's job.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dump::{CopyFilter, LineReader, PipeReader};
//!
//! let pipe = PipeReader::spawn("pg_restore -a -t nodes dump.pgdump").unwrap();
//! let mut filter = CopyFilter::new(LineReader::new(pipe), "nodes");
//! let columns = filter.init().unwrap();
//! println!("columns: {columns:?}");
//!
//! let mut row = Vec::new();
//! while filter.read_row(&mut row).unwrap() {
//!     // process one data row
//! }
//! ```

use std::io;

use thiserror::Error;

mod copy;
mod line;
mod pipe;

pub use copy::CopyFilter;
pub use line::LineReader;
pub use pipe::PipeReader;

/// Errors that can occur while ingesting a dump's COPY section.
#[derive(Debug, Error)]
pub enum DumpError {
    /// The restore subprocess could not be spawned.
    #[error("failed to spawn `{command}`: {source}")]
    PipeOpen {
        /// The command line that failed to start.
        command: String,
        /// The underlying spawn error.
        source: io::Error,
    },

    /// Reading from the restore pipe reported an error (distinct from EOF).
    #[error("read from restore pipe failed: {0}")]
    PipeRead(#[source] io::Error),

    /// The stream ended before a `COPY ... FROM stdin;` line was seen.
    #[error("dump ended before a COPY header for the table was found")]
    HeaderMissing,

    /// A line began with `COPY ` but did not match the header grammar
    /// (or named a different table). Carries the offending line.
    #[error("malformed COPY header: {0:?}")]
    HeaderMalformed(String),

    /// The COPY header parsed but listed no columns.
    #[error("COPY header lists no columns")]
    HeaderEmpty,
}
