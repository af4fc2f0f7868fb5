//! # Spill — sorted compressed block files
//!
//! On-disk format for the external merge sort: each spill block is a gzip
//! stream of length-prefixed (key, value) records, written in ascending key
//! order and consumed strictly sequentially.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ gzip stream (compression level 1)                             │
//! │                                                               │
//! │ key_len (u16) | val_len (u16) | key bytes | value bytes       │
//! │                                                               │
//! │ ... repeated for each record ...                              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Integers are written in the **native byte order of the writing host**.
//! There is no magic number, no version field, and no checksum: a block is a
//! private intermediate, produced and consumed by the same process tree on
//! the same machine, and the format trusts its own writer. End of stream is
//! wherever the decompressed bytes run out — a short read in any of the four
//! record fields is a clean end, not an error.
//!
//! Keys and values are opaque byte strings of at most 65 535 bytes each
//! (they must fit a `u16` length). Zero-length keys and values are valid.
//!
//! ## Naming
//!
//! Blocks are named `{stage}_{block:08x}.data` inside the store directory,
//! with [`Stage`] one of `part`, `part2`, `part3`, or `final`. See
//! [`block_path`].
//!
//! ## Merging
//!
//! [`MergeIter`] combines any number of sorted blocks into one sorted
//! stream, deleting each input file as it is exhausted. Ties between equal
//! keys go to the earliest reader, and equal pairs are all preserved — this
//! store never deduplicates.

use std::io;

use thiserror::Error;

mod format;
mod merge;
mod reader;
mod writer;

pub use format::{block_path, Stage, MAX_FIELD_BYTES, RECORD_HEADER_BYTES};
pub use merge::MergeIter;
pub use reader::BlockReader;
pub use writer::BlockWriter;

/// Errors produced by block file operations.
#[derive(Debug, Error)]
pub enum BlockError {
    /// File create/open/read/write/remove failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The gzip codec rejected the stream (corrupt data on read, or a
    /// failure while flushing the compressor on close).
    #[error("gzip stream error: {0}")]
    Compression(#[source] io::Error),

    /// A key or value does not fit the `u16` length prefix.
    #[error("key or value too large: {len} bytes (max {MAX_FIELD_BYTES})")]
    PairTooLarge {
        /// Length of the offending field.
        len: usize,
    },
}

#[cfg(test)]
mod tests;
