//! K-way merge over sorted block files.
//!
//! Yields (key, value) pairs in nondecreasing unsigned-lexicographic key
//! order. Equal keys are **not** deduplicated; ties are broken by reader
//! position (the earliest reader in the input list wins), which keeps the
//! merged output deterministic for a given input ordering.
//!
//! The fan-in here is small by construction (at most 16 for the staged
//! merges), so the minimum is found by a linear scan over the live readers
//! rather than a heap.

use std::fs;

use crate::{BlockError, BlockReader};

/// Merges sorted [`BlockReader`]s into a single sorted stream, removing
/// each input file from disk as soon as it is exhausted.
pub struct MergeIter {
    /// Live readers, in original input order (the tie-break order).
    readers: Vec<BlockReader>,
    /// Reader yielded by the previous `next_pair`, to be advanced first.
    last: Option<usize>,
}

impl MergeIter {
    /// Builds a merge over `readers`.
    ///
    /// Inputs that are already exhausted (empty block files) are removed
    /// from disk immediately, so the deletion contract holds even for them.
    pub fn new(readers: Vec<BlockReader>) -> Result<Self, BlockError> {
        let mut live = Vec::with_capacity(readers.len());
        for reader in readers {
            if reader.at_end() {
                fs::remove_file(reader.path())?;
            } else {
                live.push(reader);
            }
        }
        Ok(Self {
            readers: live,
            last: None,
        })
    }

    /// Number of inputs still being merged.
    pub fn remaining(&self) -> usize {
        self.readers.len()
    }

    /// Returns the next pair in merge order, or `None` when all inputs are
    /// exhausted (and therefore deleted).
    pub fn next_pair(&mut self) -> Result<Option<(&[u8], &[u8])>, BlockError> {
        // Advance the reader we handed out last time, dropping it (and its
        // file) once it runs dry. `Vec::remove` keeps the remaining readers
        // in input order so the tie-break stays stable.
        if let Some(i) = self.last.take() {
            self.readers[i].advance()?;
            if self.readers[i].at_end() {
                let reader = self.readers.remove(i);
                fs::remove_file(reader.path())?;
            }
        }

        if self.readers.is_empty() {
            return Ok(None);
        }

        let mut min = 0;
        for i in 1..self.readers.len() {
            if self.readers[i].current_key() < self.readers[min].current_key() {
                min = i;
            }
        }

        self.last = Some(min);
        Ok(Some(self.readers[min].current()))
    }
}
