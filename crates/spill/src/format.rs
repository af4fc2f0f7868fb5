use std::fmt;
use std::path::{Path, PathBuf};

/// Largest key or value accepted by the record format (u16 length prefix).
pub const MAX_FIELD_BYTES: usize = u16::MAX as usize;

/// Fixed per-record overhead: the two u16 length prefixes.
pub const RECORD_HEADER_BYTES: usize = 4;

/// Merge-tree stage a block belongs to, used as its file-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Stage 1: one sorted block per in-memory batch.
    Part,
    /// Stage 2: merge of 16 stage-1 blocks.
    Part2,
    /// Stage 3: merge of 16 stage-2 blocks.
    Part3,
    /// The single output of the final merge.
    Final,
}

impl Stage {
    pub fn prefix(self) -> &'static str {
        match self {
            Stage::Part => "part",
            Stage::Part2 => "part2",
            Stage::Part3 => "part3",
            Stage::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Path of the block `(stage, block_number)` inside `dir`:
/// `{dir}/{stage}_{block:08x}.data`.
pub fn block_path(dir: &Path, stage: Stage, block: u32) -> PathBuf {
    dir.join(format!("{}_{:08x}.data", stage.prefix(), block))
}
