
use std::path::Path;

use crate::{BlockError, BlockReader, BlockWriter};

/// Helper: write `pairs` to a block file at `path`.
pub(crate) fn write_block(path: &Path, pairs: &[(&[u8], &[u8])]) -> Result<(), BlockError> {
    let mut writer = BlockWriter::create(path)?;
    for &(key, value) in pairs {
        writer.write(key, value)?;
    }
    writer.finish()
}

/// Helper: read every record out of the block file at `path`.
pub(crate) fn read_block(path: &Path) -> Result<Vec<(Vec<u8>, Vec<u8>)>, BlockError> {
    let mut reader = BlockReader::open(path)?;
    let mut pairs = Vec::new();
    while !reader.at_end() {
        let (key, value) = reader.current();
        pairs.push((key.to_vec(), value.to_vec()));
        reader.advance()?;
    }
    Ok(pairs)
}
