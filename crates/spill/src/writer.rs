use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{NativeEndian, WriteBytesExt};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::{BlockError, MAX_FIELD_BYTES};

/// Streams length-prefixed (key, value) records into a gzip-compressed
/// block file.
///
/// Construction removes any pre-existing file of the same name and creates
/// a fresh one. Compression level 1 is deliberate: spill blocks are written
/// once and read once, so cheap compression wins over ratio.
///
/// Callers own the sort order — the writer appends records as given.
/// [`finish`](BlockWriter::finish) must be called to flush the compressor;
/// a writer dropped without it leaves a truncated file behind, which only
/// happens on abort paths where the whole output directory is already
/// invalid.
pub struct BlockWriter {
    stream: GzEncoder<BufWriter<File>>,
}

impl BlockWriter {
    /// Creates (or replaces) the block file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, BlockError> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            stream: GzEncoder::new(BufWriter::new(file), Compression::new(1)),
        })
    }

    /// Appends one record.
    ///
    /// Rejects keys or values longer than [`MAX_FIELD_BYTES`] with
    /// [`BlockError::PairTooLarge`]; nothing is written in that case.
    pub fn write(&mut self, key: &[u8], value: &[u8]) -> Result<(), BlockError> {
        if key.len() > MAX_FIELD_BYTES {
            return Err(BlockError::PairTooLarge { len: key.len() });
        }
        if value.len() > MAX_FIELD_BYTES {
            return Err(BlockError::PairTooLarge { len: value.len() });
        }

        self.stream.write_u16::<NativeEndian>(key.len() as u16)?;
        self.stream.write_u16::<NativeEndian>(value.len() as u16)?;
        self.stream.write_all(key)?;
        self.stream.write_all(value)?;
        Ok(())
    }

    /// Flushes the compressor and closes the file, surfacing any error.
    pub fn finish(self) -> Result<(), BlockError> {
        let buf = self.stream.finish().map_err(BlockError::Compression)?;
        let file = buf.into_inner().map_err(|e| BlockError::Io(e.into_error()))?;
        drop(file);
        Ok(())
    }
}
