use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use byteorder::{NativeEndian, ReadBytesExt};
use flate2::read::GzDecoder;

use crate::BlockError;

/// Streams records out of a compressed block file, one at a time.
///
/// After [`open`](BlockReader::open) the reader is positioned on the first
/// record: `current()` returns it and `at_end()` is false iff the file held
/// any records at all. [`advance`](BlockReader::advance) moves to the next
/// record; a short read in any field flags the end of the stream, after
/// which `current()` is unspecified.
pub struct BlockReader {
    path: PathBuf,
    stream: GzDecoder<BufReader<File>>,
    key: Vec<u8>,
    value: Vec<u8>,
    at_end: bool,
}

impl BlockReader {
    /// Opens `path` and reads the first record.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BlockError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let mut reader = Self {
            path,
            stream: GzDecoder::new(BufReader::new(file)),
            key: Vec::new(),
            value: Vec::new(),
            at_end: false,
        };
        reader.advance()?;
        Ok(reader)
    }

    /// The record the reader is positioned on. Unspecified once `at_end()`.
    pub fn current(&self) -> (&[u8], &[u8]) {
        (&self.key, &self.value)
    }

    /// Key of the current record. Unspecified once `at_end()`.
    pub fn current_key(&self) -> &[u8] {
        &self.key
    }

    pub fn at_end(&self) -> bool {
        self.at_end
    }

    /// Path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the next record: two u16 lengths, then the two byte strings.
    ///
    /// A short read anywhere marks the end of the stream and is not an
    /// error — the format carries no record count, so running out of bytes
    /// *is* the end marker.
    pub fn advance(&mut self) -> Result<(), BlockError> {
        let key_len = match self.stream.read_u16::<NativeEndian>() {
            Ok(n) => n as usize,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.at_end = true;
                return Ok(());
            }
            Err(e) => return Err(read_error(e)),
        };
        let val_len = match self.stream.read_u16::<NativeEndian>() {
            Ok(n) => n as usize,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.at_end = true;
                return Ok(());
            }
            Err(e) => return Err(read_error(e)),
        };

        self.key.resize(key_len, 0);
        match self.stream.read_exact(&mut self.key) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.at_end = true;
                return Ok(());
            }
            Err(e) => return Err(read_error(e)),
        }

        self.value.resize(val_len, 0);
        match self.stream.read_exact(&mut self.value) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.at_end = true;
                return Ok(());
            }
            Err(e) => return Err(read_error(e)),
        }

        Ok(())
    }
}

/// Corrupt gzip data surfaces from the decoder as `InvalidData`; everything
/// else is a plain I/O failure.
fn read_error(e: io::Error) -> BlockError {
    if e.kind() == io::ErrorKind::InvalidData {
        BlockError::Compression(e)
    } else {
        BlockError::Io(e)
    }
}
