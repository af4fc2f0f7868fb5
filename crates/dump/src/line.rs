use std::io::Read;

use crate::DumpError;

/// Default internal buffer size (1 MiB).
const LINE_BUFFER_BYTES: usize = 1024 * 1024;

/// Splits a byte stream into newline-terminated records.
///
/// The reader owns a fixed buffer that is refilled in full whenever it runs
/// dry: short reads from the source are accumulated until the buffer is full
/// or the source is exhausted. Lines may therefore span any number of
/// refills.
///
/// A trailing unterminated line at end of stream is discarded silently —
/// callers rely on an in-band sentinel, not on EOF, to delimit their data.
#[derive(Debug)]
pub struct LineReader<R> {
    source: R,
    buf: Vec<u8>,
    pos: usize,
    end: usize,
}

impl<R: Read> LineReader<R> {
    /// Wraps `source` with the default 1 MiB buffer.
    pub fn new(source: R) -> Self {
        Self::with_buffer_size(source, LINE_BUFFER_BYTES)
    }

    /// Wraps `source` with a caller-chosen buffer size.
    ///
    /// Useful for tests that want to exercise lines spanning refills.
    pub fn with_buffer_size(source: R, buffer_size: usize) -> Self {
        Self {
            source,
            buf: vec![0; buffer_size],
            pos: 0,
            end: 0,
        }
    }

    /// Reads the next line into `out` (cleared first, newline excluded).
    ///
    /// Returns `false` when the source is exhausted and no terminated line
    /// remains; any partial data read before EOF is dropped.
    pub fn read_line(&mut self, out: &mut Vec<u8>) -> Result<bool, DumpError> {
        out.clear();

        loop {
            if self.pos == self.end {
                if self.refill()? == 0 {
                    return Ok(false);
                }
            }

            let pending = &self.buf[self.pos..self.end];
            match pending.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    out.extend_from_slice(&pending[..i]);
                    self.pos += i + 1;
                    return Ok(true);
                }
                None => {
                    out.extend_from_slice(pending);
                    self.pos = self.end;
                }
            }
        }
    }

    /// Refills the whole buffer, tolerating short reads from the source.
    /// Returns the number of bytes now buffered (0 means EOF).
    fn refill(&mut self) -> Result<usize, DumpError> {
        let mut bytes = 0;
        while bytes < self.buf.len() {
            let n = self
                .source
                .read(&mut self.buf[bytes..])
                .map_err(DumpError::PipeRead)?;
            if n == 0 {
                break;
            }
            bytes += n;
        }
        self.pos = 0;
        self.end = bytes;
        Ok(bytes)
    }
}
