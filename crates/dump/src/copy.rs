use std::io::Read;

use crate::{DumpError, LineReader};

const COPY_PREFIX: &[u8] = b"COPY ";
const END_OF_DATA: &[u8] = b"\\.";

/// Extracts one table's COPY section from a stream of dump lines.
///
/// Two phases:
///
/// 1. [`init`](CopyFilter::init) skips lines until one starting with `COPY `
///    appears, parses it as a header for the expected table, and returns the
///    column names.
/// 2. [`read_row`](CopyFilter::read_row) yields data lines until the `\.`
///    terminator. The terminator is consumed, not delivered, and everything
///    after it is drained without being yielded.
#[derive(Debug)]
pub struct CopyFilter<R> {
    lines: LineReader<R>,
    table: String,
    in_copy: bool,
}

impl<R: Read> CopyFilter<R> {
    pub fn new(lines: LineReader<R>, table: &str) -> Self {
        Self {
            lines,
            table: table.to_string(),
            in_copy: false,
        }
    }

    /// Scans for the table's COPY header and returns its column names.
    ///
    /// # Errors
    ///
    /// - [`DumpError::HeaderMissing`] if the stream ends first.
    /// - [`DumpError::HeaderMalformed`] if a `COPY `-prefixed line fails the
    ///   grammar or names a different table.
    /// - [`DumpError::HeaderEmpty`] if the column list is empty.
    pub fn init(&mut self) -> Result<Vec<String>, DumpError> {
        let mut line = Vec::new();

        loop {
            if !self.lines.read_line(&mut line)? {
                return Err(DumpError::HeaderMissing);
            }
            if !line.starts_with(COPY_PREFIX) {
                continue;
            }

            let text = std::str::from_utf8(&line)
                .map_err(|_| DumpError::HeaderMalformed(String::from_utf8_lossy(&line).into_owned()))?;
            let columns = parse_copy_header(text, &self.table)
                .ok_or_else(|| DumpError::HeaderMalformed(text.to_string()))?;
            if columns.is_empty() {
                return Err(DumpError::HeaderEmpty);
            }

            self.in_copy = true;
            return Ok(columns);
        }
    }

    /// Reads the next data row into `out`.
    ///
    /// Returns `false` once the section has ended — either at the `\.`
    /// terminator or at end of stream (a missing terminator is not an
    /// error). After the terminator, remaining input is consumed and
    /// discarded so the producing subprocess can run to completion.
    pub fn read_row(&mut self, out: &mut Vec<u8>) -> Result<bool, DumpError> {
        loop {
            if !self.lines.read_line(out)? {
                return Ok(false);
            }
            if !self.in_copy {
                continue;
            }
            if out.as_slice() == END_OF_DATA {
                self.in_copy = false;
                continue;
            }
            return Ok(true);
        }
    }
}

/// Parses `COPY <table> ( <ident> (, <ident>)* ) FROM stdin;`.
///
/// `<ident>` is either unquoted (`[A-Za-z][A-Za-z0-9_]*`) or double-quoted
/// (any characters except `"` and `\`). Whitespace between tokens is
/// insignificant and trailing bytes after `stdin;` are ignored.
///
/// An empty parenthesized list parses successfully to zero columns; the
/// caller decides whether that is an error. Returns `None` when the line
/// does not match the grammar or `table` is not the named table.
fn parse_copy_header(line: &str, table: &str) -> Option<Vec<String>> {
    let rest = line.strip_prefix("COPY")?.trim_start();
    let rest = rest.strip_prefix(table)?.trim_start();
    let mut rest = rest.strip_prefix('(')?.trim_start();

    let mut columns = Vec::new();
    if let Some(after) = rest.strip_prefix(')') {
        rest = after;
    } else {
        loop {
            let (ident, after) = parse_ident(rest)?;
            columns.push(ident);
            rest = after.trim_start();
            if let Some(after) = rest.strip_prefix(',') {
                rest = after.trim_start();
                continue;
            }
            rest = rest.strip_prefix(')')?;
            break;
        }
    }

    let rest = rest.trim_start().strip_prefix("FROM")?;
    rest.trim_start().strip_prefix("stdin;")?;
    Some(columns)
}

/// Parses one identifier off the front of `s`, returning it and the rest.
fn parse_ident(s: &str) -> Option<(String, &str)> {
    if let Some(quoted) = s.strip_prefix('"') {
        let end = quoted.find(|c| c == '"' || c == '\\')?;
        if !quoted[end..].starts_with('"') {
            return None;
        }
        return Some((quoted[..end].to_string(), &quoted[end + 1..]));
    }

    if !s.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = s
        .char_indices()
        .skip(1)
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Some((s[..end].to_string(), &s[end..]))
}
