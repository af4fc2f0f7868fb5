use std::io::{self, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::DumpError;

/// Byte source reading the stdout of a restore subprocess.
///
/// The command is run through `sh -c`, matching the restore tool's documented
/// invocation as a single command line. Only stdout is captured; stderr is
/// inherited so diagnostics from the restore tool remain visible.
///
/// Dropping the reader closes our end of the pipe and reaps the child. The
/// child's exit status is deliberately ignored (the `\.` terminator is the
/// data-level end marker), but a failed reap aborts the process: once the
/// child can no longer be accounted for, the data written so far cannot be
/// trusted either.
#[derive(Debug)]
pub struct PipeReader {
    child: Child,
    stdout: Option<ChildStdout>,
    command: String,
}

impl PipeReader {
    /// Spawns `command` via the shell and attaches to its stdout.
    pub fn spawn(command: &str) -> Result<Self, DumpError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| DumpError::PipeOpen {
                command: command.to_string(),
                source,
            })?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                return Err(DumpError::PipeOpen {
                    command: command.to_string(),
                    source: io::Error::new(io::ErrorKind::Other, "child stdout was not captured"),
                })
            }
        };

        Ok(Self {
            child,
            stdout: Some(stdout),
            command: command.to_string(),
        })
    }

    /// The command line this reader was spawned with.
    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Read for PipeReader {
    /// Reads raw bytes from the subprocess pipe. Returns `Ok(0)` at clean
    /// end of stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stdout.as_mut() {
            Some(stdout) => stdout.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        // Close our end first: a child still writing sees a broken pipe and
        // exits instead of blocking forever.
        drop(self.stdout.take());

        if let Err(err) = self.child.wait() {
            eprintln!("ERROR reaping `{}`: {err}", self.command);
            std::process::abort();
        }
    }
}
