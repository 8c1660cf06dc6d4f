//! Newline-delimited message transport over the process's stdio.
//!
//! The orchestrator writes one JSON document per line on stdin and reads our
//! control message from stdout. The reader is kept for the whole invocation
//! so a confirmation that arrived together with the request stays buffered.

use std::io::{BufRead, Read, Write};

use crate::error::TransportError;
use crate::logsink::LogSink;

/// Line reader/writer with a bounded input buffer.
pub struct Transport<'a, R, W> {
    reader: R,
    writer: W,
    max_line_bytes: usize,
    log: &'a LogSink,
}

impl<'a, R: BufRead, W: Write> Transport<'a, R, W> {
    /// `max_line_bytes` is the buffer size including the newline, so the
    /// longest accepted line holds `max_line_bytes - 2` bytes of content.
    pub fn new(reader: R, writer: W, max_line_bytes: usize, log: &'a LogSink) -> Self {
        Self {
            reader,
            writer,
            max_line_bytes,
            log,
        }
    }

    /// Read one line, without its trailing newline.
    ///
    /// A last line ended by EOF instead of a newline is accepted. The line is
    /// logged verbatim before it is returned.
    pub fn read_line(&mut self) -> Result<String, TransportError> {
        let limit = self.max_line_bytes.saturating_sub(1);
        let mut buf = Vec::new();

        let read = self
            .reader
            .by_ref()
            .take(limit as u64)
            .read_until(b'\n', &mut buf)
            .map_err(|source| TransportError::Io {
                stream: "stdin",
                source,
            })?;

        if read == 0 {
            return Err(TransportError::Closed);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
        } else if buf.len() >= limit {
            return Err(TransportError::LineTooLong {
                limit: self.max_line_bytes,
            });
        }

        let line = String::from_utf8(buf).map_err(|_| TransportError::InvalidUtf8)?;
        self.log.log(&line);
        Ok(line)
    }

    /// Write `line` followed by a newline and flush.
    pub fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let io = |source| TransportError::Io {
            stream: "stdout",
            source,
        };
        self.writer.write_all(line.as_bytes()).map_err(io)?;
        self.writer.write_all(b"\n").map_err(io)?;
        self.writer.flush().map_err(io)
    }

    /// Give back the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}
