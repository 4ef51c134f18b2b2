//! Bounded newline-delimited reader for client input.
//!
//! Unlike a plain `read_line`, an overlong line never grows the buffer past
//! the configured limit: the excess is discarded up to the next newline and
//! reported as [`Inbound::TooLong`] so the connection can stay open.
//!
//! `next_line` is cancel-safe: partial input stays buffered across calls,
//! so it can be used as a `tokio::select!` branch.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// One unit of client input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete line without its terminator (`\n` or `\r\n`).
    Line(String),

    /// A line longer than the limit; its content was discarded.
    TooLong,
}

/// Reads newline-delimited UTF-8 lines with a per-line byte limit.
pub struct LineReader<R> {
    inner: BufReader<R>,
    max_line_length: usize,
    buf: Vec<u8>,
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, max_line_length: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_line_length,
            buf: Vec::new(),
            discarding: false,
        }
    }

    /// Reads the next line.
    ///
    /// Returns `Ok(None)` at end of input. An unterminated final line is
    /// returned as a line before that. Bytes that are not valid UTF-8 are
    /// replaced with U+FFFD.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying reader.
    pub async fn next_line(&mut self) -> io::Result<Option<Inbound>> {
        if self.discarding {
            self.discard_rest().await?;
            self.discarding = false;
            return Ok(Some(Inbound::TooLong));
        }

        // One byte past the limit is enough to tell "too long" from "at limit".
        let budget = self
            .max_line_length
            .saturating_add(2)
            .saturating_sub(self.buf.len()) as u64;
        let read = (&mut self.inner)
            .take(budget)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if self.buf.last() == Some(&b'\n') {
            let line = std::mem::take(&mut self.buf);
            return Ok(Some(self.finish(line)));
        }

        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.len() > self.max_line_length.saturating_add(1) {
            self.buf.clear();
            self.discarding = true;
            self.discard_rest().await?;
            self.discarding = false;
            return Ok(Some(Inbound::TooLong));
        }

        // End of input in the middle of a line.
        let line = std::mem::take(&mut self.buf);
        Ok(Some(self.finish(line)))
    }

    /// Skips input up to and including the next newline, or to end of input.
    async fn discard_rest(&mut self) -> io::Result<()> {
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.inner.consume(pos + 1);
                    return Ok(());
                }
                None => {
                    let len = available.len();
                    self.inner.consume(len);
                }
            }
        }
    }

    fn finish(&self, mut line: Vec<u8>) -> Inbound {
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        if line.len() > self.max_line_length {
            return Inbound::TooLong;
        }

        Inbound::Line(String::from_utf8_lossy(&line).into_owned())
    }
}
