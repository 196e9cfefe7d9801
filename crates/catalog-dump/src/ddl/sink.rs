//! Append-only byte sink that reports how much has been written.

use std::io::{self, Write};

/// Wraps a writer and counts every byte accepted by it.
///
/// The count is the position the next byte will land at, which is what TOC
/// entries record.
#[derive(Debug)]
pub struct ByteCountingWriter<W: Write> {
    inner: W,
    byte_count: u64,
}

impl<W: Write> ByteCountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            byte_count: 0,
        }
    }

    /// Cumulative bytes written so far.
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ByteCountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.byte_count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
