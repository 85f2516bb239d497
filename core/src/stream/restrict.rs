use std::io::{self, Read};

/// Passes through at most `size` bytes of the underlying reader, then
/// reports end-of-stream regardless of the source state.
///
/// Both block and chunk framing need a hard upper bound because the
/// underlying slice source is shared by everything that follows.
pub struct RestrictedReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> RestrictedReader<R> {
    pub fn new(inner: R, size: u64) -> Self {
        RestrictedReader {
            inner,
            remaining: size,
        }
    }

    /// Bytes left before the cap, not counting what the source may lack.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for RestrictedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let cap = buf.len().min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..cap])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}
