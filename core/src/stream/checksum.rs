use std::io::{self, Read};

use crate::crypto::{Checksum, ChecksumKind, Hasher};

/// Passes bytes through unchanged while feeding them to a digest.
///
/// The orchestrator drains the wrapped stream to end-of-file and then calls
/// [`ChecksumReader::finalize`]; the digest therefore always covers the
/// post-filter, post-decompression bytes of exactly one stored file.
pub struct ChecksumReader<R> {
    inner: R,
    hasher: Hasher,
}

impl<R: Read> ChecksumReader<R> {
    pub fn new(inner: R, kind: ChecksumKind) -> Self {
        ChecksumReader {
            inner,
            hasher: Hasher::new(kind),
        }
    }

    pub fn finalize(self) -> Checksum {
        self.hasher.finalize()
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}
