//! Reader for the two framed metadata blocks (setup header stream and file
//! location stream).
//!
//! Layout: a CRC-32 over the small block header, the header itself (stored
//! size + compression flag, or compressed/uncompressed sizes before 4.0.9),
//! then a sequence of 4096-byte frames, each preceded by its own CRC-32. The
//! last frame may be short. A Stored/Zlib/LZMA1 layer sits on top of the
//! reassembled frames depending on version and flag.

use std::io::{self, Read, Seek};

use byteorder::{LE, ReadBytesExt};
use flate2::read::ZlibDecoder;
use log::debug;

use crate::error::{InnoError, Result};
use crate::stream::lzma::lzma1_decoder;
use crate::stream::restrict::RestrictedReader;
use crate::version::{InnoVersion, inno_version};

const FRAME_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockCompression {
    Stored,
    Zlib,
    Lzma1,
}

/// Reassembles frame payloads, verifying each frame CRC before any of its
/// bytes are handed out.
struct FrameReader<R> {
    inner: R,
    buffer: [u8; FRAME_SIZE],
    pos: usize,
    length: usize,
}

impl<R: Read> FrameReader<R> {
    fn new(inner: R) -> Self {
        FrameReader {
            inner,
            buffer: [0; FRAME_SIZE],
            pos: 0,
            length: 0,
        }
    }

    /// Loads the next frame. `Ok(false)` on a clean end of the block.
    fn read_frame(&mut self) -> io::Result<bool> {
        let mut crc_bytes = [0u8; 4];
        let mut filled = 0usize;
        while filled < 4 {
            let n = self.inner.read(&mut crc_bytes[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(false);
                }
                return Err(InnoError::Truncated.into_io());
            }
            filled += n;
        }
        let expected = u32::from_le_bytes(crc_bytes);

        self.length = 0;
        loop {
            let n = self.inner.read(&mut self.buffer[self.length..])?;
            if n == 0 {
                break;
            }
            self.length += n;
            if self.length == FRAME_SIZE {
                break;
            }
        }
        if self.length == 0 {
            return Err(InnoError::Truncated.into_io());
        }

        if crc32fast::hash(&self.buffer[..self.length]) != expected {
            return Err(InnoError::BlockChecksum.into_io());
        }

        self.pos = 0;
        Ok(true)
    }
}

impl<R: Read> Read for FrameReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0usize;
        while written < buf.len() {
            if self.pos == self.length && !self.read_frame()? {
                break;
            }
            let n = (buf.len() - written).min(self.length - self.pos);
            buf[written..written + n].copy_from_slice(&self.buffer[self.pos..self.pos + n]);
            self.pos += n;
            written += n;
        }
        Ok(written)
    }
}

/// One decoded metadata block. Reports where the block ends in the base
/// stream so the caller can seek to the next one without draining this one.
pub struct BlockReader<'a> {
    reader: Box<dyn Read + 'a>,
    end_offset: u64,
}

impl<'a> BlockReader<'a> {
    pub fn open<R: Read + Seek>(base: &'a mut R, version: &InnoVersion) -> Result<Self> {
        let expected_crc = base.read_u32::<LE>().map_err(InnoError::from_read)?;
        let mut crc = crc32fast::Hasher::new();

        let (stored_size, compression) = if *version >= inno_version(4, 0, 9, 0) {
            let stored_size = base.read_u32::<LE>().map_err(InnoError::from_read)?;
            let compressed = base.read_u8().map_err(InnoError::from_read)?;
            crc.update(&stored_size.to_le_bytes());
            crc.update(&[compressed]);

            let compression = if compressed != 0 {
                if *version >= inno_version(4, 1, 6, 0) {
                    BlockCompression::Lzma1
                } else {
                    BlockCompression::Zlib
                }
            } else {
                BlockCompression::Stored
            };
            (stored_size, compression)
        } else {
            let compressed_size = base.read_u32::<LE>().map_err(InnoError::from_read)?;
            let uncompressed_size = base.read_u32::<LE>().map_err(InnoError::from_read)?;
            crc.update(&compressed_size.to_le_bytes());
            crc.update(&uncompressed_size.to_le_bytes());

            let (mut stored_size, compression) = if compressed_size == u32::MAX {
                (uncompressed_size, BlockCompression::Stored)
            } else {
                (compressed_size, BlockCompression::Zlib)
            };
            // The old header does not count the frame CRCs.
            stored_size += stored_size.div_ceil(FRAME_SIZE as u32) * 4;
            (stored_size, compression)
        };

        if crc.finalize() != expected_crc {
            return Err(InnoError::BlockHeader);
        }

        debug!("[block] size {stored_size}, compression {compression:?}");

        let end_offset = base.stream_position()? + u64::from(stored_size);
        let frames = FrameReader::new(RestrictedReader::new(base, u64::from(stored_size)));

        let reader: Box<dyn Read + 'a> = match compression {
            BlockCompression::Stored => Box::new(frames),
            BlockCompression::Zlib => Box::new(ZlibDecoder::new(frames)),
            BlockCompression::Lzma1 => Box::new(lzma1_decoder(frames)?),
        };

        Ok(BlockReader { reader, end_offset })
    }

    /// Base-stream offset just past this block's stored bytes.
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// True if the decoded stream is exhausted; consumes one probe byte if
    /// data remains.
    pub fn at_end(&mut self) -> bool {
        let mut probe = [0u8; 1];
        !matches!(self.reader.read(&mut probe), Ok(n) if n > 0)
    }
}

impl Read for BlockReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    /// Builds a stored (uncompressed) block for a ≥4.0.9 layout.
    fn build_block(payload: &[u8], corrupt_frame: bool, corrupt_header: bool) -> Vec<u8> {
        let mut framed = Vec::new();
        for frame in payload.chunks(FRAME_SIZE) {
            let mut crc = crc32fast::hash(frame);
            if corrupt_frame {
                crc ^= 0x1;
            }
            framed.write_u32::<LE>(crc).unwrap();
            framed.extend_from_slice(frame);
        }

        let mut header = Vec::new();
        header.write_u32::<LE>(framed.len() as u32).unwrap();
        header.push(0); // not compressed

        let mut out = Vec::new();
        let mut crc = crc32fast::hash(&header);
        if corrupt_header {
            crc ^= 0x1;
        }
        out.write_u32::<LE>(crc).unwrap();
        out.extend_from_slice(&header);
        out.extend_from_slice(&framed);
        out
    }

    fn version() -> InnoVersion {
        InnoVersion::new(5, 5, 0, 0)
    }

    #[test]
    fn round_trips_multi_frame_payload() {
        let payload: Vec<u8> = (0..10_000u32).map(|i| i as u8).collect();
        let data = build_block(&payload, false, false);
        let mut cursor = Cursor::new(data);
        let mut block = BlockReader::open(&mut cursor, &version()).unwrap();
        let mut out = Vec::new();
        block.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
        assert!(block.at_end());
    }

    #[test]
    fn frame_crc_mismatch() {
        let data = build_block(b"hello", true, false);
        let mut cursor = Cursor::new(data);
        let mut block = BlockReader::open(&mut cursor, &version()).unwrap();
        let err = block.read_to_end(&mut Vec::new()).unwrap_err();
        assert!(matches!(
            InnoError::from_read(err),
            InnoError::BlockChecksum
        ));
    }

    #[test]
    fn header_crc_mismatch() {
        let data = build_block(b"hello", false, true);
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            BlockReader::open(&mut cursor, &version()),
            Err(InnoError::BlockHeader)
        ));
    }

    #[test]
    fn empty_block_is_legal() {
        let data = build_block(b"", false, false);
        let mut cursor = Cursor::new(data);
        let mut block = BlockReader::open(&mut cursor, &version()).unwrap();
        let mut out = Vec::new();
        block.read_to_end(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn end_offset_points_past_stored_bytes() {
        let payload = b"0123456789";
        let data = build_block(payload, false, false);
        let total = data.len() as u64;
        let mut cursor = Cursor::new(data);
        let block = BlockReader::open(&mut cursor, &version()).unwrap();
        assert_eq!(block.end_offset(), total);
    }

    #[test]
    fn pre_409_header_counts_frame_crcs_implicitly() {
        let payload: Vec<u8> = vec![0xab; 5000];
        let mut framed = Vec::new();
        for frame in payload.chunks(FRAME_SIZE) {
            framed.write_u32::<LE>(crc32fast::hash(frame)).unwrap();
            framed.extend_from_slice(frame);
        }
        let mut header = Vec::new();
        header.write_u32::<LE>(u32::MAX).unwrap(); // stored marker
        header.write_u32::<LE>(payload.len() as u32).unwrap();

        let mut data = Vec::new();
        data.write_u32::<LE>(crc32fast::hash(&header)).unwrap();
        data.extend_from_slice(&header);
        data.extend_from_slice(&framed);

        let mut cursor = Cursor::new(data);
        let old_version = InnoVersion::new(3, 0, 5, 0);
        let mut block = BlockReader::open(&mut cursor, &old_version).unwrap();
        let mut out = Vec::new();
        block.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }
}
