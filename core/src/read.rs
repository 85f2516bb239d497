//! Helpers for the raw wire encodings used throughout the setup metadata:
//! dynamic-width counts, length-prefixed strings, stored enums and the lazy
//! bitfield reader behind every `options` field.

use std::io::{self, Read};

use bitflags::Flags;
use byteorder::{LE, ReadBytesExt};

use crate::encoding::decode_string;
use crate::version::InnoVersion;

/// Reads a `u32` that is stored as a `u16` in 16-bit installers.
pub fn read_u32_dyn<R: Read>(reader: &mut R, bits: u8) -> io::Result<u32> {
    if bits == 16 {
        Ok(u32::from(reader.read_u16::<LE>()?))
    } else {
        reader.read_u32::<LE>()
    }
}

/// Signed companion of [`read_u32_dyn`].
pub fn read_i32_dyn<R: Read>(reader: &mut R, bits: u8) -> io::Result<i32> {
    if bits == 16 {
        Ok(i32::from(reader.read_i16::<LE>()?))
    } else {
        reader.read_i32::<LE>()
    }
}

/// Length-prefixed raw bytes: `u32` byte count followed by the payload.
pub fn read_binary_string<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let length = reader.read_u32::<LE>()? as usize;
    let mut data = vec![0u8; length];
    reader.read_exact(&mut data)?;
    Ok(data)
}

/// Length-prefixed string decoded with the given Windows codepage
/// (1200 means UTF-16LE).
pub fn read_encoded_string<R: Read>(reader: &mut R, codepage: u32) -> io::Result<String> {
    let raw = read_binary_string(reader)?;
    Ok(decode_string(&raw, codepage))
}

/// Length-prefixed string that is always Windows-1252, even in Unicode
/// installers.
pub fn read_ansi_string<R: Read>(reader: &mut R) -> io::Result<String> {
    read_encoded_string(reader, 1252)
}

/// Reads a `u8` ordinal and maps it through a version-selected variant table.
/// Out-of-range ordinals fall back to `default`, like the original decoder.
pub fn read_stored_enum<R: Read, T: Copy>(
    reader: &mut R,
    map: &[T],
    default: T,
) -> io::Result<T> {
    let ordinal = reader.read_u8()? as usize;
    Ok(map.get(ordinal).copied().unwrap_or(default))
}

/// Lazy reader for on-disk option bitfields.
///
/// Flags are stored as consecutive bits in little-endian byte order; the
/// number of bytes on disk is determined by how many flags the running
/// version knows about, so the caller `add`s exactly the flags that exist on
/// the wire, in wire order, and the reader pulls bytes as needed. 16-bit
/// installers pad the field to an even byte count.
pub struct FlagReader<'a, R: Read, F: Flags> {
    reader: &'a mut R,
    current: u8,
    pos: u8,
    bytes: usize,
    result: F,
}

impl<'a, R: Read, F: Flags + Copy> FlagReader<'a, R, F> {
    pub fn new(reader: &'a mut R) -> Self {
        FlagReader {
            reader,
            current: 0,
            pos: 0,
            bytes: 0,
            result: F::empty(),
        }
    }

    pub fn add(&mut self, flag: F) -> io::Result<()> {
        if self.pos == 0 {
            self.current = self.reader.read_u8()?;
            self.bytes += 1;
        }
        if self.current & (1 << self.pos) != 0 {
            self.result.insert(flag);
        }
        self.pos = (self.pos + 1) % 8;
        Ok(())
    }

    pub fn finish(self, version: &InnoVersion) -> io::Result<F> {
        if version.bits == 16 && self.bytes % 2 == 1 {
            self.reader.read_u8()?;
        }
        Ok(self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    bitflags::bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct TestFlags: u16 {
            const A = 1 << 0;
            const B = 1 << 1;
            const C = 1 << 2;
            const D = 1 << 3;
            const E = 1 << 4;
        }
    }

    #[test]
    fn flags_span_multiple_bytes() {
        // 10 wire positions: bit 0 and bit 9 set.
        let mut cursor = Cursor::new(vec![0b0000_0001u8, 0b0000_0010]);
        let mut reader = FlagReader::new(&mut cursor);
        for _ in 0..2 {
            for flag in [
                TestFlags::A,
                TestFlags::B,
                TestFlags::C,
                TestFlags::D,
                TestFlags::E,
            ] {
                reader.add(flag).unwrap();
            }
        }
        let flags = reader.finish(&InnoVersion::new(5, 0, 0, 0)).unwrap();
        // Second pass re-adds the same flags, so bit 9 maps onto E.
        assert_eq!(flags, TestFlags::A | TestFlags::E);
    }

    #[test]
    fn sixteen_bit_versions_pad_to_even_bytes() {
        let mut cursor = Cursor::new(vec![0b1u8, 0xff, 0xaa]);
        let mut version = InnoVersion::new(1, 2, 10, 0);
        version.bits = 16;
        let mut reader = FlagReader::new(&mut cursor);
        reader.add(TestFlags::A).unwrap();
        let flags = reader.finish(&version).unwrap();
        assert_eq!(flags, TestFlags::A);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn dynamic_counts_follow_version_bits() {
        let mut cursor = Cursor::new(vec![0x34, 0x12, 0x78, 0x56]);
        assert_eq!(read_u32_dyn(&mut cursor, 16).unwrap(), 0x1234);
        assert_eq!(read_u32_dyn(&mut cursor, 32).unwrap(), 0x5678);
    }

    #[test]
    fn binary_string_reads_length_prefix() {
        let mut cursor = Cursor::new(vec![3, 0, 0, 0, b'a', b'b', b'c', b'x']);
        assert_eq!(read_binary_string(&mut cursor).unwrap(), b"abc");
    }
}
