//! File location entries: where each stored payload lives inside the data
//! stream, how it is compressed/encrypted, and how to verify it.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::crypto::Checksum;
use crate::read::{FlagReader, read_u32_dyn};
use crate::setup::header::SetupHeader;
use crate::stream::{Chunk, CompressionMethod, EncryptionMethod};
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LocationFlags: u16 {
        const VERSION_INFO_VALID = 1 << 0;
        const VERSION_INFO_NOT_VALID = 1 << 1;
        const TIMESTAMP_IN_UTC = 1 << 2;
        const IS_UNINSTALLER_EXE = 1 << 3;
        const CALL_INSTRUCTION_OPTIMIZED = 1 << 4;
        const TOUCH = 1 << 5;
        const CHUNK_ENCRYPTED = 1 << 6;
        const CHUNK_COMPRESSED = 1 << 7;
        const SOLID_BREAK = 1 << 8;
        const SIGN = 1 << 9;
        const SIGN_ONCE = 1 << 10;
        /// Legacy marker for per-chunk BZip2 in 2.0.17 – 4.0.0.
        const BZIPPED = 1 << 11;
    }
}

/// Which call-instruction transform was applied to this payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallFilter {
    #[default]
    None,
    Filter4108,
    Filter5200,
    /// 5200 dialect with the high-byte flip of 5.3.9 and later.
    Filter5309,
}

#[derive(Debug, Clone, Default)]
pub struct FileLocationEntry {
    pub chunk: Chunk,
    /// Decompressed offset of this file within its chunk.
    pub file_offset: u64,
    /// Decompressed length.
    pub file_size: u64,
    /// Digest of the decompressed, post-filter bytes.
    pub checksum: Checksum,
    /// Windows FILETIME ticks (100ns since 1601-01-01).
    pub timestamp: u64,
    pub file_version_ms: u32,
    pub file_version_ls: u32,
    pub options: LocationFlags,
    pub filter: CallFilter,
}

impl FileLocationEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        header: &SetupHeader,
    ) -> io::Result<Self> {
        let mut entry = FileLocationEntry::default();

        entry.chunk.first_slice = read_u32_dyn(reader, version.bits)?;
        entry.chunk.last_slice = read_u32_dyn(reader, version.bits)?;
        if *version < inno_version(4, 0, 0, 0)
            && entry.chunk.first_slice >= 1
            && entry.chunk.last_slice >= 1
        {
            // Stored 1-based in old formats.
            entry.chunk.first_slice -= 1;
            entry.chunk.last_slice -= 1;
        }

        entry.chunk.offset = reader.read_u32::<LE>()?;

        if *version >= inno_version(4, 0, 1, 0) {
            entry.file_offset = reader.read_u64::<LE>()?;
        }

        if *version >= inno_version(4, 0, 0, 0) {
            entry.file_size = reader.read_u64::<LE>()?;
            entry.chunk.size = reader.read_u64::<LE>()?;
        } else {
            entry.file_size = u64::from(reader.read_u32::<LE>()?);
            entry.chunk.size = u64::from(reader.read_u32::<LE>()?);
        }

        entry.checksum = if *version >= inno_version(6, 4, 0, 0) {
            let mut digest = [0u8; 32];
            reader.read_exact(&mut digest)?;
            Checksum::Sha256(digest)
        } else if *version >= inno_version(5, 3, 9, 0) {
            let mut digest = [0u8; 20];
            reader.read_exact(&mut digest)?;
            Checksum::Sha1(digest)
        } else if *version >= inno_version(4, 2, 0, 0) {
            let mut digest = [0u8; 16];
            reader.read_exact(&mut digest)?;
            Checksum::Md5(digest)
        } else if *version >= inno_version(4, 0, 1, 0) {
            Checksum::Crc32(reader.read_u32::<LE>()?)
        } else {
            Checksum::Adler32(reader.read_u32::<LE>()?)
        };

        entry.timestamp = if version.bits == 16 {
            // FAT date/time pair.
            let time = reader.read_u16::<LE>()?;
            let date = reader.read_u16::<LE>()?;
            dos_to_filetime(date, time)
        } else {
            reader.read_u64::<LE>()?
        };

        entry.file_version_ms = reader.read_u32::<LE>()?;
        entry.file_version_ls = reader.read_u32::<LE>()?;

        use LocationFlags as F;
        let mut flags = FlagReader::new(reader);
        flags.add(F::VERSION_INFO_VALID)?;
        if *version < inno_version(6, 4, 3, 0) {
            flags.add(F::VERSION_INFO_NOT_VALID)?;
        }
        if *version >= inno_version(2, 0, 17, 0) && *version < inno_version(4, 0, 1, 0) {
            flags.add(F::BZIPPED)?;
        }
        if *version >= inno_version(4, 0, 10, 0) {
            flags.add(F::TIMESTAMP_IN_UTC)?;
        }
        if *version >= inno_version(4, 2, 0, 0) && *version < inno_version(6, 4, 3, 0) {
            flags.add(F::IS_UNINSTALLER_EXE)?;
        }
        if *version >= inno_version(4, 1, 8, 0) {
            flags.add(F::CALL_INSTRUCTION_OPTIMIZED)?;
        }
        if *version >= inno_version(4, 2, 0, 0) && *version < inno_version(6, 4, 3, 0) {
            flags.add(F::TOUCH)?;
        }
        if *version >= inno_version(4, 2, 2, 0) {
            flags.add(F::CHUNK_ENCRYPTED)?;
        }
        if *version >= inno_version(4, 2, 5, 0) {
            flags.add(F::CHUNK_COMPRESSED)?;
        }
        if *version >= inno_version(5, 1, 13, 0) && *version < inno_version(6, 4, 3, 0) {
            flags.add(F::SOLID_BREAK)?;
        }
        if *version >= inno_version(5, 5, 7, 0) && *version < inno_version(6, 3, 0, 0) {
            flags.add(F::SIGN)?;
            flags.add(F::SIGN_ONCE)?;
        }
        entry.options = flags.finish(version)?;

        if *version < inno_version(4, 2, 5, 0) {
            entry.options |= F::CHUNK_COMPRESSED;
        }

        entry.chunk.compression = if entry.options.contains(F::CHUNK_COMPRESSED) {
            header.compression
        } else {
            CompressionMethod::Stored
        };
        if entry.options.contains(F::BZIPPED) {
            entry.options |= F::CHUNK_COMPRESSED;
            entry.chunk.compression = CompressionMethod::BZip2;
        }

        entry.chunk.encryption = if entry.options.contains(F::CHUNK_ENCRYPTED) {
            if *version >= inno_version(6, 4, 0, 0) {
                EncryptionMethod::XChaCha20
            } else if *version >= inno_version(5, 3, 9, 0) {
                EncryptionMethod::Arc4Sha1
            } else {
                EncryptionMethod::Arc4Md5
            }
        } else {
            EncryptionMethod::Plaintext
        };

        entry.filter = if entry.options.contains(F::CALL_INSTRUCTION_OPTIMIZED) {
            if *version < inno_version(5, 2, 0, 0) {
                CallFilter::Filter4108
            } else if *version < inno_version(5, 3, 9, 0) {
                CallFilter::Filter5200
            } else {
                CallFilter::Filter5309
            }
        } else {
            CallFilter::None
        };

        Ok(entry)
    }

    /// Unix timestamp (seconds, nanoseconds) for this entry.
    pub fn unix_timestamp(&self) -> (i64, u32) {
        const FILETIME_UNIX_OFFSET: i64 = 11_644_473_600;
        let seconds = (self.timestamp / 10_000_000) as i64 - FILETIME_UNIX_OFFSET;
        let nanos = (self.timestamp % 10_000_000) as u32 * 100;
        (seconds, nanos)
    }
}

/// Converts a FAT date/time pair to FILETIME ticks.
fn dos_to_filetime(date: u16, time: u16) -> u64 {
    let year = i64::from(date >> 9) + 1980;
    let month = i64::from((date >> 5) & 0xf).max(1);
    let day = i64::from(date & 0x1f).max(1);
    let hour = i64::from(time >> 11);
    let minute = i64::from((time >> 5) & 0x3f);
    let second = i64::from((time & 0x1f) * 2);

    // Days since 1970-01-01 (civil calendar arithmetic).
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    let days = era * 146_097 + doe - 719_468;

    let unix = days * 86_400 + hour * 3_600 + minute * 60 + second;
    ((unix + 11_644_473_600) * 10_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_epoch_conversion() {
        // 1980-01-01 00:00:00 -> unix 315532800
        let ft = dos_to_filetime(0 << 9 | 1 << 5 | 1, 0);
        let entry = FileLocationEntry {
            timestamp: ft,
            ..FileLocationEntry::default()
        };
        assert_eq!(entry.unix_timestamp(), (315_532_800, 0));
    }

    #[test]
    fn filetime_to_unix() {
        // 2009-02-13 23:31:30 UTC == unix 1234567890
        let entry = FileLocationEntry {
            timestamp: (1_234_567_890 + 11_644_473_600) * 10_000_000 + 1_500,
            ..FileLocationEntry::default()
        };
        assert_eq!(entry.unix_timestamp(), (1_234_567_890, 150_000));
    }
}
