//! Setup loader offset table: the small record inside the stub executable
//! that points at the compressed setup program and the embedded data.
//!
//! Two discovery strategies are tried in order: a pointer structure at file
//! offset 0x30 (pre-5.1.5) and a PE resource (5.1.5 and later). The table
//! itself comes in six historical layouts keyed by a 64-bit id following the
//! `rDlP` magic.

use std::io::{Cursor, Read, Seek, SeekFrom};

use binrw::BinRead;
use byteorder::{LE, ReadBytesExt};
use log::{debug, warn};

use crate::crypto::Checksum;
use crate::error::{InnoError, Result};
use crate::pe;

/// `Inno` read as a little-endian u32.
const HEADER_MAGIC: u32 = 0x6f6e_6e49;
/// `rDlP` read as a little-endian u32.
const TABLE_MAGIC: u32 = 0x506c_4472;

/// Resource id triple for the post-5.1.5 locator.
const RESOURCE_TYPE_DATA: u32 = 10;
const RESOURCE_NAME_INSTALLER: u32 = 11111;

const TABLE_ID_10: u64 = 0x7856_6587_3230_5374;
const TABLE_ID_40: u64 = 0x7856_6587_3430_5374;
const TABLE_ID_40B: u64 = 0x7856_6587_3530_5374;
const TABLE_ID_40C: u64 = 0x7856_6587_3630_5374;
const TABLE_ID_41: u64 = 0x7856_6587_3730_5374;
const TABLE_ID_51: u64 = 0x2a0b_7bd7_e6cd_5374;

/// Normalized offset table, independent of which layout was stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupOffsets {
    /// Minimum expected size of the setup file.
    pub total_size: u32,
    /// Offset of the compressed setup program.
    pub exe_offset: u32,
    pub exe_compressed_size: u32,
    pub exe_uncompressed_size: u32,
    /// Adler-32 before 4.0.3, CRC-32 from then on.
    pub exe_checksum: Checksum,
    pub message_offset: u32,
    /// Offset of the setup metadata (version signature + two blocks).
    pub header_offset: u32,
    /// Offset of the embedded data, or 0 when data lives in external slices.
    pub data_offset: u32,
}

#[derive(BinRead)]
#[br(little)]
struct OffsetTable10 {
    total_size: u32,
    exe_offset: u32,
    exe_compressed_size: u32,
    exe_uncompressed_size: u32,
    exe_adler: u32,
    message_offset: u32,
    header_offset: u32,
    data_offset: u32,
}

#[derive(BinRead)]
#[br(little)]
struct OffsetTable40 {
    total_size: u32,
    exe_offset: u32,
    exe_compressed_size: u32,
    exe_uncompressed_size: u32,
    exe_checksum: u32,
    header_offset: u32,
    data_offset: u32,
}

#[derive(BinRead)]
#[br(little)]
struct OffsetTable41 {
    total_size: u32,
    exe_offset: u32,
    exe_uncompressed_size: u32,
    exe_crc: u32,
    header_offset: u32,
    data_offset: u32,
}

#[derive(BinRead)]
#[br(little)]
struct OffsetTable51 {
    version: u32,
    total_size: u32,
    exe_offset: u32,
    exe_uncompressed_size: u32,
    exe_crc: u32,
    header_offset: u32,
    data_offset: u32,
}

/// Locates and parses the offset table. `OffsetTableMissing` when neither
/// strategy finds one; `OffsetTableChecksum` when a recognized table fails
/// its CRC.
pub fn load_offsets<R: Read + Seek>(reader: &mut R) -> Result<SetupOffsets> {
    if let Some(table_offset) = legacy_locator(reader)? {
        debug!("[loader] legacy offset table @ {table_offset:#x}");
        if let Some(offsets) = load_offsets_at(reader, u64::from(table_offset))? {
            return Ok(offsets);
        }
    }

    if let Some(resource) =
        pe::find_resource(reader, RESOURCE_TYPE_DATA, RESOURCE_NAME_INSTALLER, 0)?
    {
        debug!("[loader] resource offset table @ {:#x}", resource.offset);
        if let Some(offsets) = load_offsets_at(reader, u64::from(resource.offset))? {
            return Ok(offsets);
        }
    }

    Err(InnoError::OffsetTableMissing)
}

/// Pre-5.1.5 locator: magic plus pointer-and-complement at 0x30.
fn legacy_locator<R: Read + Seek>(reader: &mut R) -> Result<Option<u32>> {
    reader.seek(SeekFrom::Start(0x30))?;
    let mut raw = [0u8; 12];
    if reader.read_exact(&mut raw).is_err() {
        return Ok(None);
    }
    let mut cursor = Cursor::new(raw);
    let id = cursor.read_u32::<LE>()?;
    let table_offset = cursor.read_u32::<LE>()?;
    let not_table_offset = cursor.read_u32::<LE>()?;

    if id != HEADER_MAGIC || table_offset != !not_table_offset {
        return Ok(None);
    }
    Ok(Some(table_offset))
}

fn load_offsets_at<R: Read + Seek>(reader: &mut R, pos: u64) -> Result<Option<SetupOffsets>> {
    if reader.seek(SeekFrom::Start(pos)).is_err() {
        return Ok(None);
    }

    let magic = match reader.read_u32::<LE>() {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    if magic != TABLE_MAGIC {
        return Ok(None);
    }
    let table_id = match reader.read_u64::<LE>() {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let mut crc = crc32fast::Hasher::new();
    crc.update(&magic.to_le_bytes());
    crc.update(&table_id.to_le_bytes());

    let (payload_size, checked_size) = match table_id {
        TABLE_ID_10 => (32, None),
        TABLE_ID_40 | TABLE_ID_40B => (28, None),
        TABLE_ID_40C => (32, Some(28)),
        TABLE_ID_41 => (28, Some(24)),
        TABLE_ID_51 => (32, Some(28)),
        _ => {
            warn!("[loader] unsupported offset table id: {table_id:#x}");
            return Ok(None);
        }
    };

    let mut payload = vec![0u8; payload_size];
    reader
        .read_exact(&mut payload)
        .map_err(InnoError::from_read)?;

    if let Some(checked) = checked_size {
        crc.update(&payload[..checked]);
        let expected = u32::from_le_bytes(payload[checked..checked + 4].try_into().unwrap());
        if crc.finalize() != expected {
            return Err(InnoError::OffsetTableChecksum);
        }
    }

    let mut cursor = Cursor::new(&payload);
    let offsets = match table_id {
        TABLE_ID_10 => {
            let t = OffsetTable10::read(&mut cursor)?;
            SetupOffsets {
                total_size: t.total_size,
                exe_offset: t.exe_offset,
                exe_compressed_size: t.exe_compressed_size,
                exe_uncompressed_size: t.exe_uncompressed_size,
                exe_checksum: Checksum::Adler32(t.exe_adler),
                message_offset: t.message_offset,
                header_offset: t.header_offset,
                data_offset: t.data_offset,
            }
        }
        TABLE_ID_40 | TABLE_ID_40B | TABLE_ID_40C => {
            let t = OffsetTable40::read(&mut cursor)?;
            SetupOffsets {
                total_size: t.total_size,
                exe_offset: t.exe_offset,
                exe_compressed_size: t.exe_compressed_size,
                exe_uncompressed_size: t.exe_uncompressed_size,
                exe_checksum: if table_id == TABLE_ID_40 {
                    Checksum::Adler32(t.exe_checksum)
                } else {
                    Checksum::Crc32(t.exe_checksum)
                },
                message_offset: 0,
                header_offset: t.header_offset,
                data_offset: t.data_offset,
            }
        }
        TABLE_ID_41 => {
            let t = OffsetTable41::read(&mut cursor)?;
            SetupOffsets {
                total_size: t.total_size,
                exe_offset: t.exe_offset,
                exe_compressed_size: 0,
                exe_uncompressed_size: t.exe_uncompressed_size,
                exe_checksum: Checksum::Crc32(t.exe_crc),
                message_offset: 0,
                header_offset: t.header_offset,
                data_offset: t.data_offset,
            }
        }
        TABLE_ID_51 => {
            let t = OffsetTable51::read(&mut cursor)?;
            if t.version != 1 {
                warn!("[loader] unexpected offset table version: {}", t.version);
            }
            SetupOffsets {
                total_size: t.total_size,
                exe_offset: t.exe_offset,
                exe_compressed_size: 0,
                exe_uncompressed_size: t.exe_uncompressed_size,
                exe_checksum: Checksum::Crc32(t.exe_crc),
                message_offset: 0,
                header_offset: t.header_offset,
                data_offset: t.data_offset,
            }
        }
        _ => unreachable!(),
    };

    Ok(Some(offsets))
}
