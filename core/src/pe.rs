//! Minimal PE/COFF walk used to locate the setup loader offset table when it
//! is stored as a resource (`type 10, name 11111, language 0`).
//!
//! Every failure here is soft: the caller falls back to the legacy locator,
//! so malformed executables yield `None` rather than an error.

use std::io::{self, Read, Seek, SeekFrom};

use binrw::BinRead;
use byteorder::{LE, ReadBytesExt};

const PE_MAGIC: [u8; 4] = *b"PE\0\0";

/// File offset and size of a located resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub offset: u32,
    pub size: u32,
}

#[derive(BinRead)]
#[br(little)]
struct CoffHeader {
    _machine: u16,
    section_count: u16,
    _timestamp: u32,
    _symbol_table: u32,
    _symbol_count: u32,
    optional_header_size: u16,
    _characteristics: u16,
}

#[derive(BinRead)]
#[br(little)]
struct SectionEntry {
    _name: [u8; 8],
    virtual_size: u32,
    virtual_address: u32,
    _raw_size: u32,
    raw_address: u32,
    _relocations: u32,
    _line_numbers: u32,
    _relocation_count: u16,
    _line_number_count: u16,
    _characteristics: u32,
}

#[derive(BinRead)]
#[br(little)]
struct ResourceDirectoryHeader {
    _characteristics: u32,
    _timestamp: u32,
    _major: u16,
    _minor: u16,
    named_count: u16,
    id_count: u16,
}

#[derive(BinRead)]
#[br(little)]
struct ResourceDataEntry {
    data_address: u32,
    size: u32,
    _codepage: u32,
    _reserved: u32,
}

struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_address: u32,
}

fn virtual_to_file_offset(sections: &[Section], address: u32) -> Option<u32> {
    sections
        .iter()
        .find(|s| {
            address >= s.virtual_address
                && address - s.virtual_address < s.virtual_size
        })
        .map(|s| address - s.virtual_address + s.raw_address)
}

/// Scans one resource directory level for an id entry. The returned offset
/// has its top bit set when it points at a sub-table rather than a leaf.
fn find_resource_entry<R: Read + Seek>(reader: &mut R, needle: u32) -> io::Result<Option<u32>> {
    let Ok(header) = ResourceDirectoryHeader::read(reader) else {
        return Ok(None);
    };

    // Named entries sort first; the installer resource is always id-keyed.
    reader.seek(SeekFrom::Current(i64::from(header.named_count) * 8))?;

    for _ in 0..header.id_count {
        let id = reader.read_u32::<LE>()?;
        let offset = reader.read_u32::<LE>()?;
        if id == needle {
            return Ok(Some(offset));
        }
    }
    Ok(None)
}

/// Finds a resource by (type, name, language). `Ok(None)` covers every
/// malformed or missing case.
pub fn find_resource<R: Read + Seek>(
    reader: &mut R,
    type_id: u32,
    name_id: u32,
    language_id: u32,
) -> io::Result<Option<Resource>> {
    reader.seek(SeekFrom::Start(0x3c))?;
    let pe_offset = match reader.read_u16::<LE>() {
        Ok(v) => u64::from(v),
        Err(_) => return Ok(None),
    };

    reader.seek(SeekFrom::Start(pe_offset))?;
    let mut magic = [0u8; 4];
    if reader.read_exact(&mut magic).is_err() || magic != PE_MAGIC {
        return Ok(None);
    }

    let Ok(coff) = CoffHeader::read(reader) else {
        return Ok(None);
    };

    let optional_magic = match reader.read_u16::<LE>() {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    // PE32+ widens a handful of fields before the data directory count.
    let skip = if optional_magic == 0x20b { 106 } else { 90 };
    reader.seek(SeekFrom::Current(skip))?;

    let directory_count = match reader.read_u32::<LE>() {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };
    if directory_count < 3 {
        return Ok(None);
    }
    // Skip export and import directories; #2 is the resource directory.
    reader.seek(SeekFrom::Current(16))?;
    let resource_address = reader.read_u32::<LE>()?;
    let resource_size = reader.read_u32::<LE>()?;
    if resource_address == 0 || resource_size == 0 {
        return Ok(None);
    }

    // machine .. characteristics
    let file_header_size = 2 + 2 + 4 + 4 + 4 + 2 + 2;
    let section_table_offset = pe_offset
        + PE_MAGIC.len() as u64
        + file_header_size
        + u64::from(coff.optional_header_size);
    reader.seek(SeekFrom::Start(section_table_offset))?;

    let mut sections = Vec::with_capacity(usize::from(coff.section_count));
    for _ in 0..coff.section_count {
        let Ok(entry) = SectionEntry::read(reader) else {
            return Ok(None);
        };
        sections.push(Section {
            virtual_address: entry.virtual_address,
            virtual_size: entry.virtual_size,
            raw_address: entry.raw_address,
        });
    }

    let Some(resource_offset) = virtual_to_file_offset(&sections, resource_address) else {
        return Ok(None);
    };

    // type level -> sub-table required
    reader.seek(SeekFrom::Start(u64::from(resource_offset)))?;
    let Some(type_offset) = find_resource_entry(reader, type_id)? else {
        return Ok(None);
    };
    if type_offset & (1 << 31) == 0 {
        return Ok(None);
    }

    // name level -> sub-table required
    reader.seek(SeekFrom::Start(u64::from(
        (type_offset & !(1 << 31)) + resource_offset,
    )))?;
    let Some(name_offset) = find_resource_entry(reader, name_id)? else {
        return Ok(None);
    };
    if name_offset & (1 << 31) == 0 {
        return Ok(None);
    }

    // language level -> leaf required
    reader.seek(SeekFrom::Start(u64::from(
        (name_offset & !(1 << 31)) + resource_offset,
    )))?;
    let Some(leaf_offset) = find_resource_entry(reader, language_id)? else {
        return Ok(None);
    };
    if leaf_offset == 0 || leaf_offset & (1 << 31) != 0 {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(u64::from(leaf_offset + resource_offset)))?;
    let Ok(data) = ResourceDataEntry::read(reader) else {
        return Ok(None);
    };

    match virtual_to_file_offset(&sections, data.data_address) {
        Some(offset) => Ok(Some(Resource {
            offset,
            size: data.size,
        })),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn non_pe_input_is_soft_failure() {
        let mut data = vec![0u8; 0x100];
        data[0x3c] = 0x40;
        let found = find_resource(&mut Cursor::new(data), 10, 11111, 0).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn truncated_input_is_soft_failure() {
        let found = find_resource(&mut Cursor::new(vec![0u8; 8]), 10, 11111, 0).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn rva_mapping_uses_containing_section() {
        let sections = [
            Section {
                virtual_address: 0x1000,
                virtual_size: 0x1000,
                raw_address: 0x400,
            },
            Section {
                virtual_address: 0x2000,
                virtual_size: 0x800,
                raw_address: 0x1400,
            },
        ];
        assert_eq!(virtual_to_file_offset(&sections, 0x2100), Some(0x1500));
        assert_eq!(virtual_to_file_offset(&sections, 0x4000), None);
    }
}
