//! Directory entries.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string};
use crate::setup::item::SetupItem;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirectoryFlags: u8 {
        const NEVER_UNINSTALL = 1 << 0;
        const DELETE_AFTER_INSTALL = 1 << 1;
        const ALWAYS_UNINSTALL = 1 << 2;
        const SET_NTFS_COMPRESSION = 1 << 3;
        const UNSET_NTFS_COMPRESSION = 1 << 4;
    }
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    pub name: String,
    pub permissions: String,
    pub attributes: u32,
    /// Index into the permission entry list, -1 if none.
    pub permission: i16,
    pub options: DirectoryFlags,
    pub item: SetupItem,
}

impl DirectoryEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = DirectoryEntry {
            permission: -1,
            ..DirectoryEntry::default()
        };

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the entry.
            reader.read_u32::<LE>()?;
        }

        entry.name = read_encoded_string(reader, codepage)?;
        entry.item.load_condition_data(reader, version, codepage)?;

        if *version >= inno_version(4, 0, 11, 0) && *version < inno_version(4, 1, 0, 0) {
            entry.permissions = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(2, 0, 11, 0) {
            entry.attributes = reader.read_u32::<LE>()?;
        }

        entry.item.load_version_data(reader, version)?;

        if *version >= inno_version(4, 1, 0, 0) {
            entry.permission = reader.read_i16::<LE>()?;
        }

        let mut flags = FlagReader::new(reader);
        flags.add(DirectoryFlags::NEVER_UNINSTALL)?;
        flags.add(DirectoryFlags::DELETE_AFTER_INSTALL)?;
        flags.add(DirectoryFlags::ALWAYS_UNINSTALL)?;
        if *version >= inno_version(5, 2, 0, 0) {
            flags.add(DirectoryFlags::SET_NTFS_COMPRESSION)?;
            flags.add(DirectoryFlags::UNSET_NTFS_COMPRESSION)?;
        }
        entry.options = flags.finish(version)?;

        Ok(entry)
    }
}
