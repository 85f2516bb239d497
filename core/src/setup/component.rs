//! Component entries.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string};
use crate::setup::windows::WindowsVersionRange;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ComponentFlags: u8 {
        const FIXED = 1 << 0;
        const RESTART = 1 << 1;
        const DISABLE_NO_UNINSTALL_WARNING = 1 << 2;
        const EXCLUSIVE = 1 << 3;
        const DONT_INHERIT_CHECK = 1 << 4;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentEntry {
    pub name: String,
    pub description: String,
    pub types: String,
    pub languages: String,
    pub check: String,
    pub extra_disk_space_required: u64,
    pub level: i32,
    pub used: bool,
    pub version_range: WindowsVersionRange,
    pub options: ComponentFlags,
    pub size: u64,
}

impl ComponentEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = ComponentEntry {
            name: read_encoded_string(reader, codepage)?,
            description: read_encoded_string(reader, codepage)?,
            types: read_encoded_string(reader, codepage)?,
            used: true,
            ..ComponentEntry::default()
        };
        if *version >= inno_version(4, 0, 1, 0) {
            entry.languages = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(4, 0, 0, 0) {
            entry.check = read_encoded_string(reader, codepage)?;
        }

        entry.extra_disk_space_required = if *version >= inno_version(4, 0, 0, 0) {
            reader.read_u64::<LE>()?
        } else {
            u64::from(reader.read_u32::<LE>()?)
        };

        if *version >= inno_version(4, 0, 0, 0) {
            entry.level = reader.read_i32::<LE>()?;
            entry.used = reader.read_u8()? != 0;
        }

        entry.version_range = WindowsVersionRange::load(reader, version)?;

        let mut flags = FlagReader::new(reader);
        flags.add(ComponentFlags::FIXED)?;
        flags.add(ComponentFlags::RESTART)?;
        flags.add(ComponentFlags::DISABLE_NO_UNINSTALL_WARNING)?;
        if *version >= inno_version(3, 0, 8, 0) {
            flags.add(ComponentFlags::EXCLUSIVE)?;
        }
        if *version >= inno_version(4, 2, 3, 0) {
            flags.add(ComponentFlags::DONT_INHERIT_CHECK)?;
        }
        entry.options = flags.finish(version)?;

        entry.size = if *version >= inno_version(4, 0, 0, 0) {
            reader.read_u64::<LE>()?
        } else {
            u64::from(reader.read_u32::<LE>()?)
        };

        Ok(entry)
    }
}
