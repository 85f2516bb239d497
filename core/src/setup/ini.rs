//! INI edit entries.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string};
use crate::setup::item::SetupItem;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IniFlags: u8 {
        const CREATE_KEY_IF_DOESNT_EXIST = 1 << 0;
        const UNINS_DELETE_ENTRY = 1 << 1;
        const UNINS_DELETE_ENTIRE_SECTION = 1 << 2;
        const UNINS_DELETE_SECTION_IF_EMPTY = 1 << 3;
        const HAS_VALUE = 1 << 4;
    }
}

#[derive(Debug, Clone, Default)]
pub struct IniEntry {
    pub inifile: String,
    pub section: String,
    pub key: String,
    pub value: String,
    pub options: IniFlags,
    pub item: SetupItem,
}

impl IniEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = IniEntry::default();

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the entry.
            reader.read_u32::<LE>()?;
        }

        entry.inifile = read_encoded_string(reader, codepage)?;
        if entry.inifile.is_empty() {
            entry.inifile = "win.ini".into();
        }
        entry.section = read_encoded_string(reader, codepage)?;
        entry.key = read_encoded_string(reader, codepage)?;
        entry.value = read_encoded_string(reader, codepage)?;

        entry.item.load_condition_data(reader, version, codepage)?;
        entry.item.load_version_data(reader, version)?;

        let mut flags = FlagReader::new(reader);
        flags.add(IniFlags::CREATE_KEY_IF_DOESNT_EXIST)?;
        flags.add(IniFlags::UNINS_DELETE_ENTRY)?;
        flags.add(IniFlags::UNINS_DELETE_ENTIRE_SECTION)?;
        flags.add(IniFlags::UNINS_DELETE_SECTION_IF_EMPTY)?;
        flags.add(IniFlags::HAS_VALUE)?;
        entry.options = flags.finish(version)?;

        Ok(entry)
    }
}
