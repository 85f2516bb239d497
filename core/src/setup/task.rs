//! Task entries.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string};
use crate::setup::windows::WindowsVersionRange;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TaskFlags: u8 {
        const EXCLUSIVE = 1 << 0;
        const UNCHECKED = 1 << 1;
        const RESTART = 1 << 2;
        const CHECKED_ONCE = 1 << 3;
        const DONT_INHERIT_CHECK = 1 << 4;
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskEntry {
    pub name: String,
    pub description: String,
    pub group_description: String,
    pub components: String,
    pub languages: String,
    pub check: String,
    pub level: i32,
    pub used: bool,
    pub version_range: WindowsVersionRange,
    pub options: TaskFlags,
}

impl TaskEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = TaskEntry {
            name: read_encoded_string(reader, codepage)?,
            description: read_encoded_string(reader, codepage)?,
            group_description: read_encoded_string(reader, codepage)?,
            components: read_encoded_string(reader, codepage)?,
            used: true,
            ..TaskEntry::default()
        };
        if *version >= inno_version(4, 0, 1, 0) {
            entry.languages = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(4, 0, 0, 0) {
            entry.check = read_encoded_string(reader, codepage)?;
            entry.level = reader.read_i32::<LE>()?;
            entry.used = reader.read_u8()? != 0;
        }

        entry.version_range = WindowsVersionRange::load(reader, version)?;

        let mut flags = FlagReader::new(reader);
        flags.add(TaskFlags::EXCLUSIVE)?;
        flags.add(TaskFlags::UNCHECKED)?;
        if *version >= inno_version(2, 0, 5, 0) {
            flags.add(TaskFlags::RESTART)?;
        }
        if *version >= inno_version(2, 0, 6, 0) {
            flags.add(TaskFlags::CHECKED_ONCE)?;
        }
        if *version >= inno_version(4, 2, 3, 0) {
            flags.add(TaskFlags::DONT_INHERIT_CHECK)?;
        }
        entry.options = flags.finish(version)?;

        Ok(entry)
    }
}
