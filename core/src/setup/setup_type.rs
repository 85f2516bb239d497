//! Setup type entries (full / compact / custom install choices).

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string, read_stored_enum};
use crate::setup::windows::WindowsVersionRange;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TypeFlags: u8 {
        const CUSTOM_SETUP_TYPE = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupType {
    #[default]
    User,
    DefaultFull,
    DefaultCompact,
    DefaultCustom,
}

#[derive(Debug, Clone, Default)]
pub struct TypeEntry {
    pub name: String,
    pub description: String,
    pub languages: String,
    pub check: String,
    pub version_range: WindowsVersionRange,
    pub options: TypeFlags,
    pub setup_type: SetupType,
    pub size: u64,
}

impl TypeEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = TypeEntry {
            name: read_encoded_string(reader, codepage)?,
            description: read_encoded_string(reader, codepage)?,
            ..TypeEntry::default()
        };
        if *version >= inno_version(4, 0, 1, 0) {
            entry.languages = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(4, 0, 0, 0) {
            entry.check = read_encoded_string(reader, codepage)?;
        }

        entry.version_range = WindowsVersionRange::load(reader, version)?;

        let mut flags = FlagReader::new(reader);
        flags.add(TypeFlags::CUSTOM_SETUP_TYPE)?;
        entry.options = flags.finish(version)?;

        if *version >= inno_version(4, 0, 3, 0) {
            entry.setup_type = read_stored_enum(
                reader,
                &[
                    SetupType::User,
                    SetupType::DefaultFull,
                    SetupType::DefaultCompact,
                    SetupType::DefaultCustom,
                ],
                SetupType::User,
            )?;
        }

        entry.size = if *version >= inno_version(4, 0, 0, 0) {
            reader.read_u64::<LE>()?
        } else {
            u64::from(reader.read_u32::<LE>()?)
        };

        Ok(entry)
    }
}
