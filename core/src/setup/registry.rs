//! Registry edit entries.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string, read_stored_enum};
use crate::setup::item::SetupItem;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RegistryFlags: u16 {
        const CREATE_VALUE_IF_DOESNT_EXIST = 1 << 0;
        const UNINS_DELETE_VALUE = 1 << 1;
        const UNINS_CLEAR_VALUE = 1 << 2;
        const UNINS_DELETE_ENTIRE_KEY = 1 << 3;
        const UNINS_DELETE_ENTIRE_KEY_IF_EMPTY = 1 << 4;
        const PRESERVE_STRING_TYPE = 1 << 5;
        const DELETE_KEY = 1 << 6;
        const DELETE_VALUE = 1 << 7;
        const NO_ERROR = 1 << 8;
        const DONT_CREATE_KEY = 1 << 9;
        const BITS_32 = 1 << 10;
        const BITS_64 = 1 << 11;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryHive {
    #[default]
    Unset,
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    PerformanceData,
    CurrentConfig,
    DynData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistryValueType {
    #[default]
    None,
    String,
    ExpandString,
    DWord,
    Binary,
    MultiString,
    QWord,
}

#[derive(Debug, Clone, Default)]
pub struct RegistryEntry {
    pub key: String,
    pub name: String,
    pub value: String,
    pub permissions: String,
    pub hive: RegistryHive,
    /// Index into the permission entry list, -1 if none.
    pub permission: i16,
    pub value_type: RegistryValueType,
    pub options: RegistryFlags,
    pub item: SetupItem,
}

const HIVES: [RegistryHive; 8] = [
    RegistryHive::ClassesRoot,
    RegistryHive::CurrentUser,
    RegistryHive::LocalMachine,
    RegistryHive::Users,
    RegistryHive::PerformanceData,
    RegistryHive::CurrentConfig,
    RegistryHive::DynData,
    RegistryHive::Unset,
];

impl RegistryEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = RegistryEntry {
            permission: -1,
            ..RegistryEntry::default()
        };

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the entry.
            reader.read_u32::<LE>()?;
        }

        entry.key = read_encoded_string(reader, codepage)?;
        entry.name = read_encoded_string(reader, codepage)?;
        entry.value = read_encoded_string(reader, codepage)?;

        entry.item.load_condition_data(reader, version, codepage)?;

        if *version >= inno_version(4, 0, 11, 0) && *version < inno_version(4, 1, 0, 0) {
            entry.permissions = read_encoded_string(reader, codepage)?;
        }

        entry.item.load_version_data(reader, version)?;

        // Hives are stored as HKEY constants with the high bit set.
        let hive_value = reader.read_u32::<LE>()?;
        entry.hive = if hive_value & 0x8000_0000 != 0 {
            HIVES
                .get((hive_value & 0x7fff_ffff) as usize)
                .copied()
                .unwrap_or(RegistryHive::Unset)
        } else {
            RegistryHive::Unset
        };

        if *version >= inno_version(4, 1, 0, 0) {
            entry.permission = reader.read_i16::<LE>()?;
        }

        use RegistryValueType as T;
        entry.value_type = if *version >= inno_version(5, 2, 5, 0) {
            read_stored_enum(
                reader,
                &[
                    T::None,
                    T::String,
                    T::ExpandString,
                    T::DWord,
                    T::Binary,
                    T::MultiString,
                    T::QWord,
                ],
                T::None,
            )?
        } else {
            read_stored_enum(
                reader,
                &[
                    T::None,
                    T::String,
                    T::ExpandString,
                    T::DWord,
                    T::Binary,
                    T::MultiString,
                ],
                T::None,
            )?
        };

        use RegistryFlags as F;
        let mut flags = FlagReader::new(reader);
        flags.add(F::CREATE_VALUE_IF_DOESNT_EXIST)?;
        flags.add(F::UNINS_DELETE_VALUE)?;
        flags.add(F::UNINS_CLEAR_VALUE)?;
        flags.add(F::UNINS_DELETE_ENTIRE_KEY)?;
        flags.add(F::UNINS_DELETE_ENTIRE_KEY_IF_EMPTY)?;
        flags.add(F::PRESERVE_STRING_TYPE)?;
        if *version >= inno_version(1, 3, 21, 0) {
            flags.add(F::DELETE_KEY)?;
            flags.add(F::DELETE_VALUE)?;
            flags.add(F::NO_ERROR)?;
            flags.add(F::DONT_CREATE_KEY)?;
        }
        if *version >= inno_version(5, 1, 0, 0) {
            flags.add(F::BITS_32)?;
            flags.add(F::BITS_64)?;
        }
        entry.options = flags.finish(version)?;

        Ok(entry)
    }
}
