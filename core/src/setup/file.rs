//! File entries: where a stored payload should be installed. The actual
//! bytes live in the file-location table referenced by `location`.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string, read_stored_enum, read_u32_dyn};
use crate::setup::item::SetupItem;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FileFlags: u64 {
        const CONFIRM_OVERWRITE = 1 << 0;
        const NEVER_UNINSTALL = 1 << 1;
        const RESTART_REPLACE = 1 << 2;
        const DELETE_AFTER_INSTALL = 1 << 3;
        const REGISTER_SERVER = 1 << 4;
        const REGISTER_TYPE_LIB = 1 << 5;
        const SHARED_FILE = 1 << 6;
        const COMPARE_TIMESTAMP = 1 << 7;
        const FONT_IS_NOT_TRUE_TYPE = 1 << 8;
        const SKIP_IF_SOURCE_DOESNT_EXIST = 1 << 9;
        const OVERWRITE_READONLY = 1 << 10;
        const OVERWRITE_SAME_VERSION = 1 << 11;
        const CUSTOM_DEST_NAME = 1 << 12;
        const ONLY_IF_DEST_FILE_EXISTS = 1 << 13;
        const NO_REG_ERROR = 1 << 14;
        const UNINS_RESTART_DELETE = 1 << 15;
        const ONLY_IF_DOESNT_EXIST = 1 << 16;
        const IGNORE_VERSION = 1 << 17;
        const PROMPT_IF_OLDER = 1 << 18;
        const DONT_COPY = 1 << 19;
        const UNINS_REMOVE_READ_ONLY = 1 << 20;
        const RECURSE_SUB_DIRS_EXTERNAL = 1 << 21;
        const REPLACE_SAME_VERSION_IF_CONTENTS_DIFFER = 1 << 22;
        const DONT_VERIFY_CHECKSUM = 1 << 23;
        const UNINS_NO_SHARED_FILE_PROMPT = 1 << 24;
        const CREATE_ALL_SUB_DIRS = 1 << 25;
        const BITS_32 = 1 << 26;
        const BITS_64 = 1 << 27;
        const EXTERNAL_SIZE_PRESET = 1 << 28;
        const SET_NTFS_COMPRESSION = 1 << 29;
        const UNSET_NTFS_COMPRESSION = 1 << 30;
        const GAC_INSTALL = 1 << 31;
        const IS_README_FILE = 1 << 32;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    #[default]
    UserFile,
    UninstallExe,
    RegSvrExe,
}

#[derive(Debug, Clone, Default)]
pub struct FileEntry {
    pub source: String,
    pub destination: String,
    pub install_font_name: String,
    pub strong_assembly_name: String,
    pub attributes: u32,
    pub external_size: u64,
    /// Index into the permission entry list, -1 if none.
    pub permission: i16,
    pub options: FileFlags,
    pub file_type: FileType,
    /// Index into the file location table; `None` for external files.
    pub location: Option<u32>,
    /// Follow-up locations for files split over consecutive chunks.
    pub additional_locations: Vec<u32>,
    pub item: SetupItem,
}

impl FileEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = FileEntry {
            permission: -1,
            ..FileEntry::default()
        };

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the entry.
            reader.read_u32::<LE>()?;
        }

        entry.source = read_encoded_string(reader, codepage)?;
        entry.destination = read_encoded_string(reader, codepage)?;
        entry.install_font_name = read_encoded_string(reader, codepage)?;
        if *version >= inno_version(5, 2, 5, 0) {
            entry.strong_assembly_name = read_encoded_string(reader, codepage)?;
        }

        entry.item.load_condition_data(reader, version, codepage)?;
        entry.item.load_version_data(reader, version)?;

        let location = read_u32_dyn(reader, version.bits)?;
        let no_location = if version.bits == 16 {
            u32::from(u16::MAX)
        } else {
            u32::MAX
        };
        entry.location = (location != no_location).then_some(location);
        entry.attributes = read_u32_dyn(reader, version.bits)?;
        entry.external_size = if *version >= inno_version(4, 0, 0, 0) {
            reader.read_u64::<LE>()?
        } else {
            u64::from(read_u32_dyn(reader, version.bits)?)
        };

        if *version >= inno_version(4, 1, 0, 0) {
            entry.permission = reader.read_i16::<LE>()?;
        }

        use FileFlags as F;
        let mut flags = FlagReader::new(reader);
        flags.add(F::CONFIRM_OVERWRITE)?;
        flags.add(F::NEVER_UNINSTALL)?;
        flags.add(F::RESTART_REPLACE)?;
        flags.add(F::DELETE_AFTER_INSTALL)?;
        if version.bits != 16 {
            flags.add(F::REGISTER_SERVER)?;
            flags.add(F::REGISTER_TYPE_LIB)?;
            flags.add(F::SHARED_FILE)?;
        }
        if *version < inno_version(2, 0, 0, 0) {
            flags.add(F::IS_README_FILE)?;
        }
        flags.add(F::COMPARE_TIMESTAMP)?;
        flags.add(F::FONT_IS_NOT_TRUE_TYPE)?;
        flags.add(F::SKIP_IF_SOURCE_DOESNT_EXIST)?;
        flags.add(F::OVERWRITE_READONLY)?;
        if *version >= inno_version(1, 3, 21, 0) {
            flags.add(F::OVERWRITE_SAME_VERSION)?;
            flags.add(F::CUSTOM_DEST_NAME)?;
        }
        if *version >= inno_version(1, 3, 25, 0) {
            flags.add(F::ONLY_IF_DEST_FILE_EXISTS)?;
        }
        if *version >= inno_version(2, 0, 5, 0) {
            flags.add(F::NO_REG_ERROR)?;
        }
        if *version >= inno_version(3, 0, 1, 0) {
            flags.add(F::UNINS_RESTART_DELETE)?;
        }
        if *version >= inno_version(3, 0, 5, 0) {
            flags.add(F::ONLY_IF_DOESNT_EXIST)?;
            flags.add(F::IGNORE_VERSION)?;
            flags.add(F::PROMPT_IF_OLDER)?;
        }
        if *version >= inno_version(4, 0, 0, 0) {
            flags.add(F::DONT_COPY)?;
        }
        if *version >= inno_version(4, 0, 5, 0) {
            flags.add(F::UNINS_REMOVE_READ_ONLY)?;
        }
        if *version >= inno_version(4, 1, 8, 0) {
            flags.add(F::RECURSE_SUB_DIRS_EXTERNAL)?;
        }
        if *version >= inno_version(4, 2, 1, 0) {
            flags.add(F::REPLACE_SAME_VERSION_IF_CONTENTS_DIFFER)?;
        }
        if *version >= inno_version(4, 2, 5, 0) {
            flags.add(F::DONT_VERIFY_CHECKSUM)?;
        }
        if *version >= inno_version(5, 0, 3, 0) {
            flags.add(F::UNINS_NO_SHARED_FILE_PROMPT)?;
        }
        if *version >= inno_version(5, 1, 0, 0) {
            flags.add(F::CREATE_ALL_SUB_DIRS)?;
        }
        if *version >= inno_version(5, 1, 2, 0) {
            flags.add(F::BITS_32)?;
            flags.add(F::BITS_64)?;
        }
        if *version >= inno_version(5, 2, 0, 0) {
            flags.add(F::EXTERNAL_SIZE_PRESET)?;
            flags.add(F::SET_NTFS_COMPRESSION)?;
            flags.add(F::UNSET_NTFS_COMPRESSION)?;
        }
        if *version >= inno_version(5, 2, 5, 0) {
            flags.add(F::GAC_INSTALL)?;
        }
        entry.options = flags.finish(version)?;

        let types = [
            FileType::UserFile,
            FileType::UninstallExe,
            FileType::RegSvrExe,
        ];
        entry.file_type = if version.bits == 16 || *version >= inno_version(5, 0, 0, 0) {
            read_stored_enum(reader, &types[..2], FileType::UserFile)?
        } else {
            read_stored_enum(reader, &types, FileType::UserFile)?
        };

        Ok(entry)
    }
}
