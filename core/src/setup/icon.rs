//! Shortcut (icon) entries.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string, read_stored_enum};
use crate::setup::item::SetupItem;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IconFlags: u8 {
        const NEVER_UNINSTALL = 1 << 0;
        const CREATE_ONLY_IF_FILE_EXISTS = 1 << 1;
        const USE_APP_PATHS = 1 << 2;
        const FOLDER_SHORTCUT = 1 << 3;
        const EXCLUDE_FROM_SHOW_IN_NEW_INSTALL = 1 << 4;
        const PREVENT_PINNING = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseOnExit {
    #[default]
    NoSetting,
    Yes,
    No,
}

#[derive(Debug, Clone, Default)]
pub struct IconEntry {
    pub name: String,
    pub filename: String,
    pub parameters: String,
    pub working_dir: String,
    pub icon_file: String,
    pub comment: String,
    pub app_user_model_id: String,
    pub icon_index: i32,
    pub show_command: i32,
    pub close_on_exit: CloseOnExit,
    pub hotkey: u16,
    pub options: IconFlags,
    pub item: SetupItem,
}

impl IconEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = IconEntry {
            show_command: 1,
            ..IconEntry::default()
        };

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the entry.
            reader.read_u32::<LE>()?;
        }

        entry.name = read_encoded_string(reader, codepage)?;
        entry.filename = read_encoded_string(reader, codepage)?;
        entry.parameters = read_encoded_string(reader, codepage)?;
        entry.working_dir = read_encoded_string(reader, codepage)?;
        entry.icon_file = read_encoded_string(reader, codepage)?;
        entry.comment = read_encoded_string(reader, codepage)?;

        entry.item.load_condition_data(reader, version, codepage)?;

        if *version >= inno_version(5, 3, 5, 0) {
            entry.app_user_model_id = read_encoded_string(reader, codepage)?;
        }

        entry.item.load_version_data(reader, version)?;

        entry.icon_index = reader.read_i32::<LE>()?;
        if *version >= inno_version(1, 3, 24, 0) {
            entry.show_command = reader.read_i32::<LE>()?;
        }
        if *version >= inno_version(1, 3, 15, 0) {
            entry.close_on_exit = read_stored_enum(
                reader,
                &[CloseOnExit::NoSetting, CloseOnExit::Yes, CloseOnExit::No],
                CloseOnExit::NoSetting,
            )?;
        }
        if *version >= inno_version(2, 0, 7, 0) {
            entry.hotkey = reader.read_u16::<LE>()?;
        }

        let mut flags = FlagReader::new(reader);
        if *version < inno_version(1, 3, 26, 0) {
            flags.add(IconFlags::NEVER_UNINSTALL)?;
        }
        flags.add(IconFlags::CREATE_ONLY_IF_FILE_EXISTS)?;
        if version.bits != 16 {
            flags.add(IconFlags::USE_APP_PATHS)?;
        }
        if *version >= inno_version(5, 0, 3, 0) {
            flags.add(IconFlags::FOLDER_SHORTCUT)?;
        }
        if *version >= inno_version(5, 4, 2, 0) {
            flags.add(IconFlags::EXCLUDE_FROM_SHOW_IN_NEW_INSTALL)?;
        }
        if *version >= inno_version(5, 5, 0, 0) {
            flags.add(IconFlags::PREVENT_PINNING)?;
        }
        entry.options = flags.finish(version)?;

        Ok(entry)
    }
}
