//! Install-time and uninstall-time run entries; both use the same layout.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::read::{FlagReader, read_encoded_string, read_stored_enum};
use crate::setup::item::SetupItem;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RunFlags: u16 {
        const SHELL_EXEC = 1 << 0;
        const SKIP_IF_DOESNT_EXIST = 1 << 1;
        const POST_INSTALL = 1 << 2;
        const UNCHECKED = 1 << 3;
        const SKIP_IF_SILENT = 1 << 4;
        const SKIP_IF_NOT_SILENT = 1 << 5;
        const HIDE_WIZARD = 1 << 6;
        const BITS_32 = 1 << 7;
        const BITS_64 = 1 << 8;
        const RUN_AS_ORIGINAL_USER = 1 << 9;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunWait {
    #[default]
    WaitUntilTerminated,
    NoWait,
    WaitUntilIdle,
}

#[derive(Debug, Clone, Default)]
pub struct RunEntry {
    pub name: String,
    pub parameters: String,
    pub working_dir: String,
    pub run_once_id: String,
    pub status_message: String,
    pub verb: String,
    pub description: String,
    pub show_command: i32,
    pub wait: RunWait,
    pub options: RunFlags,
    pub item: SetupItem,
}

impl RunEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = RunEntry::default();

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the entry.
            reader.read_u32::<LE>()?;
        }

        entry.name = read_encoded_string(reader, codepage)?;
        entry.parameters = read_encoded_string(reader, codepage)?;
        entry.working_dir = read_encoded_string(reader, codepage)?;
        if *version >= inno_version(1, 3, 21, 0) {
            entry.run_once_id = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(2, 0, 2, 0) {
            entry.status_message = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(5, 1, 13, 0) {
            entry.verb = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(2, 0, 0, 0) {
            entry.description = read_encoded_string(reader, codepage)?;
        }

        entry.item.load_condition_data(reader, version, codepage)?;
        entry.item.load_version_data(reader, version)?;

        if *version >= inno_version(1, 3, 21, 0) {
            entry.show_command = reader.read_i32::<LE>()?;
        }

        entry.wait = read_stored_enum(
            reader,
            &[
                RunWait::WaitUntilTerminated,
                RunWait::NoWait,
                RunWait::WaitUntilIdle,
            ],
            RunWait::WaitUntilTerminated,
        )?;

        use RunFlags as F;
        let mut flags = FlagReader::new(reader);
        flags.add(F::SHELL_EXEC)?;
        if *version >= inno_version(1, 3, 21, 0) {
            flags.add(F::SKIP_IF_DOESNT_EXIST)?;
        }
        if *version >= inno_version(2, 0, 0, 0) {
            flags.add(F::POST_INSTALL)?;
            flags.add(F::UNCHECKED)?;
            flags.add(F::SKIP_IF_SILENT)?;
            flags.add(F::SKIP_IF_NOT_SILENT)?;
        }
        if *version >= inno_version(2, 0, 8, 0) {
            flags.add(F::HIDE_WIZARD)?;
        }
        if *version >= inno_version(5, 1, 10, 0) {
            flags.add(F::BITS_32)?;
            flags.add(F::BITS_64)?;
        }
        if *version >= inno_version(5, 2, 0, 0) {
            flags.add(F::RUN_AS_ORIGINAL_USER)?;
        }
        entry.options = flags.finish(version)?;

        Ok(entry)
    }
}
