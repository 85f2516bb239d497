//! Install-time and uninstall-time delete entries; both use the same
//! record layout.

use std::io::{self, Read};

use byteorder::{LE, ReadBytesExt};

use crate::read::{read_encoded_string, read_stored_enum};
use crate::setup::item::SetupItem;
use crate::version::{InnoVersion, inno_version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteType {
    #[default]
    Files,
    FilesAndSubdirs,
    DirIfEmpty,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteEntry {
    pub name: String,
    pub delete_type: DeleteType,
    pub item: SetupItem,
}

impl DeleteEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = DeleteEntry::default();

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the entry.
            reader.read_u32::<LE>()?;
        }

        entry.name = read_encoded_string(reader, codepage)?;
        entry.item.load_condition_data(reader, version, codepage)?;
        entry.item.load_version_data(reader, version)?;

        entry.delete_type = read_stored_enum(
            reader,
            &[
                DeleteType::Files,
                DeleteType::FilesAndSubdirs,
                DeleteType::DirIfEmpty,
            ],
            DeleteType::Files,
        )?;

        Ok(entry)
    }
}
