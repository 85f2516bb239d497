//! Custom message entries. The value bytes are decoded with the codepage of
//! the language the entry belongs to (or the installer default for -1).

use std::io::{self, Read};

use byteorder::{LE, ReadBytesExt};
use log::warn;

use crate::encoding::decode_string;
use crate::read::{read_binary_string, read_encoded_string};
use crate::setup::language::LanguageEntry;
use crate::version::InnoVersion;

#[derive(Debug, Clone, Default)]
pub struct MessageEntry {
    pub name: String,
    pub value: String,
    /// Index into the language table, or -1 for the default language.
    pub language: i32,
}

impl MessageEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        _version: &InnoVersion,
        languages: &[LanguageEntry],
        codepage: u32,
    ) -> io::Result<Self> {
        let name = read_encoded_string(reader, codepage)?;
        let raw_value = read_binary_string(reader)?;
        let language = reader.read_i32::<LE>()?;

        let value_codepage = match usize::try_from(language) {
            Ok(index) if index < languages.len() => languages[index].codepage,
            Ok(_) => {
                warn!("unexpected language index {language} for message {name:?}");
                codepage
            }
            Err(_) => codepage,
        };

        Ok(MessageEntry {
            name,
            value: decode_string(&raw_value, value_codepage),
            language,
        })
    }
}
