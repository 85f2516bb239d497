//! Language table entries. Besides UI fonts, these carry the per-language
//! codepage used to decode message entries in legacy installers.

use std::io::{self, Read};

use byteorder::{LE, ReadBytesExt};

use crate::read::{read_binary_string, read_encoded_string};
use crate::version::{InnoVersion, inno_version};

#[derive(Debug, Clone, Default)]
pub struct LanguageEntry {
    pub name: String,
    pub language_name: String,
    pub dialog_font: String,
    pub title_font: String,
    pub welcome_font: String,
    pub copyright_font: String,
    pub data: Vec<u8>,
    pub license_text: String,
    pub info_before: String,
    pub info_after: String,
    pub language_id: u32,
    pub codepage: u32,
    pub dialog_font_size: u32,
    pub dialog_font_standard_height: u32,
    pub title_font_size: u32,
    pub welcome_font_size: u32,
    pub copyright_font_size: u32,
    pub right_to_left: bool,
}

impl LanguageEntry {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut entry = LanguageEntry::default();

        if *version >= inno_version(4, 0, 0, 0) {
            entry.name = read_encoded_string(reader, codepage)?;
        } else {
            entry.name = "default".into();
        }

        // The display name is stored in UTF-16 once the format gained
        // per-language codepages.
        let name_codepage = if *version >= inno_version(4, 2, 2, 0) {
            1200
        } else {
            codepage
        };
        entry.language_name = read_encoded_string(reader, name_codepage)?;

        entry.dialog_font = read_encoded_string(reader, codepage)?;
        entry.title_font = read_encoded_string(reader, codepage)?;
        entry.welcome_font = read_encoded_string(reader, codepage)?;
        entry.copyright_font = read_encoded_string(reader, codepage)?;

        if *version >= inno_version(4, 0, 0, 0) {
            entry.data = read_binary_string(reader)?;
        }
        if *version >= inno_version(4, 0, 1, 0) {
            entry.license_text = read_encoded_string(reader, 1252)?;
            entry.info_before = read_encoded_string(reader, 1252)?;
            entry.info_after = read_encoded_string(reader, 1252)?;
        }

        entry.language_id = reader.read_u32::<LE>()?;

        if *version < inno_version(4, 2, 2, 0) {
            entry.codepage = 0;
        } else if !version.unicode {
            entry.codepage = reader.read_u32::<LE>()?;
        } else {
            if *version < inno_version(5, 3, 0, 0) {
                reader.read_u32::<LE>()?;
            }
            entry.codepage = 1200;
        }
        if entry.codepage == 0 {
            entry.codepage = codepage;
        }

        entry.dialog_font_size = reader.read_u32::<LE>()?;
        if *version < inno_version(4, 1, 0, 0) {
            entry.dialog_font_standard_height = reader.read_u32::<LE>()?;
        }
        entry.title_font_size = reader.read_u32::<LE>()?;
        entry.welcome_font_size = reader.read_u32::<LE>()?;
        entry.copyright_font_size = reader.read_u32::<LE>()?;

        if *version >= inno_version(5, 2, 3, 0) {
            entry.right_to_left = reader.read_u8()? != 0;
        }

        Ok(entry)
    }
}
