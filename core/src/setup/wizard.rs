//! Wizard image blobs and the optional decompressor DLL stored between the
//! entry tables. The content is opaque to extraction but must be consumed to
//! keep the metadata stream in sync.

use std::io::{self, Read};

use byteorder::{LE, ReadBytesExt};

use crate::read::read_binary_string;
use crate::setup::header::SetupHeader;
use crate::stream::CompressionMethod;
use crate::version::{InnoVersion, inno_version};

#[derive(Debug, Clone, Default)]
pub struct WizardData {
    pub images: Vec<Vec<u8>>,
    pub small_images: Vec<Vec<u8>>,
    pub decompressor_dll: Vec<u8>,
}

fn read_image_list<R: Read>(reader: &mut R, version: &InnoVersion) -> io::Result<Vec<Vec<u8>>> {
    let count = if *version >= inno_version(5, 6, 0, 0) {
        reader.read_u32::<LE>()?
    } else {
        1
    };
    (0..count).map(|_| read_binary_string(reader)).collect()
}

impl WizardData {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        header: &SetupHeader,
    ) -> io::Result<Self> {
        let mut data = WizardData {
            images: read_image_list(reader, version)?,
            ..WizardData::default()
        };

        if *version >= inno_version(2, 0, 0, 0) {
            data.small_images = read_image_list(reader, version)?;
        }

        // Setup bundles the decompressor it needs at runtime.
        let needs_dll = match header.compression {
            CompressionMethod::BZip2 => true,
            CompressionMethod::Lzma1 => *version == inno_version(4, 1, 5, 0),
            CompressionMethod::Zlib => *version >= inno_version(4, 2, 6, 0),
            _ => false,
        };
        if needs_dll {
            data.decompressor_dll = read_binary_string(reader)?;
        }

        Ok(data)
    }
}
