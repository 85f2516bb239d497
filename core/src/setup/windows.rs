//! Windows version gates stored with the header and with every entry.

use std::io::{self, Read};

use byteorder::{LE, ReadBytesExt};

use crate::version::{InnoVersion, inno_version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowsVersionData {
    pub major: u8,
    pub minor: u8,
    pub build: u16,
}

impl WindowsVersionData {
    fn load<R: Read>(reader: &mut R, version: &InnoVersion) -> io::Result<Self> {
        let build = if *version >= inno_version(1, 3, 19, 0) {
            reader.read_u16::<LE>()?
        } else {
            0
        };
        let minor = reader.read_u8()?;
        let major = reader.read_u8()?;
        Ok(WindowsVersionData {
            major,
            minor,
            build,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowsVersion {
    pub win_version: WindowsVersionData,
    pub nt_version: WindowsVersionData,
    pub nt_service_pack_major: u8,
    pub nt_service_pack_minor: u8,
}

impl WindowsVersion {
    pub fn load<R: Read>(reader: &mut R, version: &InnoVersion) -> io::Result<Self> {
        let win_version = WindowsVersionData::load(reader, version)?;
        let nt_version = WindowsVersionData::load(reader, version)?;
        let (sp_minor, sp_major) = if *version >= inno_version(1, 3, 19, 0) {
            (reader.read_u8()?, reader.read_u8()?)
        } else {
            (0, 0)
        };
        Ok(WindowsVersion {
            win_version,
            nt_version,
            nt_service_pack_major: sp_major,
            nt_service_pack_minor: sp_minor,
        })
    }
}

/// Minimum and only-below gate pair, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowsVersionRange {
    pub min_version: WindowsVersion,
    pub only_below_version: WindowsVersion,
}

impl WindowsVersionRange {
    pub fn load<R: Read>(reader: &mut R, version: &InnoVersion) -> io::Result<Self> {
        Ok(WindowsVersionRange {
            min_version: WindowsVersion::load(reader, version)?,
            only_below_version: WindowsVersion::load(reader, version)?,
        })
    }
}
