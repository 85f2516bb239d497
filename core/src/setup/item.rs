//! Common prefix shared by most entry kinds: applicability conditions and
//! the Windows version gate. The two halves sit at different positions in
//! each record, so they are loaded by separate calls.

use std::io::{self, Read};

use crate::read::read_encoded_string;
use crate::setup::windows::WindowsVersionRange;
use crate::version::{InnoVersion, inno_version};

#[derive(Debug, Clone, Default)]
pub struct SetupItem {
    pub components: String,
    pub tasks: String,
    pub languages: String,
    pub check: String,
    pub after_install: String,
    pub before_install: String,
    pub version_range: WindowsVersionRange,
}

impl SetupItem {
    pub fn load_condition_data<R: Read>(
        &mut self,
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<()> {
        if *version > inno_version(1, 3, 26, 0) {
            self.components = read_encoded_string(reader, codepage)?;
            self.tasks = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(4, 0, 1, 0) {
            self.languages = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(3, 0, 8, 0) {
            self.check = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(4, 1, 0, 0) {
            self.after_install = read_encoded_string(reader, codepage)?;
            self.before_install = read_encoded_string(reader, codepage)?;
        }
        Ok(())
    }

    pub fn load_version_data<R: Read>(
        &mut self,
        reader: &mut R,
        version: &InnoVersion,
    ) -> io::Result<()> {
        self.version_range = WindowsVersionRange::load(reader, version)?;
        Ok(())
    }
}
