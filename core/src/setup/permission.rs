//! Permission entries: opaque ACL blobs referenced by index from directory,
//! file and registry entries.

use std::io::{self, Read};

use crate::read::read_binary_string;

#[derive(Debug, Clone, Default)]
pub struct PermissionEntry {
    /// Raw security descriptor data, kept verbatim.
    pub permissions: Vec<u8>,
}

impl PermissionEntry {
    pub fn load<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(PermissionEntry {
            permissions: read_binary_string(reader)?,
        })
    }
}
