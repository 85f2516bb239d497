//! Decoders for the versioned setup metadata records and the aggregate
//! [`Info`] loader that reads both metadata blocks.

pub mod component;
pub mod delete;
pub mod directory;
pub mod file;
pub mod header;
pub mod icon;
pub mod ini;
pub mod item;
pub mod language;
pub mod location;
pub mod message;
pub mod permission;
pub mod registry;
pub mod run;
pub mod setup_type;
pub mod task;
pub mod windows;
pub mod wizard;

use std::io::{Read, Seek, SeekFrom};

use log::{debug, warn};

pub use component::ComponentEntry;
pub use delete::DeleteEntry;
pub use directory::DirectoryEntry;
pub use file::{FileEntry, FileFlags};
pub use header::SetupHeader;
pub use icon::IconEntry;
pub use ini::IniEntry;
pub use language::LanguageEntry;
pub use location::{CallFilter, FileLocationEntry, LocationFlags};
pub use message::MessageEntry;
pub use permission::PermissionEntry;
pub use registry::RegistryEntry;
pub use run::RunEntry;
pub use setup_type::TypeEntry;
pub use task::TaskEntry;
pub use wizard::WizardData;

use crate::error::{InnoError, Result};
use crate::loader::SetupOffsets;
use crate::stream::BlockReader;
use crate::version::{InnoVersion, inno_version};

/// Knobs affecting metadata loading.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Proceed with a guessed version tuple for unknown signatures.
    pub accept_unknown_version: bool,
    /// Replaces the default legacy codepage (1252) for string decoding.
    pub codepage_override: Option<u32>,
}

/// Fully decoded setup metadata: everything from both framed blocks.
#[derive(Debug, Default)]
pub struct Info {
    pub version: InnoVersion,
    pub codepage: u32,
    pub header: SetupHeader,
    pub languages: Vec<LanguageEntry>,
    pub messages: Vec<MessageEntry>,
    pub permissions: Vec<PermissionEntry>,
    pub types: Vec<TypeEntry>,
    pub components: Vec<ComponentEntry>,
    pub tasks: Vec<TaskEntry>,
    pub directories: Vec<DirectoryEntry>,
    pub files: Vec<FileEntry>,
    pub icons: Vec<IconEntry>,
    pub ini_entries: Vec<IniEntry>,
    pub registry_entries: Vec<RegistryEntry>,
    pub delete_entries: Vec<DeleteEntry>,
    pub uninstall_delete_entries: Vec<DeleteEntry>,
    pub run_entries: Vec<RunEntry>,
    pub uninstall_run_entries: Vec<RunEntry>,
    pub wizard: WizardData,
    pub file_locations: Vec<FileLocationEntry>,
    /// Count of non-fatal oddities found while decoding (trailing bytes).
    pub warnings: u32,
}

fn load_entries<R: Read, T>(
    reader: &mut R,
    count: u32,
    mut load: impl FnMut(&mut R) -> std::io::Result<T>,
) -> Result<Vec<T>> {
    (0..count)
        .map(|_| load(reader).map_err(InnoError::from_read))
        .collect()
}

impl Info {
    /// Reads the version signature and both metadata blocks, leaving the
    /// reader positioned past the second block.
    pub fn load<R: Read + Seek>(
        reader: &mut R,
        offsets: &SetupOffsets,
        options: &LoadOptions,
    ) -> Result<Self> {
        reader.seek(SeekFrom::Start(u64::from(offsets.header_offset)))?;

        let version = InnoVersion::load(reader, options.accept_unknown_version)?;
        debug!("[setup] data version {version}");
        if !version.known {
            warn!("[setup] proceeding with guessed version {version}");
        }
        if version.suspicious && version.known {
            debug!("[setup] signature is shared by multiple releases");
        }

        let codepage = options.codepage_override.unwrap_or_else(|| version.codepage());

        let mut info = Info {
            codepage,
            warnings: if version.known { 0 } else { 1 },
            ..Info::default()
        };

        let second_block_offset;
        {
            let mut block = BlockReader::open(reader, &version)?;

            info.header = SetupHeader::load(&mut block, &version, codepage)
                .map_err(InnoError::from_read)?;
            let header = info.header.clone();
            debug!(
                "[setup] app {:?}, {} files in {} locations",
                header.app_name, header.file_count, header.file_location_count
            );

            info.languages = load_entries(&mut block, header.language_count, |r| {
                LanguageEntry::load(r, &version, codepage)
            })?;

            if version < inno_version(4, 0, 0, 0) {
                info.wizard = WizardData::load(&mut block, &version, &header)
                    .map_err(InnoError::from_read)?;
            }

            let languages = info.languages.clone();
            info.messages = load_entries(&mut block, header.message_count, |r| {
                MessageEntry::load(r, &version, &languages, codepage)
            })?;
            info.permissions = load_entries(&mut block, header.permission_count, |r| {
                PermissionEntry::load(r)
            })?;
            info.types = load_entries(&mut block, header.type_count, |r| {
                TypeEntry::load(r, &version, codepage)
            })?;
            info.components = load_entries(&mut block, header.component_count, |r| {
                ComponentEntry::load(r, &version, codepage)
            })?;
            info.tasks = load_entries(&mut block, header.task_count, |r| {
                TaskEntry::load(r, &version, codepage)
            })?;
            info.directories = load_entries(&mut block, header.directory_count, |r| {
                DirectoryEntry::load(r, &version, codepage)
            })?;
            info.files = load_entries(&mut block, header.file_count, |r| {
                FileEntry::load(r, &version, codepage)
            })?;
            info.icons = load_entries(&mut block, header.icon_count, |r| {
                IconEntry::load(r, &version, codepage)
            })?;
            info.ini_entries = load_entries(&mut block, header.ini_entry_count, |r| {
                IniEntry::load(r, &version, codepage)
            })?;
            info.registry_entries = load_entries(&mut block, header.registry_entry_count, |r| {
                RegistryEntry::load(r, &version, codepage)
            })?;
            info.delete_entries = load_entries(&mut block, header.delete_entry_count, |r| {
                DeleteEntry::load(r, &version, codepage)
            })?;
            info.uninstall_delete_entries =
                load_entries(&mut block, header.uninstall_delete_entry_count, |r| {
                    DeleteEntry::load(r, &version, codepage)
                })?;
            info.run_entries = load_entries(&mut block, header.run_entry_count, |r| {
                RunEntry::load(r, &version, codepage)
            })?;
            info.uninstall_run_entries =
                load_entries(&mut block, header.uninstall_run_entry_count, |r| {
                    RunEntry::load(r, &version, codepage)
                })?;

            if version >= inno_version(4, 0, 0, 0) {
                info.wizard = WizardData::load(&mut block, &version, &info.header)
                    .map_err(InnoError::from_read)?;
            }

            if !block.at_end() {
                warn!("[setup] expected end of primary header stream");
                info.warnings += 1;
            }
            second_block_offset = block.end_offset();
        }

        // The file location entries live in a second framed block.
        reader.seek(SeekFrom::Start(second_block_offset))?;
        {
            let mut block = BlockReader::open(reader, &version)?;
            let header = info.header.clone();
            info.file_locations =
                load_entries(&mut block, header.file_location_count, |r| {
                    FileLocationEntry::load(r, &version, &header)
                })?;

            if !block.at_end() {
                warn!("[setup] expected end of file location stream");
                info.warnings += 1;
            }
        }

        info.version = version;
        Ok(info)
    }
}
