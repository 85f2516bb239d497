//! Global setup header: application metadata, entry counts, password
//! material and the chosen compression method. Field order is dictated by
//! the format version; the conditionals below mirror the on-disk layout
//! exactly, since a single skipped or extra field desynchronizes the stream.

use std::io::{self, Read};

use bitflags::bitflags;
use byteorder::{LE, ReadBytesExt};

use crate::crypto::Checksum;
use crate::read::{
    FlagReader, read_ansi_string, read_binary_string, read_encoded_string, read_i32_dyn,
    read_stored_enum, read_u32_dyn,
};
use crate::setup::windows::WindowsVersion;
use crate::stream::CompressionMethod;
use crate::version::{InnoVersion, inno_version};

bitflags! {
    /// Display and behavior switches collected from the version-dependent
    /// option bitfield (plus a few synthesized from obsolete flags).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeaderFlags: u64 {
        const DISABLE_STARTUP_PROMPT = 1 << 0;
        const CREATE_APP_DIR = 1 << 1;
        const ALLOW_NO_ICONS = 1 << 2;
        const ALWAYS_RESTART = 1 << 3;
        const ALWAYS_USE_PERSONAL_GROUP = 1 << 4;
        const WINDOW_VISIBLE = 1 << 5;
        const WINDOW_SHOW_CAPTION = 1 << 6;
        const WINDOW_RESIZABLE = 1 << 7;
        const WINDOW_START_MAXIMIZED = 1 << 8;
        const ENABLE_DIR_DOESNT_EXIST_WARNING = 1 << 9;
        const PASSWORD = 1 << 10;
        const ALLOW_ROOT_DIRECTORY = 1 << 11;
        const DISABLE_FINISHED_PAGE = 1 << 12;
        const CHANGES_ASSOCIATIONS = 1 << 13;
        const USE_PREVIOUS_APP_DIR = 1 << 14;
        const BACK_COLOR_HORIZONTAL = 1 << 15;
        const USE_PREVIOUS_GROUP = 1 << 16;
        const UPDATE_UNINSTALL_LOG_APP_NAME = 1 << 17;
        const USE_PREVIOUS_SETUP_TYPE = 1 << 18;
        const DISABLE_READY_MEMO = 1 << 19;
        const ALWAYS_SHOW_COMPONENTS_LIST = 1 << 20;
        const FLAT_COMPONENTS_LIST = 1 << 21;
        const SHOW_COMPONENT_SIZES = 1 << 22;
        const USE_PREVIOUS_TASKS = 1 << 23;
        const DISABLE_READY_PAGE = 1 << 24;
        const ALWAYS_SHOW_DIR_ON_READY_PAGE = 1 << 25;
        const ALWAYS_SHOW_GROUP_ON_READY_PAGE = 1 << 26;
        const ALLOW_UNC_PATH = 1 << 27;
        const USER_INFO_PAGE = 1 << 28;
        const USE_PREVIOUS_USER_INFO = 1 << 29;
        const UNINSTALL_RESTART_COMPUTER = 1 << 30;
        const RESTART_IF_NEEDED_BY_RUN = 1 << 31;
        const SHOW_TASKS_TREE_LINES = 1 << 32;
        const ALLOW_CANCEL_DURING_INSTALL = 1 << 33;
        const WIZARD_IMAGE_STRETCH = 1 << 34;
        const APPEND_DEFAULT_DIR_NAME = 1 << 35;
        const APPEND_DEFAULT_GROUP_NAME = 1 << 36;
        const ENCRYPTION_USED = 1 << 37;
        const CHANGES_ENVIRONMENT = 1 << 38;
        const SHOW_UNDISPLAYABLE_LANGUAGES = 1 << 39;
        const SETUP_LOGGING = 1 << 40;
        const SIGNED_UNINSTALLER = 1 << 41;
        const USE_PREVIOUS_LANGUAGE = 1 << 42;
        const DISABLE_WELCOME_PAGE = 1 << 43;
        const CLOSE_APPLICATIONS = 1 << 44;
        const RESTART_APPLICATIONS = 1 << 45;
        const ALLOW_NETWORK_DRIVE = 1 << 46;
        // Obsolete flags, only present in older formats.
        const UNINSTALLABLE = 1 << 47;
        const DISABLE_DIR_PAGE = 1 << 48;
        const DISABLE_PROGRAM_GROUP_PAGE = 1 << 49;
        const DISABLE_APPEND_DIR = 1 << 50;
        const ADMIN_PRIVILEGES_REQUIRED = 1 << 51;
        const ALWAYS_CREATE_UNINSTALL_ICON = 1 << 52;
        const CREATE_UNINSTALL_REG_KEY = 1 << 53;
        const BZIP_USED = 1 << 54;
        const SHOW_LANGUAGE_DIALOG = 1 << 55;
        const DETECT_LANGUAGE_USING_LOCALE = 1 << 56;
        const DISABLE_DIR_EXISTS_WARNING = 1 << 57;
        const BACK_SOLID = 1 << 58;
        const OVERWRITE_UNINST_REG_ENTRIES = 1 << 59;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Architectures: u8 {
        const UNKNOWN = 1 << 0;
        const X86 = 1 << 1;
        const AMD64 = 1 << 2;
        const IA64 = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    #[default]
    Normal,
    Silent,
    VerySilent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UninstallLogMode {
    #[default]
    Append,
    New,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UninstallStyle {
    #[default]
    Classic,
    Modern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoBool {
    #[default]
    Auto,
    No,
    Yes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privileges {
    #[default]
    None,
    PowerUser,
    Admin,
    Lowest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageDetection {
    #[default]
    UiLanguage,
    Locale,
    None,
}

#[derive(Debug, Clone, Default)]
pub struct SetupHeader {
    pub app_name: String,
    pub app_versioned_name: String,
    pub app_id: String,
    pub app_copyright: String,
    pub app_publisher: String,
    pub app_publisher_url: String,
    pub app_support_phone: String,
    pub app_support_url: String,
    pub app_updates_url: String,
    pub app_version: String,
    pub default_dir_name: String,
    pub default_group_name: String,
    pub uninstall_icon_name: String,
    pub base_filename: String,
    pub uninstall_files_dir: String,
    pub uninstall_display_name: String,
    pub uninstall_display_icon: String,
    pub app_mutex: String,
    pub default_user_name: String,
    pub default_user_organisation: String,
    pub default_serial: String,
    pub app_readme_file: String,
    pub app_contact: String,
    pub app_comments: String,
    pub app_modify_path: String,
    pub create_uninstall_registry_key: String,
    pub uninstallable: String,
    pub close_applications_filter: String,
    pub license_text: String,
    pub info_before: String,
    pub info_after: String,
    pub uninstaller_signature: Vec<u8>,
    pub compiled_code: Vec<u8>,

    pub lead_bytes: [u8; 32],

    pub language_count: u32,
    pub message_count: u32,
    pub permission_count: u32,
    pub type_count: u32,
    pub component_count: u32,
    pub task_count: u32,
    pub directory_count: u32,
    pub file_count: u32,
    pub file_location_count: u32,
    pub icon_count: u32,
    pub ini_entry_count: u32,
    pub registry_entry_count: u32,
    pub delete_entry_count: u32,
    pub uninstall_delete_entry_count: u32,
    pub run_entry_count: u32,
    pub uninstall_run_entry_count: u32,

    pub min_version: WindowsVersion,
    pub only_below_version: WindowsVersion,

    pub back_color: u32,
    pub back_color2: u32,
    pub image_back_color: u32,
    pub small_image_back_color: u32,

    pub password: Checksum,
    pub password_salt: [u8; 8],
    /// PBKDF2 parameters for the XChaCha20 generation.
    pub kdf_salt: [u8; 16],
    pub kdf_iterations: u32,

    pub extra_disk_space_required: i64,
    pub slices_per_disk: u32,

    pub install_mode: InstallMode,
    pub uninstall_log_mode: UninstallLogMode,
    pub uninstall_style: UninstallStyle,
    pub dir_exists_warning: AutoBool,
    pub privileges_required: Privileges,
    pub show_language_dialog: AutoBool,
    pub language_detection: LanguageDetection,
    pub compression: CompressionMethod,
    pub architectures_allowed: Architectures,
    pub architectures_installed_in_64bit_mode: Architectures,
    pub signed_uninstaller_original_size: u32,
    pub signed_uninstaller_header_checksum: u32,
    pub disable_dir_page: AutoBool,
    pub disable_program_group_page: AutoBool,
    pub uninstall_display_size: u64,

    pub options: HeaderFlags,
}

impl SetupHeader {
    pub fn load<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
        codepage: u32,
    ) -> io::Result<Self> {
        let mut header = SetupHeader::default();

        if *version < inno_version(1, 3, 21, 0) {
            // Uncompressed size of the header structure.
            reader.read_u32::<LE>()?;
        }

        header.app_name = read_encoded_string(reader, codepage)?;
        header.app_versioned_name = read_encoded_string(reader, codepage)?;
        if *version >= inno_version(1, 3, 21, 0) {
            header.app_id = read_encoded_string(reader, codepage)?;
        }
        header.app_copyright = read_encoded_string(reader, codepage)?;
        if *version >= inno_version(1, 3, 21, 0) {
            header.app_publisher = read_encoded_string(reader, codepage)?;
            header.app_publisher_url = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(5, 1, 13, 0) {
            header.app_support_phone = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(1, 3, 21, 0) {
            header.app_support_url = read_encoded_string(reader, codepage)?;
            header.app_updates_url = read_encoded_string(reader, codepage)?;
            header.app_version = read_encoded_string(reader, codepage)?;
        }
        header.default_dir_name = read_encoded_string(reader, codepage)?;
        header.default_group_name = read_encoded_string(reader, codepage)?;
        if *version < inno_version(3, 0, 0, 0) {
            header.uninstall_icon_name = read_ansi_string(reader)?;
        }
        header.base_filename = read_encoded_string(reader, codepage)?;
        if *version >= inno_version(1, 3, 21, 0) {
            if *version < inno_version(5, 2, 5, 0) {
                header.license_text = read_ansi_string(reader)?;
                header.info_before = read_ansi_string(reader)?;
                header.info_after = read_ansi_string(reader)?;
            }
            header.uninstall_files_dir = read_encoded_string(reader, codepage)?;
            header.uninstall_display_name = read_encoded_string(reader, codepage)?;
            header.uninstall_display_icon = read_encoded_string(reader, codepage)?;
            header.app_mutex = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(3, 0, 0, 0) {
            header.default_user_name = read_encoded_string(reader, codepage)?;
            header.default_user_organisation = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(3, 0, 6, 1) {
            header.default_serial = read_encoded_string(reader, codepage)?;
            if *version < inno_version(5, 2, 5, 0) {
                header.compiled_code = read_binary_string(reader)?;
            }
        }
        if *version >= inno_version(4, 2, 4, 0) {
            header.app_readme_file = read_encoded_string(reader, codepage)?;
            header.app_contact = read_encoded_string(reader, codepage)?;
            header.app_comments = read_encoded_string(reader, codepage)?;
            header.app_modify_path = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(5, 3, 8, 0) {
            header.create_uninstall_registry_key = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(5, 3, 10, 0) {
            header.uninstallable = read_encoded_string(reader, codepage)?;
        }
        if *version >= inno_version(5, 5, 6, 0) {
            header.close_applications_filter = read_encoded_string(reader, codepage)?;
        }
        // From 5.2.5 the large text blobs trail the uninstall fields.
        if *version >= inno_version(5, 2, 5, 0) {
            header.license_text = read_ansi_string(reader)?;
            header.info_before = read_ansi_string(reader)?;
            header.info_after = read_ansi_string(reader)?;
        }
        if *version >= inno_version(5, 2, 1, 0) && *version < inno_version(5, 3, 10, 0) {
            header.uninstaller_signature = read_binary_string(reader)?;
        }
        if *version >= inno_version(5, 2, 5, 0) {
            header.compiled_code = read_binary_string(reader)?;
        }

        if *version >= inno_version(2, 0, 6, 0) && !version.unicode {
            reader.read_exact(&mut header.lead_bytes)?;
        }

        header.language_count = if *version >= inno_version(4, 0, 0, 0) {
            reader.read_u32::<LE>()?
        } else if *version >= inno_version(2, 0, 1, 0) {
            1
        } else {
            0
        };

        if *version >= inno_version(4, 2, 1, 0) {
            header.message_count = reader.read_u32::<LE>()?;
        }
        if *version >= inno_version(4, 1, 0, 0) {
            header.permission_count = reader.read_u32::<LE>()?;
        }
        if *version >= inno_version(2, 0, 0, 0) {
            header.type_count = reader.read_u32::<LE>()?;
            header.component_count = reader.read_u32::<LE>()?;
            header.task_count = reader.read_u32::<LE>()?;
        }

        header.directory_count = read_u32_dyn(reader, version.bits)?;
        header.file_count = read_u32_dyn(reader, version.bits)?;
        header.file_location_count = read_u32_dyn(reader, version.bits)?;
        header.icon_count = read_u32_dyn(reader, version.bits)?;
        header.ini_entry_count = read_u32_dyn(reader, version.bits)?;
        header.registry_entry_count = read_u32_dyn(reader, version.bits)?;
        header.delete_entry_count = read_u32_dyn(reader, version.bits)?;
        header.uninstall_delete_entry_count = read_u32_dyn(reader, version.bits)?;
        header.run_entry_count = read_u32_dyn(reader, version.bits)?;
        header.uninstall_run_entry_count = read_u32_dyn(reader, version.bits)?;

        // Very old headers store the license blobs at the end, sized here.
        let (license_size, info_before_size, info_after_size) =
            if *version < inno_version(1, 3, 21, 0) {
                (
                    read_i32_dyn(reader, version.bits)?,
                    read_i32_dyn(reader, version.bits)?,
                    read_i32_dyn(reader, version.bits)?,
                )
            } else {
                (0, 0, 0)
            };

        header.min_version = WindowsVersion::load(reader, version)?;
        header.only_below_version = WindowsVersion::load(reader, version)?;

        header.back_color = reader.read_u32::<LE>()?;
        if *version >= inno_version(1, 3, 21, 0) {
            header.back_color2 = reader.read_u32::<LE>()?;
        }
        header.image_back_color = reader.read_u32::<LE>()?;
        if *version >= inno_version(2, 0, 0, 0) && *version < inno_version(5, 0, 4, 0) {
            header.small_image_back_color = reader.read_u32::<LE>()?;
        }

        header.password = if *version < inno_version(4, 2, 0, 0) {
            Checksum::Crc32(reader.read_u32::<LE>()?)
        } else if *version < inno_version(5, 3, 9, 0) {
            let mut digest = [0u8; 16];
            reader.read_exact(&mut digest)?;
            Checksum::Md5(digest)
        } else if *version < inno_version(6, 4, 0, 0) {
            let mut digest = [0u8; 20];
            reader.read_exact(&mut digest)?;
            Checksum::Sha1(digest)
        } else {
            let mut digest = [0u8; 32];
            reader.read_exact(&mut digest)?;
            Checksum::Sha256(digest)
        };
        if *version >= inno_version(4, 2, 2, 0) {
            reader.read_exact(&mut header.password_salt)?;
        }
        if *version >= inno_version(6, 4, 0, 0) {
            reader.read_exact(&mut header.kdf_salt)?;
            header.kdf_iterations = reader.read_u32::<LE>()?;
        }

        if *version < inno_version(4, 0, 0, 0) {
            header.extra_disk_space_required = i64::from(reader.read_i32::<LE>()?);
            header.slices_per_disk = 1;
        } else {
            header.extra_disk_space_required = reader.read_i64::<LE>()?;
            header.slices_per_disk = reader.read_u32::<LE>()?;
        }

        use AutoBool::{Auto, No, Yes};

        if *version >= inno_version(2, 0, 0, 0) && *version < inno_version(5, 0, 0, 0) {
            header.install_mode = read_stored_enum(
                reader,
                &[
                    InstallMode::Normal,
                    InstallMode::Silent,
                    InstallMode::VerySilent,
                ],
                InstallMode::Normal,
            )?;
        }
        if *version >= inno_version(1, 3, 21, 0) {
            header.uninstall_log_mode = read_stored_enum(
                reader,
                &[
                    UninstallLogMode::Append,
                    UninstallLogMode::New,
                    UninstallLogMode::Overwrite,
                ],
                UninstallLogMode::Append,
            )?;
        }
        if *version >= inno_version(2, 0, 0, 0) && *version < inno_version(5, 0, 0, 0) {
            header.uninstall_style = read_stored_enum(
                reader,
                &[UninstallStyle::Classic, UninstallStyle::Modern],
                UninstallStyle::Classic,
            )?;
        } else {
            header.uninstall_style = if *version < inno_version(5, 0, 0, 0) {
                UninstallStyle::Classic
            } else {
                UninstallStyle::Modern
            };
        }
        if *version >= inno_version(1, 3, 21, 0) {
            header.dir_exists_warning = read_stored_enum(reader, &[Auto, No, Yes], Auto)?;
        }

        if *version >= inno_version(3, 0, 0, 0) && *version < inno_version(3, 0, 3, 0) {
            // Restart-computer tri-state folded into flags in 3.0.3.
            match read_stored_enum(reader, &[Auto, No, Yes], Auto)? {
                Yes => header.options |= HeaderFlags::ALWAYS_RESTART,
                Auto => header.options |= HeaderFlags::RESTART_IF_NEEDED_BY_RUN,
                No => {}
            }
        }

        if *version >= inno_version(5, 3, 7, 0) {
            header.privileges_required = read_stored_enum(
                reader,
                &[
                    Privileges::None,
                    Privileges::PowerUser,
                    Privileges::Admin,
                    Privileges::Lowest,
                ],
                Privileges::None,
            )?;
        } else if *version >= inno_version(3, 0, 4, 0) {
            header.privileges_required = read_stored_enum(
                reader,
                &[Privileges::None, Privileges::PowerUser, Privileges::Admin],
                Privileges::None,
            )?;
        }

        if *version >= inno_version(4, 0, 10, 0) {
            header.show_language_dialog = read_stored_enum(reader, &[Yes, No, Auto], Yes)?;
            header.language_detection = read_stored_enum(
                reader,
                &[
                    LanguageDetection::UiLanguage,
                    LanguageDetection::Locale,
                    LanguageDetection::None,
                ],
                LanguageDetection::UiLanguage,
            )?;
        }

        use CompressionMethod::{BZip2, Lzma1, Lzma2, Stored, Unknown, Zlib};
        if *version >= inno_version(5, 3, 9, 0) {
            header.compression =
                read_stored_enum(reader, &[Stored, Zlib, BZip2, Lzma1, Lzma2], Unknown)?;
        } else if *version >= inno_version(4, 2, 6, 0) {
            header.compression = read_stored_enum(reader, &[Stored, Zlib, BZip2, Lzma1], Unknown)?;
        } else if *version >= inno_version(4, 2, 5, 0) {
            header.compression = read_stored_enum(reader, &[Stored, BZip2, Lzma1], Unknown)?;
        } else if *version >= inno_version(4, 1, 5, 0) {
            header.compression = read_stored_enum(reader, &[Zlib, BZip2, Lzma1], Unknown)?;
        }

        if *version >= inno_version(5, 1, 0, 0) {
            header.architectures_allowed =
                Architectures::from_bits_truncate(reader.read_u8()?);
            header.architectures_installed_in_64bit_mode =
                Architectures::from_bits_truncate(reader.read_u8()?);
        } else {
            header.architectures_allowed = Architectures::all();
            header.architectures_installed_in_64bit_mode = Architectures::all();
        }

        if *version >= inno_version(5, 2, 1, 0) && *version < inno_version(5, 3, 10, 0) {
            header.signed_uninstaller_original_size = reader.read_u32::<LE>()?;
            header.signed_uninstaller_header_checksum = reader.read_u32::<LE>()?;
        }

        if *version >= inno_version(5, 3, 3, 0) {
            header.disable_dir_page = read_stored_enum(reader, &[Auto, No, Yes], Auto)?;
            header.disable_program_group_page = read_stored_enum(reader, &[Auto, No, Yes], Auto)?;
        }

        if *version >= inno_version(5, 5, 0, 0) {
            header.uninstall_display_size = reader.read_u64::<LE>()?;
        } else if *version >= inno_version(5, 3, 6, 0) {
            header.uninstall_display_size = u64::from(reader.read_u32::<LE>()?);
        }

        header.options |= Self::load_option_flags(reader, version)?;

        // Obsolete flag fixups.
        if *version < inno_version(3, 0, 4, 0) {
            header.privileges_required =
                if header.options.contains(HeaderFlags::ADMIN_PRIVILEGES_REQUIRED) {
                    Privileges::Admin
                } else {
                    Privileges::None
                };
        }
        if *version < inno_version(4, 0, 10, 0) {
            header.show_language_dialog =
                if header.options.contains(HeaderFlags::SHOW_LANGUAGE_DIALOG) {
                    Yes
                } else {
                    No
                };
            header.language_detection =
                if header.options.contains(HeaderFlags::DETECT_LANGUAGE_USING_LOCALE) {
                    LanguageDetection::Locale
                } else {
                    LanguageDetection::UiLanguage
                };
        }
        if *version < inno_version(4, 1, 5, 0) {
            header.compression = if header.options.contains(HeaderFlags::BZIP_USED) {
                BZip2
            } else {
                Zlib
            };
        }
        if *version < inno_version(5, 3, 3, 0) {
            header.disable_dir_page = if header.options.contains(HeaderFlags::DISABLE_DIR_PAGE) {
                Yes
            } else {
                No
            };
            header.disable_program_group_page =
                if header.options.contains(HeaderFlags::DISABLE_PROGRAM_GROUP_PAGE) {
                    Yes
                } else {
                    No
                };
        }

        if *version < inno_version(1, 3, 21, 0) {
            for (size, target) in [
                (license_size, &mut header.license_text),
                (info_before_size, &mut header.info_before),
                (info_after_size, &mut header.info_after),
            ] {
                if size > 0 {
                    let mut raw = vec![0u8; size as usize];
                    reader.read_exact(&mut raw)?;
                    *target = crate::encoding::decode_string(&raw, codepage);
                }
            }
        }

        Ok(header)
    }

    fn load_option_flags<R: Read>(
        reader: &mut R,
        version: &InnoVersion,
    ) -> io::Result<HeaderFlags> {
        use HeaderFlags as F;

        let mut flags = FlagReader::new(reader);
        flags.add(F::DISABLE_STARTUP_PROMPT)?;
        if *version < inno_version(5, 3, 10, 0) {
            flags.add(F::UNINSTALLABLE)?;
        }
        flags.add(F::CREATE_APP_DIR)?;
        if *version < inno_version(5, 3, 3, 0) {
            flags.add(F::DISABLE_DIR_PAGE)?;
        }
        if *version < inno_version(1, 3, 21, 0) {
            flags.add(F::DISABLE_DIR_EXISTS_WARNING)?;
        }
        if *version < inno_version(5, 3, 3, 0) {
            flags.add(F::DISABLE_PROGRAM_GROUP_PAGE)?;
        }
        flags.add(F::ALLOW_NO_ICONS)?;
        if *version < inno_version(3, 0, 0, 0) || *version >= inno_version(3, 0, 3, 0) {
            flags.add(F::ALWAYS_RESTART)?;
        }
        if *version < inno_version(1, 3, 21, 0) {
            flags.add(F::BACK_SOLID)?;
        }
        flags.add(F::ALWAYS_USE_PERSONAL_GROUP)?;
        flags.add(F::WINDOW_VISIBLE)?;
        flags.add(F::WINDOW_SHOW_CAPTION)?;
        flags.add(F::WINDOW_RESIZABLE)?;
        flags.add(F::WINDOW_START_MAXIMIZED)?;
        flags.add(F::ENABLE_DIR_DOESNT_EXIST_WARNING)?;
        if *version < inno_version(4, 1, 2, 0) {
            flags.add(F::DISABLE_APPEND_DIR)?;
        }
        flags.add(F::PASSWORD)?;
        flags.add(F::ALLOW_ROOT_DIRECTORY)?;
        flags.add(F::DISABLE_FINISHED_PAGE)?;
        if version.bits != 16 {
            if *version < inno_version(3, 0, 4, 0) {
                flags.add(F::ADMIN_PRIVILEGES_REQUIRED)?;
            }
            if *version < inno_version(3, 0, 0, 0) {
                flags.add(F::ALWAYS_CREATE_UNINSTALL_ICON)?;
            }
            if *version < inno_version(1, 3, 21, 0) {
                flags.add(F::OVERWRITE_UNINST_REG_ENTRIES)?;
            }
            flags.add(F::CHANGES_ASSOCIATIONS)?;
        }
        if *version >= inno_version(1, 3, 21, 0) {
            if *version < inno_version(5, 3, 8, 0) {
                flags.add(F::CREATE_UNINSTALL_REG_KEY)?;
            }
            flags.add(F::USE_PREVIOUS_APP_DIR)?;
            flags.add(F::BACK_COLOR_HORIZONTAL)?;
            flags.add(F::USE_PREVIOUS_GROUP)?;
            flags.add(F::UPDATE_UNINSTALL_LOG_APP_NAME)?;
        }
        if *version >= inno_version(2, 0, 0, 0) {
            flags.add(F::USE_PREVIOUS_SETUP_TYPE)?;
            flags.add(F::DISABLE_READY_MEMO)?;
            flags.add(F::ALWAYS_SHOW_COMPONENTS_LIST)?;
            flags.add(F::FLAT_COMPONENTS_LIST)?;
            flags.add(F::SHOW_COMPONENT_SIZES)?;
            flags.add(F::USE_PREVIOUS_TASKS)?;
            flags.add(F::DISABLE_READY_PAGE)?;
        }
        if *version >= inno_version(2, 0, 7, 0) {
            flags.add(F::ALWAYS_SHOW_DIR_ON_READY_PAGE)?;
            flags.add(F::ALWAYS_SHOW_GROUP_ON_READY_PAGE)?;
        }
        if *version >= inno_version(2, 0, 17, 0) && *version < inno_version(4, 1, 5, 0) {
            flags.add(F::BZIP_USED)?;
        }
        if *version >= inno_version(2, 0, 18, 0) {
            flags.add(F::ALLOW_UNC_PATH)?;
        }
        if *version >= inno_version(3, 0, 0, 0) {
            flags.add(F::USER_INFO_PAGE)?;
            flags.add(F::USE_PREVIOUS_USER_INFO)?;
        }
        if *version >= inno_version(3, 0, 1, 0) {
            flags.add(F::UNINSTALL_RESTART_COMPUTER)?;
        }
        if *version >= inno_version(3, 0, 3, 0) {
            flags.add(F::RESTART_IF_NEEDED_BY_RUN)?;
        }
        if *version >= inno_version(3, 0, 6, 1) {
            flags.add(F::SHOW_TASKS_TREE_LINES)?;
        }
        if *version >= inno_version(4, 0, 0, 0) && *version < inno_version(4, 0, 10, 0) {
            flags.add(F::SHOW_LANGUAGE_DIALOG)?;
        }
        if *version >= inno_version(4, 0, 1, 0) && *version < inno_version(4, 0, 10, 0) {
            flags.add(F::DETECT_LANGUAGE_USING_LOCALE)?;
        }
        let mut implied = F::empty();
        if *version >= inno_version(4, 0, 9, 0) {
            flags.add(F::ALLOW_CANCEL_DURING_INSTALL)?;
        } else {
            implied |= F::ALLOW_CANCEL_DURING_INSTALL;
        }
        if *version >= inno_version(4, 1, 3, 0) {
            flags.add(F::WIZARD_IMAGE_STRETCH)?;
        }
        if *version >= inno_version(4, 1, 8, 0) {
            flags.add(F::APPEND_DEFAULT_DIR_NAME)?;
            flags.add(F::APPEND_DEFAULT_GROUP_NAME)?;
        }
        if *version >= inno_version(4, 2, 2, 0) {
            flags.add(F::ENCRYPTION_USED)?;
        }
        if *version >= inno_version(5, 0, 4, 0) {
            flags.add(F::CHANGES_ENVIRONMENT)?;
        }
        if *version >= inno_version(5, 1, 7, 0) && !version.unicode {
            flags.add(F::SHOW_UNDISPLAYABLE_LANGUAGES)?;
        }
        if *version >= inno_version(5, 1, 13, 0) {
            flags.add(F::SETUP_LOGGING)?;
        }
        if *version >= inno_version(5, 2, 1, 0) {
            flags.add(F::SIGNED_UNINSTALLER)?;
        }
        if *version >= inno_version(5, 3, 8, 0) {
            flags.add(F::USE_PREVIOUS_LANGUAGE)?;
        }
        if *version >= inno_version(5, 3, 9, 0) {
            flags.add(F::DISABLE_WELCOME_PAGE)?;
        }
        if *version >= inno_version(5, 5, 0, 0) {
            flags.add(F::CLOSE_APPLICATIONS)?;
            flags.add(F::RESTART_APPLICATIONS)?;
            flags.add(F::ALLOW_NETWORK_DRIVE)?;
        }

        Ok(flags.finish(version)? | implied)
    }
}
