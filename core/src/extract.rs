//! Extraction orchestration: plans which chunks to visit, drives the filter
//! pipeline over each one, fans bytes out to the destination files and
//! verifies their checksums.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::crypto::{Checksum, Hasher};
use crate::error::{InnoError, Result};
use crate::filename::FilenameMap;
use crate::loader::{SetupOffsets, load_offsets};
use crate::setup::{FileFlags, Info, LoadOptions, LocationFlags, location::CallFilter};
use crate::stream::{
    Chunk, ChunkReader, ChecksumReader, EncryptionKey, EncryptionMethod, RestrictedReader,
    SliceReader,
};
use crate::version::inno_version;

/// What to do when two entries map to the same output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionAction {
    #[default]
    Overwrite,
    /// First entry keeps the name, later ones get a `$N` suffix.
    Rename,
    /// Every colliding entry gets a `$N` suffix.
    RenameAll,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub output_dir: PathBuf,
    pub password: Option<String>,
    pub collisions: CollisionAction,
    /// Also extract `{tmp}` / delete-after-install files.
    pub extract_temp: bool,
    /// Only extract files whose language expression matches.
    pub language_filter: Option<String>,
    /// Glob patterns over output paths; empty means everything.
    pub include_patterns: Vec<String>,
    pub preserve_timestamps: bool,
    pub local_timestamps: bool,
    pub lowercase_paths: bool,
    pub codepage_override: Option<u32>,
    pub accept_unknown_version: bool,
    /// Directory searched for external slice files besides the installer's.
    pub slice_dir: Option<PathBuf>,
    /// Cooperative cancellation, checked between output writes.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Progress notifications for UI layers; byte counts are decompressed
/// output bytes.
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent {
    Start(u64),
    Inc(u64),
    Finish,
}

#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub files_extracted: u64,
    pub bytes_extracted: u64,
    pub warnings: u32,
    pub errors: u32,
    pub failed_checksums: Vec<String>,
}

/// One row of `list`: an output the installer would create.
#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub path: String,
    pub size: u64,
    pub checksum: String,
    /// Number of stored parts (multi-part files span several chunks).
    pub parts: usize,
}

#[derive(Debug, Serialize)]
pub struct Listing {
    pub app_name: String,
    pub app_version: String,
    pub data_version: String,
    pub entries: Vec<ListEntry>,
}

impl ExtractOptions {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            accept_unknown_version: self.accept_unknown_version,
            codepage_override: self.codepage_override,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// One planned output file: its path and the location parts feeding it.
struct PlannedFile {
    path: String,
    parts: Vec<u32>,
}

struct Plan {
    files: Vec<PlannedFile>,
    /// location index -> list of (planned file index, part number).
    consumers: HashMap<u32, Vec<(usize, usize)>>,
    /// chunk -> location indices inside it.
    chunks: BTreeMap<Chunk, Vec<u32>>,
}

/// Decodes the metadata of an installer without touching the data stream.
pub fn load_info(installer: &Path, options: &LoadOptions) -> Result<(SetupOffsets, Info)> {
    let mut file = io::BufReader::new(File::open(installer)?);
    let offsets = load_offsets(&mut file)?;
    let info = Info::load(&mut file, &offsets, options)?;
    Ok((offsets, info))
}

/// Lists the files an installer would extract, without reading any data.
pub fn list(installer: &Path, options: &ExtractOptions) -> Result<Listing> {
    let (_, info) = load_info(installer, &options.load_options())?;
    let plan = build_plan(&info, options, &mut 0)?;

    let entries = plan
        .files
        .iter()
        .map(|planned| {
            let size: u64 = planned
                .parts
                .iter()
                .map(|&l| info.file_locations[l as usize].file_size)
                .sum();
            let checksum = info.file_locations[planned.parts[0] as usize]
                .checksum
                .to_hex();
            ListEntry {
                path: planned.path.clone(),
                size,
                checksum,
                parts: planned.parts.len(),
            }
        })
        .collect();

    Ok(Listing {
        app_name: info.header.app_name.clone(),
        app_version: info.header.app_version.clone(),
        data_version: info.version.to_string(),
        entries,
    })
}

/// Extracts an installer into `options.output_dir`.
pub fn extract(installer: &Path, options: &ExtractOptions) -> Result<Report> {
    extract_with_progress(installer, options, |_| {})
}

/// [`extract`] with progress notifications for a UI layer.
pub fn extract_with_progress(
    installer: &Path,
    options: &ExtractOptions,
    on_progress: impl Fn(ProgressEvent),
) -> Result<Report> {
    let (offsets, info) = load_info(installer, &options.load_options())?;

    let mut report = Report {
        warnings: info.warnings,
        ..Report::default()
    };

    let key = derive_encryption_key(&info, options)?;
    let plan = build_plan(&info, options, &mut report.warnings)?;

    if plan.chunks.is_empty() {
        info!("nothing to extract");
        return Ok(report);
    }

    let total_bytes: u64 = plan
        .chunks
        .values()
        .flatten()
        .map(|&l| info.file_locations[l as usize].file_size)
        .sum();
    on_progress(ProgressEvent::Start(total_bytes));

    let mut slices = open_slices(installer, &offsets, &info, options)?;

    let mut outputs: HashMap<usize, FileOutput> = HashMap::new();
    for (chunk, locations) in &plan.chunks {
        extract_chunk(
            &info,
            options,
            &plan,
            chunk,
            locations,
            &mut slices,
            &key,
            &mut outputs,
            &mut report,
            &on_progress,
        )?;
    }

    if !outputs.is_empty() {
        warn!("{} multi-part files were left incomplete", outputs.len());
        report.warnings += outputs.len() as u32;
    }

    on_progress(ProgressEvent::Finish);
    Ok(report)
}

fn open_slices(
    installer: &Path,
    offsets: &SetupOffsets,
    info: &Info,
    options: &ExtractOptions,
) -> Result<SliceReader> {
    if offsets.data_offset != 0 {
        SliceReader::embedded(installer, offsets.data_offset)
    } else {
        let mut dirs = vec![
            installer
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        ];
        if let Some(dir) = &options.slice_dir {
            dirs.push(dir.clone());
        }
        let base = installer
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        SliceReader::external(dirs, base, info.header.slices_per_disk as usize)
    }
}

/// Encodes the password the way the installer hashes it: UTF-16LE for
/// Unicode installers, the legacy codepage otherwise.
fn encode_password(info: &Info, password: &str) -> Vec<u8> {
    if info.version.unicode {
        password
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect()
    } else {
        crate::encoding::encoding_for_codepage(info.codepage)
            .encode(password)
            .0
            .into_owned()
    }
}

/// Validates the password against the stored checksum and produces the key
/// material for encrypted chunks. Runs before any chunk is opened.
fn derive_encryption_key(info: &Info, options: &ExtractOptions) -> Result<EncryptionKey> {
    let encryption = info
        .file_locations
        .iter()
        .map(|location| location.chunk.encryption)
        .find(|&encryption| encryption != EncryptionMethod::Plaintext);

    let Some(encryption) = encryption else {
        return Ok(EncryptionKey::None);
    };

    let Some(password) = options.password.as_deref() else {
        return Err(InnoError::PasswordRequired);
    };
    let password = encode_password(info, password);

    if encryption == EncryptionMethod::XChaCha20 {
        let mut key = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            &password,
            &info.header.kdf_salt,
            info.header.kdf_iterations.max(1),
            &mut key,
        );
        let mut hasher = Sha256::new();
        hasher.update(info.header.password_salt);
        hasher.update(key);
        if Checksum::Sha256(hasher.finalize().into()) != info.header.password {
            return Err(InnoError::PasswordBad);
        }
        return Ok(EncryptionKey::XChaCha20(key));
    }

    let mut hasher = Hasher::new(info.header.password.kind());
    if info.version >= inno_version(4, 2, 2, 0) {
        hasher.update(&info.header.password_salt);
    }
    hasher.update(&password);
    if hasher.finalize() != info.header.password {
        return Err(InnoError::PasswordBad);
    }

    Ok(EncryptionKey::Password(password))
}

/// True when the entry's language expression admits the filter language.
/// Expressions are space-separated language names with optional `not`.
fn language_matches(expression: &str, language: &str) -> bool {
    if expression.is_empty() {
        return true;
    }
    let mut matched = false;
    let mut negate = false;
    for token in expression.split([' ', '\t']).filter(|t| !t.is_empty()) {
        match token {
            "not" => negate = true,
            "and" | "or" => negate = false,
            name => {
                if (name.eq_ignore_ascii_case(language)) != negate {
                    matched = true;
                }
                negate = false;
            }
        }
    }
    matched
}

fn build_plan(info: &Info, options: &ExtractOptions, warnings: &mut u32) -> Result<Plan> {
    let patterns = options
        .include_patterns
        .iter()
        .map(|pattern| glob::Pattern::new(&pattern.to_lowercase()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| InnoError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    let map = FilenameMap::new(options.lowercase_paths);
    let mut files = Vec::new();

    for file in &info.files {
        let Some(location) = file.location else {
            continue;
        };
        if file.destination.is_empty() {
            continue;
        }
        let mut parts = vec![location];
        parts.extend(file.additional_locations.iter().copied());
        if parts
            .iter()
            .any(|&l| l as usize >= info.file_locations.len())
        {
            warn!(
                "file entry {:?} references an invalid location, skipping",
                file.destination
            );
            *warnings += 1;
            continue;
        }

        let is_temp = file.destination.starts_with("{tmp}")
            || file.options.contains(FileFlags::DELETE_AFTER_INSTALL);
        if is_temp && !options.extract_temp {
            continue;
        }

        if let Some(language) = &options.language_filter {
            if !language_matches(&file.item.languages, language) {
                continue;
            }
        }

        let path = map.convert(&file.destination);
        if path.is_empty() {
            continue;
        }
        if !patterns.is_empty()
            && !patterns
                .iter()
                .any(|pattern| pattern.matches(&path.to_lowercase()))
        {
            continue;
        }

        files.push(PlannedFile { path, parts });
    }

    resolve_collisions(&mut files, options.collisions)?;

    let mut consumers: HashMap<u32, Vec<(usize, usize)>> = HashMap::new();
    let mut chunks: BTreeMap<Chunk, Vec<u32>> = BTreeMap::new();
    for (planned_index, planned) in files.iter().enumerate() {
        for (part, &location) in planned.parts.iter().enumerate() {
            consumers
                .entry(location)
                .or_default()
                .push((planned_index, part));
            let chunk = info.file_locations[location as usize].chunk;
            let members = chunks.entry(chunk).or_default();
            if !members.contains(&location) {
                members.push(location);
            }
        }
    }

    Ok(Plan {
        files,
        consumers,
        chunks,
    })
}

/// Appends `$N` before the extension, like `tool.exe` -> `tool$1.exe`.
fn renamed(path: &str, n: usize) -> String {
    match path.rfind('.').filter(|&dot| !path[dot..].contains('/')) {
        Some(dot) => format!("{}${}{}", &path[..dot], n, &path[dot..]),
        None => format!("{path}${n}"),
    }
}

fn resolve_collisions(files: &mut [PlannedFile], action: CollisionAction) -> Result<()> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for planned in files.iter_mut() {
        let key = planned.path.to_lowercase();
        let count = seen.entry(key).or_insert(0);
        if *count > 0 || action == CollisionAction::RenameAll {
            match action {
                CollisionAction::Error => {
                    return Err(InnoError::UnsafePath(format!(
                        "duplicate output path {:?}",
                        planned.path
                    )));
                }
                CollisionAction::Overwrite => {}
                CollisionAction::Rename | CollisionAction::RenameAll => {
                    if *count > 0 {
                        planned.path = renamed(&planned.path, *count);
                    }
                }
            }
        }
        *count += 1;
    }
    Ok(())
}

/// An open destination file. Multi-part outputs stay open across chunks.
struct FileOutput {
    path: PathBuf,
    writer: BufWriter<File>,
    remaining_parts: usize,
    timestamp: Option<(i64, u32)>,
}

impl FileOutput {
    fn create(root: &Path, relative: &str) -> Result<Self> {
        let path = root.join(relative);
        if !path.starts_with(root) {
            return Err(InnoError::UnsafePath(relative.to_owned()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("-> {relative}");
        let file = File::create(&path)?;
        Ok(FileOutput {
            path,
            writer: BufWriter::new(file),
            remaining_parts: 0,
            timestamp: None,
        })
    }

    fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        let file = self
            .writer
            .into_inner()
            .map_err(|e| InnoError::Io(e.into_error()))?;
        drop(file);
        if let Some((seconds, nanos)) = self.timestamp {
            let mtime = filetime::FileTime::from_unix_time(seconds, nanos);
            if let Err(e) = filetime::set_file_mtime(&self.path, mtime) {
                warn!("could not set timestamp on {:?}: {e}", self.path);
            }
        }
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn extract_chunk(
    info: &Info,
    options: &ExtractOptions,
    plan: &Plan,
    chunk: &Chunk,
    locations: &[u32],
    slices: &mut SliceReader,
    key: &EncryptionKey,
    outputs: &mut HashMap<usize, FileOutput>,
    report: &mut Report,
    on_progress: &impl Fn(ProgressEvent),
) -> Result<()> {
    debug!(
        "[chunk] slice {} offset {:#x} size {:#x} ({:?}, {:?})",
        chunk.first_slice, chunk.offset, chunk.size, chunk.compression, chunk.encryption
    );

    let mut ordered: Vec<u32> = locations.to_vec();
    ordered.sort_by_key(|&l| info.file_locations[l as usize].file_offset);

    let mut reader = ChunkReader::open(slices, chunk, key)?;
    let mut position = 0u64;

    for &location_index in &ordered {
        let location = &info.file_locations[location_index as usize];

        if location.file_offset < position {
            return Err(InnoError::ChunkOverlap);
        }
        if location.file_offset > position {
            let gap = location.file_offset - position;
            debug!("[chunk] discarding {gap} bytes");
            let copied = io::copy(&mut reader.by_ref().take(gap), &mut io::sink())?;
            if copied != gap {
                return Err(InnoError::Truncated);
            }
            position = location.file_offset;
        }

        // Per-file pipeline: cap at the stored size, undo the call
        // instruction transform, then tap the checksum.
        let restricted = RestrictedReader::new(reader.by_ref(), location.file_size);
        let filtered: Box<dyn Read + '_> = match location.filter {
            CallFilter::None => Box::new(restricted),
            CallFilter::Filter4108 => {
                Box::new(crate::stream::exefilter::ExeFilter4108::new(restricted))
            }
            CallFilter::Filter5200 => {
                Box::new(crate::stream::exefilter::ExeFilter5200::new(restricted, false))
            }
            CallFilter::Filter5309 => {
                Box::new(crate::stream::exefilter::ExeFilter5200::new(restricted, true))
            }
        };
        let mut tap = ChecksumReader::new(filtered, location.checksum.kind());

        // Open or look up every output consuming this location.
        let consumers = plan
            .consumers
            .get(&location_index)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut writers: Vec<usize> = Vec::with_capacity(consumers.len());
        for &(planned_index, part) in consumers {
            let planned = &plan.files[planned_index];
            if part == 0 {
                let mut output = FileOutput::create(&options.output_dir, &planned.path)?;
                output.remaining_parts = planned.parts.len();
                if options.preserve_timestamps {
                    // Non-UTC timestamps are only applied when the caller
                    // asked for the local interpretation.
                    let utc = location.options.contains(LocationFlags::TIMESTAMP_IN_UTC);
                    if utc || options.local_timestamps {
                        output.timestamp = Some(location.unix_timestamp());
                    }
                }
                outputs.insert(planned_index, output);
            }
            if outputs.contains_key(&planned_index) {
                writers.push(planned_index);
            }
        }

        let mut buffer = [0u8; 64 * 1024];
        let mut total = 0u64;
        loop {
            if options.cancelled() {
                for planned_index in &writers {
                    if let Some(output) = outputs.remove(planned_index) {
                        let _ = output.finish();
                    }
                }
                return Err(InnoError::Cancelled);
            }
            let n = tap.read(&mut buffer).map_err(InnoError::from_read)?;
            if n == 0 {
                break;
            }
            for planned_index in &writers {
                let output = outputs
                    .get_mut(planned_index)
                    .expect("writer opened above");
                output.writer.write_all(&buffer[..n])?;
            }
            total += n as u64;
            on_progress(ProgressEvent::Inc(n as u64));
        }
        if total != location.file_size {
            return Err(InnoError::Truncated);
        }
        position = location.file_offset + location.file_size;
        report.bytes_extracted += total;

        let actual = tap.finalize();
        if actual != location.checksum {
            warn!(
                "checksum mismatch for location {location_index}: got {}, expected {}",
                actual.to_hex(),
                location.checksum.to_hex()
            );
            report.warnings += 1;
            for &(planned_index, _) in consumers {
                report
                    .failed_checksums
                    .push(plan.files[planned_index].path.clone());
            }
        }

        for planned_index in writers {
            let finished = {
                let output = outputs.get_mut(&planned_index).expect("writer opened above");
                output.remaining_parts -= 1;
                output.remaining_parts == 0
            };
            if finished {
                let output = outputs.remove(&planned_index).expect("present");
                output.finish()?;
                report.files_extracted += 1;
            }
        }
    }

    // Trailing bytes inside the chunk are only legal when zero.
    let mut buffer = [0u8; 8 * 1024];
    let mut trailing_nonzero = false;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => return Err(InnoError::from_read(e)),
        };
        if buffer[..n].iter().any(|&b| b != 0) {
            trailing_nonzero = true;
        }
    }
    if trailing_nonzero {
        warn!("[chunk] non-zero trailing bytes after last file");
        report.warnings += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_expressions() {
        assert!(language_matches("", "en"));
        assert!(language_matches("en", "en"));
        assert!(language_matches("de or en", "en"));
        assert!(!language_matches("de", "en"));
        assert!(language_matches("not de", "en"));
        assert!(!language_matches("not en", "en"));
    }

    #[test]
    fn rename_suffix_goes_before_the_extension() {
        assert_eq!(renamed("app/tool.exe", 1), "app/tool$1.exe");
        assert_eq!(renamed("app/readme", 2), "app/readme$2");
        assert_eq!(renamed("app.dir/readme", 1), "app.dir/readme$1");
    }

    #[test]
    fn collision_policies() {
        fn mk(paths: &[&str]) -> Vec<PlannedFile> {
            paths
                .iter()
                .map(|p| PlannedFile {
                    path: (*p).to_owned(),
                    parts: vec![0],
                })
                .collect()
        }

        let mut files = mk(&["a.txt", "A.TXT", "b.txt"]);
        resolve_collisions(&mut files, CollisionAction::Rename).unwrap();
        assert_eq!(files[0].path, "a.txt");
        assert_eq!(files[1].path, "A$1.TXT");
        assert_eq!(files[2].path, "b.txt");

        let mut files = mk(&["a.txt", "a.txt"]);
        assert!(resolve_collisions(&mut files, CollisionAction::Error).is_err());

        let mut files = mk(&["a.txt", "a.txt"]);
        resolve_collisions(&mut files, CollisionAction::Overwrite).unwrap();
        assert_eq!(files[0].path, files[1].path);
    }
}
