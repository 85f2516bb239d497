//! End-to-end extraction over synthetic single-file installers (format
//! 5.5.0, Unicode). The builder below writes the exact byte layout the
//! decoder expects: legacy locator at 0x30, a 5.1-layout offset table, the
//! version signature, two framed metadata blocks and one data chunk.

use std::fs;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use innodec_core::crypto::arc4::Arc4;
use innodec_core::{ExtractOptions, InnoError, extract};

const TABLE_MAGIC: u32 = 0x506c_4472; // rDlP
const TABLE_ID_51: u64 = 0x2a0b_7bd7_e6cd_5374;
const HEADER_MAGIC: u32 = 0x6f6e_6e49; // Inno
const SIGNATURE: &str = "Inno Setup Setup Data (5.5.0) (u)";
const FILETIME_1234567890: u64 = (1_234_567_890 + 11_644_473_600) * 10_000_000;

#[derive(Clone, Copy, PartialEq)]
enum Compression {
    Stored,
    Zlib,
}

struct LocationSpec {
    file_offset: u64,
    /// Original (decoded) bytes of the stored file.
    data: Vec<u8>,
    call_optimized: bool,
    /// Overrides the computed digest to provoke a checksum warning.
    bad_checksum: bool,
}

struct FileSpec {
    destination: &'static str,
    location: u32,
}

struct InstallerSpec {
    compression: Compression,
    password: Option<&'static str>,
    files: Vec<FileSpec>,
    locations: Vec<LocationSpec>,
    /// When set, the data moves into external `setup-1.bin`/`setup-2.bin`
    /// slices, with the chunk split after this many bytes.
    external_split: Option<usize>,
}

struct InstallerImage {
    exe: Vec<u8>,
    slices: Vec<(String, Vec<u8>)>,
}

fn utf16(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

/// Length-prefixed UTF-16LE string (the Unicode `encoded_string`).
fn ws(out: &mut Vec<u8>, s: &str) {
    let raw = utf16(s);
    out.extend_from_slice(&(raw.len() as u32).to_le_bytes());
    out.extend_from_slice(&raw);
}

/// Length-prefixed Windows-1252 string; test content stays ASCII.
fn wa(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Length-prefixed raw bytes.
fn wb(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
}

fn w32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn w64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// min-version / only-below pair: (build u16 + minor + major) x2 + sp pair.
fn windows_version_pair(out: &mut Vec<u8>) {
    out.extend_from_slice(&[0u8; 20]);
}

fn sha1_of(data: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Forward direction of the post-5.3.9 call instruction transform, mirroring
/// what the installer compiler does to executables before compressing them.
fn call_encode(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    let mut i = 0usize;
    while i < out.len() {
        let byte = out[i];
        i += 1;
        if byte != 0xe8 && byte != 0xe9 {
            continue;
        }
        let block_left = 0x10000 - ((i as u32 - 1) % 0x10000);
        if block_left < 5 || i + 4 > out.len() {
            continue;
        }
        let mut addr = [out[i], out[i + 1], out[i + 2], out[i + 3]];
        let rel = u32::from(addr[0]) | u32::from(addr[1]) << 8 | u32::from(addr[2]) << 16;
        if rel & 0x80_0000 != 0 {
            addr[3] = !addr[3];
        }
        if addr[3] == 0x00 || addr[3] == 0xff {
            let position = (i as u32 + 4) & 0xff_ffff;
            let stored = rel.wrapping_add(position) & 0xff_ffff;
            addr[0] = stored as u8;
            addr[1] = (stored >> 8) as u8;
            addr[2] = (stored >> 16) as u8;
            out[i..i + 4].copy_from_slice(&addr);
        }
        i += 4;
    }
    out
}

/// Header for format 5.5.0 (u). Field order mirrors the decoder.
fn build_header(spec: &InstallerSpec, password_salt: &[u8; 8]) -> Vec<u8> {
    let mut h = Vec::new();

    ws(&mut h, "Test App"); // app name
    ws(&mut h, "Test App 1.0"); // versioned name
    ws(&mut h, "{TESTAPP-GUID}"); // app id
    ws(&mut h, "(c) Test"); // copyright
    ws(&mut h, "Test Publisher"); // publisher
    ws(&mut h, ""); // publisher url
    ws(&mut h, ""); // support phone
    ws(&mut h, ""); // support url
    ws(&mut h, ""); // updates url
    ws(&mut h, "1.0"); // app version
    ws(&mut h, "{pf}\\Test App"); // default dir
    ws(&mut h, "Test App"); // default group
    ws(&mut h, "setup"); // base filename
    ws(&mut h, ""); // uninstall files dir
    ws(&mut h, ""); // uninstall display name
    ws(&mut h, ""); // uninstall display icon
    ws(&mut h, ""); // app mutex
    ws(&mut h, ""); // default user name
    ws(&mut h, ""); // default user org
    ws(&mut h, ""); // default serial
    ws(&mut h, ""); // readme
    ws(&mut h, ""); // contact
    ws(&mut h, ""); // comments
    ws(&mut h, ""); // modify path
    ws(&mut h, ""); // create uninstall reg key expr
    ws(&mut h, ""); // uninstallable expr
    wa(&mut h, "License."); // license
    wa(&mut h, ""); // info before
    wa(&mut h, ""); // info after
    wb(&mut h, b""); // compiled code

    w32(&mut h, 1); // languages
    w32(&mut h, 0); // messages
    w32(&mut h, 0); // permissions
    w32(&mut h, 0); // types
    w32(&mut h, 0); // components
    w32(&mut h, 0); // tasks
    w32(&mut h, 0); // directories
    w32(&mut h, spec.files.len() as u32); // files
    w32(&mut h, spec.locations.len() as u32); // locations
    w32(&mut h, 0); // icons
    w32(&mut h, 0); // ini
    w32(&mut h, 0); // registry
    w32(&mut h, 0); // delete
    w32(&mut h, 0); // uninstall delete
    w32(&mut h, 0); // run
    w32(&mut h, 0); // uninstall run

    windows_version_pair(&mut h);

    w32(&mut h, 0); // back color
    w32(&mut h, 0); // back color 2
    w32(&mut h, 0); // image back color

    // Password digest (SHA-1 for this format) and salt.
    if let Some(password) = spec.password {
        let mut hasher = Sha1::new();
        hasher.update(password_salt);
        hasher.update(utf16(password));
        h.extend_from_slice(&hasher.finalize());
    } else {
        h.extend_from_slice(&[0u8; 20]);
    }
    h.extend_from_slice(password_salt);

    h.extend_from_slice(&0i64.to_le_bytes()); // extra disk space
    w32(&mut h, 1); // slices per disk

    h.push(0); // uninstall log mode
    h.push(0); // dir exists warning
    h.push(0); // privileges
    h.push(0); // show language dialog
    h.push(0); // language detection
    h.push(match spec.compression {
        Compression::Stored => 0,
        Compression::Zlib => 1,
    });
    h.push(0x0f); // architectures allowed
    h.push(0x0f); // architectures in 64-bit mode
    h.push(0); // disable dir page
    h.push(0); // disable program group page
    w64(&mut h, 0); // uninstall display size

    // 46 option flags for this format -> 6 bitfield bytes, all clear.
    h.extend_from_slice(&[0u8; 6]);

    h
}

fn build_language_entry() -> Vec<u8> {
    let mut e = Vec::new();
    ws(&mut e, "english");
    ws(&mut e, "English");
    ws(&mut e, "Tahoma"); // dialog font
    ws(&mut e, ""); // title font
    ws(&mut e, ""); // welcome font
    ws(&mut e, ""); // copyright font
    wb(&mut e, b""); // data
    wa(&mut e, ""); // license
    wa(&mut e, ""); // info before
    wa(&mut e, ""); // info after
    e.extend_from_slice(&0x0409u32.to_le_bytes()); // language id
    e.extend_from_slice(&8u32.to_le_bytes()); // dialog font size
    e.extend_from_slice(&9u32.to_le_bytes()); // title font size
    e.extend_from_slice(&12u32.to_le_bytes()); // welcome font size
    e.extend_from_slice(&8u32.to_le_bytes()); // copyright font size
    e.push(0); // right to left
    e
}

fn build_file_entry(file: &FileSpec) -> Vec<u8> {
    let mut e = Vec::new();
    ws(&mut e, ""); // source
    ws(&mut e, file.destination);
    ws(&mut e, ""); // install font
    ws(&mut e, ""); // strong assembly name
    ws(&mut e, ""); // components
    ws(&mut e, ""); // tasks
    ws(&mut e, ""); // languages
    ws(&mut e, ""); // check
    ws(&mut e, ""); // after install
    ws(&mut e, ""); // before install
    windows_version_pair(&mut e);
    w32(&mut e, file.location);
    w32(&mut e, 0); // attributes
    w64(&mut e, 0); // external size
    e.extend_from_slice(&(-1i16).to_le_bytes()); // permission
    e.extend_from_slice(&[0u8; 4]); // 32 option flags
    e.push(0); // file type: user file
    e
}

fn build_location_entry(
    spec: &InstallerSpec,
    location: &LocationSpec,
    chunk_size: u64,
) -> Vec<u8> {
    let mut e = Vec::new();
    w32(&mut e, 0); // first slice
    w32(&mut e, u32::from(spec.external_split.is_some())); // last slice
    // External chunk offsets are absolute within the slice file, past its
    // 12-byte header.
    w32(&mut e, if spec.external_split.is_some() { 12 } else { 0 });
    w64(&mut e, location.file_offset);
    w64(&mut e, location.data.len() as u64);
    w64(&mut e, chunk_size);
    let mut digest = sha1_of(&location.data);
    if location.bad_checksum {
        digest[0] ^= 0xff;
    }
    e.extend_from_slice(&digest);
    w64(&mut e, FILETIME_1234567890);
    w32(&mut e, 0); // file version ms
    w32(&mut e, 0); // file version ls

    // Wire flag bits: 2 = timestamp-in-UTC, 4 = call optimized,
    // 6 = encrypted, 7 = compressed.
    let mut flags = 1u16 << 2;
    if location.call_optimized {
        flags |= 1 << 4;
    }
    if spec.password.is_some() {
        flags |= 1 << 6;
    }
    if spec.compression != Compression::Stored {
        flags |= 1 << 7;
    }
    e.extend_from_slice(&flags.to_le_bytes());
    e
}

fn build_wizard(spec: &InstallerSpec) -> Vec<u8> {
    let mut w = Vec::new();
    wb(&mut w, b"WIZARD-IMAGE");
    wb(&mut w, b"WIZARD-SMALL");
    if spec.compression == Compression::Zlib {
        // Zlib installers of this vintage bundle the decompressor DLL.
        wb(&mut w, b"FAKE-DLL");
    }
    w
}

/// Frames a payload into 4096-byte CRC-prefixed fragments with the stored
/// (uncompressed) block header used by modern formats.
fn frame_block(payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::new();
    for frame in payload.chunks(4096) {
        framed.extend_from_slice(&crc32fast::hash(frame).to_le_bytes());
        framed.extend_from_slice(frame);
    }

    let mut header = Vec::new();
    w32(&mut header, framed.len() as u32);
    header.push(0); // not compressed

    let mut out = Vec::new();
    w32(&mut out, crc32fast::hash(&header));
    out.extend_from_slice(&header);
    out.extend_from_slice(&framed);
    out
}

/// The decompressed chunk image: every stored file at its offset, gaps
/// zero-filled, plus a little legal zero padding at the end.
fn build_chunk_plain(spec: &InstallerSpec) -> Vec<u8> {
    let mut plain = Vec::new();
    for location in &spec.locations {
        assert!(plain.len() as u64 <= location.file_offset);
        plain.resize(location.file_offset as usize, 0);
        let stored = if location.call_optimized {
            call_encode(&location.data)
        } else {
            location.data.clone()
        };
        plain.extend_from_slice(&stored);
    }
    plain.extend_from_slice(&[0u8; 3]);
    plain
}

fn build_installer(spec: &InstallerSpec) -> InstallerImage {
    let password_salt = *b"\x09\x0a\x0b\x0c\x0d\x0e\x0f\x10";

    // Data chunk: compress, then encrypt, then prefix magic (and salt).
    let plain = build_chunk_plain(spec);
    let mut stored = match spec.compression {
        Compression::Stored => plain,
        Compression::Zlib => {
            use flate2::{Compression as Level, write::ZlibEncoder};
            use std::io::Write;
            let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
            encoder.write_all(&plain).unwrap();
            encoder.finish().unwrap()
        }
    };
    let chunk_salt = *b"\x01\x02\x03\x04\x05\x06\x07\x08";
    if let Some(password) = spec.password {
        let mut hasher = Sha1::new();
        hasher.update(chunk_salt);
        hasher.update(utf16(password));
        let key: [u8; 20] = hasher.finalize().into();
        let mut cipher = Arc4::with_discard(&key);
        cipher.crypt(&mut stored);
    }
    let chunk_size = stored.len() as u64;

    let mut chunk = Vec::new();
    chunk.extend_from_slice(b"zlb\x1a");
    if spec.password.is_some() {
        chunk.extend_from_slice(&chunk_salt);
    }
    chunk.extend_from_slice(&stored);

    // Primary metadata block.
    let mut block1 = build_header(spec, &password_salt);
    block1.extend_from_slice(&build_language_entry());
    for file in &spec.files {
        block1.extend_from_slice(&build_file_entry(file));
    }
    block1.extend_from_slice(&build_wizard(spec));

    // Secondary metadata block: the file locations.
    let mut block2 = Vec::new();
    for location in &spec.locations {
        block2.extend_from_slice(&build_location_entry(spec, location, chunk_size));
    }

    let block1 = frame_block(&block1);
    let block2 = frame_block(&block2);

    let header_offset = 0x60u32 + 44;
    let data_offset = if spec.external_split.is_some() {
        0 // data lives in external slice files
    } else {
        header_offset + 64 + block1.len() as u32 + block2.len() as u32
    };

    // Stub with the legacy locator at 0x30 pointing at the offset table.
    let mut out = vec![0u8; 0x30];
    w32(&mut out, HEADER_MAGIC);
    w32(&mut out, 0x60);
    w32(&mut out, !0x60u32);
    out.resize(0x60, 0);

    // 5.1-layout offset table with trailing CRC.
    let mut table = Vec::new();
    w32(&mut table, TABLE_MAGIC);
    table.extend_from_slice(&TABLE_ID_51.to_le_bytes());
    let mut fields = Vec::new();
    w32(&mut fields, 1); // table version
    w32(&mut fields, 0); // total size (unchecked)
    w32(&mut fields, 0); // exe offset
    w32(&mut fields, 0); // exe uncompressed size
    w32(&mut fields, 0); // exe crc
    w32(&mut fields, header_offset);
    w32(&mut fields, data_offset);
    let mut crc = crc32fast::Hasher::new();
    crc.update(&table);
    crc.update(&fields);
    w32(&mut fields, crc.finalize());
    table.extend_from_slice(&fields);
    out.extend_from_slice(&table);

    let mut signature = [0u8; 64];
    signature[..SIGNATURE.len()].copy_from_slice(SIGNATURE.as_bytes());
    out.extend_from_slice(&signature);
    out.extend_from_slice(&block1);
    out.extend_from_slice(&block2);

    let mut slices = Vec::new();
    match spec.external_split {
        None => {
            assert_eq!(out.len() as u32, data_offset);
            out.extend_from_slice(&chunk);
        }
        Some(split) => {
            // Slice files: 8-byte magic + u32 valid size + chunk part.
            assert!(split < chunk.len());
            for (index, part) in [&chunk[..split], &chunk[split..]].iter().enumerate() {
                let mut slice = Vec::new();
                slice.extend_from_slice(b"idska32\x1a");
                w32(&mut slice, 12 + part.len() as u32);
                slice.extend_from_slice(part);
                slices.push((format!("setup-{}.bin", index + 1), slice));
            }
        }
    }

    InstallerImage { exe: out, slices }
}

fn write_installer(dir: &Path, spec: &InstallerSpec) -> PathBuf {
    let image = build_installer(spec);
    let path = dir.join("setup.exe");
    fs::write(&path, image.exe).unwrap();
    for (name, data) in image.slices {
        fs::write(dir.join(name), data).unwrap();
    }
    path
}

fn hello_spec() -> InstallerSpec {
    InstallerSpec {
        compression: Compression::Stored,
        password: None,
        external_split: None,
        files: vec![
            FileSpec {
                destination: "{app}\\readme.txt",
                location: 0,
            },
            FileSpec {
                destination: "{app}\\copy\\readme2.txt",
                location: 0,
            },
            FileSpec {
                destination: "{app}\\data.bin",
                location: 1,
            },
        ],
        locations: vec![
            LocationSpec {
                file_offset: 0,
                data: b"Hello world".to_vec(),
                call_optimized: false,
                bad_checksum: false,
            },
            LocationSpec {
                // Gap between the files inside the chunk.
                file_offset: 16,
                data: (0u16..700).map(|i| i as u8).collect(),
                call_optimized: false,
                bad_checksum: false,
            },
        ],
    }
}

#[test]
fn extracts_a_stored_installer() {
    let dir = tempfile::tempdir().unwrap();
    let installer = write_installer(dir.path(), &hello_spec());
    let out = dir.path().join("out");

    let options = ExtractOptions {
        output_dir: out.clone(),
        preserve_timestamps: true,
        ..ExtractOptions::default()
    };
    let report = extract(&installer, &options).unwrap();

    assert_eq!(report.files_extracted, 3);
    assert!(report.failed_checksums.is_empty());
    assert_eq!(report.warnings, 0);

    let readme = fs::read(out.join("app/readme.txt")).unwrap();
    assert_eq!(readme, b"Hello world");
    let copy = fs::read(out.join("app/copy/readme2.txt")).unwrap();
    assert_eq!(copy, b"Hello world");
    let data = fs::read(out.join("app/data.bin")).unwrap();
    assert_eq!(data, hello_spec().locations[1].data);

    // Timestamp was applied (stored value is UTC-flagged).
    let mtime = fs::metadata(out.join("app/readme.txt"))
        .unwrap()
        .modified()
        .unwrap();
    let secs = mtime
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    assert_eq!(secs, 1_234_567_890);
}

#[test]
fn listing_matches_the_plan() {
    let dir = tempfile::tempdir().unwrap();
    let installer = write_installer(dir.path(), &hello_spec());

    let listing = innodec_core::list(&installer, &ExtractOptions::default()).unwrap();
    assert_eq!(listing.app_name, "Test App");
    assert_eq!(listing.data_version, "5.5.0 (unicode)");
    let paths: Vec<&str> = listing.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        ["app/readme.txt", "app/copy/readme2.txt", "app/data.bin"]
    );
    assert_eq!(listing.entries[0].size, 11);
}

#[test]
fn extracts_zlib_chunks_with_call_filter() {
    let mut data = Vec::new();
    data.extend_from_slice(&[0x55, 0x8b, 0xec]);
    data.push(0xe8);
    data.extend_from_slice(&0x1234u32.to_le_bytes());
    data.extend_from_slice(&[0x90; 64]);
    data.push(0xe9);
    data.extend_from_slice(&(-40i32 as u32).to_le_bytes());
    data.extend_from_slice(&[0xc3; 10]);

    let spec = InstallerSpec {
        compression: Compression::Zlib,
        password: None,
        external_split: None,
        files: vec![FileSpec {
            destination: "{app}\\tool.exe",
            location: 0,
        }],
        locations: vec![LocationSpec {
            file_offset: 0,
            data: data.clone(),
            call_optimized: true,
            bad_checksum: false,
        }],
    };

    let dir = tempfile::tempdir().unwrap();
    let installer = write_installer(dir.path(), &spec);
    let out = dir.path().join("out");

    let options = ExtractOptions {
        output_dir: out.clone(),
        ..ExtractOptions::default()
    };
    let report = extract(&installer, &options).unwrap();
    assert_eq!(report.files_extracted, 1);
    assert!(report.failed_checksums.is_empty());

    assert_eq!(fs::read(out.join("app/tool.exe")).unwrap(), data);
}

#[test]
fn password_protected_installer() {
    let mut spec = hello_spec();
    spec.password = Some("hunter2");

    let dir = tempfile::tempdir().unwrap();
    let installer = write_installer(dir.path(), &spec);
    let out = dir.path().join("out");

    // Wrong password fails before any chunk is read or file created.
    let options = ExtractOptions {
        output_dir: out.clone(),
        password: Some("wrong".into()),
        ..ExtractOptions::default()
    };
    assert!(matches!(
        extract(&installer, &options),
        Err(InnoError::PasswordBad)
    ));
    assert!(!out.exists() || fs::read_dir(&out).unwrap().next().is_none());

    // Missing password is reported distinctly.
    let options = ExtractOptions {
        output_dir: out.clone(),
        ..ExtractOptions::default()
    };
    assert!(matches!(
        extract(&installer, &options),
        Err(InnoError::PasswordRequired)
    ));

    // Correct password round-trips the data.
    let options = ExtractOptions {
        output_dir: out.clone(),
        password: Some("hunter2".into()),
        ..ExtractOptions::default()
    };
    let report = extract(&installer, &options).unwrap();
    assert_eq!(report.files_extracted, 3);
    assert_eq!(
        fs::read(out.join("app/readme.txt")).unwrap(),
        b"Hello world"
    );
}

#[test]
fn corrupted_metadata_frame_fails_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut image = build_installer(&hello_spec()).exe;

    // First frame CRC of the primary block sits right after the version
    // signature and the 9-byte block header (4 CRC + 4 size + 1 flag).
    let frame_crc_offset = (0x60 + 44 + 64 + 9) as usize;
    image[frame_crc_offset] ^= 0x01;
    let installer = dir.path().join("setup.exe");
    fs::write(&installer, image).unwrap();

    let out = dir.path().join("out");
    let options = ExtractOptions {
        output_dir: out.clone(),
        ..ExtractOptions::default()
    };
    assert!(matches!(
        extract(&installer, &options),
        Err(InnoError::BlockChecksum)
    ));
    assert!(!out.exists() || fs::read_dir(&out).unwrap().next().is_none());
}

#[test]
fn checksum_mismatch_keeps_the_file_and_warns() {
    let mut spec = hello_spec();
    spec.files.truncate(1);
    spec.locations.truncate(1);
    spec.locations[0].bad_checksum = true;

    let dir = tempfile::tempdir().unwrap();
    let installer = write_installer(dir.path(), &spec);
    let out = dir.path().join("out");

    let options = ExtractOptions {
        output_dir: out.clone(),
        ..ExtractOptions::default()
    };
    let report = extract(&installer, &options).unwrap();

    assert_eq!(report.files_extracted, 1);
    assert_eq!(report.failed_checksums, ["app/readme.txt"]);
    assert!(report.warnings >= 1);
    assert_eq!(
        fs::read(out.join("app/readme.txt")).unwrap(),
        b"Hello world"
    );
}

#[test]
fn unknown_version_is_rejected_without_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let mut image = build_installer(&hello_spec()).exe;

    // Swap the signature for a version that is not in the table.
    let sig_offset = 0x60 + 44;
    let unknown = "Inno Setup Setup Data (9.9.9) (u)";
    image[sig_offset..sig_offset + 64].fill(0);
    image[sig_offset..sig_offset + unknown.len()].copy_from_slice(unknown.as_bytes());
    let installer = dir.path().join("setup.exe");
    fs::write(&installer, image).unwrap();

    let out = dir.path().join("out");
    let options = ExtractOptions {
        output_dir: out.clone(),
        ..ExtractOptions::default()
    };
    assert!(matches!(
        extract(&installer, &options),
        Err(InnoError::UnknownVersion(_))
    ));
    assert!(!out.exists() || fs::read_dir(&out).unwrap().next().is_none());
}

#[test]
fn chunk_spanning_two_external_slices() {
    let mut spec = hello_spec();
    // Split mid-chunk: the first slice ends inside the second file's data.
    spec.external_split = Some(24);

    let dir = tempfile::tempdir().unwrap();
    let installer = write_installer(dir.path(), &spec);
    let out = dir.path().join("out");

    let options = ExtractOptions {
        output_dir: out.clone(),
        ..ExtractOptions::default()
    };
    let report = extract(&installer, &options).unwrap();

    assert_eq!(report.files_extracted, 3);
    assert!(report.failed_checksums.is_empty());
    assert_eq!(
        fs::read(out.join("app/readme.txt")).unwrap(),
        b"Hello world"
    );
    assert_eq!(
        fs::read(out.join("app/data.bin")).unwrap(),
        hello_spec().locations[1].data
    );
}

#[test]
fn include_patterns_filter_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let installer = write_installer(dir.path(), &hello_spec());
    let out = dir.path().join("out");

    let options = ExtractOptions {
        output_dir: out.clone(),
        include_patterns: vec!["app/*.txt".into()],
        ..ExtractOptions::default()
    };
    let report = extract(&installer, &options).unwrap();

    assert_eq!(report.files_extracted, 1);
    assert!(out.join("app/readme.txt").is_file());
    assert!(!out.join("app/data.bin").exists());
}
