//! Checksum and decryption primitives shared by the metadata and data paths.
//!
//! Digest state lives in the RustCrypto crates; this module only adds the
//! tagged [`Checksum`] value the installer format stores on disk and a
//! [`Hasher`] that dispatches on the stored tag.

pub mod arc4;

use md5::{Digest, Md5};
use serde::Serialize;
use sha1::Sha1;
use sha2::Sha256;

/// Digest algorithm selector as stored in the setup headers.
///
/// Which algorithm is in use depends solely on the format version, so the
/// orchestrator never has to guess: it constructs a [`Hasher`] from the kind
/// recorded in the file location entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ChecksumKind {
    #[default]
    None,
    Adler32,
    Crc32,
    Md5,
    Sha1,
    Sha256,
}

/// A digest together with its algorithm tag.
///
/// Two checksums are equal only if both the tag and the bytes match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Checksum {
    None,
    Adler32(u32),
    Crc32(u32),
    Md5([u8; 16]),
    Sha1([u8; 20]),
    Sha256([u8; 32]),
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::None
    }
}

impl Checksum {
    pub fn kind(&self) -> ChecksumKind {
        match self {
            Checksum::None => ChecksumKind::None,
            Checksum::Adler32(_) => ChecksumKind::Adler32,
            Checksum::Crc32(_) => ChecksumKind::Crc32,
            Checksum::Md5(_) => ChecksumKind::Md5,
            Checksum::Sha1(_) => ChecksumKind::Sha1,
            Checksum::Sha256(_) => ChecksumKind::Sha256,
        }
    }

    /// Lowercase hex rendering, used for listings and log lines.
    pub fn to_hex(&self) -> String {
        fn hex(bytes: &[u8]) -> String {
            bytes.iter().map(|b| format!("{b:02x}")).collect()
        }
        match self {
            Checksum::None => String::new(),
            Checksum::Adler32(v) | Checksum::Crc32(v) => format!("{v:08x}"),
            Checksum::Md5(d) => hex(d),
            Checksum::Sha1(d) => hex(d),
            Checksum::Sha256(d) => hex(d),
        }
    }
}

/// Incremental digest over one of the supported algorithms.
///
/// `finalize` consumes the hasher; the state cannot be reused.
pub enum Hasher {
    None,
    Adler32(adler2::Adler32),
    Crc32(crc32fast::Hasher),
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Hasher {
    pub fn new(kind: ChecksumKind) -> Self {
        match kind {
            ChecksumKind::None => Hasher::None,
            ChecksumKind::Adler32 => Hasher::Adler32(adler2::Adler32::new()),
            ChecksumKind::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
            ChecksumKind::Md5 => Hasher::Md5(Md5::new()),
            ChecksumKind::Sha1 => Hasher::Sha1(Sha1::new()),
            ChecksumKind::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::None => {}
            Hasher::Adler32(h) => h.write_slice(data),
            Hasher::Crc32(h) => h.update(data),
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha1(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
        }
    }

    pub fn finalize(self) -> Checksum {
        match self {
            Hasher::None => Checksum::None,
            Hasher::Adler32(h) => Checksum::Adler32(h.checksum()),
            Hasher::Crc32(h) => Checksum::Crc32(h.finalize()),
            Hasher::Md5(h) => Checksum::Md5(h.finalize().into()),
            Hasher::Sha1(h) => Checksum::Sha1(h.finalize().into()),
            Hasher::Sha256(h) => Checksum::Sha256(h.finalize().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(kind: ChecksumKind, data: &[u8]) -> Checksum {
        let mut h = Hasher::new(kind);
        h.update(data);
        h.finalize()
    }

    #[test]
    fn dispatch_matches_direct_digests() {
        assert_eq!(
            digest(ChecksumKind::Crc32, b"123456789"),
            Checksum::Crc32(0xcbf43926)
        );
        assert_eq!(
            digest(ChecksumKind::Adler32, b"Wikipedia"),
            Checksum::Adler32(0x11e60398)
        );
        let Checksum::Md5(d) = digest(ChecksumKind::Md5, b"abc") else {
            panic!("wrong tag");
        };
        assert_eq!(d[..4], [0x90, 0x01, 0x50, 0x98]);
    }

    #[test]
    fn split_updates_are_equivalent() {
        let mut h = Hasher::new(ChecksumKind::Sha1);
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(h.finalize(), digest(ChecksumKind::Sha1, b"hello world"));
    }

    #[test]
    fn equality_requires_matching_tag() {
        assert_ne!(Checksum::Adler32(1), Checksum::Crc32(1));
    }
}
