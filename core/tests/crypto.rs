//! Digest and key-derivation vectors from the usual RFC test suites.

use innodec_core::crypto::{Checksum, ChecksumKind, Hasher};

fn digest(kind: ChecksumKind, data: &[u8]) -> Checksum {
    let mut hasher = Hasher::new(kind);
    hasher.update(data);
    hasher.finalize()
}

fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

#[test]
fn crc32_vectors() {
    assert_eq!(digest(ChecksumKind::Crc32, b""), Checksum::Crc32(0));
    assert_eq!(
        digest(ChecksumKind::Crc32, b"123456789"),
        Checksum::Crc32(0xcbf43926)
    );
}

#[test]
fn adler32_vectors() {
    assert_eq!(digest(ChecksumKind::Adler32, b""), Checksum::Adler32(1));
    assert_eq!(
        digest(ChecksumKind::Adler32, b"Wikipedia"),
        Checksum::Adler32(0x11e60398)
    );
}

#[test]
fn md5_vectors() {
    assert_eq!(
        digest(ChecksumKind::Md5, b"").to_hex(),
        "d41d8cd98f00b204e9800998ecf8427e"
    );
    assert_eq!(
        digest(ChecksumKind::Md5, b"abc").to_hex(),
        "900150983cd24fb0d6963f7d28e17f72"
    );
}

#[test]
fn sha1_vectors() {
    assert_eq!(
        digest(ChecksumKind::Sha1, b"").to_hex(),
        "da39a3ee5e6b4b0d3255bfef95601890afd80709"
    );
    assert_eq!(
        digest(ChecksumKind::Sha1, b"abc").to_hex(),
        "a9993e364706816aba3e25717850c26c9cd0d89d"
    );
}

#[test]
fn sha256_vectors() {
    assert_eq!(
        digest(ChecksumKind::Sha256, b"abc").to_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn pbkdf2_sha256_vector() {
    use sha2::Sha256;
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(b"password", b"salt", 1, &mut key);
    assert_eq!(
        key.to_vec(),
        hex("120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b")
    );

    pbkdf2::pbkdf2_hmac::<Sha256>(b"password", b"salt", 2, &mut key);
    assert_eq!(
        key.to_vec(),
        hex("ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43")
    );
}

#[test]
fn hmac_sha256_vector() {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(b"key").unwrap();
    mac.update(b"The quick brown fox jumps over the lazy dog");
    assert_eq!(
        mac.finalize().into_bytes().to_vec(),
        hex("f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8")
    );
}

#[test]
fn empty_input_checksums_are_well_defined() {
    // A zero-byte stored file still gets a digest: the hash of nothing.
    assert_eq!(
        digest(ChecksumKind::Sha1, b""),
        digest(ChecksumKind::Sha1, b"")
    );
    assert_eq!(digest(ChecksumKind::None, b"anything"), Checksum::None);
}
