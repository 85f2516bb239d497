//! Windows codepage to UTF-8 conversion.
//!
//! Legacy installers store strings in a single-byte codepage (1252 unless a
//! language entry overrides it); Unicode installers store UTF-16LE. Both are
//! normalized to `String` here. Unpaired UTF-16 surrogates decode to U+FFFD;
//! Rust strings cannot carry WTF-8.

use encoding_rs::Encoding;

/// Codepage id used for UTF-16LE text.
pub const CP_UTF16LE: u32 = 1200;

/// Maps a Windows codepage id to an `encoding_rs` encoding. Unknown ids fall
/// back to Windows-1252, which matches how the installers themselves behave
/// on systems without the requested codepage.
pub fn encoding_for_codepage(codepage: u32) -> &'static Encoding {
    match codepage {
        437 | 850 => encoding_rs::WINDOWS_1252,
        708 | 720 | 864 => encoding_rs::ISO_8859_6,
        866 => encoding_rs::IBM866,
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1252 => encoding_rs::WINDOWS_1252,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        20866 => encoding_rs::KOI8_R,
        21866 => encoding_rs::KOI8_U,
        28591 => encoding_rs::WINDOWS_1252, // ISO-8859-1 is decoded as its superset
        28592 => encoding_rs::ISO_8859_2,
        28593 => encoding_rs::ISO_8859_3,
        28594 => encoding_rs::ISO_8859_4,
        28595 => encoding_rs::ISO_8859_5,
        28596 => encoding_rs::ISO_8859_6,
        28597 => encoding_rs::ISO_8859_7,
        28598 => encoding_rs::ISO_8859_8,
        28603 => encoding_rs::ISO_8859_13,
        28605 => encoding_rs::ISO_8859_15,
        54936 => encoding_rs::GB18030,
        65001 => encoding_rs::UTF_8,
        _ => encoding_rs::WINDOWS_1252,
    }
}

/// Decodes raw string bytes using the given codepage (1200 = UTF-16LE).
pub fn decode_string(raw: &[u8], codepage: u32) -> String {
    if codepage == CP_UTF16LE {
        utf16le_to_string(raw)
    } else {
        let (decoded, _, _) = encoding_for_codepage(codepage).decode(raw);
        decoded.into_owned()
    }
}

fn utf16le_to_string(raw: &[u8]) -> String {
    let mut units = Vec::with_capacity(raw.len() / 2);
    let mut chunks = raw.chunks_exact(2);
    for pair in &mut chunks {
        units.push(u16::from_le_bytes([pair[0], pair[1]]));
    }
    let mut out: String = char::decode_utf16(units.into_iter())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if !chunks.remainder().is_empty() {
        // Odd byte count; the stray byte cannot form a code unit.
        out.push(char::REPLACEMENT_CHARACTER);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows1252_high_bytes() {
        // 0x80 is the euro sign in CP1252, not U+0080.
        assert_eq!(decode_string(&[0x80, 0x41], 1252), "\u{20ac}A");
    }

    #[test]
    fn utf16le_basic_and_supplementary() {
        let mut raw = Vec::new();
        for unit in "ab\u{1F600}".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_string(&raw, CP_UTF16LE), "ab\u{1F600}");
    }

    #[test]
    fn utf16le_lone_surrogate_is_replaced() {
        let raw = [0x00, 0xd8, b'x', 0x00];
        assert_eq!(decode_string(&raw, CP_UTF16LE), "\u{fffd}x");
    }

    #[test]
    fn unknown_codepage_falls_back_to_1252() {
        assert_eq!(decode_string(b"abc", 99999), "abc");
    }
}
