//! Adapters for the installer's two LZMA dialects.
//!
//! Neither stream carries the standard container headers: LZMA1 payloads are
//! prefixed with just a packed properties byte and a 4-byte dictionary size
//! (no uncompressed-size field), and LZMA2 payloads with a single
//! dictionary-size code byte. The headers are parsed here and the raw
//! decoders come from `lzma-rust2`.

use std::io::Read;

use byteorder::{LE, ReadBytesExt};
use lzma_rust2::{Lzma2Reader, LzmaReader};

use crate::error::{InnoError, Result};

/// Maximum packed properties value: `((pb * 5) + lp) * 9 + lc` with
/// pb, lp < 5 and lc < 9.
const MAX_LZMA1_PROPS: u8 = 9 * 5 * 5;

/// Opens an LZMA1 decoder over `source` after consuming the 5-byte header.
/// The decompressed length is bounded by the enclosing restriction, so the
/// decoder runs with an unknown size.
pub fn lzma1_decoder<R: Read>(mut source: R) -> Result<LzmaReader<R>> {
    let props = source.read_u8().map_err(InnoError::from_read)?;
    if props > MAX_LZMA1_PROPS {
        return Err(InnoError::DecompressorFormat("lzma1 properties out of range"));
    }
    let dict_size = source.read_u32::<LE>().map_err(InnoError::from_read)?;

    LzmaReader::new_with_props(source, u64::MAX, props, dict_size, None)
        .map_err(|_| InnoError::DecompressorFormat("lzma1 header rejected"))
}

/// Opens an LZMA2 decoder over `source` after consuming the one-byte
/// dictionary-size code.
pub fn lzma2_decoder<R: Read>(mut source: R) -> Result<Lzma2Reader<R>> {
    let prop = source.read_u8().map_err(InnoError::from_read)?;
    if prop > 40 {
        return Err(InnoError::DecompressorFormat("lzma2 dictionary code out of range"));
    }
    let dict_size = if prop == 40 {
        0xffff_ffff
    } else {
        (2 | u32::from(prop) & 1) << (prop / 2 + 11)
    };
    Ok(Lzma2Reader::new(source, dict_size, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lzma1_rejects_bad_properties() {
        let header = [0xff, 0, 0, 1, 0];
        assert!(matches!(
            lzma1_decoder(&header[..]),
            Err(InnoError::DecompressorFormat(_))
        ));
    }

    #[test]
    fn lzma2_rejects_bad_dictionary_code() {
        assert!(matches!(
            lzma2_decoder(&[41u8][..]),
            Err(InnoError::DecompressorFormat(_))
        ));
    }

    #[test]
    fn lzma2_dictionary_sizes() {
        // Codes map to (2 | (p & 1)) << (p / 2 + 11); 40 means 4 GiB - 1.
        for (prop, expected) in [(0u8, 0x1000u32), (1, 0x1800), (2, 0x2000), (30, 0x0400_0000)] {
            let dict = if prop == 40 {
                0xffff_ffff
            } else {
                (2 | u32::from(prop) & 1) << (prop / 2 + 11)
            };
            assert_eq!(dict, expected, "prop {prop}");
        }
    }

    #[test]
    fn truncated_header_reports_truncation() {
        assert!(matches!(
            lzma1_decoder(&[0x5d, 0, 0][..]),
            Err(InnoError::Truncated)
        ));
    }
}
