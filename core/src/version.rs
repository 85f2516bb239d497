//! Setup data version detection.
//!
//! Every installer embeds a human-readable signature string right before the
//! first metadata block. The decoder only proceeds when the signature matches
//! a known entry, because nearly every record layout is gated on the exact
//! version; with `accept_unknown` the version digits are parsed out of the
//! string instead and the result is marked suspicious.

use std::fmt;
use std::io::{self, Read};

use log::debug;

use crate::error::{InnoError, Result};

/// Packed (a, b, c, d) version with the two format-wide mode switches.
/// Comparisons (and equality) look at the packed value only.
#[derive(Debug, Clone, Copy, Default)]
pub struct InnoVersion {
    pub value: u32,
    /// Strings are UTF-16LE rather than a Windows codepage.
    pub unicode: bool,
    /// 16 or 32; affects count field widths in 1.2.x installers.
    pub bits: u8,
    /// False when the tuple was guessed from an unknown signature.
    pub known: bool,
    /// True for signatures shared by more than one release.
    pub suspicious: bool,
}

/// Builds the packed constant used in version comparisons.
pub const fn inno_version(a: u8, b: u8, c: u8, d: u8) -> u32 {
    ((a as u32) << 24) | ((b as u32) << 16) | ((c as u32) << 8) | (d as u32)
}

impl InnoVersion {
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        InnoVersion {
            value: inno_version(a, b, c, d),
            unicode: false,
            bits: 32,
            known: true,
            suspicious: false,
        }
    }

    pub fn a(&self) -> u8 {
        (self.value >> 24) as u8
    }
    pub fn b(&self) -> u8 {
        (self.value >> 16) as u8
    }
    pub fn c(&self) -> u8 {
        (self.value >> 8) as u8
    }
    pub fn d(&self) -> u8 {
        self.value as u8
    }

    /// The codepage implied by the format variant (overridable per language).
    pub fn codepage(&self) -> u32 {
        if self.unicode { 1200 } else { 1252 }
    }

    /// Reads the stored signature and resolves it against the known tables.
    pub fn load<R: Read>(reader: &mut R, accept_unknown: bool) -> Result<Self> {
        let mut legacy = [0u8; 12];
        reader.read_exact(&mut legacy).map_err(InnoError::from_read)?;

        if legacy[0] == b'i' && legacy[11] == 0x1a {
            let name = String::from_utf8_lossy(&legacy[..11]).into_owned();
            debug!("found legacy version signature {name:?}");
            for (signature, version, bits) in LEGACY_VERSIONS {
                if **signature == legacy {
                    let mut found = InnoVersion::new_legacy(*version, *bits);
                    found.known = true;
                    return Ok(found);
                }
            }
            if accept_unknown {
                if let Some(mut guessed) = guess_from_signature(&name) {
                    guessed.bits = if name.contains("16") { 16 } else { 32 };
                    return Ok(guessed);
                }
            }
            return Err(InnoError::UnknownVersion(name));
        }

        let mut stored = [0u8; 64];
        stored[..12].copy_from_slice(&legacy);
        reader
            .read_exact(&mut stored[12..])
            .map_err(InnoError::from_read)?;

        let end = stored.iter().position(|&b| b == 0).unwrap_or(stored.len());
        let name = String::from_utf8_lossy(&stored[..end]).into_owned();
        debug!("found version signature {name:?}");

        for (signature, version, unicode) in KNOWN_VERSIONS {
            if signature.as_bytes().len() <= stored.len()
                && &stored[..signature.len()] == signature.as_bytes()
                && stored[signature.len()..].iter().all(|&b| b == 0)
            {
                let mut found = InnoVersion {
                    value: *version,
                    unicode: *unicode,
                    bits: 32,
                    known: true,
                    suspicious: false,
                };
                found.suspicious = found.is_ambiguous();
                return Ok(found);
            }
        }

        if accept_unknown {
            if let Some(guessed) = guess_from_signature(&name) {
                return Ok(guessed);
            }
        }
        Err(InnoError::UnknownVersion(name))
    }

    fn new_legacy(value: u32, bits: u8) -> Self {
        InnoVersion {
            value,
            unicode: false,
            bits,
            known: true,
            suspicious: false,
        }
    }

    /// Signatures shared between two releases; the earlier one is reported.
    fn is_ambiguous(&self) -> bool {
        self.value == inno_version(2, 0, 1, 0)
            || self.value == inno_version(3, 0, 3, 0)
            || self.value == inno_version(4, 2, 3, 0)
    }
}

impl PartialEq for InnoVersion {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for InnoVersion {}

impl PartialOrd for InnoVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InnoVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl PartialEq<u32> for InnoVersion {
    fn eq(&self, other: &u32) -> bool {
        self.value == *other
    }
}

impl PartialOrd<u32> for InnoVersion {
    fn partial_cmp(&self, other: &u32) -> Option<std::cmp::Ordering> {
        Some(self.value.cmp(other))
    }
}

impl fmt::Display for InnoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.a(), self.b(), self.c())?;
        if self.d() != 0 {
            write!(f, ".{}", self.d())?;
        }
        if self.unicode {
            write!(f, " (unicode)")?;
        }
        if self.bits != 32 {
            write!(f, " ({}-bit)", self.bits)?;
        }
        if !self.known {
            write!(f, " [unsupported]")?;
        }
        Ok(())
    }
}

/// Best-effort tuple for signatures not in the table: the digits are pulled
/// straight out of the string.
fn guess_from_signature(name: &str) -> Option<InnoVersion> {
    let open = name.find('(')?;
    let close = name[open..].find(')')? + open;
    let mut parts = name[open + 1..close]
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .split('.');
    let a: u8 = parts.next()?.trim().parse().ok()?;
    let b: u8 = parts.next()?.trim().parse().ok()?;
    let c: u8 = parts.next()?.trim().parse().ok()?;
    let d: u8 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    Some(InnoVersion {
        value: inno_version(a, b, c, d),
        unicode: name.contains("(u)") || a >= 6,
        bits: 32,
        known: false,
        suspicious: true,
    })
}

const LEGACY_VERSIONS: &[(&[u8; 12], u32, u8)] = &[
    (b"i1.2.10--16\x1a", inno_version(1, 2, 10, 0), 16),
    (b"i1.2.10--32\x1a", inno_version(1, 2, 10, 0), 32),
];

#[rustfmt::skip]
const KNOWN_VERSIONS: &[(&str, u32, bool)] = &[
    ("Inno Setup Setup Data (1.3.21)",                inno_version(1, 3, 21, 0), false),
    ("Inno Setup Setup Data (1.3.25)",                inno_version(1, 3, 25, 0), false),
    ("Inno Setup Setup Data (2.0.0)",                 inno_version(2, 0,  0, 0), false),
    ("Inno Setup Setup Data (2.0.1)",                 inno_version(2, 0,  1, 0), false), // or 2.0.2
    ("Inno Setup Setup Data (2.0.5)",                 inno_version(2, 0,  5, 0), false),
    ("Inno Setup Setup Data (2.0.6a)",                inno_version(2, 0,  6, 0), false),
    ("Inno Setup Setup Data (2.0.7)",                 inno_version(2, 0,  7, 0), false),
    ("Inno Setup Setup Data (2.0.8)",                 inno_version(2, 0,  8, 0), false),
    ("Inno Setup Setup Data (2.0.11)",                inno_version(2, 0, 11, 0), false),
    ("Inno Setup Setup Data (2.0.17)",                inno_version(2, 0, 17, 0), false),
    ("Inno Setup Setup Data (2.0.18)",                inno_version(2, 0, 18, 0), false),
    ("Inno Setup Setup Data (3.0.0a)",                inno_version(3, 0,  0, 0), false),
    ("Inno Setup Setup Data (3.0.1)",                 inno_version(3, 0,  1, 0), false),
    ("Inno Setup Setup Data (3.0.3)",                 inno_version(3, 0,  3, 0), false), // or 3.0.4
    ("Inno Setup Setup Data (3.0.5)",                 inno_version(3, 0,  5, 0), false),
    ("My Inno Setup Extensions Setup Data (3.0.6.1)", inno_version(3, 0,  6, 1), false),
    ("Inno Setup Setup Data (4.0.0a)",                inno_version(4, 0,  0, 0), false),
    ("Inno Setup Setup Data (4.0.1)",                 inno_version(4, 0,  1, 0), false),
    ("Inno Setup Setup Data (4.0.3)",                 inno_version(4, 0,  3, 0), false),
    ("Inno Setup Setup Data (4.0.5)",                 inno_version(4, 0,  5, 0), false),
    ("Inno Setup Setup Data (4.0.9)",                 inno_version(4, 0,  9, 0), false),
    ("Inno Setup Setup Data (4.0.10)",                inno_version(4, 0, 10, 0), false),
    ("Inno Setup Setup Data (4.0.11)",                inno_version(4, 0, 11, 0), false),
    ("Inno Setup Setup Data (4.1.0)",                 inno_version(4, 1,  0, 0), false),
    ("Inno Setup Setup Data (4.1.2)",                 inno_version(4, 1,  2, 0), false),
    ("Inno Setup Setup Data (4.1.3)",                 inno_version(4, 1,  3, 0), false),
    ("Inno Setup Setup Data (4.1.4)",                 inno_version(4, 1,  4, 0), false),
    ("Inno Setup Setup Data (4.1.5)",                 inno_version(4, 1,  5, 0), false),
    ("Inno Setup Setup Data (4.1.6)",                 inno_version(4, 1,  6, 0), false),
    ("Inno Setup Setup Data (4.1.8)",                 inno_version(4, 1,  8, 0), false),
    ("Inno Setup Setup Data (4.2.0)",                 inno_version(4, 2,  0, 0), false),
    ("Inno Setup Setup Data (4.2.1)",                 inno_version(4, 2,  1, 0), false),
    ("Inno Setup Setup Data (4.2.2)",                 inno_version(4, 2,  2, 0), false),
    ("Inno Setup Setup Data (4.2.3)",                 inno_version(4, 2,  3, 0), false), // or 4.2.4
    ("Inno Setup Setup Data (4.2.5)",                 inno_version(4, 2,  5, 0), false),
    ("Inno Setup Setup Data (4.2.6)",                 inno_version(4, 2,  6, 0), false),
    ("Inno Setup Setup Data (5.0.0)",                 inno_version(5, 0,  0, 0), false),
    ("Inno Setup Setup Data (5.0.1)",                 inno_version(5, 0,  1, 0), false),
    ("Inno Setup Setup Data (5.0.3)",                 inno_version(5, 0,  3, 0), false),
    ("Inno Setup Setup Data (5.0.4)",                 inno_version(5, 0,  4, 0), false),
    ("Inno Setup Setup Data (5.1.0)",                 inno_version(5, 1,  0, 0), false),
    ("Inno Setup Setup Data (5.1.2)",                 inno_version(5, 1,  2, 0), false),
    ("Inno Setup Setup Data (5.1.7)",                 inno_version(5, 1,  7, 0), false),
    ("Inno Setup Setup Data (5.1.10)",                inno_version(5, 1, 10, 0), false),
    ("Inno Setup Setup Data (5.1.13)",                inno_version(5, 1, 13, 0), false),
    ("Inno Setup Setup Data (5.2.0)",                 inno_version(5, 2,  0, 0), false),
    ("Inno Setup Setup Data (5.2.1)",                 inno_version(5, 2,  1, 0), false),
    ("Inno Setup Setup Data (5.2.3)",                 inno_version(5, 2,  3, 0), false),
    ("Inno Setup Setup Data (5.2.5)",                 inno_version(5, 2,  5, 0), false),
    ("Inno Setup Setup Data (5.2.5) (u)",             inno_version(5, 2,  5, 0), true),
    ("Inno Setup Setup Data (5.3.0)",                 inno_version(5, 3,  0, 0), false),
    ("Inno Setup Setup Data (5.3.0) (u)",             inno_version(5, 3,  0, 0), true),
    ("Inno Setup Setup Data (5.3.3)",                 inno_version(5, 3,  3, 0), false),
    ("Inno Setup Setup Data (5.3.3) (u)",             inno_version(5, 3,  3, 0), true),
    ("Inno Setup Setup Data (5.3.5)",                 inno_version(5, 3,  5, 0), false),
    ("Inno Setup Setup Data (5.3.5) (u)",             inno_version(5, 3,  5, 0), true),
    ("Inno Setup Setup Data (5.3.6)",                 inno_version(5, 3,  6, 0), false),
    ("Inno Setup Setup Data (5.3.6) (u)",             inno_version(5, 3,  6, 0), true),
    ("Inno Setup Setup Data (5.3.7)",                 inno_version(5, 3,  7, 0), false),
    ("Inno Setup Setup Data (5.3.7) (u)",             inno_version(5, 3,  7, 0), true),
    ("Inno Setup Setup Data (5.3.8)",                 inno_version(5, 3,  8, 0), false),
    ("Inno Setup Setup Data (5.3.8) (u)",             inno_version(5, 3,  8, 0), true),
    ("Inno Setup Setup Data (5.3.9)",                 inno_version(5, 3,  9, 0), false),
    ("Inno Setup Setup Data (5.3.9) (u)",             inno_version(5, 3,  9, 0), true),
    ("Inno Setup Setup Data (5.3.10)",                inno_version(5, 3, 10, 0), false),
    ("Inno Setup Setup Data (5.3.10) (u)",            inno_version(5, 3, 10, 0), true),
    ("Inno Setup Setup Data (5.4.2)",                 inno_version(5, 4,  2, 0), false),
    ("Inno Setup Setup Data (5.4.2) (u)",             inno_version(5, 4,  2, 0), true),
    ("Inno Setup Setup Data (5.5.0)",                 inno_version(5, 5,  0, 0), false),
    ("Inno Setup Setup Data (5.5.0) (u)",             inno_version(5, 5,  0, 0), true),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stored(signature: &str) -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[..signature.len()].copy_from_slice(signature.as_bytes());
        data
    }

    #[test]
    fn known_signature() {
        let data = stored("Inno Setup Setup Data (5.5.0) (u)");
        let version = InnoVersion::load(&mut Cursor::new(data), false).unwrap();
        assert_eq!(version.value, inno_version(5, 5, 0, 0));
        assert!(version.unicode);
        assert!(version.known);
        assert!(!version.suspicious);
    }

    #[test]
    fn legacy_signature() {
        let version =
            InnoVersion::load(&mut Cursor::new(b"i1.2.10--16\x1a".to_vec()), false).unwrap();
        assert_eq!(version.value, inno_version(1, 2, 10, 0));
        assert_eq!(version.bits, 16);
        assert!(!version.unicode);
    }

    #[test]
    fn ambiguous_signature_is_suspicious() {
        let data = stored("Inno Setup Setup Data (2.0.1)");
        let version = InnoVersion::load(&mut Cursor::new(data), false).unwrap();
        assert_eq!(version.value, inno_version(2, 0, 1, 0));
        assert!(version.suspicious);
    }

    #[test]
    fn unknown_signature_rejected_by_default() {
        let data = stored("Inno Setup Setup Data (6.2.0) (u)");
        assert!(matches!(
            InnoVersion::load(&mut Cursor::new(data.clone()), false),
            Err(InnoError::UnknownVersion(_))
        ));

        let version = InnoVersion::load(&mut Cursor::new(data), true).unwrap();
        assert_eq!(version.value, inno_version(6, 2, 0, 0));
        assert!(version.unicode);
        assert!(!version.known);
        assert!(version.suspicious);
    }

    #[test]
    fn version_ordering() {
        assert!(InnoVersion::new(5, 3, 9, 0) > inno_version(5, 2, 5, 0));
        assert!(InnoVersion::new(4, 2, 5, 0) >= inno_version(4, 2, 5, 0));
        assert!(InnoVersion::new(1, 3, 21, 0) < inno_version(2, 0, 0, 0));
    }
}
