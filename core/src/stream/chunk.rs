//! Data chunk access: one compressed (and optionally encrypted) unit inside
//! the slice stream, holding the payloads of one or more files.

use std::io::Read;

use bzip2::read::BzDecoder;
use flate2::read::ZlibDecoder;
use log::debug;
use md5::{Digest, Md5};
use serde::Serialize;
use sha1::Sha1;

use crate::crypto::arc4::Arc4;
use crate::error::{InnoError, Result};
use crate::stream::lzma::{lzma1_decoder, lzma2_decoder};
use crate::stream::restrict::RestrictedReader;
use crate::stream::slice::SliceReader;

const CHUNK_MAGIC: [u8; 4] = *b"zlb\x1a";

/// Compression method for data chunks and the global default recorded in the
/// setup header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub enum CompressionMethod {
    Stored,
    Zlib,
    BZip2,
    Lzma1,
    Lzma2,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EncryptionMethod {
    #[default]
    Plaintext,
    Arc4Md5,
    Arc4Sha1,
    XChaCha20,
}

/// Identity of one chunk within the data stream. Extraction visits chunks in
/// the derived order: ascending slice, then offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Chunk {
    pub first_slice: u32,
    pub offset: u32,
    /// Compressed bytes stored on disk, excluding the magic and any
    /// encryption material.
    pub size: u64,
    pub compression: CompressionMethod,
    pub encryption: EncryptionMethod,
    pub last_slice: u32,
}

/// Key material for encrypted chunks, derived once per extraction.
pub enum EncryptionKey {
    None,
    /// Raw password bytes; each chunk salts and hashes them itself.
    Password(Vec<u8>),
    /// PBKDF2-derived XChaCha20 key.
    XChaCha20([u8; 32]),
}

struct Arc4Reader<R> {
    inner: R,
    cipher: Arc4,
}

impl<R: Read> Read for Arc4Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.cipher.crypt(&mut buf[..n]);
        Ok(n)
    }
}

struct XChaCha20Reader<R> {
    inner: R,
    cipher: chacha20::XChaCha20,
}

impl<R: Read> Read for XChaCha20Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        use chacha20::cipher::StreamCipher;
        let n = self.inner.read(buf)?;
        self.cipher.apply_keystream(&mut buf[..n]);
        Ok(n)
    }
}

/// Stream over one chunk's decompressed bytes.
pub struct ChunkReader;

impl ChunkReader {
    /// Seeks the slice reader to the chunk, checks the magic, and stacks
    /// decryption, decompression and the length cap.
    pub fn open<'a>(
        slices: &'a mut SliceReader,
        chunk: &Chunk,
        key: &EncryptionKey,
    ) -> Result<Box<dyn Read + 'a>> {
        debug!(
            "[chunk] opening {:?} chunk @ slice {} + {:#x}",
            chunk.compression, chunk.first_slice, chunk.offset
        );

        slices.seek(chunk.first_slice as usize, chunk.offset)?;

        let mut magic = [0u8; 4];
        slices
            .read_exact(&mut magic)
            .map_err(InnoError::from_read)?;
        if magic != CHUNK_MAGIC {
            return Err(InnoError::ChunkMagic);
        }

        let mut reader: Box<dyn Read + 'a> = match (chunk.encryption, key) {
            (EncryptionMethod::Plaintext, _) => {
                Box::new(RestrictedReader::new(slices, chunk.size))
            }
            (EncryptionMethod::Arc4Md5 | EncryptionMethod::Arc4Sha1, EncryptionKey::Password(password)) => {
                let mut salt = [0u8; 8];
                slices.read_exact(&mut salt).map_err(InnoError::from_read)?;

                let cipher = if chunk.encryption == EncryptionMethod::Arc4Sha1 {
                    let mut hasher = Sha1::new();
                    hasher.update(salt);
                    hasher.update(password);
                    let key: [u8; 20] = hasher.finalize().into();
                    Arc4::with_discard(&key)
                } else {
                    let mut hasher = Md5::new();
                    hasher.update(salt);
                    hasher.update(password);
                    let key: [u8; 16] = hasher.finalize().into();
                    Arc4::with_discard(&key)
                };
                Box::new(Arc4Reader {
                    inner: RestrictedReader::new(slices, chunk.size),
                    cipher,
                })
            }
            (EncryptionMethod::XChaCha20, EncryptionKey::XChaCha20(key)) => {
                use chacha20::cipher::KeyIvInit;
                let mut nonce = [0u8; 24];
                slices
                    .read_exact(&mut nonce)
                    .map_err(InnoError::from_read)?;
                let cipher = chacha20::XChaCha20::new(key.into(), (&nonce).into());
                Box::new(XChaCha20Reader {
                    inner: RestrictedReader::new(slices, chunk.size),
                    cipher,
                })
            }
            _ => return Err(InnoError::PasswordRequired),
        };

        if chunk.compression != CompressionMethod::Stored {
            reader = match chunk.compression {
                CompressionMethod::Zlib => Box::new(ZlibDecoder::new(reader)),
                CompressionMethod::BZip2 => Box::new(BzDecoder::new(reader)),
                CompressionMethod::Lzma1 => Box::new(lzma1_decoder(reader)?),
                CompressionMethod::Lzma2 => Box::new(lzma2_decoder(reader)?),
                CompressionMethod::Stored => unreachable!(),
                CompressionMethod::Unknown => {
                    return Err(InnoError::DecompressorFormat("unknown chunk compression"));
                }
            };
        }

        Ok(reader)
    }
}
