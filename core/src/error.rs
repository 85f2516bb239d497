use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InnoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unexpected end of stream")]
    Truncated,

    #[error("no valid setup loader offset table found")]
    OffsetTableMissing,

    #[error("CRC32 mismatch in setup loader offset table")]
    OffsetTableChecksum,

    #[error("unknown setup data version: {0:?}")]
    UnknownVersion(String),

    #[error("block header CRC32 mismatch")]
    BlockHeader,

    #[error("block fragment CRC32 mismatch")]
    BlockChecksum,

    #[error("slice file not found: {0}")]
    SliceMissing(PathBuf),

    #[error("bad magic number in slice file {0}")]
    SliceMagicBad(PathBuf),

    #[error("slice size {size} exceeds limit {limit}")]
    SliceSizeOverflow { size: u64, limit: u64 },

    #[error("bad chunk magic")]
    ChunkMagic,

    #[error("decompressor rejected input: {0}")]
    DecompressorFormat(&'static str),

    #[error("overlapping file data within a chunk")]
    ChunkOverlap,

    #[error("setup files are encrypted but no password was given")]
    PasswordRequired,

    #[error("incorrect password")]
    PasswordBad,

    #[error("refusing to write outside the output directory: {0:?}")]
    UnsafePath(String),

    #[error("extraction cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, InnoError>;

impl InnoError {
    /// Wraps a typed error so it can travel through a `std::io::Read` chain.
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            InnoError::Io(e) => e,
            other => io::Error::other(other),
        }
    }

    /// Recovers a typed error smuggled through the filter stack with
    /// [`InnoError::into_io`]; bare `UnexpectedEof` becomes `Truncated`.
    pub(crate) fn from_read(e: io::Error) -> Self {
        if e.get_ref().is_some_and(|inner| inner.is::<InnoError>()) {
            return *e
                .into_inner()
                .expect("checked above")
                .downcast::<InnoError>()
                .expect("checked above");
        }
        if e.kind() == io::ErrorKind::UnexpectedEof {
            InnoError::Truncated
        } else {
            InnoError::Io(e)
        }
    }
}

impl From<binrw::Error> for InnoError {
    fn from(e: binrw::Error) -> Self {
        match e {
            binrw::Error::Io(io) => InnoError::from_read(io),
            other => InnoError::Io(io::Error::other(other)),
        }
    }
}
