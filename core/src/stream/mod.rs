//! Pull-based filter stack for the installer's nested stream formats.
//!
//! Everything here implements `std::io::Read` and composes by wrapping; the
//! shape of a chain is fixed when a block or chunk is opened, so dynamic
//! dispatch happens once per chunk, not per byte. Typed failures travel
//! through the chains boxed inside `io::Error` and are unwrapped at the
//! orchestrator boundary.

pub mod block;
pub mod chunk;
pub mod exefilter;
pub mod lzma;
pub mod slice;

mod checksum;
mod restrict;

pub use block::BlockReader;
pub use checksum::ChecksumReader;
pub use chunk::{Chunk, ChunkReader, CompressionMethod, EncryptionKey, EncryptionMethod};
pub use restrict::RestrictedReader;
pub use slice::SliceReader;
