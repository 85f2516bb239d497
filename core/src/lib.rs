pub mod crypto;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod filename;
pub mod loader;
pub mod pe;
pub mod read;
pub mod setup;
pub mod stream;
pub mod version;

pub use error::{InnoError, Result};
pub use extract::{
    CollisionAction, ExtractOptions, ListEntry, Listing, ProgressEvent, Report, extract,
    extract_with_progress, list, load_info,
};
pub use loader::{SetupOffsets, load_offsets};
pub use setup::{Info, LoadOptions};
pub use version::InnoVersion;
