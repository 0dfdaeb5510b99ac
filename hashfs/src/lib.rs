//! Reader and writer for the HashFS game-archive container format.
//!
//! HashFS archives are flat single-file containers keyed by salted 64-bit
//! CityHash values over normalized paths. Two on-disk revisions exist:
//! v1 with a plain stride-32 entry table, and v2 with a compressed entry
//! table plus a chunked metadata table that can fuse a texture descriptor
//! and its surface file into one entry.
//!
//! # Reading
//!
//! ```no_run
//! use hashfs::HashFsReader;
//!
//! let mut reader = HashFsReader::open_file("base.scs")?;
//! for entry in reader.list_directory("/")? {
//!     println!("{} (dir: {})", entry.path, entry.is_directory);
//! }
//! let payload = reader.extract("/def/city.sii")?;
//! # Ok::<(), hashfs::HashFsError>(())
//! ```
//!
//! # Writing
//!
//! ```no_run
//! use hashfs::WriterV2;
//!
//! let mut writer = WriterV2::new();
//! writer.add_bytes(b"SiiNunit {}".to_vec(), "/def/city.sii")?;
//! writer.save_to_file("out.scs")?;
//! # Ok::<(), hashfs::HashFsError>(())
//! ```
//!
//! Everything is single-threaded and synchronous. A reader's tables are
//! immutable after open, but extraction moves the stream position; open
//! one reader per thread for parallel extraction.

pub mod bitfield;
pub mod compress;
pub mod dirtree;
pub mod entry;
pub mod error;
pub mod hash;
pub mod header;
pub mod reader;
pub mod v1;
pub mod v2;
pub mod writer;

pub use compress::CompressionLevel;
pub use entry::Entry;
pub use error::{HashFsError, Result};
pub use hash::hash_path;
pub use header::{MAGIC, PAYLOAD_OFFSET};
pub use reader::{DirEntry, EntryStatus, HashFsReader, OpenOptions};
pub use v1::WriterV1;
pub use v2::WriterV2;
pub use v2::texture::TextureInfo;

/// Watermark written after the final table of v2 archives and tolerated
/// on read.
pub const WATERMARK: &str = concat!("hashfs ", env!("CARGO_PKG_VERSION"));
