//! Version 2 entry table records.
//!
//! The on-disk table is a zlib-compressed array of stride-16 records
//! sorted by ascending hash:
//!
//! ```text
//! u64 hash
//! u32 metadata_index  (4-byte block index into the metadata table)
//! u16 metadata_count  (number of chunk descriptors)
//! u16 flags           (bit 0 directory)
//! ```
//!
//! Offsets, sizes, and texture information live in the metadata table;
//! [`EntryV2`] is the assembled result of walking it.

use crate::error::{HashFsError, Result};
use crate::v2::texture::TextureInfo;

/// On-disk record stride.
pub const ENTRY_RECORD_V2_SIZE: usize = 16;

/// Entry flag bits.
pub mod flags {
    pub const DIRECTORY: u16 = 1 << 0;
}

/// A raw v2 entry table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRecordV2 {
    pub hash: u64,
    pub metadata_index: u32,
    pub metadata_count: u16,
    pub flags: u16,
}

impl EntryRecordV2 {
    /// Parse one record from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ENTRY_RECORD_V2_SIZE {
            return Err(HashFsError::CorruptTable(format!(
                "entry record truncated at {} bytes",
                data.len()
            )));
        }
        Ok(Self {
            hash: u64::from_le_bytes([
                data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
            ]),
            metadata_index: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            metadata_count: u16::from_le_bytes([data[12], data[13]]),
            flags: u16::from_le_bytes([data[14], data[15]]),
        })
    }

    /// Serialize the record.
    pub fn build(&self) -> [u8; ENTRY_RECORD_V2_SIZE] {
        let mut out = [0u8; ENTRY_RECORD_V2_SIZE];
        out[0..8].copy_from_slice(&self.hash.to_le_bytes());
        out[8..12].copy_from_slice(&self.metadata_index.to_le_bytes());
        out[12..14].copy_from_slice(&self.metadata_count.to_le_bytes());
        out[14..16].copy_from_slice(&self.flags.to_le_bytes());
        out
    }

    pub fn is_directory(&self) -> bool {
        self.flags & flags::DIRECTORY != 0
    }
}

/// A fully assembled v2 entry.
///
/// `flags`, `reserved_flags`, and `unknown` carry the main-metadata fields
/// this library does not interpret; they are preserved verbatim.
#[derive(Debug, Clone)]
pub struct EntryV2 {
    pub hash: u64,
    pub offset: u64,
    pub size: u32,
    pub compressed_size: u32,
    pub is_directory: bool,
    pub is_compressed: bool,
    pub flags: u8,
    pub reserved_flags: u8,
    pub unknown: u32,
    pub texture: Option<TextureInfo>,
}
