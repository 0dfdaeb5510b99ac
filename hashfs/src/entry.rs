//! The version-independent entry view.

use crate::v1::entry::EntryV1;
use crate::v2::entry::EntryV2;
use crate::v2::texture::TextureInfo;

/// An archive entry, keyed by its 64-bit path hash.
///
/// The two revisions store rather different records; this enum carries the
/// parsed form and exposes the shared capability set.
#[derive(Debug, Clone)]
pub enum Entry {
    V1(EntryV1),
    V2(EntryV2),
}

impl Entry {
    /// Path hash keying the entry.
    pub fn hash(&self) -> u64 {
        match self {
            Self::V1(e) => e.hash,
            Self::V2(e) => e.hash,
        }
    }

    /// Byte offset of the payload within the archive.
    pub fn offset(&self) -> u64 {
        match self {
            Self::V1(e) => e.offset,
            Self::V2(e) => e.offset,
        }
    }

    /// Logical (uncompressed) payload size.
    ///
    /// For v2 texture entries this equals [`Entry::compressed_size`]: the
    /// archive stores only the repacked surface bytes.
    pub fn size(&self) -> u32 {
        match self {
            Self::V1(e) => e.size,
            Self::V2(e) => e.size,
        }
    }

    /// Stored payload size.
    pub fn compressed_size(&self) -> u32 {
        match self {
            Self::V1(e) => e.compressed_size,
            Self::V2(e) => e.compressed_size,
        }
    }

    pub fn is_directory(&self) -> bool {
        match self {
            Self::V1(e) => e.is_directory(),
            Self::V2(e) => e.is_directory,
        }
    }

    pub fn is_compressed(&self) -> bool {
        match self {
            Self::V1(e) => e.is_compressed(),
            Self::V2(e) => e.is_compressed,
        }
    }

    /// CRC32 of the payload; v1 only, may be zero.
    pub fn crc32(&self) -> Option<u32> {
        match self {
            Self::V1(e) => Some(e.crc),
            Self::V2(_) => None,
        }
    }

    /// Texture metadata; present for v2 texture entries only.
    pub fn texture(&self) -> Option<&TextureInfo> {
        match self {
            Self::V1(_) => None,
            Self::V2(e) => e.texture.as_ref(),
        }
    }
}
