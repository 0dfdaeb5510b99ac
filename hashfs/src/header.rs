//! Archive header codec.
//!
//! Both revisions share a prelude; the version field dispatches the tail.
//! Writers emit the header last, seeking back to offset 0 once every table
//! offset is known.
//!
//! # Layout (little-endian)
//!
//! ```text
//! offset 0x00: u32 magic "SCS#"
//! offset 0x04: u16 version (1 or 2)
//! offset 0x06: u16 salt
//! offset 0x08: [u8; 4] hash method ("CITY")
//!
//! v1 tail:
//!   u32 num_entries
//!   u32 start_offset          (byte offset of the entry table)
//!
//! v2 tail:
//!   u32 entry_table_length    (compressed bytes)
//!   u32 num_metadata_entries
//!   u32 metadata_table_length (compressed bytes)
//!   u64 entry_table_start
//!   u64 metadata_table_start
//!   u64 security_descriptor_offset (0)
//!   u16 platform              (0 = PC, the only supported value)
//! ```

use std::io::{self, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{HashFsError, Result};

/// `"SCS#"` magic.
pub const MAGIC: u32 = 0x2353_4353;

/// The only supported hash method.
pub const HASH_METHOD_CITY: [u8; 4] = *b"CITY";

/// The only supported platform value.
pub const PLATFORM_PC: u16 = 0;

/// Byte offset where the payload region starts, both revisions.
pub const PAYLOAD_OFFSET: u64 = 4096;

/// Header size on disk, v1.
pub const HEADER_V1_SIZE: usize = 20;

/// Header size on disk, v2.
pub const HEADER_V2_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderV1 {
    pub salt: u16,
    pub num_entries: u32,
    pub start_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderV2 {
    pub salt: u16,
    pub entry_table_length: u32,
    pub num_metadata_entries: u32,
    pub metadata_table_length: u32,
    pub entry_table_start: u64,
    pub metadata_table_start: u64,
    pub security_descriptor_offset: u64,
    pub platform: u16,
}

/// A parsed archive header, discriminated by version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    V1(HeaderV1),
    V2(HeaderV2),
}

impl Header {
    /// Parse a header from the start of a stream.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = reader.read_u32::<LittleEndian>().map_err(short_is_not_hashfs)?;
        if magic != MAGIC {
            return Err(HashFsError::NotHashFs);
        }
        let version = reader.read_u16::<LittleEndian>()?;
        let salt = reader.read_u16::<LittleEndian>()?;
        let mut hash_method = [0u8; 4];
        reader.read_exact(&mut hash_method)?;
        if hash_method != HASH_METHOD_CITY {
            return Err(HashFsError::UnsupportedHashMethod(
                String::from_utf8_lossy(&hash_method).into_owned(),
            ));
        }

        match version {
            1 => {
                let num_entries = reader.read_u32::<LittleEndian>()?;
                let start_offset = reader.read_u32::<LittleEndian>()?;
                Ok(Self::V1(HeaderV1 {
                    salt,
                    num_entries,
                    start_offset,
                }))
            }
            2 => {
                let entry_table_length = reader.read_u32::<LittleEndian>()?;
                let num_metadata_entries = reader.read_u32::<LittleEndian>()?;
                let metadata_table_length = reader.read_u32::<LittleEndian>()?;
                let entry_table_start = reader.read_u64::<LittleEndian>()?;
                let metadata_table_start = reader.read_u64::<LittleEndian>()?;
                let security_descriptor_offset = reader.read_u64::<LittleEndian>()?;
                let platform = reader.read_u16::<LittleEndian>()?;
                if platform != PLATFORM_PC {
                    return Err(HashFsError::UnsupportedFeature(format!(
                        "platform {platform}"
                    )));
                }
                Ok(Self::V2(HeaderV2 {
                    salt,
                    entry_table_length,
                    num_metadata_entries,
                    metadata_table_length,
                    entry_table_start,
                    metadata_table_start,
                    security_descriptor_offset,
                    platform,
                }))
            }
            other => Err(HashFsError::UnsupportedVersion(other)),
        }
    }

    /// Serialize the header.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_V2_SIZE);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&self.version().to_le_bytes());
        out.extend_from_slice(&self.salt().to_le_bytes());
        out.extend_from_slice(&HASH_METHOD_CITY);
        match self {
            Self::V1(h) => {
                out.extend_from_slice(&h.num_entries.to_le_bytes());
                out.extend_from_slice(&h.start_offset.to_le_bytes());
            }
            Self::V2(h) => {
                out.extend_from_slice(&h.entry_table_length.to_le_bytes());
                out.extend_from_slice(&h.num_metadata_entries.to_le_bytes());
                out.extend_from_slice(&h.metadata_table_length.to_le_bytes());
                out.extend_from_slice(&h.entry_table_start.to_le_bytes());
                out.extend_from_slice(&h.metadata_table_start.to_le_bytes());
                out.extend_from_slice(&h.security_descriptor_offset.to_le_bytes());
                out.extend_from_slice(&h.platform.to_le_bytes());
            }
        }
        out
    }

    pub fn version(&self) -> u16 {
        match self {
            Self::V1(_) => 1,
            Self::V2(_) => 2,
        }
    }

    pub fn salt(&self) -> u16 {
        match self {
            Self::V1(h) => h.salt,
            Self::V2(h) => h.salt,
        }
    }
}

/// A stream too short to even hold the magic is not an archive.
fn short_is_not_hashfs(err: io::Error) -> HashFsError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        HashFsError::NotHashFs
    } else {
        HashFsError::Io(err)
    }
}
