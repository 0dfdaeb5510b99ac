//! Version 1 entry table parsing.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::entry::Entry;
use crate::error::{HashFsError, Result};
use crate::header::HeaderV1;
use crate::v1::entry::{ENTRY_V1_SIZE, EntryV1};

/// Parse the v1 entry table and index it by hash.
///
/// With `force_table_at_end` the header's `start_offset` is ignored and
/// the table is read from `file_length - num_entries * 32` instead, which
/// recovers archives whose header offset is corrupted.
pub(crate) fn read_entries<R: Read + Seek>(
    stream: &mut R,
    header: &HeaderV1,
    force_table_at_end: bool,
) -> Result<HashMap<u64, Entry>> {
    let table_len = u64::from(header.num_entries) * ENTRY_V1_SIZE as u64;
    let table_offset = if force_table_at_end {
        let file_len = stream.seek(SeekFrom::End(0))?;
        let offset = file_len.checked_sub(table_len).ok_or_else(|| {
            HashFsError::CorruptTable(format!(
                "entry table of {table_len} bytes larger than the archive"
            ))
        })?;
        debug!(offset, "reading entry table from end of file");
        offset
    } else {
        u64::from(header.start_offset)
    };

    stream.seek(SeekFrom::Start(table_offset))?;
    let mut raw = vec![0u8; table_len as usize];
    stream.read_exact(&mut raw).map_err(truncated_table)?;

    let mut entries = HashMap::with_capacity(header.num_entries as usize);
    for chunk in raw.chunks_exact(ENTRY_V1_SIZE) {
        let entry = EntryV1::parse(chunk)?;
        if entry.is_encrypted() {
            return Err(HashFsError::UnsupportedFeature(format!(
                "encrypted entry {:#018x}",
                entry.hash
            )));
        }
        trace!(hash = entry.hash, offset = entry.offset, "parsed entry");
        entries.insert(entry.hash, Entry::V1(entry));
    }
    Ok(entries)
}

fn truncated_table(err: io::Error) -> HashFsError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        HashFsError::CorruptTable("entry table extends past the end of the archive".into())
    } else {
        HashFsError::Io(err)
    }
}
