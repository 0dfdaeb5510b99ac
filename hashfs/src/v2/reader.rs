//! Version 2 table parsing.
//!
//! Both tables are read whole, decompressed, and parsed into fresh maps;
//! the caller swaps them in only on success, so a failed open leaves
//! nothing half-built.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, trace};

use crate::compress::inflate;
use crate::entry::Entry;
use crate::error::{HashFsError, Result};
use crate::header::HeaderV2;
use crate::v2::entry::{ENTRY_RECORD_V2_SIZE, EntryRecordV2, EntryV2};
use crate::v2::metadata::{MetadataRecord, MetadataTable};
use crate::v2::texture::{ImageFlags, SampleFlags, TextureInfo};

/// Parse both v2 tables and assemble the hash-keyed entry map.
pub(crate) fn read_entries<R: Read + Seek>(
    stream: &mut R,
    header: &HeaderV2,
) -> Result<HashMap<u64, Entry>> {
    let raw = read_compressed_table(
        stream,
        header.entry_table_start,
        header.entry_table_length,
        "entry",
    )?;
    if raw.len() % ENTRY_RECORD_V2_SIZE != 0 {
        return Err(HashFsError::CorruptTable(format!(
            "entry table of {} bytes is not a whole number of records",
            raw.len()
        )));
    }

    let mut records = Vec::with_capacity(raw.len() / ENTRY_RECORD_V2_SIZE);
    for chunk in raw.chunks_exact(ENTRY_RECORD_V2_SIZE) {
        records.push(EntryRecordV2::parse(chunk)?);
    }
    // The table is hash-sorted on disk; walk the metadata table in chunk
    // order so its side effects stay deterministic.
    records.sort_by_key(|r| r.metadata_index);

    let metadata = MetadataTable::new(read_compressed_table(
        stream,
        header.metadata_table_start,
        header.metadata_table_length,
        "metadata",
    )?);
    debug!(
        records = records.len(),
        declared = header.num_metadata_entries,
        "walking metadata table"
    );

    let mut entries = HashMap::with_capacity(records.len());
    for record in records {
        let entry = assemble(&record, &metadata)?;
        trace!(hash = entry.hash, offset = entry.offset, "assembled entry");
        entries.insert(entry.hash, Entry::V2(entry));
    }
    Ok(entries)
}

fn assemble(record: &EntryRecordV2, metadata: &MetadataTable) -> Result<EntryV2> {
    let decoded = metadata.record(record.metadata_index, record.metadata_count)?;
    let main = *decoded.main();
    let texture = match &decoded {
        MetadataRecord::Image {
            width,
            height,
            image_word,
            sample_word,
            ..
        } => Some(TextureInfo {
            width: u32::from(*width) + 1,
            height: u32::from(*height) + 1,
            image: ImageFlags::from_word(*image_word),
            sample: SampleFlags::from_word(*sample_word),
        }),
        _ => None,
    };

    Ok(EntryV2 {
        hash: record.hash,
        offset: main.offset(),
        size: main.size,
        compressed_size: main.compressed_size,
        is_directory: record.is_directory()
            || matches!(decoded, MetadataRecord::Directory { .. }),
        is_compressed: main.is_compressed(),
        flags: main.flags,
        reserved_flags: main.reserved_flags,
        unknown: main.unknown,
        texture,
    })
}

fn read_compressed_table<R: Read + Seek>(
    stream: &mut R,
    start: u64,
    length: u32,
    what: &str,
) -> Result<Vec<u8>> {
    stream.seek(SeekFrom::Start(start))?;
    let mut compressed = vec![0u8; length as usize];
    stream.read_exact(&mut compressed).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            HashFsError::CorruptTable(format!(
                "{what} table extends past the end of the archive"
            ))
        } else {
            HashFsError::Io(err)
        }
    })?;
    inflate(&compressed, None)
        .map_err(|err| HashFsError::CorruptTable(format!("{what} table: {err}")))
}
