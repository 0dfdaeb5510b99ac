//! Version 1 archive writer.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::compress::{CompressionLevel, crc32};
use crate::dirtree::{DirectoryTree, encode_listing_v1};
use crate::error::{HashFsError, Result};
use crate::hash::hash_path;
use crate::header::{Header, HeaderV1, PAYLOAD_OFFSET};
use crate::v1::entry::{EntryV1, flags};
use crate::writer::{Source, StoredPayload, WriterCore, sort_by_hash, store_payload};

/// Writer producing version 1 archives.
///
/// Accumulates entries until [`WriterV1::save`], which consumes the
/// writer; a saved archive becomes readable by re-parsing the stream.
pub struct WriterV1 {
    core: WriterCore,
    compute_checksums: bool,
}

impl Default for WriterV1 {
    fn default() -> Self {
        Self::new()
    }
}

impl WriterV1 {
    pub fn new() -> Self {
        Self {
            core: WriterCore::default(),
            compute_checksums: true,
        }
    }

    pub fn salt(&self) -> u16 {
        self.core.salt
    }

    pub fn set_salt(&mut self, salt: u16) {
        self.core.salt = salt;
    }

    pub fn compression_level(&self) -> CompressionLevel {
        self.core.compression_level
    }

    pub fn set_compression_level(&mut self, level: CompressionLevel) {
        self.core.compression_level = level;
    }

    pub fn compression_threshold(&self) -> u32 {
        self.core.compression_threshold
    }

    pub fn set_compression_threshold(&mut self, threshold: u32) {
        self.core.compression_threshold = threshold;
    }

    /// Whether payload CRC32s are computed; when off, records carry zero.
    pub fn compute_checksums(&self) -> bool {
        self.compute_checksums
    }

    pub fn set_compute_checksums(&mut self, compute: bool) {
        self.compute_checksums = compute;
    }

    /// Register a host file. It is opened during `save`, not now.
    pub fn add<P: AsRef<Path>>(&mut self, host_path: P, archive_path: &str) -> Result<()> {
        self.core
            .add_source(archive_path, Source::Path(host_path.as_ref().to_path_buf()))
    }

    /// Register an in-memory payload.
    pub fn add_bytes(&mut self, bytes: Vec<u8>, archive_path: &str) -> Result<()> {
        self.core.add_source(archive_path, Source::Bytes(bytes))
    }

    /// Register a stream source; it is read during `save` and dropped
    /// when the save returns.
    pub fn add_reader(&mut self, reader: Box<dyn Read>, archive_path: &str) -> Result<()> {
        self.core.add_source(archive_path, Source::Reader(reader))
    }

    /// Number of registered entries.
    pub fn pending_count(&self) -> usize {
        self.core.pending.len()
    }

    /// Serialize the archive into a file.
    pub fn save_to_file<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut stream = BufWriter::new(file);
        self.save(&mut stream)
    }

    /// Serialize the archive.
    ///
    /// On error the partial output is left in caller-owned, undefined
    /// state.
    pub fn save<W: Write + Seek>(self, stream: &mut W) -> Result<()> {
        let Self {
            core,
            compute_checksums,
        } = self;
        let ctx = SaveContext {
            salt: core.salt,
            level: core.compression_level,
            threshold: core.compression_threshold,
            checksums: compute_checksums,
        };
        let files = core.pending.into_files();

        let mut tree = DirectoryTree::new();
        for file in &files {
            tree.insert_file(&file.path);
        }

        stream.seek(SeekFrom::Start(0))?;
        stream.write_all(&vec![0u8; PAYLOAD_OFFSET as usize])?;
        let mut pos = PAYLOAD_OFFSET;
        let mut records = Vec::with_capacity(files.len());

        for listing in tree.listings() {
            let blob = encode_listing_v1(&listing.subdirs, &listing.files);
            records.push(write_payload(stream, &mut pos, blob, &listing.path, true, &ctx)?);
        }
        for file in files {
            let data = file.source.read_all()?;
            records.push(write_payload(stream, &mut pos, data, &file.path, false, &ctx)?);
        }

        sort_by_hash(&mut records, |r: &EntryV1| r.hash)?;

        if pos > u64::from(u32::MAX) {
            return Err(HashFsError::UnsupportedFeature(
                "v1 archive larger than 4 GiB".into(),
            ));
        }
        let start_offset = pos as u32;
        for record in &records {
            stream.write_all(&record.build())?;
        }

        let header = Header::V1(HeaderV1 {
            salt: ctx.salt,
            num_entries: records.len() as u32,
            start_offset,
        });
        stream.seek(SeekFrom::Start(0))?;
        stream.write_all(&header.build())?;
        stream.flush()?;
        debug!(entries = records.len(), start_offset, "saved v1 archive");
        Ok(())
    }
}

struct SaveContext {
    salt: u16,
    level: CompressionLevel,
    threshold: u32,
    checksums: bool,
}

fn write_payload<W: Write + Seek>(
    stream: &mut W,
    pos: &mut u64,
    data: Vec<u8>,
    archive_path: &str,
    is_directory: bool,
    ctx: &SaveContext,
) -> Result<EntryV1> {
    let crc = if ctx.checksums { crc32(&data) } else { 0 };
    let StoredPayload {
        bytes,
        logical_size,
        compressed,
    } = store_payload(data, ctx.level, ctx.threshold)?;

    let offset = *pos;
    stream.write_all(&bytes)?;
    *pos += bytes.len() as u64;

    let mut entry_flags = 0;
    if is_directory {
        entry_flags |= flags::DIRECTORY;
    }
    if compressed {
        entry_flags |= flags::COMPRESSED;
    }

    Ok(EntryV1 {
        hash: hash_path(archive_path, ctx.salt),
        offset,
        flags: entry_flags,
        crc,
        size: logical_size,
        compressed_size: bytes.len() as u32,
    })
}
