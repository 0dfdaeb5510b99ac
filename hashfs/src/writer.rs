//! Shared writer plumbing.
//!
//! Both writer revisions accumulate `(archive path, source)` pairs and
//! serialize everything in one pass at save time. Host files are not
//! opened until then; boxed readers are consumed by the save and dropped
//! when it returns. Archive paths are validated when added: non-empty,
//! not the bare root, and no `/`-separated component over 255 bytes.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use crate::compress::{CompressionLevel, deflate};
use crate::error::{HashFsError, Result};

/// Default compression threshold in bytes: payloads at or below this size
/// are stored raw.
pub const DEFAULT_COMPRESSION_THRESHOLD: u32 = 64;

/// Where an entry's bytes come from at save time.
pub(crate) enum Source {
    Path(PathBuf),
    Bytes(Vec<u8>),
    Reader(Box<dyn Read>),
}

impl Source {
    pub(crate) fn read_all(self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Path(path) => std::fs::read(path),
            Self::Bytes(bytes) => Ok(bytes),
            Self::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

pub(crate) struct PendingFile {
    pub path: String,
    pub source: Source,
}

/// Accumulated entries in insertion order; re-adding a path replaces its
/// source, so one record per hash reaches the archive.
#[derive(Default)]
pub(crate) struct PendingSet {
    files: Vec<PendingFile>,
    index: HashMap<String, usize>,
}

impl PendingSet {
    pub fn add(&mut self, path: String, source: Source) {
        if let Some(&i) = self.index.get(&path) {
            self.files[i].source = source;
        } else {
            self.index.insert(path.clone(), self.files.len());
            self.files.push(PendingFile { path, source });
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn into_files(self) -> Vec<PendingFile> {
        self.files
    }
}

/// Shared configuration and pending state of a writer.
pub(crate) struct WriterCore {
    pub salt: u16,
    pub compression_level: CompressionLevel,
    pub compression_threshold: u32,
    pub pending: PendingSet,
}

impl Default for WriterCore {
    fn default() -> Self {
        Self {
            salt: 0,
            compression_level: CompressionLevel::default(),
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            pending: PendingSet::default(),
        }
    }
}

impl WriterCore {
    pub fn add_source(&mut self, archive_path: &str, source: Source) -> Result<()> {
        let normalized = normalize_archive_path(archive_path)?;
        self.pending.add(normalized, source);
        Ok(())
    }
}

/// Validate an archive path and give it its canonical leading `/`.
pub(crate) fn normalize_archive_path(path: &str) -> Result<String> {
    if path.is_empty() || path == "/" {
        return Err(HashFsError::InvalidArchivePath(path.to_string()));
    }
    let normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    for component in normalized[1..].split('/') {
        if component.len() > 255 {
            return Err(HashFsError::InvalidArchivePath(format!(
                "component of {} bytes in {path}",
                component.len()
            )));
        }
    }
    Ok(normalized)
}

/// A payload after the compression decision.
pub(crate) struct StoredPayload {
    pub bytes: Vec<u8>,
    pub logical_size: u32,
    pub compressed: bool,
}

/// Apply the threshold policy: payloads strictly larger than the
/// threshold are zlib-compressed when a level is set.
pub(crate) fn store_payload(
    data: Vec<u8>,
    level: CompressionLevel,
    threshold: u32,
) -> Result<StoredPayload> {
    if data.len() > u32::MAX as usize {
        return Err(HashFsError::UnsupportedFeature(format!(
            "payload of {} bytes",
            data.len()
        )));
    }
    let logical_size = data.len() as u32;
    if let Some(flate_level) = level.to_flate2() {
        if logical_size > threshold {
            let bytes = deflate(&data, flate_level)?;
            return Ok(StoredPayload {
                bytes,
                logical_size,
                compressed: true,
            });
        }
    }
    Ok(StoredPayload {
        bytes: data,
        logical_size,
        compressed: false,
    })
}

/// Sort entry records into on-disk order and reject colliding hashes.
pub(crate) fn sort_by_hash<T>(records: &mut Vec<T>, hash_of: impl Fn(&T) -> u64) -> Result<()> {
    records.sort_by_key(&hash_of);
    for pair in records.windows(2) {
        if hash_of(&pair[0]) == hash_of(&pair[1]) {
            return Err(HashFsError::UnsupportedFeature(format!(
                "colliding path hashes {:#018x}",
                hash_of(&pair[0])
            )));
        }
    }
    Ok(())
}
