//! The reader facade.
//!
//! A [`HashFsReader`] owns a seekable stream, parses the header and both
//! tables on open, and serves lookups from an in-memory hash map from then
//! on. The map is read-only after open; extraction mutates the stream
//! position, so callers wanting parallel extraction open one reader per
//! thread. Dropping the reader closes it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use hashfs_texture::{Surface, Tobj, TobjKind, unpack_surface};

use crate::compress::inflate;
use crate::dirtree::{ListingEntry, decode_listing_v1, decode_listing_v2};
use crate::entry::Entry;
use crate::error::{HashFsError, Result};
use crate::hash::hash_path;
use crate::header::Header;
use crate::{v1, v2};

/// Options for [`HashFsReader::open_with_options`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Ignore the v1 header's table offset and read the entry table from
    /// the end of the file. Recovers archives with a corrupted header
    /// offset; v1 only.
    pub force_entry_table_at_end: bool,
}

/// What a path resolves to inside an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    NotFound,
    File,
    Directory,
}

/// One name of a directory listing, resolved to an absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: String,
    pub is_directory: bool,
}

/// Reader over an open archive.
pub struct HashFsReader<R: Read + Seek> {
    stream: R,
    version: u16,
    salt: u16,
    entries: HashMap<u64, Entry>,
}

impl<R: Read + Seek> std::fmt::Debug for HashFsReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashFsReader")
            .field("version", &self.version)
            .field("salt", &self.salt)
            .field("entries", &self.entries)
            .finish()
    }
}

impl HashFsReader<BufReader<File>> {
    /// Open an archive file.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_file_with_options(path, OpenOptions::default())
    }

    /// Open an archive file with explicit options.
    pub fn open_file_with_options<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opening archive file");
        Self::open_with_options(BufReader::new(file), options)
    }
}

impl<R: Read + Seek> HashFsReader<R> {
    /// Open an archive from a seekable stream.
    pub fn open(stream: R) -> Result<Self> {
        Self::open_with_options(stream, OpenOptions::default())
    }

    /// Open an archive from a seekable stream with explicit options.
    pub fn open_with_options(mut stream: R, options: OpenOptions) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let header = Header::parse(&mut stream)?;
        let entries = match &header {
            Header::V1(h) => {
                v1::reader::read_entries(&mut stream, h, options.force_entry_table_at_end)?
            }
            Header::V2(h) => v2::reader::read_entries(&mut stream, h)?,
        };
        debug!(
            version = header.version(),
            salt = header.salt(),
            entries = entries.len(),
            "opened archive"
        );
        Ok(Self {
            stream,
            version: header.version(),
            salt: header.salt(),
            entries,
        })
    }

    /// Archive format revision, 1 or 2.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// The salt used for path hashing.
    pub fn salt(&self) -> u16 {
        self.salt
    }

    /// Replace the lookup salt.
    ///
    /// Nothing is recomputed: keyed lookups resolve against the new salt
    /// immediately, so existing entries are only reachable again once the
    /// caller asks with paths that hash the same way.
    pub fn set_salt(&mut self, salt: u16) {
        self.salt = salt;
    }

    /// All entries, keyed by path hash.
    pub fn entries(&self) -> &HashMap<u64, Entry> {
        &self.entries
    }

    /// Hash a path with this archive's salt.
    pub fn hash_path(&self, path: &str) -> u64 {
        hash_path(path, self.salt)
    }

    /// Look up an entry by path.
    pub fn try_entry(&self, path: &str) -> Option<&Entry> {
        self.entries.get(&self.hash_path(path))
    }

    /// Look up an entry by path, failing with [`HashFsError::NotFound`].
    pub fn entry(&self, path: &str) -> Result<Entry> {
        self.try_entry(path)
            .cloned()
            .ok_or_else(|| HashFsError::NotFound(path.to_string()))
    }

    /// What `path` resolves to.
    pub fn entry_status(&self, path: &str) -> EntryStatus {
        match self.try_entry(path) {
            None => EntryStatus::NotFound,
            Some(entry) if entry.is_directory() => EntryStatus::Directory,
            Some(_) => EntryStatus::File,
        }
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.entry_status(path) == EntryStatus::File
    }

    pub fn directory_exists(&self, path: &str) -> bool {
        self.entry_status(path) == EntryStatus::Directory
    }

    /// Decode the listing of a directory into absolute paths.
    pub fn list_directory(&mut self, path: &str) -> Result<Vec<DirEntry>> {
        let entry = self.entry(path)?;
        if !entry.is_directory() {
            return Err(HashFsError::NotDirectory(path.to_string()));
        }
        let payload = self.read_payload(&entry)?;
        let names = match self.version {
            1 => decode_listing_v1(&payload)?,
            _ => decode_listing_v2(&payload)?,
        };
        Ok(names
            .into_iter()
            .map(|ListingEntry { name, is_directory }| DirEntry {
                path: join_path(path, &name),
                is_directory,
            })
            .collect())
    }

    /// Extract an entry's payload(s) by path.
    ///
    /// Texture entries yield two buffers, the synthesized descriptor first
    /// and the reconstructed surface second; everything else yields one.
    pub fn extract(&mut self, path: &str) -> Result<Vec<Vec<u8>>> {
        let entry = self.entry(path)?;
        self.extract_entry(entry, path)
    }

    /// Extract a payload for an already resolved entry.
    ///
    /// `archive_path` names the entry for descriptor reconstruction; it is
    /// the path the entry was registered under.
    pub fn extract_entry(&mut self, entry: Entry, archive_path: &str) -> Result<Vec<Vec<u8>>> {
        if entry.texture().is_some() {
            self.extract_texture(&entry, archive_path)
        } else {
            Ok(vec![self.read_payload(&entry)?])
        }
    }

    /// Extract an entry to the host filesystem.
    ///
    /// Texture entries write the descriptor at `output` and the surface at
    /// the sibling path with the extension changed to `.dds`.
    pub fn extract_to_file<P: AsRef<Path>>(&mut self, path: &str, output: P) -> Result<()> {
        let entry = self.entry(path)?;
        if entry.is_directory() {
            return Err(HashFsError::IsDirectory(path.to_string()));
        }
        let parts = self.extract_entry(entry, path)?;
        let output = output.as_ref();
        std::fs::write(output, &parts[0])?;
        if let Some(surface) = parts.get(1) {
            std::fs::write(output.with_extension("dds"), surface)?;
        }
        Ok(())
    }

    /// Extract a file entry and decode it as UTF-8 text.
    pub fn read_all_text(&mut self, path: &str) -> Result<String> {
        let entry = self.entry(path)?;
        if entry.is_directory() {
            return Err(HashFsError::IsDirectory(path.to_string()));
        }
        let parts = self.extract_entry(entry, path)?;
        let bytes = parts.into_iter().next().unwrap_or_default();
        String::from_utf8(bytes).map_err(|_| {
            HashFsError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{path} is not UTF-8 text"),
            ))
        })
    }

    /// Read and, when flagged, decompress an entry's stored payload.
    fn read_payload(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        if entry.size() == 0 && entry.compressed_size() == 0 {
            return Ok(Vec::new());
        }
        let stored = if entry.is_compressed() {
            entry.compressed_size()
        } else {
            entry.size()
        };
        self.stream.seek(SeekFrom::Start(entry.offset()))?;
        let mut buf = vec![0u8; stored as usize];
        self.stream.read_exact(&mut buf)?;
        if entry.is_compressed() {
            Ok(inflate(&buf, Some(entry.size() as usize))?)
        } else {
            Ok(buf)
        }
    }

    fn extract_texture(&mut self, entry: &Entry, archive_path: &str) -> Result<Vec<Vec<u8>>> {
        let info = *entry.texture().expect("caller checked texture presence");
        let geometry = info.geometry().ok_or_else(|| {
            HashFsError::UnsupportedFeature(format!(
                "DXGI format {} of {archive_path}",
                info.image.format_raw()
            ))
        })?;
        let packed = self.read_payload(entry)?;
        let tight = unpack_surface(&geometry, info.layout(), &packed)?;

        let surface = Surface {
            width: geometry.width,
            height: geometry.height,
            mipmap_count: geometry.mipmap_count,
            format: geometry.format,
            is_cube: info.is_cube(),
            face_count: geometry.face_count,
            data: tight,
        };

        let tobj = Tobj {
            kind: if info.is_cube() {
                TobjKind::CubeMap
            } else {
                TobjKind::Map2d
            },
            mag_filter: info.sample.mag_filter(),
            min_filter: info.sample.min_filter(),
            mip_filter: info.sample.mip_filter(),
            addr_u: info.sample.addr_u(),
            addr_v: info.sample.addr_v(),
            addr_w: info.sample.addr_w(),
            texture_path: sibling_dds_path(archive_path),
            ..Tobj::default()
        };

        Ok(vec![tobj.build(), surface.build()])
    }
}

/// Join a directory path and a child name into an absolute path.
fn join_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Sibling path with the extension replaced by `.dds`.
fn sibling_dds_path(path: &str) -> String {
    match path.rfind('.') {
        Some(dot) if !path[dot..].contains('/') => format!("{}.dds", &path[..dot]),
        _ => format!("{path}.dds"),
    }
}
