//! Version 2 archive writer.
//!
//! Beyond the v1 flow, the v2 save partitions registered files by
//! extension: every `.tobj` descriptor consumes the surface file it
//! references and becomes a single fused texture entry, and `.dds` files
//! never reach the archive on their own. Payload offsets are 16-byte
//! aligned, both tables are zlib-compressed, and a watermark trails the
//! metadata table.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use flate2::Compression;
use tracing::{debug, trace};

use hashfs_texture::{
    ARCHIVE_IMAGE_ALIGNMENT, ARCHIVE_PITCH_ALIGNMENT, RepackLayout, Surface, TextureError, Tobj,
    pack_surface,
};

use crate::compress::{CompressionLevel, deflate};
use crate::dirtree::{DirectoryTree, encode_listing_v2};
use crate::error::{HashFsError, Result};
use crate::hash::hash_path;
use crate::header::{Header, HeaderV2, PAYLOAD_OFFSET, PLATFORM_PC};
use crate::v2::entry::{EntryRecordV2, flags};
use crate::v2::metadata::{IMAGE_RESERVED_FLAGS, MainMetadata, MetadataTableBuilder};
use crate::v2::texture::{ImageFlags, SampleFlags};
use crate::writer::{Source, StoredPayload, WriterCore, sort_by_hash, store_payload};

/// Writer producing version 2 archives.
pub struct WriterV2 {
    core: WriterCore,
}

enum Planned {
    Plain { path: String, data: Vec<u8> },
    Texture { path: String, tobj: Tobj, surface: Surface },
}

impl Planned {
    fn path(&self) -> &str {
        match self {
            Self::Plain { path, .. } | Self::Texture { path, .. } => path,
        }
    }
}

impl Default for WriterV2 {
    fn default() -> Self {
        Self::new()
    }
}

impl WriterV2 {
    pub fn new() -> Self {
        Self {
            core: WriterCore::default(),
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
        let Self { core } = self;
        let salt = core.salt;
        let level = core.compression_level;
        let threshold = core.compression_threshold;

        // Open sources now; nothing was touched before save.
        let mut loaded = Vec::new();
        let mut by_path = HashMap::new();
        for file in core.pending.into_files() {
            by_path.insert(file.path.clone(), loaded.len());
            loaded.push((file.path, file.source.read_all()?));
        }

        let planned = plan_entries(loaded, &by_path)?;

        let mut tree = DirectoryTree::new();
        for item in &planned {
            tree.insert_file(item.path());
        }

        stream.seek(SeekFrom::Start(0))?;
        stream.write_all(&vec![0u8; PAYLOAD_OFFSET as usize])?;
        let mut pos = PAYLOAD_OFFSET;
        let mut builder = MetadataTableBuilder::new();
        let mut records = Vec::new();

        for listing in tree.listings() {
            let blob = encode_listing_v2(&listing.subdirs, &listing.files)?;
            let stored = store_payload(blob, level, threshold)?;
            let offset = write_aligned(stream, &mut pos, &stored.bytes)?;
            let main = main_metadata(offset, &stored)?;
            let (metadata_index, metadata_count) = builder.push_directory(&main);
            records.push(EntryRecordV2 {
                hash: hash_path(&listing.path, salt),
                metadata_index,
                metadata_count,
                flags: flags::DIRECTORY,
            });
            trace!(path = %listing.path, offset, "wrote directory listing");
        }

        for item in planned {
            match item {
                Planned::Plain { path, data } => {
                    let stored = store_payload(data, level, threshold)?;
                    let offset = write_aligned(stream, &mut pos, &stored.bytes)?;
                    let main = main_metadata(offset, &stored)?;
                    let (metadata_index, metadata_count) =
                        builder.push_plain(&main, path.ends_with(".pmg"));
                    records.push(EntryRecordV2 {
                        hash: hash_path(&path, salt),
                        metadata_index,
                        metadata_count,
                        flags: 0,
                    });
                    trace!(path = %path, offset, "wrote file payload");
                }
                Planned::Texture { path, tobj, surface } => {
                    let record = write_texture(
                        stream,
                        &mut pos,
                        &mut builder,
                        &path,
                        &tobj,
                        &surface,
                        salt,
                    )?;
                    records.push(record);
                }
            }
        }

        sort_by_hash(&mut records, |r: &EntryRecordV2| r.hash)?;
        let mut raw = Vec::with_capacity(records.len() * 16);
        for record in &records {
            raw.extend_from_slice(&record.build());
        }
        let entry_table = deflate(&raw, Compression::default())?;
        let entry_table_start = pos;
        stream.write_all(&entry_table)?;
        pos += entry_table.len() as u64;

        let num_metadata_entries = builder.record_count();
        let metadata_table = deflate(&builder.into_bytes(), Compression::default())?;
        let metadata_table_start = pos;
        stream.write_all(&metadata_table)?;

        stream.write_all(crate::WATERMARK.as_bytes())?;

        let header = Header::V2(HeaderV2 {
            salt,
            entry_table_length: entry_table.len() as u32,
            num_metadata_entries,
            metadata_table_length: metadata_table.len() as u32,
            entry_table_start,
            metadata_table_start,
            security_descriptor_offset: 0,
            platform: PLATFORM_PC,
        });
        stream.seek(SeekFrom::Start(0))?;
        stream.write_all(&header.build())?;
        stream.flush()?;
        debug!(
            entries = records.len(),
            entry_table_start, metadata_table_start, "saved v2 archive"
        );
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn write_texture<W: Write>(
    stream: &mut W,
    pos: &mut u64,
    builder: &mut MetadataTableBuilder,
    path: &str,
    tobj: &Tobj,
    surface: &Surface,
    salt: u16,
) -> Result<EntryRecordV2> {
    if surface.width > u32::from(u16::MAX) + 1 || surface.height > u32::from(u16::MAX) + 1 {
        return Err(TextureError::UnsupportedSurface(format!(
            "extent {}x{}",
            surface.width, surface.height
        ))
        .into());
    }
    if surface.mipmap_count > 16 {
        return Err(TextureError::UnsupportedSurface(format!(
            "{} mip levels",
            surface.mipmap_count
        ))
        .into());
    }

    let packed = pack_surface(surface, RepackLayout::default())?;
    let offset = write_aligned(stream, pos, &packed)?;

    // The archive stores only the repacked surface bytes, so the logical
    // size equals the stored size. Texture payloads stay uncompressed.
    let stored = StoredPayload {
        logical_size: packed.len() as u32,
        bytes: packed,
        compressed: false,
    };
    let mut main = main_metadata(offset, &stored)?;
    main.reserved_flags = IMAGE_RESERVED_FLAGS;

    let mut image = ImageFlags::default();
    image.set_mipmap_count(surface.mipmap_count);
    image.set_format(surface.format);
    image.set_cube(surface.is_cube);
    image.set_face_count(surface.face_count);
    image.set_pitch_alignment(ARCHIVE_PITCH_ALIGNMENT);
    image.set_image_alignment(ARCHIVE_IMAGE_ALIGNMENT);

    let mut sample = SampleFlags::default();
    sample.set_mag_filter(tobj.mag_filter);
    sample.set_min_filter(tobj.min_filter);
    sample.set_mip_filter(tobj.mip_filter);
    sample.set_addr_u(tobj.addr_u);
    sample.set_addr_v(tobj.addr_v);
    sample.set_addr_w(tobj.addr_w);

    let (metadata_index, metadata_count) = builder.push_image(
        (surface.width - 1) as u16,
        (surface.height - 1) as u16,
        image.word(),
        sample.word(),
        &main,
    );
    trace!(path = %path, offset, width = surface.width, height = surface.height, "wrote texture");

    Ok(EntryRecordV2 {
        hash: hash_path(path, salt),
        metadata_index,
        metadata_count,
        flags: 0,
    })
}

/// Partition loaded files into plain payloads and fused texture entries.
///
/// Descriptors resolve their surface reference inside the working set;
/// surfaces referenced by a descriptor are consumed by it, and stand-alone
/// surface files are dropped from the archive.
fn plan_entries(
    loaded: Vec<(String, Vec<u8>)>,
    by_path: &HashMap<String, usize>,
) -> Result<Vec<Planned>> {
    let mut textures: HashMap<usize, (Tobj, Surface)> = HashMap::new();
    for (i, (path, data)) in loaded.iter().enumerate() {
        if !path.ends_with(".tobj") {
            continue;
        }
        let tobj = Tobj::parse(data)?;
        let reference = resolve_reference(path, &tobj.texture_path);
        if !reference.ends_with(".dds") {
            return Err(TextureError::NotASurface(reference).into());
        }
        let &j = by_path
            .get(&reference)
            .ok_or_else(|| TextureError::MissingSurface(reference.clone()))?;
        let surface = Surface::parse(&loaded[j].1)?;
        textures.insert(i, (tobj, surface));
    }

    let mut planned = Vec::with_capacity(loaded.len());
    for (i, (path, data)) in loaded.into_iter().enumerate() {
        if path.ends_with(".dds") {
            trace!(path = %path, "dropping stand-alone surface file");
            continue;
        }
        match textures.remove(&i) {
            Some((tobj, surface)) => planned.push(Planned::Texture { path, tobj, surface }),
            None => planned.push(Planned::Plain { path, data }),
        }
    }
    Ok(planned)
}

/// Resolve a descriptor's surface reference against the descriptor's
/// directory.
fn resolve_reference(tobj_path: &str, reference: &str) -> String {
    if reference.starts_with('/') {
        reference.to_string()
    } else {
        match tobj_path.rfind('/') {
            Some(0) | None => format!("/{reference}"),
            Some(slash) => format!("{}/{reference}", &tobj_path[..slash]),
        }
    }
}

/// Pad to the 16-byte payload alignment, then write.
fn write_aligned<W: Write>(stream: &mut W, pos: &mut u64, bytes: &[u8]) -> Result<u64> {
    let padding = (16 - (*pos % 16)) % 16;
    if padding > 0 {
        stream.write_all(&[0u8; 16][..padding as usize])?;
        *pos += padding;
    }
    let offset = *pos;
    stream.write_all(bytes)?;
    *pos += bytes.len() as u64;
    Ok(offset)
}

/// Build the main-metadata record for a stored payload.
fn main_metadata(offset: u64, stored: &StoredPayload) -> Result<MainMetadata> {
    if stored.bytes.len() >= 1 << 28 || stored.logical_size >= 1 << 28 {
        return Err(HashFsError::UnsupportedFeature(format!(
            "payload of {} bytes exceeds the 28-bit size field",
            stored.bytes.len()
        )));
    }
    let offset_block = offset / 16;
    if offset_block > u64::from(u32::MAX) {
        return Err(HashFsError::UnsupportedFeature(
            "archive exceeds the addressable payload range".into(),
        ));
    }
    let mut main = MainMetadata {
        compressed_size: stored.bytes.len() as u32,
        size: stored.logical_size,
        offset_block: offset_block as u32,
        ..MainMetadata::default()
    };
    main.set_compressed(stored.compressed);
    Ok(main)
}
