//! End-to-end tests for version 2 archives.

use std::io::Cursor;

use hashfs_texture::{DxgiFormat, MagFilter, MipFilter, Surface, Tobj, TobjKind};

use hashfs::compress::inflate;
use hashfs::v2::entry::{ENTRY_RECORD_V2_SIZE, EntryRecordV2};
use hashfs::{HashFsReader, PAYLOAD_OFFSET, WriterV2};

fn make_surface(width: u32, height: u32, mipmap_count: u32, is_cube: bool) -> Surface {
    let face_count = if is_cube { 6 } else { 1 };
    let mut surface = Surface {
        width,
        height,
        mipmap_count,
        format: DxgiFormat::Bc1UnormSrgb,
        is_cube,
        face_count,
        data: Vec::new(),
    };
    let size = surface.expected_data_size();
    surface.data = (0..size).map(|i| (i % 249) as u8).collect();
    surface
}

fn make_tobj(texture_path: &str, cube: bool) -> Tobj {
    Tobj {
        kind: if cube { TobjKind::CubeMap } else { TobjKind::Map2d },
        mag_filter: MagFilter::Linear,
        mip_filter: MipFilter::Trilinear,
        texture_path: texture_path.to_string(),
        ..Tobj::default()
    }
}

/// The v1 sample tree minus the separate surface file: the descriptor and
/// surface fuse into one entry, leaving 14 file entries.
fn sample_files() -> Vec<(&'static str, Vec<u8>)> {
    let sii = b"SiiNunit\n{\nmodel_def : .model {\n}\n}\n".repeat(4);
    let surface = make_surface(256, 256, 9, false);
    let tobj = make_tobj("/model/simple_cube/cubetx.dds", false);
    vec![
        ("/def/world/model.tests.sii", sii),
        ("/def/world/prefab.sii", b"SiiNunit { prefab: .p {} }".to_vec()),
        ("/def/city.sii", b"SiiNunit { city: .c {} }".to_vec()),
        ("/def/country.sii", b"SiiNunit { country: .n {} }".to_vec()),
        ("/manifest.sii", b"SiiNunit { mod_package: .m {} }".to_vec()),
        ("/map/europe.mbd", vec![0u8; 128]),
        ("/map/europe/sec+0000+0000.base", vec![0x42u8; 300]),
        ("/map/europe/sec+0000+0000.desc", vec![0x17u8; 90]),
        ("/material/ui/white.mat", b"material: \"ui\" {}".to_vec()),
        ("/model/simple_cube/cube.pmd", (0u8..200).collect()),
        ("/model/simple_cube/cube.pmg", vec![0x50u8; 150]),
        ("/model/simple_cube/cubetx.tobj", tobj.build()),
        ("/model/simple_cube/cubetx.dds", surface.build()),
        ("/sound/engine.bank", vec![0xABu8; 512]),
        ("/version.txt", b"1.0".to_vec()),
    ]
}

fn build_archive(salt: u16) -> Vec<u8> {
    let mut writer = WriterV2::new();
    writer.set_salt(salt);
    for (path, data) in sample_files() {
        writer.add_bytes(data, path).unwrap();
    }
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();
    stream.into_inner()
}

#[test]
fn round_trip_preserves_plain_payloads() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    assert_eq!(reader.version(), 2);
    assert_eq!(reader.salt(), 42);

    for (path, data) in sample_files() {
        if path.ends_with(".dds") || path.ends_with(".tobj") {
            continue;
        }
        let parts = reader.extract(path).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], data, "{path} round-trips byte-identically");
    }
}

#[test]
fn common_hashes_match_v1() {
    let archive = build_archive(42);
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    assert!(reader
        .entries()
        .get(&0x0DAC_6B40_4449_05D0)
        .unwrap()
        .is_directory());
    assert!(reader
        .entries()
        .get(&0x3C63_69BC_6EFD_D668)
        .unwrap()
        .is_compressed());
}

#[test]
fn surface_is_fused_into_the_descriptor_entry() {
    let archive = build_archive(42);
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();

    // 14 file entries (no stand-alone surface) + 10 directories.
    assert_eq!(reader.entries().len(), 24);
    assert!(!reader.file_exists("/model/simple_cube/cubetx.dds"));

    let entry = reader.try_entry("/model/simple_cube/cubetx.tobj").unwrap();
    let texture = entry.texture().expect("descriptor entry carries texture metadata");
    assert_eq!(texture.width, 256);
    assert_eq!(texture.height, 256);
    assert_eq!(texture.mipmap_count(), 9);
    assert_eq!(texture.format(), Some(DxgiFormat::Bc1UnormSrgb));
    assert!(!texture.is_cube());
    assert_eq!(texture.face_count(), 1);

    // The archive stores only the repacked surface bytes.
    assert_eq!(entry.size(), entry.compressed_size());
    assert!(!entry.is_compressed());
}

#[test]
fn texture_extraction_returns_descriptor_then_surface() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();

    let parts = reader.extract("/model/simple_cube/cubetx.tobj").unwrap();
    assert_eq!(parts.len(), 2);

    let tobj = Tobj::parse(&parts[0]).unwrap();
    let original = make_tobj("/model/simple_cube/cubetx.dds", false);
    assert_eq!(tobj.kind, original.kind);
    assert_eq!(tobj.mag_filter, original.mag_filter);
    assert_eq!(tobj.min_filter, original.min_filter);
    assert_eq!(tobj.mip_filter, original.mip_filter);
    assert_eq!(tobj.addr_u, original.addr_u);
    assert_eq!(tobj.addr_v, original.addr_v);
    assert_eq!(tobj.addr_w, original.addr_w);
    assert_eq!(tobj.texture_path, "/model/simple_cube/cubetx.dds");

    // The reconstructed surface file is byte-identical to the input.
    let original_surface = make_surface(256, 256, 9, false);
    assert_eq!(parts[1], original_surface.build());
}

#[test]
fn payload_offsets_are_16_byte_aligned_past_4096() {
    let archive = build_archive(42);
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    for entry in reader.entries().values() {
        assert_eq!(entry.offset() % 16, 0);
        assert!(entry.offset() >= PAYLOAD_OFFSET);
    }
}

#[test]
fn on_disk_entry_table_is_sorted_and_strictly_increasing() {
    let archive = build_archive(42);
    // Header tail: entry_table_length at 12, entry_table_start at 24.
    let table_len = u32::from_le_bytes(archive[12..16].try_into().unwrap()) as usize;
    let table_start = u64::from_le_bytes(archive[24..32].try_into().unwrap()) as usize;

    let raw = inflate(&archive[table_start..table_start + table_len], None).unwrap();
    assert_eq!(raw.len() % ENTRY_RECORD_V2_SIZE, 0);

    let mut previous: Option<u64> = None;
    for chunk in raw.chunks_exact(ENTRY_RECORD_V2_SIZE) {
        let record = EntryRecordV2::parse(chunk).unwrap();
        if let Some(prev) = previous {
            assert!(record.hash > prev, "table must be strictly increasing");
        }
        previous = Some(record.hash);
    }
}

#[test]
fn trailing_watermark_is_tolerated() {
    let archive = build_archive(0);
    assert!(archive.ends_with(hashfs::WATERMARK.as_bytes()));
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    assert_eq!(reader.version(), 2);
}

#[test]
fn listings_enumerate_the_tree_without_the_surface() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();

    let cube_dir = reader.list_directory("/model/simple_cube").unwrap();
    let names: Vec<&str> = cube_dir.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        names,
        [
            "/model/simple_cube/cube.pmd",
            "/model/simple_cube/cube.pmg",
            "/model/simple_cube/cubetx.tobj",
        ]
    );
}

#[test]
fn directory_closure_holds() {
    let archive = build_archive(42);
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    for dir in [
        "/",
        "/def",
        "/def/world",
        "/map",
        "/map/europe",
        "/material",
        "/material/ui",
        "/model",
        "/model/simple_cube",
        "/sound",
    ] {
        assert!(reader.directory_exists(dir), "{dir} must exist");
    }
}

#[test]
fn empty_file_and_threshold_behave_like_v1() {
    let mut writer = WriterV2::new();
    writer.add_bytes(Vec::new(), "/empty.bin").unwrap();
    writer.add_bytes(vec![0x11u8; 64], "/at.bin").unwrap();
    writer.add_bytes(vec![0x11u8; 65], "/above.bin").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();

    let mut reader = HashFsReader::open(stream).unwrap();
    assert_eq!(reader.extract("/empty.bin").unwrap()[0], Vec::<u8>::new());
    assert!(!reader.try_entry("/at.bin").unwrap().is_compressed());
    assert!(reader.try_entry("/above.bin").unwrap().is_compressed());
    assert_eq!(reader.extract("/above.bin").unwrap()[0], vec![0x11u8; 65]);
}

#[test]
fn extract_to_file_writes_the_texture_pair() {
    let dir = tempfile::tempdir().unwrap();
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();

    let out = dir.path().join("cubetx.tobj");
    reader
        .extract_to_file("/model/simple_cube/cubetx.tobj", &out)
        .unwrap();

    let tobj = Tobj::parse(&std::fs::read(&out).unwrap()).unwrap();
    assert_eq!(tobj.texture_path, "/model/simple_cube/cubetx.dds");
    let surface = Surface::parse(&std::fs::read(dir.path().join("cubetx.dds")).unwrap()).unwrap();
    assert_eq!(surface.width, 256);
    assert_eq!(surface.mipmap_count, 9);
}

#[test]
fn pmg_entries_round_trip() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    let parts = reader.extract("/model/simple_cube/cube.pmg").unwrap();
    assert_eq!(parts[0], vec![0x50u8; 150]);
}

#[test]
fn relative_surface_references_resolve() {
    let surface = make_surface(16, 16, 1, false);
    let tobj = make_tobj("tex.dds", false);

    let mut writer = WriterV2::new();
    writer.add_bytes(tobj.build(), "/model/tex.tobj").unwrap();
    writer.add_bytes(surface.build(), "/model/tex.dds").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();

    let reader = HashFsReader::open(stream).unwrap();
    let entry = reader.try_entry("/model/tex.tobj").unwrap();
    assert!(entry.texture().is_some());
}
