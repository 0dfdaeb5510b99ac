//! End-to-end tests for version 1 archives.

use std::io::Cursor;

use hashfs::v1::entry::{ENTRY_V1_SIZE, EntryV1};
use hashfs::{CompressionLevel, EntryStatus, HashFsError, HashFsReader, OpenOptions, WriterV1};

/// The 15-file sample tree used across the round-trip tests.
fn sample_files() -> Vec<(&'static str, Vec<u8>)> {
    let sii = b"SiiNunit\n{\nmodel_def : .model {\n}\n}\n".repeat(4);
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
        ("/model/simple_cube/cubetx.tobj", vec![0x01u8; 70]),
        ("/model/simple_cube/cubetx.dds", vec![0xD5u8; 96]),
        ("/sound/engine.bank", vec![0xABu8; 512]),
        ("/version.txt", b"1.0".to_vec()),
    ]
}

fn build_archive(salt: u16) -> Vec<u8> {
    let mut writer = WriterV1::new();
    writer.set_salt(salt);
    for (path, data) in sample_files() {
        writer.add_bytes(data, path).unwrap();
    }
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();
    stream.into_inner()
}

#[test]
fn round_trip_preserves_every_payload() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    assert_eq!(reader.version(), 1);
    assert_eq!(reader.salt(), 42);

    for (path, data) in sample_files() {
        let parts = reader.extract(path).unwrap();
        assert_eq!(parts.len(), 1, "{path} should be a single payload");
        assert_eq!(parts[0], data, "{path} round-trips byte-identically");
    }
}

#[test]
fn known_hashes_with_salt_42() {
    let archive = build_archive(42);
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();

    let root = reader.entries().get(&0x0DAC_6B40_4449_05D0).unwrap();
    assert!(root.is_directory());

    let model = reader.entries().get(&0x3C63_69BC_6EFD_D668).unwrap();
    assert!(model.is_compressed());
    assert_eq!(reader.hash_path("/def/world/model.tests.sii"), model.hash());
}

#[test]
fn hash_consistency_for_every_entry() {
    let archive = build_archive(42);
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    for (path, _) in sample_files() {
        let entry = reader.try_entry(path).unwrap();
        assert_eq!(entry.hash(), reader.hash_path(path));
    }
}

#[test]
fn on_disk_entry_table_is_sorted_and_strictly_increasing() {
    let archive = build_archive(7);
    // Header tail: num_entries at 12, start_offset at 16.
    let num_entries = u32::from_le_bytes(archive[12..16].try_into().unwrap()) as usize;
    let start = u32::from_le_bytes(archive[16..20].try_into().unwrap()) as usize;

    let mut previous: Option<u64> = None;
    for i in 0..num_entries {
        let record =
            EntryV1::parse(&archive[start + i * ENTRY_V1_SIZE..start + (i + 1) * ENTRY_V1_SIZE])
                .unwrap();
        if let Some(prev) = previous {
            assert!(record.hash > prev, "table must be strictly increasing");
        }
        previous = Some(record.hash);
    }
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
    // 15 files + 10 directories
    assert_eq!(reader.entries().len(), 25);
}

#[test]
fn listings_enumerate_the_tree() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();

    let root = reader.list_directory("/").unwrap();
    let dirs: Vec<&str> = root
        .iter()
        .filter(|e| e.is_directory)
        .map(|e| e.path.as_str())
        .collect();
    assert_eq!(dirs, ["/def", "/map", "/material", "/model", "/sound"]);
    assert!(root.iter().any(|e| e.path == "/manifest.sii" && !e.is_directory));

    let world = reader.list_directory("/def/world").unwrap();
    let names: Vec<&str> = world.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(names, ["/def/world/model.tests.sii", "/def/world/prefab.sii"]);
}

#[test]
fn crc_matches_payloads_and_can_be_disabled() {
    let archive = build_archive(0);
    let reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    let entry = reader.try_entry("/version.txt").unwrap();
    assert_eq!(entry.crc32(), Some(hashfs::compress::crc32(b"1.0")));

    let mut writer = WriterV1::new();
    writer.set_compute_checksums(false);
    writer.add_bytes(b"1.0".to_vec(), "/version.txt").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();
    let reader = HashFsReader::open(stream).unwrap();
    assert_eq!(reader.try_entry("/version.txt").unwrap().crc32(), Some(0));
}

#[test]
fn compression_threshold_boundary() {
    let mut writer = WriterV1::new();
    writer.add_bytes(vec![0x11u8; 64], "/at.bin").unwrap();
    writer.add_bytes(vec![0x11u8; 65], "/above.bin").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();

    let mut reader = HashFsReader::open(stream).unwrap();
    assert!(!reader.try_entry("/at.bin").unwrap().is_compressed());
    assert!(reader.try_entry("/above.bin").unwrap().is_compressed());
    assert_eq!(reader.extract("/at.bin").unwrap()[0], vec![0x11u8; 64]);
    assert_eq!(reader.extract("/above.bin").unwrap()[0], vec![0x11u8; 65]);
}

#[test]
fn compression_level_none_stores_everything_raw() {
    let mut writer = WriterV1::new();
    writer.set_compression_level(CompressionLevel::None);
    writer.add_bytes(vec![0u8; 4000], "/big.bin").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();

    let reader = HashFsReader::open(stream).unwrap();
    let entry = reader.try_entry("/big.bin").unwrap();
    assert!(!entry.is_compressed());
    assert_eq!(entry.size(), entry.compressed_size());
}

#[test]
fn empty_file_extracts_to_zero_bytes() {
    let mut writer = WriterV1::new();
    writer.add_bytes(Vec::new(), "/empty.txt").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();

    let mut reader = HashFsReader::open(stream).unwrap();
    let entry = reader.try_entry("/empty.txt").unwrap();
    assert_eq!(entry.size(), 0);
    assert!(!entry.is_compressed());
    assert_eq!(reader.extract("/empty.txt").unwrap()[0], Vec::<u8>::new());
}

#[test]
fn force_entry_table_at_end_recovers_a_corrupted_header() {
    let mut archive = build_archive(42);
    // Corrupt the header's start_offset.
    archive[16..20].copy_from_slice(&1234u32.to_le_bytes());

    let options = OpenOptions {
        force_entry_table_at_end: true,
    };
    let mut reader = HashFsReader::open_with_options(Cursor::new(archive), options).unwrap();
    for (path, data) in sample_files() {
        assert_eq!(reader.extract(path).unwrap()[0], data);
    }
}

#[test]
fn read_all_text_and_status() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    assert_eq!(reader.read_all_text("/version.txt").unwrap(), "1.0");

    assert_eq!(reader.entry_status("/version.txt"), EntryStatus::File);
    assert_eq!(reader.entry_status("/def"), EntryStatus::Directory);
    assert_eq!(reader.entry_status("/nope"), EntryStatus::NotFound);

    assert!(matches!(
        reader.read_all_text("/def"),
        Err(HashFsError::IsDirectory(_))
    ));
    assert!(matches!(
        reader.list_directory("/version.txt"),
        Err(HashFsError::NotDirectory(_))
    ));
    assert!(matches!(
        reader.extract("/nope"),
        Err(HashFsError::NotFound(_))
    ));
}

#[test]
fn changing_the_salt_rekeys_lookups() {
    let archive = build_archive(42);
    let mut reader = HashFsReader::open(Cursor::new(archive)).unwrap();
    assert!(reader.file_exists("/version.txt"));

    reader.set_salt(0);
    assert!(!reader.file_exists("/version.txt"));
    assert_eq!(reader.hash_path("/x"), hashfs::hash_path("/x", 0));

    reader.set_salt(42);
    assert!(reader.file_exists("/version.txt"));
}

#[test]
fn save_and_open_through_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let host_file = dir.path().join("input.sii");
    std::fs::write(&host_file, b"SiiNunit {}").unwrap();
    let archive_path = dir.path().join("out.scs");

    let mut writer = WriterV1::new();
    writer.add(&host_file, "/def/input.sii").unwrap();
    writer.save_to_file(&archive_path).unwrap();

    let mut reader = HashFsReader::open_file(&archive_path).unwrap();
    assert_eq!(reader.extract("/def/input.sii").unwrap()[0], b"SiiNunit {}");

    let out = dir.path().join("extracted.sii");
    reader.extract_to_file("/def/input.sii", &out).unwrap();
    assert_eq!(std::fs::read(out).unwrap(), b"SiiNunit {}");
}

#[test]
fn reader_sources_are_read_at_save_time() {
    let mut writer = WriterV1::new();
    writer
        .add_reader(Box::new(Cursor::new(b"streamed".to_vec())), "/s.bin")
        .unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();

    let mut reader = HashFsReader::open(stream).unwrap();
    assert_eq!(reader.extract("/s.bin").unwrap()[0], b"streamed");
}

#[test]
fn duplicate_adds_keep_the_last_payload() {
    let mut writer = WriterV1::new();
    writer.add_bytes(b"first".to_vec(), "/a.txt").unwrap();
    writer.add_bytes(b"second".to_vec(), "/a.txt").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();

    let mut reader = HashFsReader::open(stream).unwrap();
    assert_eq!(reader.extract("/a.txt").unwrap()[0], b"second");
}
