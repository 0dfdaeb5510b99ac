//! Rejection paths: invalid archive paths, foreign streams, unsupported
//! headers, and encrypted v1 entries.

use std::io::Cursor;

use hashfs::{HashFsError, HashFsReader, WriterV1, WriterV2};

fn small_v1_archive() -> Vec<u8> {
    let mut writer = WriterV1::new();
    writer.add_bytes(b"payload".to_vec(), "/a.txt").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();
    stream.into_inner()
}

#[test]
fn invalid_archive_paths_are_rejected_at_add_time() {
    let mut v1 = WriterV1::new();
    assert!(matches!(
        v1.add_bytes(Vec::new(), ""),
        Err(HashFsError::InvalidArchivePath(_))
    ));
    assert!(matches!(
        v1.add_bytes(Vec::new(), "/"),
        Err(HashFsError::InvalidArchivePath(_))
    ));

    let oversize = format!("/dir/{}", "x".repeat(256));
    let mut v2 = WriterV2::new();
    assert!(matches!(
        v2.add_bytes(Vec::new(), &oversize),
        Err(HashFsError::InvalidArchivePath(_))
    ));

    let boundary = format!("/dir/{}", "x".repeat(255));
    assert!(v2.add_bytes(Vec::new(), &boundary).is_ok());
}

#[test]
fn foreign_streams_are_not_hashfs() {
    let err = HashFsReader::open(Cursor::new(b"PK\x03\x04 this is a zip file".to_vec()))
        .unwrap_err();
    assert!(matches!(err, HashFsError::NotHashFs));

    let err = HashFsReader::open(Cursor::new(Vec::new())).unwrap_err();
    assert!(matches!(err, HashFsError::NotHashFs));
}

#[test]
fn unknown_hash_method_is_rejected() {
    let mut archive = small_v1_archive();
    archive[8..12].copy_from_slice(b"MD5!");
    let err = HashFsReader::open(Cursor::new(archive)).unwrap_err();
    assert!(matches!(err, HashFsError::UnsupportedHashMethod(m) if m == "MD5!"));
}

#[test]
fn unknown_version_is_rejected() {
    let mut archive = small_v1_archive();
    archive[4..6].copy_from_slice(&9u16.to_le_bytes());
    let err = HashFsReader::open(Cursor::new(archive)).unwrap_err();
    assert!(matches!(err, HashFsError::UnsupportedVersion(9)));
}

#[test]
fn encrypted_v1_entries_are_rejected() {
    let mut archive = small_v1_archive();
    let start = u32::from_le_bytes(archive[16..20].try_into().unwrap()) as usize;
    // Set the encrypted bit in the first record's flag word.
    let flags_offset = start + 16;
    archive[flags_offset] |= 0x08;
    let err = HashFsReader::open(Cursor::new(archive)).unwrap_err();
    assert!(matches!(err, HashFsError::UnsupportedFeature(_)));
}

#[test]
fn truncated_v1_table_is_a_corrupt_table() {
    let archive = small_v1_archive();
    let start = u32::from_le_bytes(archive[16..20].try_into().unwrap()) as usize;
    let err = HashFsReader::open(Cursor::new(archive[..start + 10].to_vec())).unwrap_err();
    assert!(matches!(err, HashFsError::CorruptTable(_)));
}

#[test]
fn truncated_v2_tables_are_corrupt_tables() {
    let mut writer = WriterV2::new();
    writer.add_bytes(b"payload".to_vec(), "/a.txt").unwrap();
    let mut stream = Cursor::new(Vec::new());
    writer.save(&mut stream).unwrap();
    let archive = stream.into_inner();

    let table_start = u64::from_le_bytes(archive[24..32].try_into().unwrap()) as usize;
    let err = HashFsReader::open(Cursor::new(archive[..table_start + 3].to_vec())).unwrap_err();
    assert!(matches!(err, HashFsError::CorruptTable(_)));

    // Garbage in place of the compressed table.
    let mut mangled = archive;
    for byte in &mut mangled[table_start..table_start + 8] {
        *byte = 0xFF;
    }
    let err = HashFsReader::open(Cursor::new(mangled)).unwrap_err();
    assert!(matches!(err, HashFsError::CorruptTable(_)));
}
