//! zlib helpers shared by both archive revisions.

use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

/// Compression level of a writer.
///
/// `None` stores every payload raw; the other three map onto zlib levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    None,
    Fastest,
    #[default]
    Optimal,
    SmallestSize,
}

impl CompressionLevel {
    /// The zlib level for this setting, or `None` when compression is off.
    pub fn to_flate2(self) -> Option<Compression> {
        match self {
            Self::None => None,
            Self::Fastest => Some(Compression::fast()),
            Self::Optimal => Some(Compression::default()),
            Self::SmallestSize => Some(Compression::best()),
        }
    }
}

/// zlib-compress a buffer.
pub fn deflate(data: &[u8], level: Compression) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    encoder.finish()
}

/// zlib-decompress a buffer, optionally checking the decoded size.
pub fn inflate(data: &[u8], expected_size: Option<usize>) -> io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = match expected_size {
        Some(size) => Vec::with_capacity(size),
        None => Vec::new(),
    };
    decoder.read_to_end(&mut out)?;
    if let Some(expected) = expected_size {
        if out.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("decompressed to {} bytes, expected {expected}", out.len()),
            ));
        }
    }
    Ok(out)
}

/// CRC32 of a buffer.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deflate_inflate_round_trip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let compressed = deflate(&data, Compression::default()).unwrap();
        assert!(compressed.len() < data.len());
        let restored = inflate(&compressed, Some(data.len())).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn inflate_rejects_size_mismatch() {
        let compressed = deflate(b"abc", Compression::default()).unwrap();
        assert!(inflate(&compressed, Some(4)).is_err());
    }

    #[test]
    fn inflate_without_expected_size() {
        let compressed = deflate(b"abc", Compression::default()).unwrap();
        assert_eq!(inflate(&compressed, None).unwrap(), b"abc");
    }

    #[test]
    fn level_mapping() {
        assert!(CompressionLevel::None.to_flate2().is_none());
        assert_eq!(
            CompressionLevel::Fastest.to_flate2(),
            Some(Compression::fast())
        );
        assert_eq!(
            CompressionLevel::SmallestSize.to_flate2(),
            Some(Compression::best())
        );
    }

    #[test]
    fn crc32_known_answer() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }
}
