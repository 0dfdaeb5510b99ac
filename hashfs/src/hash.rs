//! Salted CityHash-64 path hashing.
//!
//! Every entry in an archive is keyed by the 64-bit CityHash of its
//! normalized path. The same function serves lookup and writing, so the
//! rules here are part of the on-disk contract: a single leading `/` is
//! dropped, and a non-zero salt is prepended as decimal text with no
//! separator before hashing the UTF-8 bytes.

/// Hash an archive path with the given salt.
pub fn hash_path(path: &str, salt: u16) -> u64 {
    let normalized = path.strip_prefix('/').unwrap_or(path);
    if salt == 0 {
        cityhasher::hash(normalized.as_bytes())
    } else {
        let salted = format!("{salt}{normalized}");
        cityhasher::hash(salted.as_bytes())
    }
}
