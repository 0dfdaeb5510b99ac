//! Directory tree synthesis and listing blob codecs.
//!
//! Archives are keyed by path hashes, so directories only exist as
//! synthesized listing entries: for every registered path the writer
//! ensures a node per prefix (root included) and serializes one listing
//! blob per directory at save time. Traversal is lexicographic, which
//! makes the produced archives byte-deterministic for a given input set.
//!
//! Listing formats:
//! - v1: UTF-8 text, one name per line, subdirectory names prefixed `/`;
//! - v2: `u32 count`, then `count` names each prefixed with a `u8` length,
//!   subdirectory names prefixed `/` in their first byte.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{HashFsError, Result};

/// One name inside a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_directory: bool,
}

/// A directory and the names it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Absolute directory path (`/` for the root).
    pub path: String,
    pub subdirs: Vec<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Default)]
struct Node {
    dirs: BTreeMap<String, Node>,
    files: BTreeSet<String>,
}

/// The implicit directory tree of a writer.
#[derive(Debug, Default)]
pub struct DirectoryTree {
    root: Node,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file path, creating every intermediate directory.
    ///
    /// `path` must be absolute; empty components are ignored.
    pub fn insert_file(&mut self, path: &str) {
        let mut components: Vec<&str> = path
            .trim_start_matches('/')
            .split('/')
            .filter(|c| !c.is_empty())
            .collect();
        let Some(file_name) = components.pop() else {
            return;
        };
        let mut node = &mut self.root;
        for dir in components {
            node = node.dirs.entry(dir.to_string()).or_default();
        }
        node.files.insert(file_name.to_string());
    }

    /// All directories of the tree in depth-first preorder, root first.
    pub fn listings(&self) -> Vec<DirectoryListing> {
        let mut out = Vec::new();
        walk("/", &self.root, &mut out);
        out
    }
}

fn walk(path: &str, node: &Node, out: &mut Vec<DirectoryListing>) {
    out.push(DirectoryListing {
        path: path.to_string(),
        subdirs: node.dirs.keys().cloned().collect(),
        files: node.files.iter().cloned().collect(),
    });
    for (name, child) in &node.dirs {
        let child_path = if path == "/" {
            format!("/{name}")
        } else {
            format!("{path}/{name}")
        };
        walk(&child_path, child, out);
    }
}

/// Encode a v1 listing blob.
pub fn encode_listing_v1(subdirs: &[String], files: &[String]) -> Vec<u8> {
    let mut lines: Vec<String> = subdirs.iter().map(|d| format!("/{d}")).collect();
    lines.extend(files.iter().cloned());
    lines.join("\n").into_bytes()
}

/// Decode a v1 listing blob.
pub fn decode_listing_v1(data: &[u8]) -> Result<Vec<ListingEntry>> {
    let text = std::str::from_utf8(data)
        .map_err(|_| HashFsError::CorruptTable("directory listing is not UTF-8".into()))?;
    Ok(text
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix('/') {
            Some(name) => ListingEntry {
                name: name.to_string(),
                is_directory: true,
            },
            None => ListingEntry {
                name: line.to_string(),
                is_directory: false,
            },
        })
        .collect())
}

/// Encode a v2 listing blob.
pub fn encode_listing_v2(subdirs: &[String], files: &[String]) -> Result<Vec<u8>> {
    let count = subdirs.len() + files.len();
    let mut out = Vec::new();
    out.extend_from_slice(&(count as u32).to_le_bytes());
    let mut push = |name: String| -> Result<()> {
        if name.len() > u8::MAX as usize {
            return Err(HashFsError::InvalidArchivePath(format!(
                "listing name of {} bytes",
                name.len()
            )));
        }
        out.push(name.len() as u8);
        out.extend_from_slice(name.as_bytes());
        Ok(())
    };
    for dir in subdirs {
        push(format!("/{dir}"))?;
    }
    for file in files {
        push(file.clone())?;
    }
    Ok(out)
}

/// Decode a v2 listing blob.
pub fn decode_listing_v2(data: &[u8]) -> Result<Vec<ListingEntry>> {
    if data.len() < 4 {
        return Err(HashFsError::CorruptTable(
            "directory listing shorter than its count field".into(),
        ));
    }
    let count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let mut entries = Vec::with_capacity(count);
    let mut pos = 4;
    for _ in 0..count {
        let len = *data.get(pos).ok_or_else(|| {
            HashFsError::CorruptTable("directory listing truncated".into())
        })? as usize;
        pos += 1;
        let bytes = data.get(pos..pos + len).ok_or_else(|| {
            HashFsError::CorruptTable("directory listing truncated".into())
        })?;
        pos += len;
        let name = std::str::from_utf8(bytes)
            .map_err(|_| HashFsError::CorruptTable("directory listing is not UTF-8".into()))?;
        entries.push(match name.strip_prefix('/') {
            Some(dir) => ListingEntry {
                name: dir.to_string(),
                is_directory: true,
            },
            None => ListingEntry {
                name: name.to_string(),
                is_directory: false,
            },
        });
    }
    Ok(entries)
}
