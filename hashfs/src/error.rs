//! Error types for HashFS archive operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashFsError {
    #[error("not a HashFS archive (magic mismatch)")]
    NotHashFs,

    #[error("unsupported archive version {0}")]
    UnsupportedVersion(u16),

    #[error("unsupported hash method {0:?}")]
    UnsupportedHashMethod(String),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("corrupt table: {0}")]
    CorruptTable(String),

    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("{0} is a directory")]
    IsDirectory(String),

    #[error("{0} is not a directory")]
    NotDirectory(String),

    #[error("invalid archive path: {0}")]
    InvalidArchivePath(String),

    #[error("texture packing failed: {0}")]
    TexturePacking(#[from] hashfs_texture::TextureError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, HashFsError>;
