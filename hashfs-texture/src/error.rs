//! Error types for texture packing operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextureError {
    #[error("descriptor references {0}, which is not in the working set")]
    MissingSurface(String),

    #[error("referenced file {0} is not a surface file")]
    NotASurface(String),

    #[error("unsupported surface subformat: {0}")]
    UnsupportedSurface(String),

    #[error("invalid surface data: {0}")]
    InvalidSurface(String),

    #[error("invalid descriptor data: {0}")]
    InvalidDescriptor(String),

    #[error("surface data truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TextureError>;
