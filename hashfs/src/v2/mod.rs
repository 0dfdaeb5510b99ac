//! Version 2 archive format.

pub mod entry;
pub mod metadata;
pub mod reader;
pub mod texture;
pub mod writer;

pub use entry::{EntryRecordV2, EntryV2};
pub use texture::TextureInfo;
pub use writer::WriterV2;
