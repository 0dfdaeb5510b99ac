//! Version 1 archive format.

pub mod entry;
pub mod reader;
pub mod writer;

pub use entry::EntryV1;
pub use writer::WriterV1;
