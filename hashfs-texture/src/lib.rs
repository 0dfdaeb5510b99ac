//! Texture collaborators for HashFS archives.
//!
//! HashFS v2 archives fuse a texture descriptor (`.tobj`) and its surface
//! file (`.dds`) into a single entry. This crate provides the three pieces
//! the container needs for that:
//!
//! - the DDS surface container codec (DX10 extended headers only),
//! - the TOBJ descriptor codec (texture reference plus sampling state),
//! - the surface repacker that realigns pixel rows between the external
//!   file layout and the archive's pitch/image alignment.

pub mod error;
pub mod format;
pub mod repack;
pub mod surface;
pub mod tobj;

pub use error::{Result, TextureError};
pub use format::{DxgiFormat, SurfaceInfo, mip_extent, surface_info};
pub use repack::{
    ARCHIVE_IMAGE_ALIGNMENT, ARCHIVE_PITCH_ALIGNMENT, RepackLayout, SurfaceGeometry, pack_surface,
    unpack_surface,
};
pub use surface::Surface;
pub use tobj::{AddrMode, MagFilter, MinFilter, MipFilter, Tobj, TobjKind};
