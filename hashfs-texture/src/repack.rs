//! Surface repacker.
//!
//! Archives store surface bytes with every mip level padded to an image
//! alignment and every row padded to a pitch alignment, while the external
//! DDS file packs rows tightly. `pack_surface` walks the face x mip grid
//! (faces outer, mip levels inner) and pads destination offsets;
//! `unpack_surface` is the exact inverse and pads source offsets instead.

use crate::error::{Result, TextureError};
use crate::format::{DxgiFormat, mip_extent, surface_info};
use crate::surface::Surface;

/// Row alignment used by the writer when packing surfaces.
pub const ARCHIVE_PITCH_ALIGNMENT: u32 = 256;

/// Mip-level alignment used by the writer when packing surfaces.
pub const ARCHIVE_IMAGE_ALIGNMENT: u32 = 512;

/// Pitch and image alignment of the packed layout. Both are powers of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepackLayout {
    pub pitch_alignment: u32,
    pub image_alignment: u32,
}

impl Default for RepackLayout {
    fn default() -> Self {
        Self {
            pitch_alignment: ARCHIVE_PITCH_ALIGNMENT,
            image_alignment: ARCHIVE_IMAGE_ALIGNMENT,
        }
    }
}

/// The dimensions needed to walk a packed surface without its container
/// header, as recovered from archive metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub width: u32,
    pub height: u32,
    pub mipmap_count: u32,
    pub format: DxgiFormat,
    pub face_count: u32,
}

impl From<&Surface> for SurfaceGeometry {
    fn from(surface: &Surface) -> Self {
        Self {
            width: surface.width,
            height: surface.height,
            mipmap_count: surface.mipmap_count,
            format: surface.format,
            face_count: surface.face_count,
        }
    }
}

fn align_up(value: usize, alignment: usize) -> usize {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

fn pad_to(buf: &mut Vec<u8>, alignment: usize) {
    let target = align_up(buf.len(), alignment);
    buf.resize(target, 0);
}

/// Realign a surface's pixel data into the archive layout.
pub fn pack_surface(surface: &Surface, layout: RepackLayout) -> Result<Vec<u8>> {
    let geometry = SurfaceGeometry::from(surface);
    let mut out = Vec::new();
    let mut src = 0usize;

    for _face in 0..geometry.face_count {
        for level in 0..geometry.mipmap_count {
            let w = mip_extent(geometry.width, level);
            let h = mip_extent(geometry.height, level);
            let info = surface_info(w, h, geometry.format);

            pad_to(&mut out, layout.image_alignment as usize);
            for _row in 0..info.rows {
                pad_to(&mut out, layout.pitch_alignment as usize);
                let end = src + info.row_pitch;
                let row = surface
                    .data
                    .get(src..end)
                    .ok_or(TextureError::Truncated {
                        needed: end,
                        available: surface.data.len(),
                    })?;
                out.extend_from_slice(row);
                src = end;
            }
        }
    }

    Ok(out)
}

/// Recover a surface's tight pixel data from the archive layout.
///
/// The result is suitable for [`Surface::build`] together with the fields
/// of `geometry`.
pub fn unpack_surface(
    geometry: &SurfaceGeometry,
    layout: RepackLayout,
    packed: &[u8],
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut src = 0usize;

    for _face in 0..geometry.face_count {
        for level in 0..geometry.mipmap_count {
            let w = mip_extent(geometry.width, level);
            let h = mip_extent(geometry.height, level);
            let info = surface_info(w, h, geometry.format);

            src = align_up(src, layout.image_alignment as usize);
            for _row in 0..info.rows {
                src = align_up(src, layout.pitch_alignment as usize);
                let end = src + info.row_pitch;
                let row = packed.get(src..end).ok_or(TextureError::Truncated {
                    needed: end,
                    available: packed.len(),
                })?;
                out.extend_from_slice(row);
                src = end;
            }
        }
    }

    Ok(out)
}

/// Packed byte size of a surface under the given layout.
pub fn packed_size(geometry: &SurfaceGeometry, layout: RepackLayout) -> usize {
    let mut offset = 0usize;
    for _face in 0..geometry.face_count {
        for level in 0..geometry.mipmap_count {
            let w = mip_extent(geometry.width, level);
            let h = mip_extent(geometry.height, level);
            let info = surface_info(w, h, geometry.format);

            offset = align_up(offset, layout.image_alignment as usize);
            for _row in 0..info.rows {
                offset = align_up(offset, layout.pitch_alignment as usize);
                offset += info.row_pitch;
            }
        }
    }
    offset
}
