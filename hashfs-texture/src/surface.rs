//! DDS surface container codec.
//!
//! Only the modern container form is accepted: a 124-byte header whose
//! pixel format carries the `DX10` fourcc, followed by the 20-byte DX10
//! extension. Legacy fourcc-only surfaces cannot express the format range
//! the archive metadata stores and are rejected.
//!
//! # Layout (little-endian)
//!
//! ```text
//! offset 0x00: u32 magic "DDS "
//! offset 0x04: header (124 bytes)
//!   u32 size (124), u32 flags, u32 height, u32 width,
//!   u32 pitch_or_linear_size, u32 depth, u32 mipmap_count,
//!   u32 reserved1[11],
//!   pixel format (32 bytes):
//!     u32 size (32), u32 flags, [u8; 4] fourcc,
//!     u32 rgb_bit_count, u32 r/g/b/a masks,
//!   u32 caps, u32 caps2, u32 caps3, u32 caps4, u32 reserved2
//! offset 0x80: DX10 extension (20 bytes)
//!   u32 dxgi_format, u32 resource_dimension, u32 misc_flag,
//!   u32 array_size, u32 misc_flags2
//! offset 0x94: pixel data (faces outer, mip levels inner, tight rows)
//! ```

use crate::error::{Result, TextureError};
use crate::format::{DxgiFormat, mip_extent, surface_info};

/// `"DDS "` magic.
pub const DDS_MAGIC: u32 = 0x2053_4444;

/// Byte offset of the pixel data: magic + header + DX10 extension.
pub const DATA_OFFSET: usize = 4 + 124 + 20;

/// Header flags.
mod header_flags {
    pub const CAPS: u32 = 0x1;
    pub const HEIGHT: u32 = 0x2;
    pub const WIDTH: u32 = 0x4;
    pub const PIXEL_FORMAT: u32 = 0x1000;
    pub const MIPMAP_COUNT: u32 = 0x2_0000;
    pub const LINEAR_SIZE: u32 = 0x8_0000;
}

/// Caps flags.
mod caps {
    pub const COMPLEX: u32 = 0x8;
    pub const TEXTURE: u32 = 0x1000;
    pub const MIPMAP: u32 = 0x40_0000;
}

/// All cubemap bits of `caps2`: cubemap plus the six face-present flags.
const CAPS2_CUBEMAP_ALL_FACES: u32 = 0xFE00;

/// Pixel format flag marking the fourcc field as valid.
const PF_FOURCC: u32 = 0x4;

/// `"DX10"` fourcc.
const FOURCC_DX10: [u8; 4] = *b"DX10";

/// DX10 resource dimension for 2D textures.
const RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;

/// DX10 misc flag marking a cubemap.
const MISC_TEXTURECUBE: u32 = 0x4;

/// A parsed DDS surface.
///
/// `data` holds the pixel payload exactly as stored in the file: faces in
/// the outer loop, mip levels in the inner loop, rows tightly packed at
/// the format's natural pitch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    pub mipmap_count: u32,
    pub format: DxgiFormat,
    pub is_cube: bool,
    pub face_count: u32,
    pub data: Vec<u8>,
}

impl Surface {
    /// Parse a DDS byte stream.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(TextureError::InvalidSurface("file too short".into()));
        }
        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic != DDS_MAGIC {
            return Err(TextureError::NotASurface(format!(
                "magic {magic:#010x}, expected \"DDS \""
            )));
        }
        if data.len() < DATA_OFFSET {
            return Err(TextureError::InvalidSurface(format!(
                "header truncated at {} bytes",
                data.len()
            )));
        }

        let word = |offset: usize| {
            u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ])
        };

        let header_size = word(4);
        if header_size != 124 {
            return Err(TextureError::InvalidSurface(format!(
                "header size {header_size}, expected 124"
            )));
        }
        let height = word(12);
        let width = word(16);
        let mipmap_count = word(28).max(1);

        let pf_size = word(76);
        if pf_size != 32 {
            return Err(TextureError::InvalidSurface(format!(
                "pixel format size {pf_size}, expected 32"
            )));
        }
        let pf_flags = word(80);
        let fourcc = [data[84], data[85], data[86], data[87]];
        if pf_flags & PF_FOURCC == 0 || fourcc != FOURCC_DX10 {
            return Err(TextureError::UnsupportedSurface(
                "legacy header without DX10 extension".into(),
            ));
        }

        let dxgi_format = word(128);
        let resource_dimension = word(132);
        let misc_flag = word(136);
        let array_size = word(140);

        let format = DxgiFormat::from_u32(dxgi_format)
            .filter(|f| *f != DxgiFormat::Unknown)
            .ok_or_else(|| {
                TextureError::UnsupportedSurface(format!("DXGI format {dxgi_format}"))
            })?;
        if resource_dimension != RESOURCE_DIMENSION_TEXTURE2D {
            return Err(TextureError::UnsupportedSurface(format!(
                "resource dimension {resource_dimension}"
            )));
        }
        if array_size > 1 {
            return Err(TextureError::UnsupportedSurface(format!(
                "texture arrays (array size {array_size})"
            )));
        }
        if width == 0 || height == 0 {
            return Err(TextureError::InvalidSurface("zero extent".into()));
        }

        let is_cube = misc_flag & MISC_TEXTURECUBE != 0;
        let face_count = if is_cube { 6 } else { 1 };

        let expected = data_size(width, height, mipmap_count, face_count, format);
        let payload = &data[DATA_OFFSET..];
        if payload.len() < expected {
            return Err(TextureError::InvalidSurface(format!(
                "pixel data truncated: need {expected} bytes, have {}",
                payload.len()
            )));
        }

        Ok(Self {
            width,
            height,
            mipmap_count,
            format,
            is_cube,
            face_count,
            data: payload[..expected].to_vec(),
        })
    }

    /// Serialize the surface back into a DDS byte stream.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(DATA_OFFSET + self.data.len());
        out.extend_from_slice(&DDS_MAGIC.to_le_bytes());

        let mut flags = header_flags::CAPS
            | header_flags::HEIGHT
            | header_flags::WIDTH
            | header_flags::PIXEL_FORMAT
            | header_flags::LINEAR_SIZE;
        let mut caps_value = caps::TEXTURE;
        if self.mipmap_count > 1 {
            flags |= header_flags::MIPMAP_COUNT;
            caps_value |= caps::COMPLEX | caps::MIPMAP;
        }
        if self.is_cube {
            caps_value |= caps::COMPLEX;
        }

        let linear_size = surface_info(self.width, self.height, self.format).slice_pitch as u32;

        out.extend_from_slice(&124u32.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&linear_size.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // depth
        out.extend_from_slice(&self.mipmap_count.to_le_bytes());
        for _ in 0..11 {
            out.extend_from_slice(&0u32.to_le_bytes()); // reserved1
        }

        // Pixel format
        out.extend_from_slice(&32u32.to_le_bytes());
        out.extend_from_slice(&PF_FOURCC.to_le_bytes());
        out.extend_from_slice(&FOURCC_DX10);
        for _ in 0..5 {
            out.extend_from_slice(&0u32.to_le_bytes()); // bit count + masks
        }

        out.extend_from_slice(&caps_value.to_le_bytes());
        let caps2 = if self.is_cube {
            CAPS2_CUBEMAP_ALL_FACES
        } else {
            0
        };
        out.extend_from_slice(&caps2.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // caps3
        out.extend_from_slice(&0u32.to_le_bytes()); // caps4
        out.extend_from_slice(&0u32.to_le_bytes()); // reserved2

        // DX10 extension
        out.extend_from_slice(&self.format.as_u32().to_le_bytes());
        out.extend_from_slice(&RESOURCE_DIMENSION_TEXTURE2D.to_le_bytes());
        let misc = if self.is_cube { MISC_TEXTURECUBE } else { 0 };
        out.extend_from_slice(&misc.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes()); // array_size
        out.extend_from_slice(&0u32.to_le_bytes()); // misc_flags2

        out.extend_from_slice(&self.data);
        out
    }

    /// Total pixel data size for the surface's dimensions.
    pub fn expected_data_size(&self) -> usize {
        data_size(
            self.width,
            self.height,
            self.mipmap_count,
            self.face_count,
            self.format,
        )
    }
}

/// Tight pixel data size of a face x mip grid.
fn data_size(width: u32, height: u32, mipmap_count: u32, face_count: u32, format: DxgiFormat) -> usize {
    let mut total = 0;
    for _ in 0..face_count {
        for level in 0..mipmap_count {
            let w = mip_extent(width, level);
            let h = mip_extent(height, level);
            total += surface_info(w, h, format).slice_pitch;
        }
    }
    total
}
