//! DXGI surface formats and pitch arithmetic.
//!
//! The archive repacker only needs to know how large one row and one mip
//! slice of a surface are, so this module carries the format catalogue and
//! the four pitch rules: block-compressed formats round up to 4x4 blocks,
//! packed formats pair pixels, planar formats append half-height chroma,
//! and everything else is plain bits-per-pixel.

/// DXGI formats understood by the repacker.
///
/// The discriminants are the DXGI_FORMAT values, which is also how the
/// format is stored in the archive's texture metadata word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DxgiFormat {
    Unknown = 0,
    R32G32B32A32Float = 2,
    R32G32B32Float = 6,
    R16G16B16A16Float = 10,
    R16G16B16A16Unorm = 11,
    R32G32Float = 16,
    R10G10B10A2Unorm = 24,
    R11G11B10Float = 26,
    R8G8B8A8Unorm = 28,
    R8G8B8A8UnormSrgb = 29,
    R16G16Float = 34,
    R32Float = 41,
    R8G8Unorm = 49,
    R16Unorm = 56,
    R8Unorm = 61,
    A8Unorm = 65,
    R8G8B8G8Unorm = 68,
    G8R8G8B8Unorm = 69,
    Bc1Unorm = 71,
    Bc1UnormSrgb = 72,
    Bc2Unorm = 74,
    Bc2UnormSrgb = 75,
    Bc3Unorm = 77,
    Bc3UnormSrgb = 78,
    Bc4Unorm = 80,
    Bc4Snorm = 81,
    Bc5Unorm = 83,
    Bc5Snorm = 84,
    B8G8R8A8Unorm = 87,
    B8G8R8X8Unorm = 88,
    B8G8R8A8UnormSrgb = 91,
    Bc6hUf16 = 95,
    Bc6hSf16 = 96,
    Bc7Unorm = 98,
    Bc7UnormSrgb = 99,
    Nv12 = 103,
    P010 = 104,
    Yuy2 = 107,
}

impl DxgiFormat {
    /// Parse a raw DXGI_FORMAT value.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            2 => Some(Self::R32G32B32A32Float),
            6 => Some(Self::R32G32B32Float),
            10 => Some(Self::R16G16B16A16Float),
            11 => Some(Self::R16G16B16A16Unorm),
            16 => Some(Self::R32G32Float),
            24 => Some(Self::R10G10B10A2Unorm),
            26 => Some(Self::R11G11B10Float),
            28 => Some(Self::R8G8B8A8Unorm),
            29 => Some(Self::R8G8B8A8UnormSrgb),
            34 => Some(Self::R16G16Float),
            41 => Some(Self::R32Float),
            49 => Some(Self::R8G8Unorm),
            56 => Some(Self::R16Unorm),
            61 => Some(Self::R8Unorm),
            65 => Some(Self::A8Unorm),
            68 => Some(Self::R8G8B8G8Unorm),
            69 => Some(Self::G8R8G8B8Unorm),
            71 => Some(Self::Bc1Unorm),
            72 => Some(Self::Bc1UnormSrgb),
            74 => Some(Self::Bc2Unorm),
            75 => Some(Self::Bc2UnormSrgb),
            77 => Some(Self::Bc3Unorm),
            78 => Some(Self::Bc3UnormSrgb),
            80 => Some(Self::Bc4Unorm),
            81 => Some(Self::Bc4Snorm),
            83 => Some(Self::Bc5Unorm),
            84 => Some(Self::Bc5Snorm),
            87 => Some(Self::B8G8R8A8Unorm),
            88 => Some(Self::B8G8R8X8Unorm),
            91 => Some(Self::B8G8R8A8UnormSrgb),
            95 => Some(Self::Bc6hUf16),
            96 => Some(Self::Bc6hSf16),
            98 => Some(Self::Bc7Unorm),
            99 => Some(Self::Bc7UnormSrgb),
            103 => Some(Self::Nv12),
            104 => Some(Self::P010),
            107 => Some(Self::Yuy2),
            _ => None,
        }
    }

    /// Raw DXGI_FORMAT value.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Bytes per 4x4 block for block-compressed formats, `None` otherwise.
    pub fn block_bytes(self) -> Option<usize> {
        match self {
            Self::Bc1Unorm | Self::Bc1UnormSrgb | Self::Bc4Unorm | Self::Bc4Snorm => Some(8),
            Self::Bc2Unorm
            | Self::Bc2UnormSrgb
            | Self::Bc3Unorm
            | Self::Bc3UnormSrgb
            | Self::Bc5Unorm
            | Self::Bc5Snorm
            | Self::Bc6hUf16
            | Self::Bc6hSf16
            | Self::Bc7Unorm
            | Self::Bc7UnormSrgb => Some(16),
            _ => None,
        }
    }

    /// Packed formats store two pixels in one element.
    pub fn is_packed(self) -> bool {
        matches!(
            self,
            Self::R8G8B8G8Unorm | Self::G8R8G8B8Unorm | Self::Yuy2
        )
    }

    /// Planar formats append a half-height chroma plane after the luma rows.
    pub fn is_planar(self) -> bool {
        matches!(self, Self::Nv12 | Self::P010)
    }

    /// Bits per pixel for formats that are neither block-compressed,
    /// packed, nor planar.
    fn bits_per_pixel(self) -> usize {
        match self {
            Self::R32G32B32A32Float => 128,
            Self::R32G32B32Float => 96,
            Self::R16G16B16A16Float | Self::R16G16B16A16Unorm | Self::R32G32Float => 64,
            Self::R10G10B10A2Unorm
            | Self::R11G11B10Float
            | Self::R8G8B8A8Unorm
            | Self::R8G8B8A8UnormSrgb
            | Self::R16G16Float
            | Self::R32Float
            | Self::B8G8R8A8Unorm
            | Self::B8G8R8X8Unorm
            | Self::B8G8R8A8UnormSrgb => 32,
            Self::R8G8Unorm | Self::R16Unorm => 16,
            Self::R8Unorm | Self::A8Unorm => 8,
            _ => 0,
        }
    }
}

/// Row and slice pitch of one mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Bytes in one row of the level (a block row for BC formats).
    pub row_pitch: usize,
    /// Bytes in the whole level.
    pub slice_pitch: usize,
    /// Number of rows in the level.
    pub rows: usize,
}

/// Compute the pitch of a single mip level.
pub fn surface_info(width: u32, height: u32, format: DxgiFormat) -> SurfaceInfo {
    let w = width as usize;
    let h = height as usize;

    if let Some(block_bytes) = format.block_bytes() {
        let blocks_wide = ((w + 3) / 4).max(1);
        let blocks_high = ((h + 3) / 4).max(1);
        let row_pitch = blocks_wide * block_bytes;
        SurfaceInfo {
            row_pitch,
            slice_pitch: row_pitch * blocks_high,
            rows: blocks_high,
        }
    } else if format.is_packed() {
        let row_pitch = ((w + 1) >> 1) * 4;
        SurfaceInfo {
            row_pitch,
            slice_pitch: row_pitch * h,
            rows: h,
        }
    } else if format.is_planar() {
        let element = match format {
            DxgiFormat::P010 => 4,
            _ => 2,
        };
        let row_pitch = ((w + 1) >> 1) * element;
        let rows = h + (h + 1) / 2;
        SurfaceInfo {
            row_pitch,
            slice_pitch: row_pitch * rows,
            rows,
        }
    } else {
        let row_pitch = (w * format.bits_per_pixel() + 7) / 8;
        SurfaceInfo {
            row_pitch,
            slice_pitch: row_pitch * h,
            rows: h,
        }
    }
}

/// Extent of a base dimension at the given mip level, clamped to 1.
pub fn mip_extent(base: u32, level: u32) -> u32 {
    (base >> level).max(1)
}
