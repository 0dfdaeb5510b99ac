//! TOBJ texture descriptor codec.
//!
//! The descriptor is the small sidecar file that names a surface and the
//! sampler state to bind it with. The container only reads and writes the
//! fields below; everything else in the header is reserved and carried as
//! zeros.
//!
//! # Layout (little-endian)
//!
//! ```text
//! offset 0x00: u32 magic
//! offset 0x04: u32 reserved[4]
//! offset 0x14: u8 bias, u8 reserved, u8 kind, u8 reserved
//! offset 0x18: u8 mag_filter, u8 min_filter, u8 mip_filter, u8 reserved
//! offset 0x1C: u8 addr_u, u8 addr_v, u8 addr_w, u8 nocompress
//! offset 0x20: u8 reserved, u8 noanisotropic, u8 reserved[2]
//! offset 0x24: u32 reserved
//! offset 0x28: u32 path_length
//! offset 0x2C: [u8; path_length] texture path
//! ```

use crate::error::{Result, TextureError};

/// Descriptor magic.
pub const TOBJ_MAGIC: u32 = 0x70AB_0A01;

/// Fixed header size before the path record.
pub const TOBJ_HEADER_SIZE: usize = 0x28;

/// Descriptor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TobjKind {
    #[default]
    Map2d = 2,
    CubeMap = 5,
}

/// Magnification filter, one bit in the archive metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MagFilter {
    Nearest = 0,
    #[default]
    Linear = 1,
}

/// Minification filter, one bit in the archive metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinFilter {
    Nearest = 0,
    #[default]
    Linear = 1,
}

/// Mipmap filter, two bits in the archive metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipFilter {
    Nearest = 0,
    Trilinear = 1,
    NoMips = 2,
    #[default]
    Default = 3,
}

/// Texture addressing mode, three bits per axis in the archive metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddrMode {
    #[default]
    Repeat = 0,
    Clamp = 1,
    ClampToEdge = 2,
    ClampToBorder = 3,
    Mirror = 4,
    MirrorClamp = 5,
    MirrorClampToEdge = 6,
}

impl TobjKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(Self::Map2d),
            5 => Some(Self::CubeMap),
            _ => None,
        }
    }
}

impl MagFilter {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Nearest),
            1 => Some(Self::Linear),
            _ => None,
        }
    }
}

impl MinFilter {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Nearest),
            1 => Some(Self::Linear),
            _ => None,
        }
    }
}

impl MipFilter {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Nearest),
            1 => Some(Self::Trilinear),
            2 => Some(Self::NoMips),
            3 => Some(Self::Default),
            _ => None,
        }
    }
}

impl AddrMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Repeat),
            1 => Some(Self::Clamp),
            2 => Some(Self::ClampToEdge),
            3 => Some(Self::ClampToBorder),
            4 => Some(Self::Mirror),
            5 => Some(Self::MirrorClamp),
            6 => Some(Self::MirrorClampToEdge),
            _ => None,
        }
    }
}

/// A parsed texture descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tobj {
    pub kind: TobjKind,
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub mip_filter: MipFilter,
    pub addr_u: AddrMode,
    pub addr_v: AddrMode,
    pub addr_w: AddrMode,
    pub bias: u8,
    pub nocompress: bool,
    pub noanisotropic: bool,
    /// Archive path of the referenced surface file.
    pub texture_path: String,
}

impl Default for Tobj {
    fn default() -> Self {
        Self {
            kind: TobjKind::default(),
            mag_filter: MagFilter::default(),
            min_filter: MinFilter::default(),
            mip_filter: MipFilter::default(),
            addr_u: AddrMode::default(),
            addr_v: AddrMode::default(),
            addr_w: AddrMode::default(),
            bias: 0,
            nocompress: false,
            noanisotropic: false,
            texture_path: String::new(),
        }
    }
}

impl Tobj {
    /// Parse a descriptor byte stream.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < TOBJ_HEADER_SIZE + 4 {
            return Err(TextureError::InvalidDescriptor(format!(
                "descriptor truncated at {} bytes",
                data.len()
            )));
        }
        let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic != TOBJ_MAGIC {
            return Err(TextureError::InvalidDescriptor(format!(
                "magic {magic:#010x}"
            )));
        }

        let kind = TobjKind::from_u8(data[0x16]).ok_or_else(|| {
            TextureError::InvalidDescriptor(format!("kind {}", data[0x16]))
        })?;
        let mag_filter = MagFilter::from_u8(data[0x18]).ok_or_else(|| {
            TextureError::InvalidDescriptor(format!("mag filter {}", data[0x18]))
        })?;
        let min_filter = MinFilter::from_u8(data[0x19]).ok_or_else(|| {
            TextureError::InvalidDescriptor(format!("min filter {}", data[0x19]))
        })?;
        let mip_filter = MipFilter::from_u8(data[0x1A]).ok_or_else(|| {
            TextureError::InvalidDescriptor(format!("mip filter {}", data[0x1A]))
        })?;
        let addr_u = AddrMode::from_u8(data[0x1C]).ok_or_else(|| {
            TextureError::InvalidDescriptor(format!("addr u {}", data[0x1C]))
        })?;
        let addr_v = AddrMode::from_u8(data[0x1D]).ok_or_else(|| {
            TextureError::InvalidDescriptor(format!("addr v {}", data[0x1D]))
        })?;
        let addr_w = AddrMode::from_u8(data[0x1E]).ok_or_else(|| {
            TextureError::InvalidDescriptor(format!("addr w {}", data[0x1E]))
        })?;

        let path_length = u32::from_le_bytes([
            data[TOBJ_HEADER_SIZE],
            data[TOBJ_HEADER_SIZE + 1],
            data[TOBJ_HEADER_SIZE + 2],
            data[TOBJ_HEADER_SIZE + 3],
        ]) as usize;
        let path_start = TOBJ_HEADER_SIZE + 4;
        let path_end = path_start + path_length;
        if data.len() < path_end {
            return Err(TextureError::InvalidDescriptor(format!(
                "path record truncated: need {path_end} bytes, have {}",
                data.len()
            )));
        }
        let texture_path = std::str::from_utf8(&data[path_start..path_end])
            .map_err(|_| TextureError::InvalidDescriptor("path is not UTF-8".into()))?
            .to_string();

        Ok(Self {
            kind,
            mag_filter,
            min_filter,
            mip_filter,
            addr_u,
            addr_v,
            addr_w,
            bias: data[0x14],
            nocompress: data[0x1F] != 0,
            noanisotropic: data[0x21] != 0,
            texture_path,
        })
    }

    /// Serialize the descriptor.
    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; TOBJ_HEADER_SIZE];
        out[0..4].copy_from_slice(&TOBJ_MAGIC.to_le_bytes());
        out[0x14] = self.bias;
        out[0x16] = self.kind as u8;
        out[0x18] = self.mag_filter as u8;
        out[0x19] = self.min_filter as u8;
        out[0x1A] = self.mip_filter as u8;
        out[0x1C] = self.addr_u as u8;
        out[0x1D] = self.addr_v as u8;
        out[0x1E] = self.addr_w as u8;
        out[0x1F] = u8::from(self.nocompress);
        out[0x21] = u8::from(self.noanisotropic);
        out.extend_from_slice(&(self.texture_path.len() as u32).to_le_bytes());
        out.extend_from_slice(self.texture_path.as_bytes());
        out
    }
}
