//! Bit-packed texture metadata.
//!
//! A texture entry stores its descriptor state in two 32-bit words plus a
//! pair of `value - 1` 16-bit extents. The bit positions are part of the
//! on-disk contract:
//!
//! ```text
//! word A: [0,4)   mipmap_count - 1
//!         [4,12)  DXGI format
//!         [12,14) cube flag
//!         [14,20) face_count - 1
//!         [20,24) log2(pitch alignment)
//!         [24,28) log2(image alignment)
//! word B: bit 0   mag filter
//!         bit 1   min filter
//!         [2,4)   mip filter
//!         [4,7)   addressing U
//!         [7,10)  addressing V
//!         [10,13) addressing W
//! ```

use hashfs_texture::{
    AddrMode, DxgiFormat, MagFilter, MinFilter, MipFilter, RepackLayout, SurfaceGeometry,
};

use crate::bitfield::BitField32;

/// Word A: image geometry and archive layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageFlags(pub BitField32);

impl ImageFlags {
    pub fn from_word(word: u32) -> Self {
        Self(BitField32::new(word))
    }

    pub fn word(self) -> u32 {
        self.0.word()
    }

    pub fn mipmap_count(self) -> u32 {
        self.0.get(0, 4) + 1
    }

    pub fn set_mipmap_count(&mut self, count: u32) {
        self.0.set(0, 4, count - 1);
    }

    pub fn format_raw(self) -> u32 {
        self.0.get(4, 8)
    }

    pub fn format(self) -> Option<DxgiFormat> {
        DxgiFormat::from_u32(self.format_raw())
    }

    pub fn set_format(&mut self, format: DxgiFormat) {
        self.0.set(4, 8, format.as_u32());
    }

    pub fn is_cube(self) -> bool {
        self.0.get(12, 2) != 0
    }

    pub fn set_cube(&mut self, cube: bool) {
        self.0.set(12, 2, u32::from(cube));
    }

    pub fn face_count(self) -> u32 {
        self.0.get(14, 6) + 1
    }

    pub fn set_face_count(&mut self, count: u32) {
        self.0.set(14, 6, count - 1);
    }

    pub fn pitch_alignment(self) -> u32 {
        1 << self.0.get(20, 4)
    }

    pub fn set_pitch_alignment(&mut self, alignment: u32) {
        debug_assert!(alignment.is_power_of_two());
        self.0.set(20, 4, alignment.trailing_zeros());
    }

    pub fn image_alignment(self) -> u32 {
        1 << self.0.get(24, 4)
    }

    pub fn set_image_alignment(&mut self, alignment: u32) {
        debug_assert!(alignment.is_power_of_two());
        self.0.set(24, 4, alignment.trailing_zeros());
    }
}

/// Word B: sampler state.
///
/// Unknown addressing encodings read as the default mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleFlags(pub BitField32);

impl SampleFlags {
    pub fn from_word(word: u32) -> Self {
        Self(BitField32::new(word))
    }

    pub fn word(self) -> u32 {
        self.0.word()
    }

    pub fn mag_filter(self) -> MagFilter {
        MagFilter::from_u8(self.0.get(0, 1) as u8).unwrap_or_default()
    }

    pub fn set_mag_filter(&mut self, filter: MagFilter) {
        self.0.set(0, 1, filter as u32);
    }

    pub fn min_filter(self) -> MinFilter {
        MinFilter::from_u8(self.0.get(1, 1) as u8).unwrap_or_default()
    }

    pub fn set_min_filter(&mut self, filter: MinFilter) {
        self.0.set(1, 1, filter as u32);
    }

    pub fn mip_filter(self) -> MipFilter {
        MipFilter::from_u8(self.0.get(2, 2) as u8).unwrap_or_default()
    }

    pub fn set_mip_filter(&mut self, filter: MipFilter) {
        self.0.set(2, 2, filter as u32);
    }

    pub fn addr_u(self) -> AddrMode {
        AddrMode::from_u8(self.0.get(4, 3) as u8).unwrap_or_default()
    }

    pub fn set_addr_u(&mut self, mode: AddrMode) {
        self.0.set(4, 3, mode as u32);
    }

    pub fn addr_v(self) -> AddrMode {
        AddrMode::from_u8(self.0.get(7, 3) as u8).unwrap_or_default()
    }

    pub fn set_addr_v(&mut self, mode: AddrMode) {
        self.0.set(7, 3, mode as u32);
    }

    pub fn addr_w(self) -> AddrMode {
        AddrMode::from_u8(self.0.get(10, 3) as u8).unwrap_or_default()
    }

    pub fn set_addr_w(&mut self, mode: AddrMode) {
        self.0.set(10, 3, mode as u32);
    }
}

/// Texture metadata of a v2 entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub image: ImageFlags,
    pub sample: SampleFlags,
}

impl TextureInfo {
    pub fn mipmap_count(&self) -> u32 {
        self.image.mipmap_count()
    }

    pub fn format(&self) -> Option<DxgiFormat> {
        self.image.format()
    }

    pub fn is_cube(&self) -> bool {
        self.image.is_cube()
    }

    pub fn face_count(&self) -> u32 {
        self.image.face_count()
    }

    /// Geometry for the repacker, if the stored format is known.
    pub fn geometry(&self) -> Option<SurfaceGeometry> {
        Some(SurfaceGeometry {
            width: self.width,
            height: self.height,
            mipmap_count: self.mipmap_count(),
            format: self.format()?,
            face_count: self.face_count(),
        })
    }

    /// The alignments the surface was packed with.
    pub fn layout(&self) -> RepackLayout {
        RepackLayout {
            pitch_alignment: self.image.pitch_alignment(),
            image_alignment: self.image.image_alignment(),
        }
    }
}
