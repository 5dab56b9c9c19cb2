//! Texture descriptions, copy regions and sampling state.

use crate::format::Format;

bitflags! {
    /// How a texture will be used.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TextureUsage: u32 {
        /// Sampled from a shader.
        const TEXTURE = 0x1;
        /// Accessed as a storage image.
        const IMAGE = 0x2;
        /// Source of copy operations.
        const COPY_FROM = 0x4;
        /// Destination of copy operations.
        const COPY_TO = 0x8;
        /// Rendered to as a framebuffer attachment.
        const OFFSCREEN = 0x10;
    }
}

/// Dimensionality of a texture.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureDim {
    Dim1D,
    Dim2D,
    Dim3D,
    Cube,
}

/// Full description of a texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureInfo {
    /// Pixel format.
    pub format: Format,
    /// Dimensionality.
    pub dim: TextureDim,
    /// Width in texels.
    pub width: u32,
    /// Height in texels; 1 for 1D textures.
    pub height: u32,
    /// Depth for 3D textures, array layers otherwise. 0 means non-array.
    pub depth: u32,
    /// Number of mip levels, minimum 1.
    pub mip_levels: u32,
    /// Sample count for multisampled offscreens, minimum 1.
    pub samples: u32,
}

impl TextureInfo {
    /// A single-sampled 2D texture with one mip level.
    pub fn new_2d(format: Format, width: u32, height: u32) -> Self {
        TextureInfo {
            format,
            dim: TextureDim::Dim2D,
            width,
            height,
            depth: 0,
            mip_levels: 1,
            samples: 1,
        }
    }

    /// Byte size of the base mip level across all layers.
    pub fn base_size(&self) -> usize {
        let layers = self.depth.max(1)
            * match self.dim {
                TextureDim::Cube => 6,
                _ => 1,
            };
        self.format.surface_size(self.width, self.height, layers)
    }
}

/// A texel position inside a texture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TexturePosition {
    pub x: u32,
    pub y: u32,
    /// Depth slice or array layer.
    pub depth: u32,
    pub mip_level: u32,
}

/// A region of a texture-to-texture copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureCopyRegion {
    pub src_position: TexturePosition,
    pub dst_position: TexturePosition,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// A region of a buffer-to-texture or texture-to-buffer copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferTextureCopyRegion {
    /// Byte offset of the region inside the buffer.
    pub buffer_offset: usize,
    /// Row pitch inside the buffer, in texels. 0 means tightly packed.
    pub buffer_width: u32,
    /// Image rows inside the buffer. 0 means tightly packed.
    pub buffer_height: u32,
    pub texture_position: TexturePosition,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// A region of a surface blit, allowing scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceBlitRegion {
    pub src_position: TexturePosition,
    pub src_width: u32,
    pub src_height: u32,
    pub dst_position: TexturePosition,
    pub dst_width: u32,
    pub dst_height: u32,
    pub layers: u32,
}

/// Filtering applied by samplers and scaled blits.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    Nearest,
    Linear,
}

/// Wrapping behavior outside the `[0, 1]` texture coordinate range.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Sampler description used when shaders omit explicit samplers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerDesc {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mip_filter: Option<Filter>,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    /// Enables shadow comparison sampling with the given comparison.
    pub compare: Option<crate::pso::CompareOp>,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        SamplerDesc {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mip_filter: None,
            wrap_u: WrapMode::ClampToEdge,
            wrap_v: WrapMode::ClampToEdge,
            compare: None,
        }
    }
}
