//! Universal pixel format specification.
//!
//! A format is a surface layout (channel widths) combined with a channel
//! decorator, or one of the special packed / compressed layouts that don't
//! decompose into per-channel widths. Backends map formats to their own
//! internal triples through a capability table and may support an arbitrary
//! subset.

/// Channel layout of a standard format.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SurfaceType {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    Bgra8,
    R16,
    Rg16,
    Rgb16,
    Rgba16,
    R32,
    Rg32,
    Rgb32,
    Rgba32,
    D16,
    D32F,
    D24S8,
    D32FS8,
    S8,
}

/// Type of a format channel.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelType {
    Unorm,
    Snorm,
    Uint,
    Sint,
    Float,
    Srgb,
}

/// Packed formats that don't fit the per-channel-width scheme.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackedType {
    R5G6B5,
    R5G5B5A1,
    R4G4B4A4,
    A2B10G10R10,
    B10G11R11F,
    E5B9G9R9F,
}

/// Block-compressed formats.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressedType {
    Bc1Rgb,
    Bc1Rgba,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Etc2R8G8B8,
    Etc2R8G8B8A1,
    Etc2R8G8B8A8,
}

/// A complete pixel format.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Format {
    /// Channel layout with a decorator, e.g. `Standard(Rgba8, Unorm)`.
    Standard(SurfaceType, ChannelType),
    /// Special packed layout.
    Packed(PackedType),
    /// Block-compressed layout with a decorator (`Unorm` or `Srgb`).
    Compressed(CompressedType, ChannelType),
}

impl Format {
    /// The format used for per-primitive info textures.
    pub const INFO_TEXTURE: Format = Format::Standard(SurfaceType::Rgba32, ChannelType::Float);

    /// Whether the format has a depth aspect.
    pub fn is_depth(&self) -> bool {
        match self {
            Format::Standard(surface, _) => matches!(
                surface,
                SurfaceType::D16 | SurfaceType::D32F | SurfaceType::D24S8 | SurfaceType::D32FS8
            ),
            _ => false,
        }
    }

    /// Whether the format has a stencil aspect.
    pub fn is_stencil(&self) -> bool {
        match self {
            Format::Standard(surface, _) => matches!(
                surface,
                SurfaceType::D24S8 | SurfaceType::D32FS8 | SurfaceType::S8
            ),
            _ => false,
        }
    }

    /// Whether the format is a pure color format.
    pub fn is_color(&self) -> bool {
        !self.is_depth() && !self.is_stencil()
    }

    /// The decorator, when the format carries one.
    pub fn channel(&self) -> Option<ChannelType> {
        match *self {
            Format::Standard(_, channel) | Format::Compressed(_, channel) => Some(channel),
            Format::Packed(_) => None,
        }
    }

    /// Bytes per texel for uncompressed formats, bytes per block otherwise.
    pub fn block_size(&self) -> usize {
        match *self {
            Format::Standard(surface, _) => match surface {
                SurfaceType::R8 | SurfaceType::S8 => 1,
                SurfaceType::Rg8 | SurfaceType::R16 | SurfaceType::D16 => 2,
                SurfaceType::Rgb8 => 3,
                SurfaceType::Rgba8
                | SurfaceType::Bgra8
                | SurfaceType::Rg16
                | SurfaceType::R32
                | SurfaceType::D32F
                | SurfaceType::D24S8 => 4,
                SurfaceType::Rgb16 => 6,
                SurfaceType::Rgba16 | SurfaceType::Rg32 | SurfaceType::D32FS8 => 8,
                SurfaceType::Rgb32 => 12,
                SurfaceType::Rgba32 => 16,
            },
            Format::Packed(packed) => match packed {
                PackedType::R5G6B5 | PackedType::R5G5B5A1 | PackedType::R4G4B4A4 => 2,
                PackedType::A2B10G10R10 | PackedType::B10G11R11F | PackedType::E5B9G9R9F => 4,
            },
            Format::Compressed(compressed, _) => match compressed {
                CompressedType::Bc1Rgb
                | CompressedType::Bc1Rgba
                | CompressedType::Bc4
                | CompressedType::Etc2R8G8B8
                | CompressedType::Etc2R8G8B8A1 => 8,
                CompressedType::Bc2
                | CompressedType::Bc3
                | CompressedType::Bc5
                | CompressedType::Etc2R8G8B8A8 => 16,
            },
        }
    }

    /// Texel dimensions of a block. `(1, 1)` for uncompressed formats.
    pub fn block_dimensions(&self) -> (u32, u32) {
        match self {
            Format::Compressed(..) => (4, 4),
            _ => (1, 1),
        }
    }

    /// Total byte size of an image region with this format.
    pub fn surface_size(&self, width: u32, height: u32, layers: u32) -> usize {
        let (bw, bh) = self.block_dimensions();
        let blocks_x = (width + bw - 1) / bw;
        let blocks_y = (height + bh - 1) / bh;
        self.block_size() * blocks_x as usize * blocks_y as usize * layers as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_queries() {
        let color = Format::Standard(SurfaceType::Rgba8, ChannelType::Unorm);
        assert!(color.is_color());
        assert!(!color.is_depth());

        let ds = Format::Standard(SurfaceType::D24S8, ChannelType::Unorm);
        assert!(ds.is_depth());
        assert!(ds.is_stencil());
        assert!(!ds.is_color());

        assert!(Format::Standard(SurfaceType::S8, ChannelType::Uint).is_stencil());
    }

    #[test]
    fn sizes() {
        assert_eq!(Format::INFO_TEXTURE.block_size(), 16);
        assert_eq!(Format::INFO_TEXTURE.surface_size(4, 1024, 1), 64 * 1024);
        let etc2 = Format::Compressed(CompressedType::Etc2R8G8B8, ChannelType::Unorm);
        assert_eq!(etc2.surface_size(8, 8, 1), 32);
        // Partial blocks round up.
        assert_eq!(etc2.surface_size(5, 5, 1), 32);
    }
}
