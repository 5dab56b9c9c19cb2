//! Format capability table.
//!
//! Maps abstract formats to the driver triple `(internal format, external
//! format, data type)` plus capability bits, seeded once from the feature
//! probe. Standard, packed and compressed formats live in separate
//! subtables. Lookups for unsupported formats return `None` without
//! touching driver state.

use std::collections::HashMap;

use hal::format::{ChannelType, CompressedType, Format, PackedType, SurfaceType};

use crate::gl::consts as gl;
use crate::info::{Info, PrivateCaps};

bitflags! {
    /// What a format can be used for on this driver.
    pub struct FormatCaps: u32 {
        /// Vertex attribute data.
        const VERTEX = 0x1;
        /// Sampled texture data.
        const TEXTURE = 0x2;
        /// Framebuffer attachment.
        const OFFSCREEN = 0x4;
        /// Texture buffer data.
        const TEXTURE_BUFFER = 0x8;
    }
}

/// The driver mapping of one format.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GlFormat {
    pub internal: u32,
    pub external: u32,
    pub data_type: u32,
    pub caps: FormatCaps,
}

/// All format mappings supported by the probed driver.
#[derive(Debug)]
pub struct FormatTable {
    standard: HashMap<(SurfaceType, ChannelType), GlFormat>,
    packed: HashMap<PackedType, GlFormat>,
    compressed: HashMap<(CompressedType, ChannelType), GlFormat>,
}

impl FormatTable {
    /// Seed the table from the probed driver info.
    pub fn new(info: &Info) -> Self {
        let mut table = FormatTable {
            standard: HashMap::new(),
            packed: HashMap::new(),
            compressed: HashMap::new(),
        };
        table.seed_standard(info);
        table.seed_packed(info);
        table.seed_compressed(info);
        table
    }

    /// Look up the driver triple of a format.
    pub fn get(&self, format: Format) -> Option<&GlFormat> {
        match format {
            Format::Standard(surface, channel) => self.standard.get(&(surface, channel)),
            Format::Packed(packed) => self.packed.get(&packed),
            Format::Compressed(compressed, channel) => self.compressed.get(&(compressed, channel)),
        }
    }

    /// Whether the format supports all the requested capabilities.
    pub fn supported(&self, format: Format, caps: FormatCaps) -> bool {
        self.get(format).map_or(false, |f| f.caps.contains(caps))
    }

    fn add_standard(
        &mut self,
        surface: SurfaceType,
        channel: ChannelType,
        internal: u32,
        external: u32,
        data_type: u32,
        caps: FormatCaps,
    ) {
        self.standard.insert(
            (surface, channel),
            GlFormat {
                internal,
                external,
                data_type,
                caps,
            },
        );
    }

    fn seed_standard(&mut self, info: &Info) {
        use ChannelType::*;
        use SurfaceType::*;

        let tb = if info.private_caps.contains(PrivateCaps::TEXTURE_BUFFER) {
            FormatCaps::TEXTURE_BUFFER
        } else {
            FormatCaps::empty()
        };
        let vt = FormatCaps::VERTEX | FormatCaps::TEXTURE;
        let vto = vt | FormatCaps::OFFSCREEN;
        let float_offscreen = if info.is_supported(3, 0, "GL_ARB_color_buffer_float") {
            FormatCaps::OFFSCREEN
        } else {
            FormatCaps::empty()
        };

        // 8-bit channels.
        for &(surface, external, int_external, count) in &[
            (R8, gl::RED, gl::RED_INTEGER, 1u32),
            (Rg8, gl::RG, gl::RG_INTEGER, 2),
            (Rgb8, gl::RGB, gl::RGB_INTEGER, 3),
            (Rgba8, gl::RGBA, gl::RGBA_INTEGER, 4),
        ] {
            let (unorm, snorm, uint, sint) = match surface {
                R8 => (gl::R8, gl::R8_SNORM, gl::R8UI, gl::R8I),
                Rg8 => (gl::RG8, gl::RG8_SNORM, gl::RG8UI, gl::RG8I),
                Rgb8 => (gl::RGB8, gl::RGB8_SNORM, gl::RGB8UI, gl::RGB8I),
                _ => (gl::RGBA8, gl::RGBA8_SNORM, gl::RGBA8UI, gl::RGBA8I),
            };
            // Three-channel formats are not renderable everywhere; keep
            // them texture-only.
            let color = if count == 3 { vt } else { vto };
            self.add_standard(surface, Unorm, unorm, external, gl::UNSIGNED_BYTE, color | tb);
            self.add_standard(surface, Snorm, snorm, external, gl::BYTE, vt);
            self.add_standard(
                surface,
                Uint,
                uint,
                int_external,
                gl::UNSIGNED_BYTE,
                color | tb,
            );
            self.add_standard(surface, Sint, sint, int_external, gl::BYTE, color | tb);
        }
        self.add_standard(
            Rgb8,
            Srgb,
            gl::SRGB8,
            gl::RGB,
            gl::UNSIGNED_BYTE,
            FormatCaps::TEXTURE,
        );
        self.add_standard(
            Rgba8,
            Srgb,
            gl::SRGB8_ALPHA8,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            FormatCaps::TEXTURE | FormatCaps::OFFSCREEN,
        );
        self.add_standard(
            Bgra8,
            Unorm,
            gl::RGBA8,
            gl::BGRA,
            gl::UNSIGNED_BYTE,
            FormatCaps::TEXTURE | FormatCaps::OFFSCREEN | FormatCaps::VERTEX,
        );

        // 16-bit channels.
        for &(surface, external, int_external) in &[
            (R16, gl::RED, gl::RED_INTEGER),
            (Rg16, gl::RG, gl::RG_INTEGER),
            (Rgb16, gl::RGB, gl::RGB_INTEGER),
            (Rgba16, gl::RGBA, gl::RGBA_INTEGER),
        ] {
            let (unorm, snorm, uint, sint, float) = match surface {
                R16 => (gl::R16, gl::R16_SNORM, gl::R16UI, gl::R16I, gl::R16F),
                Rg16 => (gl::RG16, gl::RG16_SNORM, gl::RG16UI, gl::RG16I, gl::RG16F),
                Rgb16 => (gl::RGB16, gl::RGB16_SNORM, gl::RGB16UI, gl::RGB16I, gl::RGB16F),
                _ => (
                    gl::RGBA16,
                    gl::RGBA16_SNORM,
                    gl::RGBA16UI,
                    gl::RGBA16I,
                    gl::RGBA16F,
                ),
            };
            if !info.version.is_embedded {
                self.add_standard(surface, Unorm, unorm, external, gl::UNSIGNED_SHORT, vt);
                self.add_standard(surface, Snorm, snorm, external, gl::SHORT, vt);
            }
            self.add_standard(
                surface,
                Uint,
                uint,
                int_external,
                gl::UNSIGNED_SHORT,
                vt | tb,
            );
            self.add_standard(surface, Sint, sint, int_external, gl::SHORT, vt | tb);
            self.add_standard(
                surface,
                Float,
                float,
                external,
                gl::HALF_FLOAT,
                vt | tb | float_offscreen,
            );
        }

        // 32-bit channels.
        for &(surface, external, int_external) in &[
            (R32, gl::RED, gl::RED_INTEGER),
            (Rg32, gl::RG, gl::RG_INTEGER),
            (Rgb32, gl::RGB, gl::RGB_INTEGER),
            (Rgba32, gl::RGBA, gl::RGBA_INTEGER),
        ] {
            let (uint, sint, float) = match surface {
                R32 => (gl::R32UI, gl::R32I, gl::R32F),
                Rg32 => (gl::RG32UI, gl::RG32I, gl::RG32F),
                Rgb32 => (gl::RGB32UI, gl::RGB32I, gl::RGB32F),
                _ => (gl::RGBA32UI, gl::RGBA32I, gl::RGBA32F),
            };
            self.add_standard(surface, Uint, uint, int_external, gl::UNSIGNED_INT, vt | tb);
            self.add_standard(surface, Sint, sint, int_external, gl::INT, vt | tb);
            self.add_standard(
                surface,
                Float,
                float,
                external,
                gl::FLOAT,
                vt | tb | float_offscreen,
            );
        }

        // Depth and stencil.
        let ds = FormatCaps::TEXTURE | FormatCaps::OFFSCREEN;
        self.add_standard(
            D16,
            Unorm,
            gl::DEPTH_COMPONENT16,
            gl::DEPTH_COMPONENT,
            gl::UNSIGNED_SHORT,
            ds,
        );
        self.add_standard(
            D32F,
            Float,
            gl::DEPTH_COMPONENT32F,
            gl::DEPTH_COMPONENT,
            gl::FLOAT,
            ds,
        );
        self.add_standard(
            D24S8,
            Unorm,
            gl::DEPTH24_STENCIL8,
            gl::DEPTH_STENCIL,
            gl::UNSIGNED_INT_24_8,
            ds,
        );
        self.add_standard(
            D32FS8,
            Float,
            gl::DEPTH32F_STENCIL8,
            gl::DEPTH_STENCIL,
            gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
            ds,
        );
        self.add_standard(
            S8,
            Uint,
            gl::STENCIL_INDEX8,
            gl::STENCIL_INDEX,
            gl::UNSIGNED_BYTE,
            FormatCaps::OFFSCREEN,
        );
    }

    fn seed_packed(&mut self, _info: &Info) {
        let to = FormatCaps::TEXTURE | FormatCaps::OFFSCREEN;
        let entries = [
            (
                PackedType::R5G6B5,
                gl::RGB565,
                gl::RGB,
                gl::UNSIGNED_SHORT_5_6_5,
                to,
            ),
            (
                PackedType::R5G5B5A1,
                gl::RGB5_A1,
                gl::RGBA,
                gl::UNSIGNED_SHORT_5_5_5_1,
                to,
            ),
            (
                PackedType::R4G4B4A4,
                gl::RGBA4,
                gl::RGBA,
                gl::UNSIGNED_SHORT_4_4_4_4,
                to,
            ),
            (
                PackedType::A2B10G10R10,
                gl::RGB10_A2,
                gl::RGBA,
                gl::UNSIGNED_INT_2_10_10_10_REV,
                to | FormatCaps::VERTEX,
            ),
            (
                PackedType::B10G11R11F,
                gl::R11F_G11F_B10F,
                gl::RGB,
                gl::UNSIGNED_INT_10F_11F_11F_REV,
                to,
            ),
            (
                PackedType::E5B9G9R9F,
                gl::RGB9_E5,
                gl::RGB,
                gl::UNSIGNED_INT_5_9_9_9_REV,
                FormatCaps::TEXTURE,
            ),
        ];
        for &(packed, internal, external, data_type, caps) in &entries {
            self.packed.insert(
                packed,
                GlFormat {
                    internal,
                    external,
                    data_type,
                    caps,
                },
            );
        }
    }

    fn seed_compressed(&mut self, info: &Info) {
        let mut add = |compressed, channel, internal| {
            self.compressed.insert(
                (compressed, channel),
                GlFormat {
                    internal,
                    external: gl::RGBA,
                    data_type: gl::UNSIGNED_BYTE,
                    caps: FormatCaps::TEXTURE,
                },
            );
        };

        if info.is_extension_supported("GL_EXT_texture_compression_s3tc") {
            add(CompressedType::Bc1Rgb, ChannelType::Unorm, gl::COMPRESSED_RGB_S3TC_DXT1);
            add(CompressedType::Bc1Rgba, ChannelType::Unorm, gl::COMPRESSED_RGBA_S3TC_DXT1);
            add(CompressedType::Bc2, ChannelType::Unorm, gl::COMPRESSED_RGBA_S3TC_DXT3);
            add(CompressedType::Bc3, ChannelType::Unorm, gl::COMPRESSED_RGBA_S3TC_DXT5);
        }
        if info.is_supported(3, 0, "GL_ARB_texture_compression_rgtc") {
            add(CompressedType::Bc4, ChannelType::Unorm, gl::COMPRESSED_RED_RGTC1);
            add(CompressedType::Bc5, ChannelType::Unorm, gl::COMPRESSED_RG_RGTC2);
        }
        if info.is_supported(4, 3, "GL_ARB_ES3_compatibility") || info.version.is_embedded {
            add(CompressedType::Etc2R8G8B8, ChannelType::Unorm, gl::COMPRESSED_RGB8_ETC2);
            add(CompressedType::Etc2R8G8B8, ChannelType::Srgb, gl::COMPRESSED_SRGB8_ETC2);
            add(
                CompressedType::Etc2R8G8B8A1,
                ChannelType::Unorm,
                gl::COMPRESSED_RGB8_PUNCHTHROUGH_ALPHA1_ETC2,
            );
            add(
                CompressedType::Etc2R8G8B8A8,
                ChannelType::Unorm,
                gl::COMPRESSED_RGBA8_ETC2_EAC,
            );
            add(
                CompressedType::Etc2R8G8B8A8,
                ChannelType::Srgb,
                gl::COMPRESSED_SRGB8_ALPHA8_ETC2_EAC,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::Info;
    use crate::mock::MockContext;

    fn table_for(version: &str, extensions: &str) -> FormatTable {
        let ctx = MockContext::with_driver(version, extensions);
        FormatTable::new(&Info::get(&ctx))
    }

    #[test]
    fn info_texture_format_is_supported() {
        let table = table_for("4.5 Mock", "GL_ARB_texture_buffer_object");
        let gl_format = table.get(Format::INFO_TEXTURE).unwrap();
        assert_eq!(gl_format.internal, gl::RGBA32F);
        assert_eq!(gl_format.external, gl::RGBA);
        assert_eq!(gl_format.data_type, gl::FLOAT);
        assert!(table.supported(Format::INFO_TEXTURE, FormatCaps::TEXTURE));
    }

    #[test]
    fn unsupported_format_returns_none() {
        let table = table_for("4.5 Mock", "");
        let bc3 = Format::Compressed(CompressedType::Bc3, ChannelType::Unorm);
        assert!(table.get(bc3).is_none());
        assert!(!table.supported(bc3, FormatCaps::TEXTURE));

        let with_s3tc = table_for("4.5 Mock", "GL_EXT_texture_compression_s3tc");
        assert!(with_s3tc.supported(bc3, FormatCaps::TEXTURE));
    }

    #[test]
    fn three_channel_formats_not_renderable() {
        let table = table_for("4.5 Mock", "");
        let rgb = Format::Standard(SurfaceType::Rgb8, ChannelType::Unorm);
        assert!(table.supported(rgb, FormatCaps::TEXTURE));
        assert!(!table.supported(rgb, FormatCaps::OFFSCREEN));
        let rgba = Format::Standard(SurfaceType::Rgba8, ChannelType::Unorm);
        assert!(table.supported(rgba, FormatCaps::OFFSCREEN));
    }

    #[test]
    fn texture_buffer_gated_on_caps() {
        let without = table_for("3.0 Mock", "");
        assert!(!without.supported(Format::INFO_TEXTURE, FormatCaps::TEXTURE_BUFFER));
        let with = table_for("3.1 Mock", "");
        assert!(with.supported(Format::INFO_TEXTURE, FormatCaps::TEXTURE_BUFFER));
    }
}
