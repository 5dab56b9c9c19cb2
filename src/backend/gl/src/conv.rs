//! Conversions from abstract enums to driver values.

use hal::command::PrimitiveType;
use hal::format::{ChannelType, Format, SurfaceType};
use hal::image::Filter;
use hal::memory::Access;

use crate::gl::consts as gl;

pub(crate) fn map_primitive(primitive: PrimitiveType) -> u32 {
    match primitive {
        PrimitiveType::PointList => gl::POINTS,
        PrimitiveType::LineList => gl::LINES,
        PrimitiveType::LineStrip => gl::LINE_STRIP,
        PrimitiveType::TriangleList => gl::TRIANGLES,
        PrimitiveType::TriangleStrip => gl::TRIANGLE_STRIP,
        PrimitiveType::TriangleFan => gl::TRIANGLE_FAN,
        PrimitiveType::PatchList => gl::PATCHES,
    }
}

pub(crate) fn map_filter(filter: Filter) -> u32 {
    match filter {
        Filter::Nearest => gl::NEAREST,
        Filter::Linear => gl::LINEAR,
    }
}

/// Reduce an access mask to the driver's memory barrier bits.
pub(crate) fn access_to_barrier_bits(access: Access) -> u32 {
    let mut bits = 0;
    if access.contains(Access::INDIRECT_COMMAND_READ) {
        bits |= gl::COMMAND_BARRIER_BIT;
    }
    if access.contains(Access::INDEX_READ) {
        bits |= gl::ELEMENT_ARRAY_BARRIER_BIT;
    }
    if access.contains(Access::VERTEX_ATTRIBUTE_READ) {
        bits |= gl::VERTEX_ATTRIB_ARRAY_BARRIER_BIT;
    }
    if access.contains(Access::UNIFORM_READ) {
        bits |= gl::UNIFORM_BARRIER_BIT;
    }
    if access.intersects(Access::SHADER_READ | Access::INPUT_ATTACHMENT_READ) {
        bits |= gl::TEXTURE_FETCH_BARRIER_BIT;
    }
    if access.contains(Access::SHADER_WRITE) {
        bits |= gl::SHADER_IMAGE_ACCESS_BARRIER_BIT;
    }
    if access.intersects(
        Access::COLOR_ATTACHMENT_READ
            | Access::COLOR_ATTACHMENT_WRITE
            | Access::DEPTH_STENCIL_READ
            | Access::DEPTH_STENCIL_WRITE,
    ) {
        bits |= gl::FRAMEBUFFER_BARRIER_BIT;
    }
    if access.intersects(Access::TRANSFER_READ | Access::TRANSFER_WRITE) {
        bits |= gl::TEXTURE_UPDATE_BARRIER_BIT | gl::BUFFER_UPDATE_BARRIER_BIT
            | gl::PIXEL_BUFFER_BARRIER_BIT;
    }
    if access.intersects(Access::HOST_READ | Access::HOST_WRITE) {
        bits |= gl::BUFFER_UPDATE_BARRIER_BIT;
    }
    if access.intersects(Access::MEMORY_READ | Access::MEMORY_WRITE) {
        bits = gl::ALL_BARRIER_BITS;
    }
    bits
}

/// Vertex attribute layout of a format: `(components, data type,
/// normalized, integer path)`.
pub(crate) fn map_vertex_format(format: Format) -> Option<(i32, u32, bool, bool)> {
    let (surface, channel) = match format {
        Format::Standard(surface, channel) => (surface, channel),
        _ => return None,
    };
    let count = match surface {
        SurfaceType::R8 | SurfaceType::R16 | SurfaceType::R32 => 1,
        SurfaceType::Rg8 | SurfaceType::Rg16 | SurfaceType::Rg32 => 2,
        SurfaceType::Rgb8 | SurfaceType::Rgb16 | SurfaceType::Rgb32 => 3,
        SurfaceType::Rgba8
        | SurfaceType::Bgra8
        | SurfaceType::Rgba16
        | SurfaceType::Rgba32 => 4,
        _ => return None,
    };
    let signed = matches!(channel, ChannelType::Snorm | ChannelType::Sint);
    let data_type = match surface {
        SurfaceType::R8 | SurfaceType::Rg8 | SurfaceType::Rgb8 | SurfaceType::Rgba8
        | SurfaceType::Bgra8 => {
            if signed {
                gl::BYTE
            } else {
                gl::UNSIGNED_BYTE
            }
        }
        SurfaceType::R16 | SurfaceType::Rg16 | SurfaceType::Rgb16 | SurfaceType::Rgba16 => {
            match channel {
                ChannelType::Float => gl::HALF_FLOAT,
                _ if signed => gl::SHORT,
                _ => gl::UNSIGNED_SHORT,
            }
        }
        _ => match channel {
            ChannelType::Float => gl::FLOAT,
            ChannelType::Sint => gl::INT,
            _ => gl::UNSIGNED_INT,
        },
    };
    let normalized = matches!(channel, ChannelType::Unorm | ChannelType::Snorm);
    let integer = matches!(channel, ChannelType::Uint | ChannelType::Sint);
    Some((count, data_type, normalized, integer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrier_bits_reduction() {
        assert_eq!(
            access_to_barrier_bits(Access::INDEX_READ),
            gl::ELEMENT_ARRAY_BARRIER_BIT
        );
        let combined =
            access_to_barrier_bits(Access::UNIFORM_READ | Access::COLOR_ATTACHMENT_WRITE);
        assert_ne!(combined & gl::UNIFORM_BARRIER_BIT, 0);
        assert_ne!(combined & gl::FRAMEBUFFER_BARRIER_BIT, 0);
        assert_eq!(
            access_to_barrier_bits(Access::MEMORY_READ),
            gl::ALL_BARRIER_BITS
        );
    }

    #[test]
    fn vertex_formats() {
        let (count, ty, norm, int) = map_vertex_format(Format::Standard(
            SurfaceType::Rgba32,
            ChannelType::Float,
        ))
        .unwrap();
        assert_eq!((count, ty, norm, int), (4, gl::FLOAT, false, false));

        let (count, ty, norm, int) =
            map_vertex_format(Format::Standard(SurfaceType::Rg16, ChannelType::Sint)).unwrap();
        assert_eq!((count, ty, norm, int), (2, gl::SHORT, false, true));

        assert!(map_vertex_format(Format::Standard(
            SurfaceType::D24S8,
            ChannelType::Unorm
        ))
        .is_none());
    }
}
