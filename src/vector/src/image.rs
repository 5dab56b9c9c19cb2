//! Vector image assembly and drawing.
//!
//! Finalization takes everything the tessellators left in the scratch
//! arena and turns it into the immutable image: one combined GPU buffer
//! (shape vertices, image vertices, indices, 4-byte tail alignment), info
//! textures of width 4 packing up to 1024 records each, glyph geometry
//! for text pieces, and the ordered draw piece list. Drawing walks the
//! pieces, binding per-piece state and issuing one indexed draw each.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Vector2};

use hal::buffer::{
    BufferUsage, IndexBufferBinding, MemoryFlags, VertexAttribute, VertexBufferBinding,
    VertexFormat,
};
use hal::command::{CommandBuffer, DrawIndexedRange, PrimitiveType};
use hal::format::{ChannelType, Format, SurfaceType};
use hal::image::{TextureInfo, TextureUsage};
use hal::pso::DynamicRenderStates;
use hal::{Backend, Device, Error, Result};

use crate::command::VectorCommand;
use crate::material::MaterialSet;
use crate::path;
use crate::scratch::{
    MaterialSource, ShaderVariant, ShapeVertex, TextDrawInfo, VectorInfo, VectorScratchData,
    INFOS_PER_TEXTURE, MAX_VERTEX_INDEX,
};
use crate::text::TextLayout;

/// Uniform and texture binding convention shared with the shaders.
pub mod bindings {
    /// `mat4` model-view-projection.
    pub const MODEL_VIEW_PROJECTION: i32 = 0;
    /// `vec2` logical image size.
    pub const IMAGE_SIZE: i32 = 1;
    /// `vec3` heights of the bound info textures.
    pub const TEXTURE_SIZES: i32 = 2;

    /// Per-piece shape/text info texture.
    pub const SHAPE_INFO_TEXTURE: u32 = 0;
    /// Image or glyph atlas texture of the piece.
    pub const OTHER_TEXTURE: u32 = 1;
    /// Material parameter texture.
    pub const MATERIAL_INFO_TEXTURE: u32 = 2;
    /// Material color ramp texture.
    pub const MATERIAL_COLOR_TEXTURE: u32 = 3;
    /// Outline material parameter texture.
    pub const OUTLINE_MATERIAL_INFO_TEXTURE: u32 = 4;
    /// Outline material color ramp texture.
    pub const OUTLINE_MATERIAL_COLOR_TEXTURE: u32 = 5;
}

/// Vertex layout of text glyph quads. `tex_coords.z` carries the info
/// record index of the range the glyph belongs to.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 3],
    pub fill_material: u16,
    pub outline_material: u16,
}

/// The shader set an image draws with, one per [`ShaderVariant`].
#[derive(Clone, Debug)]
pub struct VectorShaders<B: Backend> {
    shaders: [B::Shader; 9],
}

impl<B: Backend> VectorShaders<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fill_color: B::Shader,
        fill_linear_gradient: B::Shader,
        fill_radial_gradient: B::Shader,
        line: B::Shader,
        image: B::Shader,
        text_color: B::Shader,
        text_color_outline: B::Shader,
        text_gradient: B::Shader,
        text_gradient_outline: B::Shader,
    ) -> Self {
        VectorShaders {
            shaders: [
                fill_color,
                fill_linear_gradient,
                fill_radial_gradient,
                line,
                image,
                text_color,
                text_color_outline,
                text_gradient,
                text_gradient_outline,
            ],
        }
    }

    /// The shader for a variant.
    pub fn shader(&self, variant: ShaderVariant) -> &B::Shader {
        let index = match variant {
            ShaderVariant::FillColor => 0,
            ShaderVariant::FillLinearGradient => 1,
            ShaderVariant::FillRadialGradient => 2,
            ShaderVariant::Line => 3,
            ShaderVariant::Image => 4,
            ShaderVariant::TextColor => 5,
            ShaderVariant::TextColorOutline => 6,
            ShaderVariant::TextGradient => 7,
            ShaderVariant::TextGradientOutline => 8,
        };
        &self.shaders[index]
    }
}

#[derive(Clone, Debug)]
pub(crate) struct VectorImagePiece<B: Backend> {
    pub variant: ShaderVariant,
    pub info_texture: B::Texture,
    pub info_texture_height: u32,
    pub texture: Option<B::Texture>,
    pub material_source: MaterialSource,
    pub text_outline_material_source: MaterialSource,
    pub range: DrawIndexedRange,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum BaseType {
    Shape,
    Image,
    Text,
}

impl ShaderVariant {
    fn base_type(&self) -> BaseType {
        if self.is_text() {
            BaseType::Text
        } else if self.uses_image_vertices() {
            BaseType::Image
        } else {
            BaseType::Shape
        }
    }
}

/// A compiled, immutable vector image.
#[derive(Debug)]
pub struct VectorImage<B: Backend> {
    buffer: Option<B::Buffer>,
    text_buffer: Option<B::Buffer>,
    shape_geometry: Option<B::Geometry>,
    image_geometry: Option<B::Geometry>,
    text_geometry: Option<B::Geometry>,
    info_textures: Vec<B::Texture>,
    pieces: Vec<VectorImagePiece<B>>,
    info_records: Vec<VectorInfo>,
    text_layouts: Vec<Arc<TextLayout>>,
    local_materials: Option<MaterialSet<B>>,
    size: Vector2<f32>,
}

impl<B: Backend> VectorImage<B> {
    /// Compile a command stream into an image.
    ///
    /// `pixel_size` is the size of one on-screen pixel in image units and
    /// drives curve refinement. The local material set's textures are
    /// created here; the shared set must already be packed.
    pub fn new(
        device: &B::Device,
        scratch: &mut VectorScratchData<B>,
        commands: &[VectorCommand<B>],
        shared_materials: &MaterialSet<B>,
        mut local_materials: MaterialSet<B>,
        size: Vector2<f32>,
        pixel_size: f32,
    ) -> Result<Self> {
        if commands.is_empty() {
            return Err(Error::InvalidArg("empty command list"));
        }
        if size.x <= 0.0 || size.y <= 0.0 || pixel_size <= 0.0 {
            return Err(Error::InvalidArg("image size and pixel size must be positive"));
        }
        if !device.texture_format_supported(Format::INFO_TEXTURE) {
            error!("float textures are required for vector images");
            return Err(Error::NotSupported("float textures"));
        }

        local_materials.create_textures(device)?;

        if let Err(err) = path::process_commands(
            scratch,
            commands,
            shared_materials,
            &local_materials,
            pixel_size,
        ) {
            scratch.reset();
            return Err(err);
        }

        let image = Self::finish(device, scratch, local_materials, size);
        scratch.reset();
        if image.is_ok() {
            scratch.note_image_built();
        }
        image
    }

    fn finish(
        device: &B::Device,
        scratch: &mut VectorScratchData<B>,
        local_materials: MaterialSet<B>,
        size: Vector2<f32>,
    ) -> Result<Self> {
        // Pack info records into textures of width 4: full textures of
        // 1024 records, the last sized to the next power of two.
        let record_count = scratch.infos.len() as u32;
        let texture_count = (record_count + INFOS_PER_TEXTURE - 1) / INFOS_PER_TEXTURE;
        let mut info_textures = Vec::with_capacity(texture_count as usize);
        let mut info_texture_heights = Vec::with_capacity(texture_count as usize);
        for i in 0..texture_count {
            let first = i * INFOS_PER_TEXTURE;
            let resident = (record_count - first).min(INFOS_PER_TEXTURE);
            let height = resident.next_power_of_two().max(1);

            let mut data: Vec<VectorInfo> =
                scratch.infos[first as usize..(first + resident) as usize].to_vec();
            data.resize(height as usize, VectorInfo::zeroed());

            let info = TextureInfo::new_2d(Format::INFO_TEXTURE, 4, height);
            info_textures.push(device.create_texture(
                &info,
                TextureUsage::TEXTURE,
                MemoryFlags::STATIC | MemoryFlags::GPU_ONLY,
                Some(bytemuck::cast_slice(&data)),
            )?);
            info_texture_heights.push(height);
        }

        // The combined geometry buffer.
        let shape_count = scratch.shape_vertices.len() as u32;
        let image_count = scratch.image_vertices.len() as u32;
        let index_count = scratch.indices.len() as u32;
        let (buffer, shape_geometry, image_geometry) = if scratch.has_geometry() {
            let (image_offset, index_offset) = scratch.build_combined_buffer();
            let buffer = device.create_buffer(
                BufferUsage::VERTEX | BufferUsage::INDEX | BufferUsage::COPY_FROM,
                MemoryFlags::STATIC | MemoryFlags::DRAW,
                scratch.combined_buffer.len(),
                Some(&scratch.combined_buffer),
            )?;

            let shape_geometry = if shape_count > 0 {
                Some(device.create_geometry(
                    &[VertexBufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        count: shape_count,
                        format: shape_vertex_format(),
                    }],
                    Some(IndexBufferBinding {
                        buffer: &buffer,
                        offset: index_offset,
                        count: index_count,
                        index_size: 2,
                    }),
                )?)
            } else {
                None
            };
            let image_geometry = if image_count > 0 {
                Some(device.create_geometry(
                    &[VertexBufferBinding {
                        buffer: &buffer,
                        offset: image_offset,
                        count: image_count,
                        format: image_vertex_format(),
                    }],
                    Some(IndexBufferBinding {
                        buffer: &buffer,
                        offset: index_offset,
                        count: index_count,
                        index_size: 2,
                    }),
                )?)
            } else {
                None
            };
            (Some(buffer), shape_geometry, image_geometry)
        } else {
            (None, None, None)
        };

        // Glyph geometry for text pieces, converting draw-info counted
        // ranges into index ranges.
        let mut pieces = Vec::with_capacity(scratch.pieces.len());
        let mut text_vertices: Vec<TextVertex> = Vec::new();
        let mut text_indices: Vec<u16> = Vec::new();
        for piece in &scratch.pieces {
            let info_texture = info_textures
                .get(piece.info_texture_index as usize)
                .ok_or(Error::Internal("piece references a missing info texture"))?
                .clone();
            let range = if piece.variant.is_text() {
                build_text_range(piece, scratch, &mut text_vertices, &mut text_indices)?
            } else {
                piece.range
            };
            pieces.push(VectorImagePiece {
                variant: piece.variant,
                info_texture,
                info_texture_height: info_texture_heights[piece.info_texture_index as usize],
                texture: piece.texture.clone(),
                material_source: piece.material_source,
                text_outline_material_source: piece.text_outline_material_source,
                range,
            });
        }

        let (text_buffer, text_geometry) = if text_vertices.is_empty() {
            (None, None)
        } else {
            let vertex_bytes: &[u8] = bytemuck::cast_slice(&text_vertices);
            let index_bytes: &[u8] = bytemuck::cast_slice(&text_indices);
            let mut combined = Vec::with_capacity(vertex_bytes.len() + index_bytes.len() + 2);
            combined.extend_from_slice(vertex_bytes);
            let index_offset = combined.len();
            combined.extend_from_slice(index_bytes);
            while combined.len() % 4 != 0 {
                combined.push(0);
            }
            let buffer = device.create_buffer(
                BufferUsage::VERTEX | BufferUsage::INDEX,
                MemoryFlags::STATIC | MemoryFlags::DRAW,
                combined.len(),
                Some(&combined),
            )?;
            let geometry = device.create_geometry(
                &[VertexBufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    count: text_vertices.len() as u32,
                    format: text_vertex_format(),
                }],
                Some(IndexBufferBinding {
                    buffer: &buffer,
                    offset: index_offset,
                    count: text_indices.len() as u32,
                    index_size: 2,
                }),
            )?;
            (Some(buffer), Some(geometry))
        };

        Ok(VectorImage {
            buffer,
            text_buffer,
            shape_geometry,
            image_geometry,
            text_geometry,
            info_textures,
            pieces,
            info_records: std::mem::take(&mut scratch.infos),
            text_layouts: std::mem::take(&mut scratch.text_layouts),
            local_materials: if local_materials.is_empty() {
                None
            } else {
                Some(local_materials)
            },
            size,
        })
    }

    /// Logical size of the image.
    pub fn size(&self) -> Vector2<f32> {
        self.size
    }

    /// Number of draw pieces.
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    /// The combined geometry buffer, when any geometry was emitted.
    pub fn buffer(&self) -> Option<&B::Buffer> {
        self.buffer.as_ref()
    }

    /// The packed info textures in slot order.
    pub fn info_textures(&self) -> &[B::Texture] {
        &self.info_textures
    }

    /// The info records, in the order they were packed.
    pub fn info_records(&self) -> &[VectorInfo] {
        &self.info_records
    }

    /// The image-local material set, if any.
    pub fn local_materials(&self) -> Option<&MaterialSet<B>> {
        self.local_materials.as_ref()
    }

    /// The text layouts the image keeps alive.
    pub fn text_layouts(&self) -> &[Arc<TextLayout>] {
        &self.text_layouts
    }

    /// Build an image from a serialized description.
    pub fn from_data(
        device: &B::Device,
        scratch: &mut VectorScratchData<B>,
        data: crate::io::VectorImageData<B>,
        shared_materials: &MaterialSet<B>,
        pixel_size: f32,
    ) -> Result<Self> {
        let mut local_materials = MaterialSet::new();
        for (name, desc) in &data.materials {
            local_materials.add(name, desc.clone())?;
        }
        Self::new(
            device,
            scratch,
            &data.commands,
            shared_materials,
            local_materials,
            data.size,
            pixel_size,
        )
    }

    /// Decode and build an image from in-memory file contents.
    pub fn load_data(
        device: &B::Device,
        scratch: &mut VectorScratchData<B>,
        data: &[u8],
        resources: &dyn crate::io::VectorResources<B>,
        shared_materials: &MaterialSet<B>,
        pixel_size: f32,
    ) -> Result<Self> {
        let mut cursor = data;
        let image_data = crate::io::load_image_data(&mut cursor, resources)?;
        Self::from_data(device, scratch, image_data, shared_materials, pixel_size)
    }

    /// Read, decode and build an image from a stream, reusing the scratch
    /// arena's file buffer.
    pub fn load_stream(
        device: &B::Device,
        scratch: &mut VectorScratchData<B>,
        stream: &mut dyn std::io::Read,
        resources: &dyn crate::io::VectorResources<B>,
        shared_materials: &MaterialSet<B>,
        pixel_size: f32,
    ) -> Result<Self> {
        let mut file_buffer = std::mem::take(&mut scratch.file_buffer);
        file_buffer.clear();
        let read = stream.read_to_end(&mut file_buffer);
        let result = match read {
            Ok(_) => Self::load_data(
                device,
                scratch,
                &file_buffer,
                resources,
                shared_materials,
                pixel_size,
            ),
            Err(err) => Err(err.into()),
        };
        scratch.file_buffer = file_buffer;
        result
    }

    /// Draw the image: per piece, bind the variant shader and its
    /// textures, then issue one indexed draw.
    pub fn draw(
        &self,
        command_buffer: &mut dyn CommandBuffer<B>,
        shaders: &VectorShaders<B>,
        shared_materials: &MaterialSet<B>,
        model_view_projection: &Matrix4<f32>,
        dynamic_states: Option<&DynamicRenderStates>,
    ) -> Result<()> {
        if self.pieces.is_empty() {
            return Ok(());
        }

        let mvp: [[f32; 4]; 4] = (*model_view_projection).into();
        let image_size = [self.size.x, self.size.y];

        for piece in &self.pieces {
            if piece.range.index_count == 0 {
                continue;
            }
            let local = self.local_materials.as_ref();
            let (material_info, material_color) = match piece.material_source {
                MaterialSource::Shared => (
                    shared_materials.info_texture(),
                    shared_materials.color_texture(),
                ),
                MaterialSource::Local => (
                    local.and_then(|set| set.info_texture()),
                    local.and_then(|set| set.color_texture()),
                ),
            };
            let (outline_info, outline_color) = match piece.text_outline_material_source {
                MaterialSource::Shared => (
                    shared_materials.info_texture(),
                    shared_materials.color_texture(),
                ),
                MaterialSource::Local => (
                    local.and_then(|set| set.info_texture()),
                    local.and_then(|set| set.color_texture()),
                ),
            };

            command_buffer.bind_shader(shaders.shader(piece.variant), dynamic_states)?;
            command_buffer.set_uniform(
                bindings::MODEL_VIEW_PROJECTION,
                hal::command::UniformType::Mat4,
                bytemuck::bytes_of(&mvp),
            )?;
            command_buffer.set_uniform(
                bindings::IMAGE_SIZE,
                hal::command::UniformType::Vec2,
                bytemuck::bytes_of(&image_size),
            )?;

            let texture_sizes = [
                piece.info_texture_height as f32,
                material_height(piece.material_source, shared_materials, local),
                material_height(piece.text_outline_material_source, shared_materials, local),
            ];
            command_buffer.set_uniform(
                bindings::TEXTURE_SIZES,
                hal::command::UniformType::Vec3,
                bytemuck::bytes_of(&texture_sizes),
            )?;

            command_buffer.set_texture(bindings::SHAPE_INFO_TEXTURE, &piece.info_texture)?;
            // Pieces without their own texture re-use the material color
            // texture so the slot always has a binding.
            let other = piece.texture.as_ref().or(material_color);
            if let Some(other) = other {
                command_buffer.set_texture(bindings::OTHER_TEXTURE, other)?;
            }
            if let Some(texture) = material_info {
                command_buffer.set_texture(bindings::MATERIAL_INFO_TEXTURE, texture)?;
            }
            if let Some(texture) = material_color {
                command_buffer.set_texture(bindings::MATERIAL_COLOR_TEXTURE, texture)?;
            }
            if let Some(texture) = outline_info {
                command_buffer.set_texture(bindings::OUTLINE_MATERIAL_INFO_TEXTURE, texture)?;
            }
            if let Some(texture) = outline_color {
                command_buffer.set_texture(bindings::OUTLINE_MATERIAL_COLOR_TEXTURE, texture)?;
            }

            let geometry = match piece.variant.base_type() {
                BaseType::Shape => self.shape_geometry.as_ref(),
                BaseType::Image => self.image_geometry.as_ref(),
                BaseType::Text => self.text_geometry.as_ref(),
            }
            .ok_or(Error::Internal("piece references missing geometry"))?;
            command_buffer.draw_indexed(geometry, piece.range, PrimitiveType::TriangleList)?;
        }

        command_buffer.unbind_shader()
    }
}

fn material_height<B: Backend>(
    source: MaterialSource,
    shared: &MaterialSet<B>,
    local: Option<&MaterialSet<B>>,
) -> f32 {
    let set = match source {
        MaterialSource::Shared => Some(shared),
        MaterialSource::Local => local,
    };
    set.map_or(0.0, |set| set.texture_height() as f32)
}

fn shape_vertex_format() -> VertexFormat {
    VertexFormat {
        attributes: vec![
            VertexAttribute {
                location: 0,
                format: Format::Standard(SurfaceType::Rgba32, ChannelType::Float),
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                format: Format::Standard(SurfaceType::Rg16, ChannelType::Uint),
                offset: 16,
            },
        ],
        stride: std::mem::size_of::<ShapeVertex>() as u32,
    }
}

fn image_vertex_format() -> VertexFormat {
    VertexFormat {
        attributes: vec![
            VertexAttribute {
                location: 0,
                format: Format::Standard(SurfaceType::Rg32, ChannelType::Float),
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                format: Format::Standard(SurfaceType::Rgba16, ChannelType::Sint),
                offset: 8,
            },
        ],
        stride: std::mem::size_of::<crate::scratch::ImageVertex>() as u32,
    }
}

fn text_vertex_format() -> VertexFormat {
    VertexFormat {
        attributes: vec![
            VertexAttribute {
                location: 0,
                format: Format::Standard(SurfaceType::Rg32, ChannelType::Float),
                offset: 0,
            },
            VertexAttribute {
                location: 1,
                format: Format::Standard(SurfaceType::Rgb32, ChannelType::Float),
                offset: 8,
            },
            VertexAttribute {
                location: 2,
                format: Format::Standard(SurfaceType::Rg16, ChannelType::Uint),
                offset: 20,
            },
        ],
        stride: std::mem::size_of::<TextVertex>() as u32,
    }
}

/// Expand the draw infos of a text piece into glyph quads, producing the
/// piece's real index range.
fn build_text_range<B: Backend>(
    piece: &crate::scratch::TempPiece<B>,
    scratch: &VectorScratchData<B>,
    vertices: &mut Vec<TextVertex>,
    indices: &mut Vec<u16>,
) -> Result<DrawIndexedRange> {
    let vertex_offset = vertices.len() as u32;
    let first_index = indices.len() as u32;

    let draw_infos = scratch
        .text_draw_infos
        .get(piece.range.first_index as usize..(piece.range.first_index + piece.range.index_count) as usize)
        .ok_or(Error::Internal("text piece references missing draw infos"))?;

    for draw_info in draw_infos {
        append_glyph_quads(draw_info, vertex_offset, vertices, indices)?;
    }

    Ok(DrawIndexedRange {
        index_count: indices.len() as u32 - first_index,
        instance_count: 1,
        first_index,
        vertex_offset,
        first_instance: 0,
    })
}

fn append_glyph_quads(
    draw_info: &TextDrawInfo,
    vertex_offset: u32,
    vertices: &mut Vec<TextVertex>,
    indices: &mut Vec<u16>,
) -> Result<()> {
    let outline = draw_info.outline_material.unwrap_or(u16::MAX);
    let last_character = draw_info.first_character + draw_info.character_count;
    for glyph in draw_info
        .layout
        .glyphs
        .iter()
        .filter(|g| g.character >= draw_info.first_character && g.character < last_character)
    {
        let base = vertices.len() as u32 - vertex_offset;
        if base + 4 > MAX_VERTEX_INDEX + 1 {
            return Err(Error::IndexOutOfRange("too many glyphs in one text piece"));
        }

        let position = glyph.position + draw_info.offset;
        let geometry = glyph.geometry;
        let tex = glyph.tex_coords;
        let corners = [
            (geometry.min, tex.min),
            (
                Vector2::new(geometry.min.x, geometry.max.y),
                Vector2::new(tex.min.x, tex.max.y),
            ),
            (geometry.max, tex.max),
            (
                Vector2::new(geometry.max.x, geometry.min.y),
                Vector2::new(tex.max.x, tex.min.y),
            ),
        ];
        for (corner, tex_coord) in &corners {
            vertices.push(TextVertex {
                position: [position.x + corner.x, position.y + corner.y],
                tex_coords: [tex_coord.x, tex_coord.y, draw_info.info_index as f32],
                fill_material: draw_info.fill_material,
                outline_material: outline,
            });
        }
        for &offset in &[0u32, 1, 2, 2, 3, 0] {
            indices.push((base + offset) as u16);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{FillRule, FillStyle, TextAlign, TextRangeCommand};
    use crate::mock::{mock_materials, mock_texture, MockBackend, MockCommandBuffer, MockFont};
    use crate::scratch::ImageVertex;
    use crate::Box2;
    use cgmath::{Matrix3, SquareMatrix};

    type Commands = Vec<VectorCommand<MockBackend>>;

    fn triangle_at(commands: &mut Commands, x: f32, y: f32) {
        commands.push(VectorCommand::Move {
            position: Vector2::new(x, y),
        });
        commands.push(VectorCommand::Line {
            end: Vector2::new(x + 2.0, y),
        });
        commands.push(VectorCommand::Line {
            end: Vector2::new(x + 1.0, y + 2.0),
        });
        commands.push(VectorCommand::ClosePath);
    }

    fn build(commands: Commands) -> VectorImage<MockBackend> {
        let device = crate::mock::MockDevice::default();
        let mut scratch = VectorScratchData::new();
        let (shared, _local) = mock_materials();
        VectorImage::new(
            &device,
            &mut scratch,
            &commands,
            &shared,
            MaterialSet::new(),
            Vector2::new(100.0, 100.0),
            1.0,
        )
        .unwrap()
    }

    fn fill_commands(count: usize) -> Commands {
        let mut commands: Commands = vec![VectorCommand::StartPath {
            transform: Matrix3::identity(),
            simple: true,
        }];
        for i in 0..count {
            triangle_at(&mut commands, (i % 100) as f32, (i / 100) as f32);
        }
        commands.push(VectorCommand::FillPath(FillStyle {
            material: "red".to_owned(),
            opacity: 1.0,
            fill_rule: FillRule::NonZero,
        }));
        commands
    }

    #[test]
    fn triangle_image_layout() {
        let image = build(fill_commands(1));
        assert_eq!(image.piece_count(), 1);
        assert_eq!(image.info_textures().len(), 1);
        // One record packs into a height-1 texture.
        let info_texture = &image.info_textures()[0];
        assert_eq!(info_texture.0.info.height, 1);
        assert_eq!(info_texture.0.info.width, 4);

        // Combined buffer: 3 shape vertices, no image vertices, 3
        // indices padded to 4 bytes.
        let buffer = image.buffer().unwrap();
        let shape_bytes = 3 * std::mem::size_of::<ShapeVertex>();
        assert_eq!(buffer.0.size, shape_bytes + 8);
        // Vertex data leads the buffer.
        let vertices: &[ShapeVertex] =
            bytemuck::cast_slice(&buffer.0.data[..shape_bytes]);
        assert!(vertices.iter().any(|v| v.position[0] == 0.0));
        assert!(vertices.iter().any(|v| v.position[1] == 2.0));
    }

    #[test]
    fn piece_splits_on_16_bit_overflow() {
        // Enough triangles to push the vertex pool past the 16-bit
        // index range inside one fill.
        let triangle_count = (MAX_VERTEX_INDEX as usize + 2) / 3 + 2;
        let image = build(fill_commands(triangle_count));

        assert!(image.pieces.len() >= 2, "expected a split piece");
        let first = &image.pieces[0];
        let second = &image.pieces[1];
        assert_eq!(first.variant, second.variant);
        assert_eq!(first.texture, second.texture);
        // Consecutive index ranges, strictly increasing vertex offsets.
        assert_eq!(
            first.range.first_index + first.range.index_count,
            second.range.first_index
        );
        assert!(second.range.vertex_offset > first.range.vertex_offset);
        // Only whole triangles end up in each piece.
        for piece in &image.pieces {
            assert!(piece.range.index_count % 3 == 0);
        }
    }

    #[test]
    fn info_texture_boundary_splits_pieces() {
        // Each fill gets its own info record; crossing 1024 forces a
        // second texture and piece.
        let mut commands: Commands = Vec::new();
        for i in 0..1030 {
            commands.push(VectorCommand::StartPath {
                transform: Matrix3::identity(),
                simple: true,
            });
            triangle_at(&mut commands, (i % 100) as f32 * 3.0, (i / 100) as f32 * 3.0);
            commands.push(VectorCommand::FillPath(FillStyle {
                material: "red".to_owned(),
                opacity: 1.0,
                fill_rule: FillRule::NonZero,
            }));
        }
        let image = build(commands);
        assert_eq!(image.info_textures().len(), 2);
        assert_eq!(image.info_textures()[0].0.info.height, 1024);
        // 6 remaining records round up to a height of 8.
        assert_eq!(image.info_textures()[1].0.info.height, 8);
        assert_eq!(image.piece_count(), 2);
        assert!(image.pieces[1].info_texture == image.info_textures()[1]);
    }

    #[test]
    fn image_command_builds_quad() {
        let texture = mock_texture(64, 64);
        let commands: Commands = vec![VectorCommand::Image {
            image: texture.clone(),
            bounds: Box2::new(Vector2::new(10.0, 10.0), Vector2::new(20.0, 30.0)),
            opacity: 0.5,
            transform: Matrix3::identity(),
        }];
        let image = build(commands);
        assert_eq!(image.piece_count(), 1);
        assert_eq!(image.pieces[0].variant, ShaderVariant::Image);
        assert!(image.pieces[0].texture.as_ref() == Some(&texture));

        let buffer = image.buffer().unwrap();
        let image_bytes = 4 * std::mem::size_of::<ImageVertex>();
        let vertices: &[ImageVertex] = bytemuck::cast_slice(&buffer.0.data[..image_bytes]);
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[0].position, [10.0, 10.0]);
        assert_eq!(vertices[0].tex_coords, [0, 0]);
        assert_eq!(vertices[2].position, [20.0, 30.0]);
        assert_eq!(vertices[2].tex_coords, [1, 1]);
        assert_eq!(image.info_records()[0].opacity(), 0.5);
    }

    #[test]
    fn text_ranges_build_glyph_geometry() {
        use std::sync::Arc;
        let font = Arc::new(MockFont::new());
        let commands: Commands = vec![
            VectorCommand::Text(crate::command::TextCommand {
                text: "hello".to_owned(),
                font: font.clone(),
                alignment: TextAlign::Start,
                max_length: f32::INFINITY,
                line_height: 1.2,
                transform: Matrix3::identity(),
                range_count: 2,
            }),
            VectorCommand::TextRange(TextRangeCommand {
                start: 0,
                count: 2,
                position_offset: Vector2::new(0.0, 0.0),
                fill_material: "red".to_owned(),
                outline_material: String::new(),
                fill_opacity: 1.0,
                outline_opacity: 0.0,
                size: 12.0,
                embolden: 0.0,
                slant: 0.0,
                outline_width: 0.0,
                fuzziness: 1.0,
            }),
            VectorCommand::TextRange(TextRangeCommand {
                start: 2,
                count: 3,
                position_offset: Vector2::new(0.0, 0.0),
                fill_material: "red".to_owned(),
                outline_material: String::new(),
                fill_opacity: 1.0,
                outline_opacity: 0.0,
                size: 12.0,
                embolden: 0.0,
                slant: 0.0,
                outline_width: 0.0,
                fuzziness: 1.0,
            }),
        ];
        let image = build(commands);
        assert_eq!(image.piece_count(), 1);
        assert_eq!(image.pieces[0].variant, ShaderVariant::TextColor);
        // Five glyphs, four vertices and six indices each.
        assert_eq!(image.pieces[0].range.index_count, 5 * 6);
        assert_eq!(image.text_layouts().len(), 1);
        assert!(image.text_buffer.is_some());
        assert!(image.text_geometry.is_some());
    }

    #[test]
    fn draw_walks_pieces_in_order() {
        let image = build(fill_commands(1));
        let shaders = VectorShaders::<MockBackend>::new(
            crate::mock::MockUnit,
            crate::mock::MockUnit,
            crate::mock::MockUnit,
            crate::mock::MockUnit,
            crate::mock::MockUnit,
            crate::mock::MockUnit,
            crate::mock::MockUnit,
            crate::mock::MockUnit,
            crate::mock::MockUnit,
        );
        let (shared, _) = mock_materials();
        let mut recorder = MockCommandBuffer::new();
        image
            .draw(
                &mut recorder,
                &shaders,
                &shared,
                &Matrix4::from_scale(1.0),
                None,
            )
            .unwrap();
        let calls = recorder.take_calls();
        let first_bind = calls.iter().position(|c| c.starts_with("bind_shader")).unwrap();
        let first_draw = calls.iter().position(|c| c.starts_with("draw_indexed")).unwrap();
        assert!(first_bind < first_draw);
        assert_eq!(calls.last().unwrap(), "unbind_shader");
        // The info texture binds on slot 0 before the draw.
        assert!(calls
            .iter()
            .take(first_draw)
            .any(|c| c == "set_texture(0)"));
        // One draw per piece.
        let draw_count = calls.iter().filter(|c| c.starts_with("draw_indexed")).count();
        assert_eq!(draw_count, image.piece_count());
    }

    #[test]
    fn empty_command_lists_are_rejected() {
        let device = crate::mock::MockDevice::default();
        let mut scratch = VectorScratchData::new();
        let (shared, _) = mock_materials();
        let result = VectorImage::new(
            &device,
            &mut scratch,
            &[],
            &shared,
            MaterialSet::new(),
            Vector2::new(10.0, 10.0),
            1.0,
        );
        assert!(matches!(result, Err(Error::InvalidArg(_))));
        let result = VectorImage::new(
            &device,
            &mut scratch,
            &fill_commands(1),
            &shared,
            MaterialSet::new(),
            Vector2::new(0.0, 10.0),
            1.0,
        );
        assert!(matches!(result, Err(Error::InvalidArg(_))));
    }
}
