//! Test support: a backend that records instead of rendering.

use std::sync::{Arc, Mutex};

use cgmath::Vector2;

use hal::buffer::{BufferUsage, IndexBufferBinding, MemoryFlags, VertexBufferBinding};
use hal::command::{
    ClearAttachment, ClearRect, ClearValue, CommandBuffer, DrawIndexedRange, DrawRange,
    PrimitiveType, SurfaceRef, UniformType,
};
use hal::format::Format;
use hal::image::{
    BufferTextureCopyRegion, Filter, SurfaceBlitRegion, TextureCopyRegion, TextureInfo,
    TexturePosition, TextureUsage,
};
use hal::memory::{MemoryBarrier, PipelineStages};
use hal::pso::{DynamicRenderStates, Viewport};
use hal::{Backend, Result};

use crate::command::TextAlign;
use crate::geom::Box2;
use crate::material::{MaterialDesc, MaterialSet};
use crate::text::{Font, PositionedGlyph, TextLayout, TextStyle};

#[derive(Debug)]
pub enum MockBackend {}

#[derive(Debug)]
pub struct MockBufferInner {
    pub size: usize,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct MockBuffer(pub Arc<MockBufferInner>);

#[derive(Debug)]
pub struct MockTextureInner {
    pub info: TextureInfo,
    pub data: Option<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct MockTexture(pub Arc<MockTextureInner>);

impl PartialEq for MockTexture {
    fn eq(&self, other: &MockTexture) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Clone, Debug)]
pub struct MockGeometry {
    pub vertex_count: u32,
    pub index_count: u32,
}

#[derive(Clone, Debug, Default)]
pub struct MockUnit;

#[derive(Debug, Default)]
pub struct MockDevice;

impl hal::Device<MockBackend> for MockDevice {
    fn create_buffer(
        &self,
        _usage: BufferUsage,
        _memory: MemoryFlags,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<MockBuffer> {
        let mut contents = vec![0; size];
        if let Some(data) = data {
            contents[..data.len()].copy_from_slice(data);
        }
        Ok(MockBuffer(Arc::new(MockBufferInner {
            size,
            data: contents,
        })))
    }

    fn create_texture(
        &self,
        info: &TextureInfo,
        _usage: TextureUsage,
        _memory: MemoryFlags,
        data: Option<&[u8]>,
    ) -> Result<MockTexture> {
        Ok(MockTexture(Arc::new(MockTextureInner {
            info: *info,
            data: data.map(|d| d.to_vec()),
        })))
    }

    fn create_geometry(
        &self,
        vertex_buffers: &[VertexBufferBinding<MockBackend>],
        index_buffer: Option<IndexBufferBinding<MockBackend>>,
    ) -> Result<MockGeometry> {
        Ok(MockGeometry {
            vertex_count: vertex_buffers.iter().map(|b| b.count).sum(),
            index_count: index_buffer.map_or(0, |b| b.count),
        })
    }

    fn texture_format_supported(&self, _format: Format) -> bool {
        true
    }

    fn vertex_format_supported(&self, _format: Format) -> bool {
        true
    }

    fn max_texture_size(&self) -> u32 {
        16384
    }
}

impl Backend for MockBackend {
    type Device = MockDevice;
    type Buffer = MockBuffer;
    type Texture = MockTexture;
    type Renderbuffer = MockUnit;
    type Geometry = MockGeometry;
    type Framebuffer = MockUnit;
    type RenderPass = MockUnit;
    type RenderSurface = MockUnit;
    type Shader = MockUnit;
    type QueryPool = MockUnit;
    type SyncRef = MockUnit;
}

/// A texture handle for image commands.
pub fn mock_texture(width: u32, height: u32) -> MockTexture {
    MockTexture(Arc::new(MockTextureInner {
        info: TextureInfo::new_2d(
            Format::Standard(
                hal::format::SurfaceType::Rgba8,
                hal::format::ChannelType::Unorm,
            ),
            width,
            height,
        ),
        data: None,
    }))
}

/// Shared and local material sets used across the tessellation tests.
pub fn mock_materials() -> (MaterialSet<MockBackend>, MaterialSet<MockBackend>) {
    use crate::material::{GradientEdge, GradientStop, LinearGradient, MaterialSpace};
    use cgmath::SquareMatrix;

    let mut shared = MaterialSet::new();
    shared
        .add("black", MaterialDesc::Color([0, 0, 0, 255]))
        .unwrap();
    shared
        .add("red", MaterialDesc::Color([255, 0, 0, 255]))
        .unwrap();
    shared
        .add(
            "fade",
            MaterialDesc::LinearGradient(LinearGradient {
                stops: vec![
                    GradientStop {
                        position: 0.0,
                        color: [0, 0, 0, 255],
                    },
                    GradientStop {
                        position: 1.0,
                        color: [255, 255, 255, 255],
                    },
                ],
                start: Vector2::new(0.0, 0.0),
                end: Vector2::new(1.0, 0.0),
                edge: GradientEdge::Clamp,
                space: MaterialSpace::Bounds,
                transform: cgmath::Matrix3::identity(),
            }),
        )
        .unwrap();

    let mut local = MaterialSet::new();
    local
        .add("local-blue", MaterialDesc::Color([0, 0, 255, 255]))
        .unwrap();
    (shared, local)
}

/// A font that lays out one fixed-size glyph per character.
#[derive(Debug)]
pub struct MockFont {
    texture: MockTexture,
    pub advance: f32,
}

impl MockFont {
    pub fn new() -> Self {
        MockFont {
            texture: mock_texture(256, 256),
            advance: 10.0,
        }
    }
}

impl Font<MockBackend> for MockFont {
    fn texture(&self) -> &MockTexture {
        &self.texture
    }

    fn apply_hinting(&self, style: &mut TextStyle, display_scale: f32, fuzziness: f32) {
        style.anti_alias = fuzziness / display_scale.max(1e-3);
    }

    fn shape(
        &self,
        text: &str,
        _styles: &[TextStyle],
        _alignment: TextAlign,
        _max_length: f32,
        _line_height: f32,
    ) -> Result<TextLayout> {
        let mut glyphs = Vec::new();
        let mut bounds = Box2::empty();
        for (index, _) in text.chars().enumerate() {
            let position = Vector2::new(index as f32 * self.advance, 0.0);
            let geometry = Box2::new(Vector2::new(0.0, -8.0), Vector2::new(8.0, 0.0));
            bounds.add_point(position + geometry.min);
            bounds.add_point(position + geometry.max);
            glyphs.push(PositionedGlyph {
                glyph: index as u32,
                character: index as u32,
                position,
                geometry,
                tex_coords: Box2::new(Vector2::new(0.0, 0.0), Vector2::new(0.125, 0.125)),
            });
        }
        Ok(TextLayout { glyphs, bounds })
    }
}

/// A command buffer that records call descriptions.
#[derive(Debug, Default)]
pub struct MockCommandBuffer {
    pub calls: Mutex<Vec<String>>,
}

impl MockCommandBuffer {
    pub fn new() -> Self {
        MockCommandBuffer::default()
    }

    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl CommandBuffer<MockBackend> for MockCommandBuffer {
    fn copy_buffer_data(&mut self, _: &MockBuffer, offset: usize, data: &[u8]) -> Result<()> {
        self.log(format!("copy_buffer_data({}, {} bytes)", offset, data.len()));
        Ok(())
    }
    fn copy_buffer(
        &mut self,
        _: &MockBuffer,
        src_offset: usize,
        _: &MockBuffer,
        dst_offset: usize,
        size: usize,
    ) -> Result<()> {
        self.log(format!("copy_buffer({}, {}, {})", src_offset, dst_offset, size));
        Ok(())
    }
    fn copy_buffer_to_texture(
        &mut self,
        _: &MockBuffer,
        _: &MockTexture,
        regions: &[BufferTextureCopyRegion],
    ) -> Result<()> {
        self.log(format!("copy_buffer_to_texture({} regions)", regions.len()));
        Ok(())
    }
    fn copy_texture_data(
        &mut self,
        _: &MockTexture,
        _: TexturePosition,
        width: u32,
        height: u32,
        _: u32,
        _: &[u8],
    ) -> Result<()> {
        self.log(format!("copy_texture_data({}x{})", width, height));
        Ok(())
    }
    fn copy_texture(
        &mut self,
        _: &MockTexture,
        _: &MockTexture,
        regions: &[TextureCopyRegion],
    ) -> Result<()> {
        self.log(format!("copy_texture({} regions)", regions.len()));
        Ok(())
    }
    fn copy_texture_to_buffer(
        &mut self,
        _: &MockTexture,
        _: &MockBuffer,
        regions: &[BufferTextureCopyRegion],
    ) -> Result<()> {
        self.log(format!("copy_texture_to_buffer({} regions)", regions.len()));
        Ok(())
    }
    fn generate_mipmaps(&mut self, _: &MockTexture) -> Result<()> {
        self.log("generate_mipmaps".to_owned());
        Ok(())
    }
    fn set_fence_syncs(&mut self, fences: &[MockUnit]) -> Result<()> {
        self.log(format!("set_fence_syncs({})", fences.len()));
        Ok(())
    }
    fn memory_barrier(
        &mut self,
        _: PipelineStages,
        _: PipelineStages,
        barriers: &[MemoryBarrier],
    ) -> Result<()> {
        self.log(format!("memory_barrier({})", barriers.len()));
        Ok(())
    }
    fn begin_query(&mut self, _: &MockUnit, query: u32) -> Result<()> {
        self.log(format!("begin_query({})", query));
        Ok(())
    }
    fn end_query(&mut self, _: &MockUnit, query: u32) -> Result<()> {
        self.log(format!("end_query({})", query));
        Ok(())
    }
    fn query_timestamp(&mut self, _: &MockUnit, query: u32) -> Result<()> {
        self.log(format!("query_timestamp({})", query));
        Ok(())
    }
    #[allow(clippy::too_many_arguments)]
    fn copy_query_values(
        &mut self,
        _: &MockUnit,
        first: u32,
        count: u32,
        _: &MockBuffer,
        _: usize,
        _: usize,
        _: u32,
        _: bool,
    ) -> Result<()> {
        self.log(format!("copy_query_values({}, {})", first, count));
        Ok(())
    }
    fn bind_shader(&mut self, _: &MockUnit, states: Option<&DynamicRenderStates>) -> Result<()> {
        self.log(format!("bind_shader(dynamic: {})", states.is_some()));
        Ok(())
    }
    fn set_texture(&mut self, slot: u32, _: &MockTexture) -> Result<()> {
        self.log(format!("set_texture({})", slot));
        Ok(())
    }
    fn set_texture_buffer(
        &mut self,
        slot: u32,
        _: &MockBuffer,
        _: Format,
        _: usize,
        _: usize,
    ) -> Result<()> {
        self.log(format!("set_texture_buffer({})", slot));
        Ok(())
    }
    fn set_shader_buffer(&mut self, slot: u32, _: &MockBuffer, _: usize, _: usize) -> Result<()> {
        self.log(format!("set_shader_buffer({})", slot));
        Ok(())
    }
    fn set_uniform(&mut self, location: i32, ty: UniformType, data: &[u8]) -> Result<()> {
        self.log(format!("set_uniform({}, {:?}, {} bytes)", location, ty, data.len()));
        Ok(())
    }
    fn update_dynamic_render_states(&mut self, _: &DynamicRenderStates) -> Result<()> {
        self.log("update_dynamic_render_states".to_owned());
        Ok(())
    }
    fn unbind_shader(&mut self) -> Result<()> {
        self.log("unbind_shader".to_owned());
        Ok(())
    }
    fn bind_compute_shader(&mut self, _: &MockUnit) -> Result<()> {
        self.log("bind_compute_shader".to_owned());
        Ok(())
    }
    fn unbind_compute_shader(&mut self) -> Result<()> {
        self.log("unbind_compute_shader".to_owned());
        Ok(())
    }
    fn begin_render_surface(&mut self, _: &MockUnit) -> Result<()> {
        self.log("begin_render_surface".to_owned());
        Ok(())
    }
    fn end_render_surface(&mut self, _: &MockUnit) -> Result<()> {
        self.log("end_render_surface".to_owned());
        Ok(())
    }
    fn begin_render_pass(
        &mut self,
        _: &MockUnit,
        _: &MockUnit,
        _: Option<Viewport>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.log(format!("begin_render_pass({} clears)", clear_values.len()));
        Ok(())
    }
    fn next_subpass(&mut self) -> Result<()> {
        self.log("next_subpass".to_owned());
        Ok(())
    }
    fn end_render_pass(&mut self) -> Result<()> {
        self.log("end_render_pass".to_owned());
        Ok(())
    }
    fn set_viewport(&mut self, _: Option<Viewport>) -> Result<()> {
        self.log("set_viewport".to_owned());
        Ok(())
    }
    fn clear_attachments(
        &mut self,
        attachments: &[ClearAttachment],
        regions: &[ClearRect],
    ) -> Result<()> {
        self.log(format!(
            "clear_attachments({}, {})",
            attachments.len(),
            regions.len()
        ));
        Ok(())
    }
    fn draw(&mut self, _: &MockGeometry, range: DrawRange, _: PrimitiveType) -> Result<()> {
        self.log(format!("draw({} vertices)", range.vertex_count));
        Ok(())
    }
    fn draw_indexed(
        &mut self,
        _: &MockGeometry,
        range: DrawIndexedRange,
        _: PrimitiveType,
    ) -> Result<()> {
        self.log(format!(
            "draw_indexed(first {}, count {}, base {})",
            range.first_index, range.index_count, range.vertex_offset
        ));
        Ok(())
    }
    fn draw_indirect(
        &mut self,
        _: &MockGeometry,
        _: &MockBuffer,
        _: usize,
        count: u32,
        _: u32,
        _: PrimitiveType,
    ) -> Result<()> {
        self.log(format!("draw_indirect({})", count));
        Ok(())
    }
    fn draw_indexed_indirect(
        &mut self,
        _: &MockGeometry,
        _: &MockBuffer,
        _: usize,
        count: u32,
        _: u32,
        _: PrimitiveType,
    ) -> Result<()> {
        self.log(format!("draw_indexed_indirect({})", count));
        Ok(())
    }
    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.log(format!("dispatch_compute({}, {}, {})", x, y, z));
        Ok(())
    }
    fn dispatch_compute_indirect(&mut self, _: &MockBuffer, offset: usize) -> Result<()> {
        self.log(format!("dispatch_compute_indirect({})", offset));
        Ok(())
    }
    fn blit_surface(
        &mut self,
        _: SurfaceRef<MockBackend>,
        _: SurfaceRef<MockBackend>,
        regions: &[SurfaceBlitRegion],
        _: Filter,
    ) -> Result<()> {
        self.log(format!("blit_surface({} regions)", regions.len()));
        Ok(())
    }
    fn push_debug_group(&mut self, name: &str) -> Result<()> {
        self.log(format!("push_debug_group({})", name));
        Ok(())
    }
    fn pop_debug_group(&mut self) -> Result<()> {
        self.log("pop_debug_group".to_owned());
        Ok(())
    }
}
