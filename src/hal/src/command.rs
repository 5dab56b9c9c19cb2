//! The command buffer operation set.
//!
//! [`CommandBuffer`] is the object-safe recording interface implemented by
//! both deferred command buffers (which store every call as a tagged record
//! for later replay) and live command buffers (which execute each call
//! against the driver immediately). Submitting a deferred buffer replays
//! its records through this trait on the target.

use crate::error::Result;
use crate::format::Format;
use crate::image::{
    BufferTextureCopyRegion, Filter, SurfaceBlitRegion, TextureCopyRegion, TexturePosition,
};
use crate::memory::{MemoryBarrier, PipelineStages};
use crate::pso::{DynamicRenderStates, Rect, Viewport};
use crate::Backend;

bitflags! {
    /// How a command buffer will be used; affects reset behavior on
    /// submission.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CommandBufferUsage: u32 {
        /// Submitted more than once without re-recording.
        const MULTI_SUBMIT = 0x1;
        /// Survives across frame boundaries.
        const MULTI_FRAME = 0x2;
    }
}

/// Primitive topology for draws.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveType {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
    PatchList,
}

/// Range of a non-indexed draw.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DrawRange {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// Range of an indexed draw.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DrawIndexedRange {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    /// Added to every index value before vertex fetch.
    pub vertex_offset: u32,
    pub first_instance: u32,
}

/// A value used to clear an attachment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearValue {
    ColorFloat([f32; 4]),
    ColorInt([i32; 4]),
    ColorUint([u32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

/// Selects an attachment of the current subpass for `clear_attachments`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearAttachment {
    /// A color output of the current subpass, by output index.
    Color { index: u32, value: ClearValue },
    /// The depth/stencil attachment.
    DepthStencil { depth: Option<f32>, stencil: Option<u32> },
}

/// A framebuffer region affected by `clear_attachments`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearRect {
    pub rect: Rect,
    pub first_layer: u32,
    pub layer_count: u32,
}

/// A renderable surface referenced by copy, blit and clear operations.
#[derive(Debug)]
pub enum SurfaceRef<'a, B: Backend> {
    Texture(&'a B::Texture),
    Renderbuffer(&'a B::Renderbuffer),
    RenderSurface(&'a B::RenderSurface),
}

impl<'a, B: Backend> Clone for SurfaceRef<'a, B> {
    fn clone(&self) -> Self {
        match self {
            SurfaceRef::Texture(t) => SurfaceRef::Texture(*t),
            SurfaceRef::Renderbuffer(r) => SurfaceRef::Renderbuffer(*r),
            SurfaceRef::RenderSurface(s) => SurfaceRef::RenderSurface(*s),
        }
    }
}

impl<'a, B: Backend> Copy for SurfaceRef<'a, B> {}

/// Data types accepted by `set_uniform`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Mat3,
    Mat4,
}

impl UniformType {
    /// Byte size of one element of this type.
    pub fn size(&self) -> usize {
        match self {
            UniformType::Float | UniformType::Int => 4,
            UniformType::Vec2 | UniformType::IVec2 => 8,
            UniformType::Vec3 | UniformType::IVec3 => 12,
            UniformType::Vec4 | UniformType::IVec4 => 16,
            UniformType::Mat3 => 36,
            UniformType::Mat4 => 64,
        }
    }
}

/// The full recordable operation set.
///
/// Operations recorded to a deferred buffer replay in insertion order;
/// within a live buffer they execute in call order.
pub trait CommandBuffer<B: Backend> {
    // Transfer operations.

    /// Copy host data into a buffer.
    fn copy_buffer_data(&mut self, buffer: &B::Buffer, offset: usize, data: &[u8]) -> Result<()>;
    /// Copy a range between two buffers.
    fn copy_buffer(
        &mut self,
        src: &B::Buffer,
        src_offset: usize,
        dst: &B::Buffer,
        dst_offset: usize,
        size: usize,
    ) -> Result<()>;
    /// Copy buffer contents into texture regions.
    fn copy_buffer_to_texture(
        &mut self,
        src: &B::Buffer,
        dst: &B::Texture,
        regions: &[BufferTextureCopyRegion],
    ) -> Result<()>;
    /// Copy host data into a texture region.
    fn copy_texture_data(
        &mut self,
        texture: &B::Texture,
        position: TexturePosition,
        width: u32,
        height: u32,
        layers: u32,
        data: &[u8],
    ) -> Result<()>;
    /// Copy regions between two textures.
    fn copy_texture(
        &mut self,
        src: &B::Texture,
        dst: &B::Texture,
        regions: &[TextureCopyRegion],
    ) -> Result<()>;
    /// Copy texture regions into a buffer.
    fn copy_texture_to_buffer(
        &mut self,
        src: &B::Texture,
        dst: &B::Buffer,
        regions: &[BufferTextureCopyRegion],
    ) -> Result<()>;
    /// Regenerate the mip chain of a texture from its base level.
    fn generate_mipmaps(&mut self, texture: &B::Texture) -> Result<()>;

    // Synchronization.

    /// Associate a sync object that signals when prior work completes with
    /// each fence. Inside a render pass the syncs are queued and issued at
    /// render pass end.
    fn set_fence_syncs(&mut self, fences: &[B::SyncRef]) -> Result<()>;
    /// Insert a memory barrier between pipeline stages.
    fn memory_barrier(
        &mut self,
        before_stages: PipelineStages,
        after_stages: PipelineStages,
        barriers: &[MemoryBarrier],
    ) -> Result<()>;

    // Queries.

    /// Begin an occlusion-style query.
    fn begin_query(&mut self, pool: &B::QueryPool, query: u32) -> Result<()>;
    /// End an occlusion-style query.
    fn end_query(&mut self, pool: &B::QueryPool, query: u32) -> Result<()>;
    /// Write a timestamp into a query slot.
    fn query_timestamp(&mut self, pool: &B::QueryPool, query: u32) -> Result<()>;
    /// Copy query results into a buffer.
    fn copy_query_values(
        &mut self,
        pool: &B::QueryPool,
        first: u32,
        count: u32,
        buffer: &B::Buffer,
        offset: usize,
        stride: usize,
        elem_size: u32,
        check_availability: bool,
    ) -> Result<()>;

    // Shader binding.

    /// Bind a graphics shader, optionally with dynamic render state values
    /// for its dynamic fields.
    fn bind_shader(&mut self, shader: &B::Shader, states: Option<&DynamicRenderStates>)
        -> Result<()>;
    /// Bind a texture to a sampler slot of the bound shader.
    fn set_texture(&mut self, slot: u32, texture: &B::Texture) -> Result<()>;
    /// Bind a buffer range as a texture buffer.
    fn set_texture_buffer(
        &mut self,
        slot: u32,
        buffer: &B::Buffer,
        format: Format,
        offset: usize,
        count: usize,
    ) -> Result<()>;
    /// Bind a buffer range as a uniform or storage block.
    fn set_shader_buffer(
        &mut self,
        slot: u32,
        buffer: &B::Buffer,
        offset: usize,
        size: usize,
    ) -> Result<()>;
    /// Set a plain uniform of the bound shader.
    fn set_uniform(&mut self, location: i32, ty: UniformType, data: &[u8]) -> Result<()>;
    /// Re-apply the dynamic subset of the render state.
    fn update_dynamic_render_states(&mut self, states: &DynamicRenderStates) -> Result<()>;
    /// Unbind the current graphics shader.
    fn unbind_shader(&mut self) -> Result<()>;
    /// Bind a compute shader.
    fn bind_compute_shader(&mut self, shader: &B::Shader) -> Result<()>;
    /// Unbind the current compute shader.
    fn unbind_compute_shader(&mut self) -> Result<()>;

    // Render passes and surfaces.

    /// Make a window surface current for rendering.
    fn begin_render_surface(&mut self, surface: &B::RenderSurface) -> Result<()>;
    /// Finish rendering to a window surface.
    fn end_render_surface(&mut self, surface: &B::RenderSurface) -> Result<()>;
    /// Begin a render pass on a framebuffer, entering its first subpass.
    /// `clear_values` supplies one value per attachment that declares a
    /// clear load op, in attachment order.
    fn begin_render_pass(
        &mut self,
        render_pass: &B::RenderPass,
        framebuffer: &B::Framebuffer,
        viewport: Option<Viewport>,
        clear_values: &[ClearValue],
    ) -> Result<()>;
    /// Advance to the next subpass.
    fn next_subpass(&mut self) -> Result<()>;
    /// End the current render pass.
    fn end_render_pass(&mut self) -> Result<()>;
    /// Set the viewport inside a render pass.
    fn set_viewport(&mut self, viewport: Option<Viewport>) -> Result<()>;
    /// Clear regions of the current subpass attachments.
    fn clear_attachments(
        &mut self,
        attachments: &[ClearAttachment],
        regions: &[ClearRect],
    ) -> Result<()>;

    // Draws and dispatches.

    /// Draw a vertex range.
    fn draw(
        &mut self,
        geometry: &B::Geometry,
        range: DrawRange,
        primitive: PrimitiveType,
    ) -> Result<()>;
    /// Draw an indexed range.
    fn draw_indexed(
        &mut self,
        geometry: &B::Geometry,
        range: DrawIndexedRange,
        primitive: PrimitiveType,
    ) -> Result<()>;
    /// Draw with arguments sourced from a buffer.
    fn draw_indirect(
        &mut self,
        geometry: &B::Geometry,
        buffer: &B::Buffer,
        offset: usize,
        count: u32,
        stride: u32,
        primitive: PrimitiveType,
    ) -> Result<()>;
    /// Indexed draw with arguments sourced from a buffer.
    fn draw_indexed_indirect(
        &mut self,
        geometry: &B::Geometry,
        buffer: &B::Buffer,
        offset: usize,
        count: u32,
        stride: u32,
        primitive: PrimitiveType,
    ) -> Result<()>;
    /// Dispatch a compute grid.
    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) -> Result<()>;
    /// Dispatch with the grid sourced from a buffer.
    fn dispatch_compute_indirect(&mut self, buffer: &B::Buffer, offset: usize) -> Result<()>;

    // Blits and debug.

    /// Blit regions between two surfaces, scaling with the given filter.
    fn blit_surface(
        &mut self,
        src: SurfaceRef<B>,
        dst: SurfaceRef<B>,
        regions: &[SurfaceBlitRegion],
        filter: Filter,
    ) -> Result<()>;
    /// Push a named debug group.
    fn push_debug_group(&mut self, name: &str) -> Result<()>;
    /// Pop the innermost debug group.
    fn pop_debug_group(&mut self) -> Result<()>;

    /// Whether this buffer accepts submission of recorded buffers.
    /// Only live buffers do; submitting into a deferred buffer is a
    /// permission error.
    fn accepts_submits(&self) -> bool {
        false
    }
}
