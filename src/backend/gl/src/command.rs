//! Deferred command buffer.
//!
//! Records every operation as a tagged [`Command`] in a growable store;
//! variable-size payloads (byte uploads, region arrays, barrier lists) are
//! copied into a shared data arena and referenced by [`BufferSlice`], so
//! the whole buffer stays movable. Every resource named by a record is
//! held as a cloned handle inside the command — clone on record, drop on
//! reset is the only reference mechanism.

use std::ops::Range;
use std::{mem, slice};

use smallvec::SmallVec;

use hal::command::{
    ClearAttachment, ClearRect, ClearValue, CommandBuffer, CommandBufferUsage, DrawIndexedRange,
    DrawRange, PrimitiveType, SurfaceRef, UniformType,
};
use hal::format::Format;
use hal::image::{
    BufferTextureCopyRegion, Filter, SurfaceBlitRegion, TextureCopyRegion, TexturePosition,
};
use hal::memory::{MemoryBarrier, PipelineStages};
use hal::pso::{DynamicRenderStates, Viewport};
use hal::{Error, Result};

use crate::native as n;
use crate::GlBackend;

/// Initial data arena reservation.
const INITIAL_DATA_CAPACITY: usize = 512 * 1024;
/// Payload alignment inside the data arena.
const DATA_ALIGN: usize = 8;

/// The place of a payload in the data arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BufferSlice {
    pub offset: u32,
    pub size: u32,
}

impl BufferSlice {
    fn empty() -> Self {
        BufferSlice { offset: 0, size: 0 }
    }
}

/// A recorded operation. Resource fields hold cloned handles.
#[derive(Debug)]
pub enum Command {
    CopyBufferData {
        buffer: n::Buffer,
        offset: usize,
        data: BufferSlice,
    },
    CopyBuffer {
        src: n::Buffer,
        src_offset: usize,
        dst: n::Buffer,
        dst_offset: usize,
        size: usize,
    },
    CopyBufferToTexture {
        src: n::Buffer,
        dst: n::Texture,
        regions: BufferSlice,
    },
    CopyTextureData {
        texture: n::Texture,
        position: TexturePosition,
        width: u32,
        height: u32,
        layers: u32,
        data: BufferSlice,
    },
    CopyTexture {
        src: n::Texture,
        dst: n::Texture,
        regions: BufferSlice,
    },
    CopyTextureToBuffer {
        src: n::Texture,
        dst: n::Buffer,
        regions: BufferSlice,
    },
    GenerateMipmaps(n::Texture),
    SetFenceSyncs(SmallVec<[n::SyncRef; 4]>),
    MemoryBarrier {
        before_stages: PipelineStages,
        after_stages: PipelineStages,
        barriers: BufferSlice,
    },
    BeginQuery {
        pool: n::QueryPool,
        query: u32,
    },
    EndQuery {
        pool: n::QueryPool,
        query: u32,
    },
    QueryTimestamp {
        pool: n::QueryPool,
        query: u32,
    },
    CopyQueryValues {
        pool: n::QueryPool,
        queries: Range<u32>,
        buffer: n::Buffer,
        offset: usize,
        stride: usize,
        elem_size: u32,
        check_availability: bool,
    },
    BindShader {
        shader: n::Shader,
        states: Option<DynamicRenderStates>,
    },
    SetTexture {
        slot: u32,
        texture: n::Texture,
    },
    SetTextureBuffer {
        slot: u32,
        buffer: n::Buffer,
        format: Format,
        offset: usize,
        count: usize,
    },
    SetShaderBuffer {
        slot: u32,
        buffer: n::Buffer,
        offset: usize,
        size: usize,
    },
    SetUniform {
        location: i32,
        ty: UniformType,
        data: BufferSlice,
    },
    UpdateDynamicRenderStates(DynamicRenderStates),
    UnbindShader,
    BindComputeShader(n::Shader),
    UnbindComputeShader,
    BeginRenderSurface(n::RenderSurface),
    EndRenderSurface(n::RenderSurface),
    BeginRenderPass {
        render_pass: n::RenderPass,
        framebuffer: n::Framebuffer,
        viewport: Option<Viewport>,
        clear_values: SmallVec<[ClearValue; 4]>,
    },
    NextSubpass,
    EndRenderPass,
    SetViewport(Option<Viewport>),
    ClearAttachments {
        attachments: SmallVec<[ClearAttachment; 4]>,
        regions: SmallVec<[ClearRect; 1]>,
    },
    Draw {
        geometry: n::Geometry,
        range: DrawRange,
        primitive: PrimitiveType,
    },
    DrawIndexed {
        geometry: n::Geometry,
        range: DrawIndexedRange,
        primitive: PrimitiveType,
    },
    DrawIndirect {
        geometry: n::Geometry,
        buffer: n::Buffer,
        offset: usize,
        count: u32,
        stride: u32,
        primitive: PrimitiveType,
        indexed: bool,
    },
    DispatchCompute {
        x: u32,
        y: u32,
        z: u32,
    },
    DispatchComputeIndirect {
        buffer: n::Buffer,
        offset: usize,
    },
    BlitSurface {
        src: n::Surface,
        dst: n::Surface,
        regions: BufferSlice,
        filter: Filter,
    },
    PushDebugGroup(String),
    PopDebugGroup,
}

/// Backing storage of a deferred buffer: the command tape plus the data
/// arena its payload slices point into.
#[derive(Debug)]
pub(crate) struct CommandStorage {
    pub commands: Vec<Command>,
    pub data: Vec<u8>,
}

impl CommandStorage {
    fn new() -> Self {
        CommandStorage {
            commands: Vec::new(),
            data: Vec::with_capacity(INITIAL_DATA_CAPACITY),
        }
    }

    fn push_cmd(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    /// Copy a typed slice into the data arena.
    fn add<T: Copy>(&mut self, data: &[T]) -> BufferSlice {
        let bytes = unsafe {
            slice::from_raw_parts(data.as_ptr() as *const u8, data.len() * mem::size_of::<T>())
        };
        self.add_raw(bytes)
    }

    /// Copy raw bytes into the data arena, keeping payloads aligned.
    fn add_raw(&mut self, data: &[u8]) -> BufferSlice {
        let misalign = self.data.len() % DATA_ALIGN;
        if misalign != 0 {
            self.data.resize(self.data.len() + DATA_ALIGN - misalign, 0);
        }
        let offset = self.data.len();
        if self.data.len() + data.len() > self.data.capacity() {
            // Grow by at least a doubling so long recordings stay
            // amortized O(1).
            let needed = self.data.len() + data.len();
            self.data.reserve((self.data.capacity() * 2).max(needed) - self.data.len());
        }
        self.data.extend_from_slice(data);
        BufferSlice {
            offset: offset as u32,
            size: data.len() as u32,
        }
    }

    /// Reinterpret a stored payload. The arena only hands out slices that
    /// were appended at `DATA_ALIGN`-aligned offsets.
    fn get<T: Copy>(&self, slice: BufferSlice) -> &[T] {
        let size = mem::size_of::<T>();
        debug_assert_eq!(slice.size as usize % size, 0);
        let raw = self.get_raw(slice);
        unsafe { slice::from_raw_parts(raw.as_ptr() as *const T, raw.len() / size) }
    }

    fn get_raw(&self, slice: BufferSlice) -> &[u8] {
        &self.data[slice.offset as usize..(slice.offset + slice.size) as usize]
    }

    fn reset(&mut self) {
        // Dropping the commands releases every resource reference taken
        // while recording, exactly once each.
        self.commands.clear();
        self.data.clear();
    }
}

/// A command buffer that records operations for later replay.
#[derive(Debug)]
pub struct DeferredCommandBuffer {
    storage: CommandStorage,
    usage: CommandBufferUsage,
    in_render_pass: bool,
}

impl DeferredCommandBuffer {
    /// Create an empty deferred buffer.
    pub fn new(usage: CommandBufferUsage) -> Self {
        DeferredCommandBuffer {
            storage: CommandStorage::new(),
            usage,
            in_render_pass: false,
        }
    }

    /// Usage flags the buffer was created with.
    pub fn usage(&self) -> CommandBufferUsage {
        self.usage
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.storage.commands.len()
    }

    /// Whether nothing has been recorded since the last reset.
    pub fn is_empty(&self) -> bool {
        self.storage.commands.is_empty()
    }

    /// Drop all recorded work, releasing every resource reference.
    pub fn reset(&mut self) {
        self.storage.reset();
        self.in_render_pass = false;
    }

    /// Replay the recorded commands, in insertion order, against a target
    /// command buffer. Unless the usage includes `MULTI_SUBMIT` or
    /// `MULTI_FRAME` the buffer is reset afterwards.
    pub fn submit<T>(&mut self, target: &mut T) -> Result<()>
    where
        T: CommandBuffer<GlBackend> + ?Sized,
    {
        if !target.accepts_submits() {
            return Err(Error::PermissionDenied(
                "only live command buffers accept submits",
            ));
        }

        let storage = &self.storage;
        for cmd in &storage.commands {
            replay(cmd, storage, target)?;
        }

        if !self
            .usage
            .intersects(CommandBufferUsage::MULTI_SUBMIT | CommandBufferUsage::MULTI_FRAME)
        {
            self.reset();
        }
        Ok(())
    }
}

fn replay<T>(cmd: &Command, storage: &CommandStorage, target: &mut T) -> Result<()>
where
    T: CommandBuffer<GlBackend> + ?Sized,
{
    match cmd {
        Command::CopyBufferData { buffer, offset, data } => {
            target.copy_buffer_data(buffer, *offset, storage.get_raw(*data))
        }
        Command::CopyBuffer {
            src,
            src_offset,
            dst,
            dst_offset,
            size,
        } => target.copy_buffer(src, *src_offset, dst, *dst_offset, *size),
        Command::CopyBufferToTexture { src, dst, regions } => {
            target.copy_buffer_to_texture(src, dst, storage.get(*regions))
        }
        Command::CopyTextureData {
            texture,
            position,
            width,
            height,
            layers,
            data,
        } => target.copy_texture_data(
            texture,
            *position,
            *width,
            *height,
            *layers,
            storage.get_raw(*data),
        ),
        Command::CopyTexture { src, dst, regions } => {
            target.copy_texture(src, dst, storage.get(*regions))
        }
        Command::CopyTextureToBuffer { src, dst, regions } => {
            target.copy_texture_to_buffer(src, dst, storage.get(*regions))
        }
        Command::GenerateMipmaps(texture) => target.generate_mipmaps(texture),
        Command::SetFenceSyncs(fences) => target.set_fence_syncs(fences),
        Command::MemoryBarrier {
            before_stages,
            after_stages,
            barriers,
        } => target.memory_barrier(*before_stages, *after_stages, storage.get(*barriers)),
        Command::BeginQuery { pool, query } => target.begin_query(pool, *query),
        Command::EndQuery { pool, query } => target.end_query(pool, *query),
        Command::QueryTimestamp { pool, query } => target.query_timestamp(pool, *query),
        Command::CopyQueryValues {
            pool,
            queries,
            buffer,
            offset,
            stride,
            elem_size,
            check_availability,
        } => target.copy_query_values(
            pool,
            queries.start,
            queries.end - queries.start,
            buffer,
            *offset,
            *stride,
            *elem_size,
            *check_availability,
        ),
        Command::BindShader { shader, states } => target.bind_shader(shader, states.as_ref()),
        Command::SetTexture { slot, texture } => target.set_texture(*slot, texture),
        Command::SetTextureBuffer {
            slot,
            buffer,
            format,
            offset,
            count,
        } => target.set_texture_buffer(*slot, buffer, *format, *offset, *count),
        Command::SetShaderBuffer {
            slot,
            buffer,
            offset,
            size,
        } => target.set_shader_buffer(*slot, buffer, *offset, *size),
        Command::SetUniform { location, ty, data } => {
            target.set_uniform(*location, *ty, storage.get_raw(*data))
        }
        Command::UpdateDynamicRenderStates(states) => target.update_dynamic_render_states(states),
        Command::UnbindShader => target.unbind_shader(),
        Command::BindComputeShader(shader) => target.bind_compute_shader(shader),
        Command::UnbindComputeShader => target.unbind_compute_shader(),
        Command::BeginRenderSurface(surface) => target.begin_render_surface(surface),
        Command::EndRenderSurface(surface) => target.end_render_surface(surface),
        Command::BeginRenderPass {
            render_pass,
            framebuffer,
            viewport,
            clear_values,
        } => target.begin_render_pass(render_pass, framebuffer, *viewport, clear_values),
        Command::NextSubpass => target.next_subpass(),
        Command::EndRenderPass => target.end_render_pass(),
        Command::SetViewport(viewport) => target.set_viewport(*viewport),
        Command::ClearAttachments { attachments, regions } => {
            target.clear_attachments(attachments, regions)
        }
        Command::Draw {
            geometry,
            range,
            primitive,
        } => target.draw(geometry, *range, *primitive),
        Command::DrawIndexed {
            geometry,
            range,
            primitive,
        } => target.draw_indexed(geometry, *range, *primitive),
        Command::DrawIndirect {
            geometry,
            buffer,
            offset,
            count,
            stride,
            primitive,
            indexed,
        } => {
            if *indexed {
                target.draw_indexed_indirect(geometry, buffer, *offset, *count, *stride, *primitive)
            } else {
                target.draw_indirect(geometry, buffer, *offset, *count, *stride, *primitive)
            }
        }
        Command::DispatchCompute { x, y, z } => target.dispatch_compute(*x, *y, *z),
        Command::DispatchComputeIndirect { buffer, offset } => {
            target.dispatch_compute_indirect(buffer, *offset)
        }
        Command::BlitSurface {
            src,
            dst,
            regions,
            filter,
        } => {
            let src = borrow_surface(src);
            let dst = borrow_surface(dst);
            target.blit_surface(src, dst, storage.get(*regions), *filter)
        }
        Command::PushDebugGroup(name) => target.push_debug_group(name),
        Command::PopDebugGroup => target.pop_debug_group(),
    }
}

fn borrow_surface(surface: &n::Surface) -> SurfaceRef<GlBackend> {
    match surface {
        n::Surface::Texture(t) => SurfaceRef::Texture(t),
        n::Surface::Renderbuffer(r) => SurfaceRef::Renderbuffer(r),
        n::Surface::RenderSurface(s) => SurfaceRef::RenderSurface(s),
    }
}

fn own_surface(surface: SurfaceRef<GlBackend>) -> n::Surface {
    match surface {
        SurfaceRef::Texture(t) => n::Surface::Texture(t.clone()),
        SurfaceRef::Renderbuffer(r) => n::Surface::Renderbuffer(r.clone()),
        SurfaceRef::RenderSurface(s) => n::Surface::RenderSurface(s.clone()),
    }
}

impl CommandBuffer<GlBackend> for DeferredCommandBuffer {
    fn copy_buffer_data(&mut self, buffer: &n::Buffer, offset: usize, data: &[u8]) -> Result<()> {
        if offset + data.len() > buffer.size() {
            return Err(Error::IndexOutOfRange("buffer data copy range"));
        }
        let data = self.storage.add_raw(data);
        self.storage.push_cmd(Command::CopyBufferData {
            buffer: buffer.clone(),
            offset,
            data,
        });
        Ok(())
    }

    fn copy_buffer(
        &mut self,
        src: &n::Buffer,
        src_offset: usize,
        dst: &n::Buffer,
        dst_offset: usize,
        size: usize,
    ) -> Result<()> {
        self.storage.push_cmd(Command::CopyBuffer {
            src: src.clone(),
            src_offset,
            dst: dst.clone(),
            dst_offset,
            size,
        });
        Ok(())
    }

    fn copy_buffer_to_texture(
        &mut self,
        src: &n::Buffer,
        dst: &n::Texture,
        regions: &[BufferTextureCopyRegion],
    ) -> Result<()> {
        if regions.is_empty() {
            return Err(Error::InvalidArg("at least one region must be specified"));
        }
        let regions = self.storage.add(regions);
        self.storage.push_cmd(Command::CopyBufferToTexture {
            src: src.clone(),
            dst: dst.clone(),
            regions,
        });
        Ok(())
    }

    fn copy_texture_data(
        &mut self,
        texture: &n::Texture,
        position: TexturePosition,
        width: u32,
        height: u32,
        layers: u32,
        data: &[u8],
    ) -> Result<()> {
        let data = self.storage.add_raw(data);
        self.storage.push_cmd(Command::CopyTextureData {
            texture: texture.clone(),
            position,
            width,
            height,
            layers,
            data,
        });
        Ok(())
    }

    fn copy_texture(
        &mut self,
        src: &n::Texture,
        dst: &n::Texture,
        regions: &[TextureCopyRegion],
    ) -> Result<()> {
        if regions.is_empty() {
            return Err(Error::InvalidArg("at least one region must be specified"));
        }
        let regions = self.storage.add(regions);
        self.storage.push_cmd(Command::CopyTexture {
            src: src.clone(),
            dst: dst.clone(),
            regions,
        });
        Ok(())
    }

    fn copy_texture_to_buffer(
        &mut self,
        src: &n::Texture,
        dst: &n::Buffer,
        regions: &[BufferTextureCopyRegion],
    ) -> Result<()> {
        if regions.is_empty() {
            return Err(Error::InvalidArg("at least one region must be specified"));
        }
        let regions = self.storage.add(regions);
        self.storage.push_cmd(Command::CopyTextureToBuffer {
            src: src.clone(),
            dst: dst.clone(),
            regions,
        });
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: &n::Texture) -> Result<()> {
        self.storage.push_cmd(Command::GenerateMipmaps(texture.clone()));
        Ok(())
    }

    fn set_fence_syncs(&mut self, fences: &[n::SyncRef]) -> Result<()> {
        self.storage
            .push_cmd(Command::SetFenceSyncs(fences.iter().cloned().collect()));
        Ok(())
    }

    fn memory_barrier(
        &mut self,
        before_stages: PipelineStages,
        after_stages: PipelineStages,
        barriers: &[MemoryBarrier],
    ) -> Result<()> {
        let barriers = self.storage.add(barriers);
        self.storage.push_cmd(Command::MemoryBarrier {
            before_stages,
            after_stages,
            barriers,
        });
        Ok(())
    }

    fn begin_query(&mut self, pool: &n::QueryPool, query: u32) -> Result<()> {
        self.storage.push_cmd(Command::BeginQuery {
            pool: pool.clone(),
            query,
        });
        Ok(())
    }

    fn end_query(&mut self, pool: &n::QueryPool, query: u32) -> Result<()> {
        self.storage.push_cmd(Command::EndQuery {
            pool: pool.clone(),
            query,
        });
        Ok(())
    }

    fn query_timestamp(&mut self, pool: &n::QueryPool, query: u32) -> Result<()> {
        self.storage.push_cmd(Command::QueryTimestamp {
            pool: pool.clone(),
            query,
        });
        Ok(())
    }

    fn copy_query_values(
        &mut self,
        pool: &n::QueryPool,
        first: u32,
        count: u32,
        buffer: &n::Buffer,
        offset: usize,
        stride: usize,
        elem_size: u32,
        check_availability: bool,
    ) -> Result<()> {
        if first + count > pool.count() {
            return Err(Error::IndexOutOfRange("query range"));
        }
        self.storage.push_cmd(Command::CopyQueryValues {
            pool: pool.clone(),
            queries: first..first + count,
            buffer: buffer.clone(),
            offset,
            stride,
            elem_size,
            check_availability,
        });
        Ok(())
    }

    fn bind_shader(
        &mut self,
        shader: &n::Shader,
        states: Option<&DynamicRenderStates>,
    ) -> Result<()> {
        self.storage.push_cmd(Command::BindShader {
            shader: shader.clone(),
            states: states.copied(),
        });
        Ok(())
    }

    fn set_texture(&mut self, slot: u32, texture: &n::Texture) -> Result<()> {
        self.storage.push_cmd(Command::SetTexture {
            slot,
            texture: texture.clone(),
        });
        Ok(())
    }

    fn set_texture_buffer(
        &mut self,
        slot: u32,
        buffer: &n::Buffer,
        format: Format,
        offset: usize,
        count: usize,
    ) -> Result<()> {
        self.storage.push_cmd(Command::SetTextureBuffer {
            slot,
            buffer: buffer.clone(),
            format,
            offset,
            count,
        });
        Ok(())
    }

    fn set_shader_buffer(
        &mut self,
        slot: u32,
        buffer: &n::Buffer,
        offset: usize,
        size: usize,
    ) -> Result<()> {
        self.storage.push_cmd(Command::SetShaderBuffer {
            slot,
            buffer: buffer.clone(),
            offset,
            size,
        });
        Ok(())
    }

    fn set_uniform(&mut self, location: i32, ty: UniformType, data: &[u8]) -> Result<()> {
        if data.is_empty() || data.len() % ty.size() != 0 {
            return Err(Error::InvalidArg("uniform data size mismatch"));
        }
        let data = self.storage.add_raw(data);
        self.storage.push_cmd(Command::SetUniform { location, ty, data });
        Ok(())
    }

    fn update_dynamic_render_states(&mut self, states: &DynamicRenderStates) -> Result<()> {
        self.storage
            .push_cmd(Command::UpdateDynamicRenderStates(*states));
        Ok(())
    }

    fn unbind_shader(&mut self) -> Result<()> {
        self.storage.push_cmd(Command::UnbindShader);
        Ok(())
    }

    fn bind_compute_shader(&mut self, shader: &n::Shader) -> Result<()> {
        self.storage
            .push_cmd(Command::BindComputeShader(shader.clone()));
        Ok(())
    }

    fn unbind_compute_shader(&mut self) -> Result<()> {
        self.storage.push_cmd(Command::UnbindComputeShader);
        Ok(())
    }

    fn begin_render_surface(&mut self, surface: &n::RenderSurface) -> Result<()> {
        self.storage
            .push_cmd(Command::BeginRenderSurface(surface.clone()));
        Ok(())
    }

    fn end_render_surface(&mut self, surface: &n::RenderSurface) -> Result<()> {
        self.storage
            .push_cmd(Command::EndRenderSurface(surface.clone()));
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &n::RenderPass,
        framebuffer: &n::Framebuffer,
        viewport: Option<Viewport>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        if self.in_render_pass {
            return Err(Error::InvalidState("render pass already begun"));
        }
        self.in_render_pass = true;
        self.storage.push_cmd(Command::BeginRenderPass {
            render_pass: render_pass.clone(),
            framebuffer: framebuffer.clone(),
            viewport,
            clear_values: clear_values.iter().copied().collect(),
        });
        Ok(())
    }

    fn next_subpass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidState("no render pass begun"));
        }
        self.storage.push_cmd(Command::NextSubpass);
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidState("no render pass begun"));
        }
        self.in_render_pass = false;
        self.storage.push_cmd(Command::EndRenderPass);
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Option<Viewport>) -> Result<()> {
        self.storage.push_cmd(Command::SetViewport(viewport));
        Ok(())
    }

    fn clear_attachments(
        &mut self,
        attachments: &[ClearAttachment],
        regions: &[ClearRect],
    ) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidState(
                "clear_attachments is only valid inside a render pass",
            ));
        }
        if attachments.is_empty() || regions.is_empty() {
            return Err(Error::InvalidArg("empty attachment or region list"));
        }
        self.storage.push_cmd(Command::ClearAttachments {
            attachments: attachments.iter().copied().collect(),
            regions: regions.iter().copied().collect(),
        });
        Ok(())
    }

    fn draw(
        &mut self,
        geometry: &n::Geometry,
        range: DrawRange,
        primitive: PrimitiveType,
    ) -> Result<()> {
        self.storage.push_cmd(Command::Draw {
            geometry: geometry.clone(),
            range,
            primitive,
        });
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        geometry: &n::Geometry,
        range: DrawIndexedRange,
        primitive: PrimitiveType,
    ) -> Result<()> {
        self.storage.push_cmd(Command::DrawIndexed {
            geometry: geometry.clone(),
            range,
            primitive,
        });
        Ok(())
    }

    fn draw_indirect(
        &mut self,
        geometry: &n::Geometry,
        buffer: &n::Buffer,
        offset: usize,
        count: u32,
        stride: u32,
        primitive: PrimitiveType,
    ) -> Result<()> {
        self.storage.push_cmd(Command::DrawIndirect {
            geometry: geometry.clone(),
            buffer: buffer.clone(),
            offset,
            count,
            stride,
            primitive,
            indexed: false,
        });
        Ok(())
    }

    fn draw_indexed_indirect(
        &mut self,
        geometry: &n::Geometry,
        buffer: &n::Buffer,
        offset: usize,
        count: u32,
        stride: u32,
        primitive: PrimitiveType,
    ) -> Result<()> {
        self.storage.push_cmd(Command::DrawIndirect {
            geometry: geometry.clone(),
            buffer: buffer.clone(),
            offset,
            count,
            stride,
            primitive,
            indexed: true,
        });
        Ok(())
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.storage.push_cmd(Command::DispatchCompute { x, y, z });
        Ok(())
    }

    fn dispatch_compute_indirect(&mut self, buffer: &n::Buffer, offset: usize) -> Result<()> {
        self.storage.push_cmd(Command::DispatchComputeIndirect {
            buffer: buffer.clone(),
            offset,
        });
        Ok(())
    }

    fn blit_surface(
        &mut self,
        src: SurfaceRef<GlBackend>,
        dst: SurfaceRef<GlBackend>,
        regions: &[SurfaceBlitRegion],
        filter: Filter,
    ) -> Result<()> {
        if regions.is_empty() {
            return Err(Error::InvalidArg("at least one region must be specified"));
        }
        let regions = self.storage.add(regions);
        self.storage.push_cmd(Command::BlitSurface {
            src: own_surface(src),
            dst: own_surface(dst),
            regions,
            filter,
        });
        Ok(())
    }

    fn push_debug_group(&mut self, name: &str) -> Result<()> {
        self.storage
            .push_cmd(Command::PushDebugGroup(name.to_owned()));
        Ok(())
    }

    fn pop_debug_group(&mut self) -> Result<()> {
        self.storage.push_cmd(Command::PopDebugGroup);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::mock::MockContext;
    use crate::Adapter;
    use hal::buffer::{BufferUsage, MemoryFlags};
    use hal::Device as _;

    fn setup() -> (Arc<MockContext>, crate::Device, crate::MainCommandBuffer) {
        let ctx = Arc::new(MockContext::new());
        let adapter = Adapter::new(ctx.clone(), 1);
        (ctx.clone(), adapter.device(), adapter.main_command_buffer())
    }

    fn buffer(device: &crate::Device, size: usize) -> n::Buffer {
        device
            .create_buffer(
                BufferUsage::VERTEX | BufferUsage::COPY_TO,
                MemoryFlags::GPU_ONLY,
                size,
                None,
            )
            .unwrap()
    }

    #[test]
    fn record_replay_parity() {
        let (ctx, device, mut main) = setup();
        let target = buffer(&device, 256);
        let payload = [0xAB; 256];

        let mut deferred = DeferredCommandBuffer::new(CommandBufferUsage::empty());
        deferred.copy_buffer_data(&target, 0, &payload).unwrap();

        // The payload is stored byte-identically.
        assert_eq!(deferred.len(), 1);
        match &deferred.storage.commands[0] {
            Command::CopyBufferData { buffer, offset, data } => {
                assert_eq!(buffer.raw(), target.raw());
                assert_eq!(*offset, 0);
                assert_eq!(deferred.storage.get_raw(*data), &payload[..]);
            }
            other => panic!("unexpected command {:?}", other),
        }

        // Replay issues exactly one upload with the same arguments.
        ctx.take_calls();
        deferred.submit(&mut main).unwrap();
        let uploads: Vec<_> = ctx
            .take_calls()
            .into_iter()
            .filter(|c| c.starts_with("buffer_sub_data"))
            .collect();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].contains("0, 256 bytes"));
    }

    #[test]
    fn record_submit_reset_leaves_refcount_unchanged() {
        let (_ctx, device, mut main) = setup();
        let target = buffer(&device, 64);
        let baseline = Arc::strong_count(&target.0);

        let mut deferred = DeferredCommandBuffer::new(CommandBufferUsage::MULTI_SUBMIT);
        deferred.copy_buffer_data(&target, 0, &[1, 2, 3]).unwrap();
        deferred
            .copy_buffer(&target, 0, &target, 32, 16)
            .unwrap();
        assert!(Arc::strong_count(&target.0) > baseline);

        deferred.submit(&mut main).unwrap();
        // Multi-submit buffers keep their recording.
        assert_eq!(deferred.len(), 2);
        deferred.submit(&mut main).unwrap();

        deferred.reset();
        assert!(deferred.is_empty());
        assert_eq!(Arc::strong_count(&target.0), baseline);
    }

    #[test]
    fn single_submit_buffers_reset_automatically() {
        let (_ctx, device, mut main) = setup();
        let target = buffer(&device, 64);
        let baseline = Arc::strong_count(&target.0);

        let mut deferred = DeferredCommandBuffer::new(CommandBufferUsage::empty());
        deferred.copy_buffer_data(&target, 0, &[7; 8]).unwrap();
        deferred.submit(&mut main).unwrap();
        assert!(deferred.is_empty());
        assert_eq!(Arc::strong_count(&target.0), baseline);
    }

    #[test]
    fn deferred_buffers_reject_submits() {
        let (_ctx, device, _main) = setup();
        let target = buffer(&device, 16);

        let mut recorded = DeferredCommandBuffer::new(CommandBufferUsage::empty());
        recorded.copy_buffer_data(&target, 0, &[1]).unwrap();

        let mut other = DeferredCommandBuffer::new(CommandBufferUsage::empty());
        assert!(matches!(
            recorded.submit(&mut other),
            Err(Error::PermissionDenied(_))
        ));
        // The failed submit keeps the recording intact.
        assert_eq!(recorded.len(), 1);
    }

    #[test]
    fn region_payloads_round_trip() {
        let (_ctx, device, _main) = setup();
        let src = buffer(&device, 1024);
        let texture = device
            .create_texture(
                &hal::image::TextureInfo::new_2d(
                    hal::format::Format::Standard(
                        hal::format::SurfaceType::Rgba8,
                        hal::format::ChannelType::Unorm,
                    ),
                    16,
                    16,
                ),
                hal::image::TextureUsage::TEXTURE,
                MemoryFlags::STATIC,
                None,
            )
            .unwrap();

        let regions = [
            BufferTextureCopyRegion {
                buffer_offset: 0,
                buffer_width: 0,
                buffer_height: 0,
                texture_position: TexturePosition::default(),
                width: 8,
                height: 8,
                layers: 1,
            },
            BufferTextureCopyRegion {
                buffer_offset: 256,
                buffer_width: 0,
                buffer_height: 0,
                texture_position: TexturePosition {
                    x: 8,
                    y: 8,
                    depth: 0,
                    mip_level: 0,
                },
                width: 8,
                height: 8,
                layers: 1,
            },
        ];
        let mut deferred = DeferredCommandBuffer::new(CommandBufferUsage::empty());
        deferred
            .copy_buffer_to_texture(&src, &texture, &regions)
            .unwrap();
        match &deferred.storage.commands[0] {
            Command::CopyBufferToTexture { regions: stored, .. } => {
                let stored: &[BufferTextureCopyRegion] = deferred.storage.get(*stored);
                assert_eq!(stored, &regions[..]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn render_pass_state_is_validated() {
        let mut deferred = DeferredCommandBuffer::new(CommandBufferUsage::empty());
        assert!(matches!(
            deferred.next_subpass(),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            deferred.end_render_pass(),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            deferred.clear_attachments(
                &[ClearAttachment::DepthStencil {
                    depth: Some(0.0),
                    stencil: None
                }],
                &[ClearRect {
                    rect: hal::pso::Rect {
                        x: 0,
                        y: 0,
                        width: 1,
                        height: 1
                    },
                    first_layer: 0,
                    layer_count: 1
                }]
            ),
            Err(Error::InvalidState(_))
        ));
    }
}
