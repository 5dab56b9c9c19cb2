//! Resource creation and buffer mapping.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use hal::buffer::{
    BufferUsage, IndexBufferBinding, MapFlags, MemoryFlags, VertexBufferBinding,
};
use hal::format::Format;
use hal::image::{TextureDim, TextureInfo, TextureUsage};
use hal::pass::{RenderPassDesc, EXTERNAL_SUBPASS};
use hal::pso::RenderState;
use hal::query::QueryType;
use hal::{Error, Result};

use crate::conv;
use crate::gl::consts as gl;
use crate::native as n;
use crate::tex::FormatCaps;
use crate::{GlBackend, Share};

/// Creates resources against the shared driver context.
///
/// Creation is safe from any thread holding a resource context; command
/// submission stays on the main thread.
#[derive(Clone, Debug)]
pub struct Device {
    share: Arc<Share>,
}

impl Device {
    pub(crate) fn new(share: Arc<Share>) -> Self {
        Device { share }
    }

    fn gl_format(&self, format: Format, caps: FormatCaps) -> Result<crate::tex::GlFormat> {
        match self.share.formats.get(format) {
            Some(gl_format) if gl_format.caps.contains(caps) => Ok(*gl_format),
            _ => Err(Error::NotSupported("format lacks the required capability")),
        }
    }

    /// Create a render-only surface.
    pub fn create_renderbuffer(
        &self,
        format: Format,
        width: u32,
        height: u32,
        samples: u32,
    ) -> Result<n::Renderbuffer> {
        let ctx = &*self.share.context;
        let gl_format = self.gl_format(format, FormatCaps::OFFSCREEN)?;
        let raw = ctx.create_renderbuffer();
        ctx.renderbuffer_storage(samples, gl_format.internal, width as i32, height as i32);
        Ok(n::Renderbuffer::new(
            raw,
            format,
            width,
            height,
            samples,
            self.share.reclaim.clone(),
        ))
    }

    /// Compile a render pass description, reducing its dependencies to one
    /// barrier bit set per subpass boundary.
    pub fn create_render_pass(&self, desc: RenderPassDesc) -> Result<n::RenderPass> {
        if desc.subpasses.is_empty() {
            return Err(Error::InvalidArg("render pass needs at least one subpass"));
        }
        let attachment_count = desc.attachments.len() as u32;
        for subpass in &desc.subpasses {
            let out_of_range = subpass
                .color_attachments
                .iter()
                .map(|r| r.index)
                .chain(subpass.depth_stencil_attachment)
                .chain(subpass.input_attachments.iter().copied())
                .any(|index| index >= attachment_count);
            if out_of_range {
                return Err(Error::IndexOutOfRange("subpass attachment index"));
            }
        }

        // A dependency with destination subpass S contributes to the
        // barrier issued when entering S; External destinations map to the
        // final barrier at render pass end.
        let subpass_count = desc.subpasses.len();
        let mut boundary_barriers = vec![0u32; subpass_count + 1];
        for dependency in &desc.dependencies {
            let boundary = if dependency.dst_subpass == EXTERNAL_SUBPASS {
                subpass_count
            } else {
                dependency.dst_subpass as usize
            };
            if boundary > subpass_count {
                return Err(Error::IndexOutOfRange("subpass dependency index"));
            }
            boundary_barriers[boundary] |=
                conv::access_to_barrier_bits(dependency.src_access | dependency.dst_access);
        }

        Ok(n::RenderPass(Arc::new(n::RenderPassInner {
            desc,
            boundary_barriers,
        })))
    }

    /// Bind attachments for a render pass into per-subpass framebuffers.
    ///
    /// Multisampled attachments whose bound surface is single-sampled get
    /// an internal multisampled renderbuffer that is resolved into the
    /// surface at subpass end.
    pub fn create_framebuffer(
        &self,
        render_pass: &n::RenderPass,
        attachments: &[n::Surface],
        width: u32,
        height: u32,
    ) -> Result<n::Framebuffer> {
        let ctx = &*self.share.context;
        let desc = &render_pass.0.desc;
        if attachments.len() != desc.attachments.len() {
            return Err(Error::InvalidArg("attachment count mismatch"));
        }

        let is_default = attachments
            .iter()
            .any(|a| matches!(a, n::Surface::RenderSurface(_)));
        if is_default && attachments.len() > 1 {
            return Err(Error::InvalidArg(
                "the default surface cannot be mixed with other attachments",
            ));
        }

        // Internal renderbuffers for resolved attachments, shared by all
        // subpasses that render to them.
        let mut resolves = Vec::new();
        if !is_default {
            for subpass in &desc.subpasses {
                for reference in &subpass.color_attachments {
                    if !reference.resolve {
                        continue;
                    }
                    if resolves
                        .iter()
                        .any(|r: &n::ResolvePair| r.attachment == reference.index)
                    {
                        continue;
                    }
                    let attachment_desc = &desc.attachments[reference.index as usize];
                    let single_sampled = match &attachments[reference.index as usize] {
                        n::Surface::Texture(t) => t.info().samples <= 1,
                        _ => false,
                    };
                    if attachment_desc.samples > 1 && single_sampled {
                        let gl_format =
                            self.gl_format(attachment_desc.format, FormatCaps::OFFSCREEN)?;
                        let raw = ctx.create_renderbuffer();
                        ctx.renderbuffer_storage(
                            attachment_desc.samples,
                            gl_format.internal,
                            width as i32,
                            height as i32,
                        );
                        resolves.push(n::ResolvePair {
                            attachment: reference.index,
                            renderbuffer: raw,
                        });
                    }
                }
            }
        }

        let mut fbos = Vec::with_capacity(desc.subpasses.len());
        for subpass in &desc.subpasses {
            if is_default {
                fbos.push(0);
                continue;
            }
            let fbo = ctx.create_framebuffer();
            ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, fbo);

            let mut draw_buffers = Vec::with_capacity(subpass.color_attachments.len());
            for (output, reference) in subpass.color_attachments.iter().enumerate() {
                let attachment = gl::COLOR_ATTACHMENT0 + output as u32;
                draw_buffers.push(attachment);
                match resolves.iter().find(|r| r.attachment == reference.index) {
                    Some(resolve) => {
                        ctx.framebuffer_renderbuffer(
                            gl::DRAW_FRAMEBUFFER,
                            attachment,
                            resolve.renderbuffer,
                        );
                    }
                    None => attach_surface(
                        ctx,
                        attachment,
                        &attachments[reference.index as usize],
                    ),
                }
            }
            if let Some(index) = subpass.depth_stencil_attachment {
                let format = desc.attachments[index as usize].format;
                let attachment = if format.is_depth() && format.is_stencil() {
                    gl::DEPTH_STENCIL_ATTACHMENT
                } else if format.is_depth() {
                    gl::DEPTH_ATTACHMENT
                } else {
                    gl::STENCIL_ATTACHMENT
                };
                attach_surface(ctx, attachment, &attachments[index as usize]);
            }
            ctx.draw_buffers(&draw_buffers);

            let status = ctx.check_framebuffer_status(gl::DRAW_FRAMEBUFFER);
            if status != gl::FRAMEBUFFER_COMPLETE {
                error!("framebuffer incomplete: {:#x}", status);
                ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
                ctx.delete_framebuffer(fbo);
                return Err(Error::NotSupported("framebuffer attachment combination"));
            }
            fbos.push(fbo);
        }
        ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);

        Ok(n::Framebuffer::new(
            fbos,
            attachments.to_vec(),
            resolves,
            render_pass.clone(),
            width,
            height,
            self.share.reclaim.clone(),
        ))
    }

    /// Load an opaque shader binary together with its baked render state.
    pub fn create_shader(&self, binary: &[u8], render_state: RenderState) -> Result<n::Shader> {
        if binary.is_empty() {
            return Err(Error::InvalidArg("empty shader binary"));
        }
        let program = self.share.context.create_program(binary);
        Ok(n::Shader::new(
            program,
            render_state,
            self.share.reclaim.clone(),
        ))
    }

    /// Create a pool of queries.
    pub fn create_query_pool(&self, ty: QueryType, count: u32) -> Result<n::QueryPool> {
        if count == 0 {
            return Err(Error::InvalidArg("query pool needs at least one query"));
        }
        if ty == QueryType::Timestamp
            && !self
                .share
                .info
                .legacy_features
                .contains(crate::info::LegacyFeatures::TIMESTAMP_QUERY)
        {
            return Err(Error::NotSupported("timestamp queries"));
        }
        let ctx = &*self.share.context;
        let queries = (0..count).map(|_| ctx.create_query()).collect();
        Ok(n::QueryPool::new(queries, ty, self.share.reclaim.clone()))
    }

    /// Create an unset fence.
    pub fn create_fence(&self) -> n::SyncRef {
        n::SyncRef::new()
    }

    /// Map a buffer range for host access.
    ///
    /// Flags the driver cannot honor directly are emulated with a shadow
    /// copy that is read back on map and uploaded on unmap/flush.
    pub fn map_buffer<'a>(
        &'a self,
        buffer: &'a n::Buffer,
        flags: MapFlags,
        offset: usize,
        size: usize,
    ) -> Result<MappedBuffer<'a>> {
        use crate::info::PrivateCaps;

        if !flags.intersects(MapFlags::READ | MapFlags::WRITE) {
            return Err(Error::InvalidArg("mapping needs READ or WRITE"));
        }
        if offset + size > buffer.size() {
            return Err(Error::IndexOutOfRange("map range"));
        }
        if buffer.0.memory.contains(MemoryFlags::GPU_ONLY) {
            return Err(Error::PermissionDenied("mapping a GPU-only buffer"));
        }

        let ctx = &*self.share.context;
        let caps = self.share.info.private_caps;
        let mut map_state = buffer.0.map.lock();
        if map_state.range.is_some() {
            return Err(Error::PermissionDenied("buffer is already mapped"));
        }

        let persistent_ok =
            !flags.contains(MapFlags::PERSISTENT) || caps.contains(PrivateCaps::BUFFER_STORAGE);
        let backing = if caps.contains(PrivateCaps::MAP_BUFFER_RANGE) && persistent_ok {
            let mut access = 0;
            if flags.contains(MapFlags::READ) {
                access |= gl::MAP_READ_BIT;
            }
            if flags.contains(MapFlags::WRITE) {
                access |= gl::MAP_WRITE_BIT | gl::MAP_FLUSH_EXPLICIT_BIT;
            }
            if flags.contains(MapFlags::ORPHAN) {
                access |= gl::MAP_INVALIDATE_BUFFER_BIT;
            }
            if flags.contains(MapFlags::PERSISTENT) {
                access |= gl::MAP_PERSISTENT_BIT;
            }
            if flags.contains(MapFlags::COHERENT) {
                access |= gl::MAP_COHERENT_BIT;
            }
            if !flags.contains(MapFlags::SYNCHRONIZE) {
                access |= gl::MAP_UNSYNCHRONIZED_BIT;
            }
            ctx.bind_buffer(gl::COPY_WRITE_BUFFER, buffer.raw());
            let ptr = ctx.map_buffer_range(gl::COPY_WRITE_BUFFER, offset as isize, size, access);
            ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
            if ptr.is_null() {
                None
            } else {
                Some(Backing::Driver(ptr))
            }
        } else {
            None
        };

        let backing = match backing {
            Some(backing) => backing,
            None => {
                // Shadow emulation. The host mirror covers the whole
                // buffer so partial writes don't clobber the remainder.
                let mut shadow = map_state
                    .shadow
                    .take()
                    .unwrap_or_else(|| vec![0; buffer.size()]);
                shadow.resize(buffer.size(), 0);
                if flags.contains(MapFlags::ORPHAN) {
                    for byte in &mut shadow[offset..offset + size] {
                        *byte = 0;
                    }
                } else if flags.contains(MapFlags::READ)
                    && caps.contains(PrivateCaps::BUFFER_READ_BACK)
                {
                    ctx.bind_buffer(gl::COPY_READ_BUFFER, buffer.raw());
                    ctx.get_buffer_sub_data(
                        gl::COPY_READ_BUFFER,
                        offset as isize,
                        &mut shadow[offset..offset + size],
                    );
                    ctx.bind_buffer(gl::COPY_READ_BUFFER, 0);
                }
                Backing::Shadow(shadow)
            }
        };

        map_state.range = Some((offset, size, flags));
        map_state.driver_mapped = matches!(backing, Backing::Driver(_));
        drop(map_state);

        Ok(MappedBuffer {
            device: self,
            buffer,
            offset,
            size,
            flags,
            backing: Some(backing),
        })
    }

    /// Delete driver objects whose last handle was dropped.
    pub fn drain_reclaimed(&self) {
        self.share.drain_reclaimed();
    }
}

fn attach_surface(ctx: &dyn crate::gl::Context, attachment: u32, surface: &n::Surface) {
    match surface {
        n::Surface::Texture(texture) => {
            ctx.framebuffer_texture(gl::DRAW_FRAMEBUFFER, attachment, texture.raw(), 0);
        }
        n::Surface::Renderbuffer(renderbuffer) => {
            ctx.framebuffer_renderbuffer(gl::DRAW_FRAMEBUFFER, attachment, renderbuffer.raw());
        }
        n::Surface::RenderSurface(_) => {}
    }
}

#[derive(Debug)]
enum Backing {
    Driver(*mut u8),
    Shadow(Vec<u8>),
}

/// An active buffer mapping. Unmaps on drop; writes reach the driver at
/// unmap (or `flush` for persistent mappings).
#[derive(Debug)]
pub struct MappedBuffer<'a> {
    device: &'a Device,
    buffer: &'a n::Buffer,
    offset: usize,
    size: usize,
    flags: MapFlags,
    backing: Option<Backing>,
}

impl<'a> MappedBuffer<'a> {
    /// Make a written sub-range visible to the device without unmapping.
    pub fn flush(&mut self, offset: usize, size: usize) -> Result<()> {
        if offset + size > self.size {
            return Err(Error::IndexOutOfRange("flush range"));
        }
        let ctx = &*self.device.share.context;
        match self.backing.as_ref() {
            Some(Backing::Driver(_)) => {
                ctx.bind_buffer(gl::COPY_WRITE_BUFFER, self.buffer.raw());
                ctx.flush_mapped_buffer_range(gl::COPY_WRITE_BUFFER, offset as isize, size);
                ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
            }
            Some(Backing::Shadow(data)) => {
                let start = self.offset + offset;
                ctx.bind_buffer(gl::COPY_WRITE_BUFFER, self.buffer.raw());
                ctx.buffer_sub_data(
                    gl::COPY_WRITE_BUFFER,
                    start as isize,
                    &data[start..start + size],
                );
                ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
            }
            None => return Err(Error::InvalidState("buffer is not mapped")),
        }
        Ok(())
    }
}

impl<'a> Deref for MappedBuffer<'a> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        match self.backing.as_ref().expect("unmapped") {
            Backing::Driver(ptr) => unsafe { std::slice::from_raw_parts(*ptr, self.size) },
            Backing::Shadow(data) => &data[self.offset..self.offset + self.size],
        }
    }
}

impl<'a> DerefMut for MappedBuffer<'a> {
    fn deref_mut(&mut self) -> &mut [u8] {
        let (offset, size) = (self.offset, self.size);
        match self.backing.as_mut().expect("unmapped") {
            Backing::Driver(ptr) => unsafe { std::slice::from_raw_parts_mut(*ptr, size) },
            Backing::Shadow(data) => &mut data[offset..offset + size],
        }
    }
}

impl<'a> Drop for MappedBuffer<'a> {
    fn drop(&mut self) {
        let ctx = &*self.device.share.context;
        match self.backing.take() {
            Some(Backing::Driver(_)) => {
                ctx.bind_buffer(gl::COPY_WRITE_BUFFER, self.buffer.raw());
                if !ctx.unmap_buffer(gl::COPY_WRITE_BUFFER) {
                    warn!("buffer contents corrupted during mapping");
                }
                ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
            }
            Some(Backing::Shadow(data)) => {
                if self.flags.contains(MapFlags::WRITE) {
                    ctx.bind_buffer(gl::COPY_WRITE_BUFFER, self.buffer.raw());
                    ctx.buffer_sub_data(
                        gl::COPY_WRITE_BUFFER,
                        self.offset as isize,
                        &data[self.offset..self.offset + self.size],
                    );
                    ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
                }
                self.buffer.0.map.lock().shadow = Some(data);
            }
            None => {}
        }
        let mut map_state = self.buffer.0.map.lock();
        map_state.range = None;
        map_state.driver_mapped = false;
    }
}

impl hal::Device<GlBackend> for Device {
    fn create_buffer(
        &self,
        usage: BufferUsage,
        memory: MemoryFlags,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<n::Buffer> {
        if size == 0 {
            return Err(Error::InvalidArg("zero-size buffer"));
        }
        if let Some(data) = data {
            if data.len() > size {
                return Err(Error::InvalidArg("initial data exceeds buffer size"));
            }
        }
        let ctx = &*self.share.context;
        let raw = ctx.create_buffer();
        let gl_usage = if memory.contains(MemoryFlags::STREAM) {
            gl::STREAM_DRAW
        } else if memory.contains(MemoryFlags::DYNAMIC) {
            gl::DYNAMIC_DRAW
        } else if memory.contains(MemoryFlags::READ) && !memory.contains(MemoryFlags::DRAW) {
            gl::STATIC_READ
        } else {
            gl::STATIC_DRAW
        };
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, raw);
        ctx.buffer_data(gl::COPY_WRITE_BUFFER, size, data, gl_usage);
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);

        let buffer = n::Buffer::new(raw, size, usage, memory, self.share.reclaim.clone());
        if !memory.contains(MemoryFlags::GPU_ONLY) {
            // Seed the host mirror used for emulated mapping.
            let mut shadow = vec![0; size];
            if let Some(data) = data {
                shadow[..data.len()].copy_from_slice(data);
            }
            buffer.0.map.lock().shadow = Some(shadow);
        }
        Ok(buffer)
    }

    fn create_texture(
        &self,
        info: &TextureInfo,
        usage: TextureUsage,
        memory: MemoryFlags,
        data: Option<&[u8]>,
    ) -> Result<n::Texture> {
        let _ = memory;
        if info.width == 0 || info.height == 0 {
            return Err(Error::InvalidArg("zero-size texture"));
        }
        if info.width > self.max_texture_size() || info.height > self.max_texture_size() {
            return Err(Error::NotSupported("texture exceeds the size limit"));
        }
        let mut required = FormatCaps::TEXTURE;
        if usage.contains(TextureUsage::OFFSCREEN) {
            required |= FormatCaps::OFFSCREEN;
        }
        let gl_format = self.gl_format(info.format, required)?;
        if let Some(data) = data {
            if data.len() < info.base_size() {
                return Err(Error::InvalidArg("texture data too small"));
            }
        }

        let ctx = &*self.share.context;
        let raw = ctx.create_texture();
        let target = n::texture_target(info);
        ctx.bind_texture(target, raw);
        ctx.tex_parameter_i(target, gl::TEXTURE_MAX_LEVEL, info.mip_levels as i32 - 1);

        let layers = info.depth.max(1);
        for level in 0..info.mip_levels {
            let width = (info.width >> level).max(1) as i32;
            let height = (info.height >> level).max(1) as i32;
            let level_data = if level == 0 { data } else { None };
            match info.dim {
                TextureDim::Dim3D => ctx.tex_image_3d(
                    target,
                    level as i32,
                    gl_format.internal,
                    width,
                    height,
                    (layers >> level).max(1) as i32,
                    gl_format.external,
                    gl_format.data_type,
                    level_data,
                ),
                TextureDim::Dim2D if info.depth > 0 => ctx.tex_image_3d(
                    target,
                    level as i32,
                    gl_format.internal,
                    width,
                    height,
                    layers as i32,
                    gl_format.external,
                    gl_format.data_type,
                    level_data,
                ),
                _ => ctx.tex_image_2d(
                    target,
                    level as i32,
                    gl_format.internal,
                    width,
                    height,
                    gl_format.external,
                    gl_format.data_type,
                    level_data,
                ),
            }
        }
        ctx.bind_texture(target, 0);

        Ok(n::Texture::new(
            raw,
            *info,
            usage,
            self.share.reclaim.clone(),
        ))
    }

    fn create_geometry(
        &self,
        vertex_buffers: &[VertexBufferBinding<GlBackend>],
        index_buffer: Option<IndexBufferBinding<GlBackend>>,
    ) -> Result<n::Geometry> {
        use crate::info::PrivateCaps;

        if vertex_buffers.is_empty() {
            return Err(Error::InvalidArg("geometry needs at least one vertex buffer"));
        }
        for binding in vertex_buffers {
            for attribute in &binding.format.attributes {
                if conv::map_vertex_format(attribute.format).is_none() {
                    return Err(Error::NotSupported("vertex attribute format"));
                }
            }
        }
        if let Some(index) = &index_buffer {
            if index.index_size != 2 && index.index_size != 4 {
                return Err(Error::InvalidArg("index size must be 2 or 4 bytes"));
            }
        }

        let ctx = &*self.share.context;
        let vao = if self.share.info.private_caps.contains(PrivateCaps::VERTEX_ARRAY) {
            let vao = ctx.create_vertex_array();
            ctx.bind_vertex_array(vao);
            for binding in vertex_buffers {
                bind_attributes(ctx, binding.buffer.raw(), binding.offset, &binding.format, 0);
            }
            if let Some(index) = &index_buffer {
                ctx.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, index.buffer.raw());
            }
            ctx.bind_vertex_array(0);
            vao
        } else {
            0
        };

        let bindings = vertex_buffers
            .iter()
            .map(|binding| n::VertexBinding {
                buffer: binding.buffer.clone(),
                offset: binding.offset,
                format: binding.format.clone(),
            })
            .collect();
        let index = index_buffer.map(|index| n::IndexBinding {
            buffer: index.buffer.clone(),
            offset: index.offset,
            index_size: index.index_size,
        });
        Ok(n::Geometry::new(
            vao,
            bindings,
            index,
            self.share.reclaim.clone(),
        ))
    }

    fn texture_format_supported(&self, format: Format) -> bool {
        self.share.formats.supported(format, FormatCaps::TEXTURE)
    }

    fn vertex_format_supported(&self, format: Format) -> bool {
        self.share.formats.supported(format, FormatCaps::VERTEX)
            && conv::map_vertex_format(format).is_some()
    }

    fn max_texture_size(&self) -> u32 {
        self.share.info.limits.max_texture_size
    }
}

/// Bind the attribute pointers of one vertex buffer, shifting every
/// attribute by `base_vertex` vertices. Used both at geometry creation and
/// for base-vertex emulation on drivers without base-vertex draws.
pub(crate) fn bind_attributes(
    ctx: &dyn crate::gl::Context,
    raw_buffer: crate::gl::Object,
    buffer_offset: usize,
    format: &hal::buffer::VertexFormat,
    base_vertex: u32,
) {
    ctx.bind_buffer(gl::ARRAY_BUFFER, raw_buffer);
    let base_offset = buffer_offset + base_vertex as usize * format.stride as usize;
    for attribute in &format.attributes {
        let (count, data_type, normalized, integer) =
            conv::map_vertex_format(attribute.format).expect("validated at creation");
        let offset = base_offset + attribute.offset as usize;
        if integer {
            ctx.vertex_attrib_i_pointer(
                attribute.location,
                count,
                data_type,
                format.stride as i32,
                offset,
            );
        } else {
            ctx.vertex_attrib_pointer(
                attribute.location,
                count,
                data_type,
                normalized,
                format.stride as i32,
                offset,
            );
        }
        ctx.enable_vertex_attrib_array(attribute.location);
    }
    ctx.bind_buffer(gl::ARRAY_BUFFER, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockContext;
    use crate::Adapter;
    use hal::Device as _;

    fn device() -> (Arc<MockContext>, Device) {
        let ctx = Arc::new(MockContext::new());
        let adapter = Adapter::new(ctx.clone(), 1);
        (ctx, adapter.device())
    }

    #[test]
    fn buffer_creation_uploads_data() {
        let (ctx, device) = device();
        ctx.take_calls();
        let data = [0xABu8; 16];
        let buffer = device
            .create_buffer(
                BufferUsage::VERTEX,
                MemoryFlags::STATIC | MemoryFlags::DRAW,
                16,
                Some(&data),
            )
            .unwrap();
        assert_eq!(buffer.size(), 16);
        let calls = ctx.take_calls();
        assert!(calls.iter().any(|c| c.starts_with("buffer_data") && c.contains("16 bytes")));
    }

    #[test]
    fn double_map_is_denied() {
        let (_ctx, device) = device();
        let buffer = device
            .create_buffer(
                BufferUsage::VERTEX,
                MemoryFlags::DYNAMIC | MemoryFlags::DRAW,
                32,
                None,
            )
            .unwrap();
        let mapped = device.map_buffer(&buffer, MapFlags::WRITE, 0, 32).unwrap();
        assert!(matches!(
            device.map_buffer(&buffer, MapFlags::WRITE, 0, 32),
            Err(Error::PermissionDenied(_))
        ));
        drop(mapped);
        // Unmapping releases the slot.
        device.map_buffer(&buffer, MapFlags::WRITE, 0, 32).unwrap();
    }

    #[test]
    fn shadow_mapping_round_trips_writes() {
        let (ctx, device) = device();
        let buffer = device
            .create_buffer(
                BufferUsage::VERTEX,
                MemoryFlags::DYNAMIC | MemoryFlags::DRAW,
                8,
                None,
            )
            .unwrap();
        {
            // The mock driver cannot map, so the shadow path kicks in.
            let mut mapped = device.map_buffer(&buffer, MapFlags::WRITE, 2, 4).unwrap();
            mapped.copy_from_slice(&[1, 2, 3, 4]);
            ctx.take_calls();
        }
        // Unmap uploaded exactly the mapped range.
        let calls = ctx.take_calls();
        assert!(calls
            .iter()
            .any(|c| c.starts_with("buffer_sub_data") && c.contains(", 2, 4 bytes")));

        // The write is visible through a following read mapping.
        let mapped = device.map_buffer(&buffer, MapFlags::WRITE, 2, 4).unwrap();
        assert_eq!(&*mapped, &[1, 2, 3, 4]);
    }

    #[test]
    fn gpu_only_buffers_cannot_map() {
        let (_ctx, device) = device();
        let buffer = device
            .create_buffer(BufferUsage::VERTEX, MemoryFlags::GPU_ONLY, 8, None)
            .unwrap();
        assert!(device.map_buffer(&buffer, MapFlags::READ, 0, 8).is_err());
    }

    #[test]
    fn texture_requires_supported_format(){
        let (_ctx, device) = device();
        let info = TextureInfo::new_2d(
            Format::Compressed(
                hal::format::CompressedType::Bc3,
                hal::format::ChannelType::Unorm,
            ),
            16,
            16,
        );
        // The mock driver advertises S3TC, so this succeeds.
        device
            .create_texture(&info, TextureUsage::TEXTURE, MemoryFlags::STATIC, None)
            .unwrap();
        // But rendering to a compressed format does not.
        assert!(device
            .create_texture(
                &info,
                TextureUsage::TEXTURE | TextureUsage::OFFSCREEN,
                MemoryFlags::STATIC,
                None
            )
            .is_err());
    }
}
