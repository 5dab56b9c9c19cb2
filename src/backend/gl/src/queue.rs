//! Live command buffer.
//!
//! Executes every operation against the driver immediately, tracking just
//! enough state to elide redundant driver calls: the applied render state,
//! the bound program, the bound geometry with its base vertex, the current
//! render pass, and a small LRU cache of temporary renderbuffers used by
//! clear fallbacks. Fences requested inside a render pass are queued and
//! issued when the pass ends so the pass is never split.

use std::sync::Arc;

use smallvec::SmallVec;

use hal::command::{
    ClearAttachment, ClearRect, ClearValue, CommandBuffer, DrawIndexedRange, DrawRange,
    PrimitiveType, SurfaceRef, UniformType,
};
use hal::format::Format;
use hal::image::{
    BufferTextureCopyRegion, Filter, SurfaceBlitRegion, TextureCopyRegion, TexturePosition,
};
use hal::memory::{MemoryBarrier, PipelineStages};
use hal::pso::{ColorMask, DynamicRenderStates, RenderState, Viewport};
use hal::{Error, Result};

use crate::command::DeferredCommandBuffer;
use crate::conv;
use crate::gl::{consts as gl, Object, WaitStatus};
use crate::info::{LegacyFeatures, PrivateCaps};
use crate::native as n;
use crate::{device, state, GlBackend, Share};

/// Slots in the temporary renderbuffer cache.
const TEMP_RENDERBUFFER_SLOTS: usize = 4;

#[derive(Clone, Copy, Debug)]
struct TempRenderbuffer {
    raw: Object,
    width: u32,
    height: u32,
    samples: u32,
    last_use: u64,
}

/// LRU cache of color renderbuffers used to complete framebuffers during
/// depth/stencil clear fallbacks.
#[derive(Debug, Default)]
struct TempRenderbuffers {
    slots: [Option<TempRenderbuffer>; TEMP_RENDERBUFFER_SLOTS],
    counter: u64,
}

impl TempRenderbuffers {
    fn get(&mut self, ctx: &dyn crate::gl::Context, width: u32, height: u32, samples: u32) -> Object {
        self.counter += 1;
        if let Some(slot) = self.slots.iter_mut().flatten().find(|slot| {
            slot.width == width && slot.height == height && slot.samples == samples
        }) {
            slot.last_use = self.counter;
            return slot.raw;
        }

        let raw = ctx.create_renderbuffer();
        ctx.renderbuffer_storage(samples, gl::RGBA8, width as i32, height as i32);
        let entry = TempRenderbuffer {
            raw,
            width,
            height,
            samples,
            last_use: self.counter,
        };

        if let Some(empty) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *empty = Some(entry);
            return raw;
        }
        // Evict the least recently used slot.
        let lru = self
            .slots
            .iter_mut()
            .min_by_key(|slot| slot.as_ref().map_or(0, |s| s.last_use))
            .unwrap();
        if let Some(old) = lru.take() {
            ctx.delete_renderbuffer(old.raw);
        }
        *lru = Some(entry);
        raw
    }
}

#[derive(Debug)]
struct PassState {
    render_pass: n::RenderPass,
    framebuffer: n::Framebuffer,
    clear_values: SmallVec<[ClearValue; 4]>,
    subpass: u32,
}

/// The live command buffer.
#[derive(Debug)]
pub struct MainCommandBuffer {
    share: Arc<Share>,
    applied_state: Option<RenderState>,
    bound_shader: Option<n::Shader>,
    bound_compute: Option<n::Shader>,
    /// `(vao, applied base vertex)` of the last geometry bind.
    bound_geometry: Option<(Object, u32)>,
    pass: Option<PassState>,
    queued_fences: Vec<n::SyncRef>,
    temp_renderbuffers: TempRenderbuffers,
    read_fbo: Object,
    draw_fbo: Object,
    texture_buffer_texture: Object,
    samplers: Option<(Object, Object)>,
    invert_y: bool,
}

impl MainCommandBuffer {
    pub(crate) fn new(share: Arc<Share>) -> Self {
        MainCommandBuffer {
            share,
            applied_state: None,
            bound_shader: None,
            bound_compute: None,
            bound_geometry: None,
            pass: None,
            queued_fences: Vec::new(),
            temp_renderbuffers: TempRenderbuffers::default(),
            read_fbo: 0,
            draw_fbo: 0,
            texture_buffer_texture: 0,
            samplers: None,
            invert_y: false,
        }
    }

    fn ctx(&self) -> &dyn crate::gl::Context {
        &*self.share.context
    }

    fn caps(&self) -> PrivateCaps {
        self.share.info.private_caps
    }

    fn legacy(&self) -> LegacyFeatures {
        self.share.info.legacy_features
    }

    fn check(&self, operation: &str) {
        let error = self.ctx().get_error();
        if error != gl::NO_ERROR {
            error!("driver error {:#x} executing {}", error, operation);
        }
    }

    /// Replay a recorded buffer into this one.
    pub fn submit(&mut self, buffer: &mut DeferredCommandBuffer) -> Result<()> {
        buffer.submit(self)
    }

    /// Start a frame: reclaim driver objects whose handles were dropped.
    pub fn begin_frame(&mut self) {
        self.share.drain_reclaimed();
    }

    /// Finish a frame.
    pub fn end_frame(&mut self) {
        self.ctx().flush();
        self.share.drain_reclaimed();
    }

    /// Present a render surface.
    pub fn present_render_surface(&mut self, surface: &n::RenderSurface) -> Result<()> {
        if self.pass.is_some() {
            return Err(Error::InvalidState("present inside a render pass"));
        }
        self.ctx().swap_buffers(surface.0.surface);
        Ok(())
    }

    /// Block until a fence signals, up to `timeout_ns`. Returns whether
    /// the fence signaled in time.
    pub fn wait_fence(&self, fence: &n::SyncRef, timeout_ns: u64) -> Result<bool> {
        let sync = fence
            .current()
            .ok_or(Error::InvalidState("fence has not been set"))?;
        match self.ctx().client_wait_sync(sync.handle, true, timeout_ns) {
            WaitStatus::Signaled => Ok(true),
            WaitStatus::TimedOut => Ok(false),
            WaitStatus::Failed => Err(Error::Internal("fence wait failed in the driver")),
        }
    }

    fn ensure_read_fbo(&mut self) -> Object {
        if self.read_fbo == 0 {
            self.read_fbo = self.ctx().create_framebuffer();
        }
        self.read_fbo
    }

    fn ensure_draw_fbo(&mut self) -> Object {
        if self.draw_fbo == 0 {
            self.draw_fbo = self.ctx().create_framebuffer();
        }
        self.draw_fbo
    }

    fn ensure_samplers(&mut self) -> (Object, Object) {
        if let Some(samplers) = self.samplers {
            return samplers;
        }
        let ctx = self.ctx();
        let plain = ctx.create_sampler();
        ctx.sampler_parameter_i(plain, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
        ctx.sampler_parameter_i(plain, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
        ctx.sampler_parameter_i(plain, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
        ctx.sampler_parameter_i(plain, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);
        let shadow = ctx.create_sampler();
        ctx.sampler_parameter_i(shadow, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
        ctx.sampler_parameter_i(shadow, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
        ctx.sampler_parameter_i(shadow, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
        ctx.sampler_parameter_i(shadow, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);
        ctx.sampler_parameter_i(
            shadow,
            gl::TEXTURE_COMPARE_MODE,
            gl::COMPARE_REF_TO_TEXTURE as i32,
        );
        ctx.sampler_parameter_i(shadow, gl::TEXTURE_COMPARE_FUNC, gl::LEQUAL as i32);
        self.samplers = Some((plain, shadow));
        (plain, shadow)
    }

    fn current_fbo(&self) -> Object {
        match &self.pass {
            Some(pass) => pass.framebuffer.0.fbos[pass.subpass as usize],
            None => 0,
        }
    }

    fn issue_barrier(&self, bits: u32) {
        if bits != 0 && self.caps().contains(PrivateCaps::MEMORY_BARRIER) {
            self.ctx().memory_barrier(bits);
        }
    }

    fn issue_fences(&self, fences: &[n::SyncRef]) -> Result<()> {
        if !self.caps().contains(PrivateCaps::SYNC) {
            return Err(Error::NotSupported("sync objects"));
        }
        let ctx = self.ctx();
        let sync = Arc::new(n::FenceSync::new(ctx.fence_sync(), self.share.reclaim.clone()));
        ctx.flush();
        for fence in fences {
            fence.set(sync.clone())?;
        }
        Ok(())
    }

    /// Temporarily force write masks open for a clear, returning what has
    /// to be restored afterwards.
    fn open_write_masks(
        &self,
        color: bool,
        depth: bool,
        stencil: bool,
    ) -> (Option<ColorMask>, bool, Option<(u32, u32)>) {
        let ctx = self.ctx();
        let mut restore_color = None;
        let mut restore_depth = false;
        let mut restore_stencil = None;
        if let Some(applied) = &self.applied_state {
            if color {
                let mask = applied.blend.attachments[0].color_write_mask;
                if mask != ColorMask::ALL {
                    ctx.color_mask(true, true, true, true);
                    restore_color = Some(mask);
                }
            }
            if depth && !applied.depth_stencil.depth_write_enable {
                ctx.depth_mask(true);
                restore_depth = true;
            }
            if stencil {
                let front = applied.depth_stencil.front_stencil.write_mask.unwrap_or(!0);
                let back = applied.depth_stencil.back_stencil.write_mask.unwrap_or(!0);
                if front != !0 || back != !0 {
                    ctx.stencil_mask_separate(gl::FRONT_AND_BACK, !0);
                    restore_stencil = Some((front, back));
                }
            }
        }
        (restore_color, restore_depth, restore_stencil)
    }

    fn restore_write_masks(&self, saved: (Option<ColorMask>, bool, Option<(u32, u32)>)) {
        let ctx = self.ctx();
        if let Some(mask) = saved.0 {
            ctx.color_mask(
                mask.contains(ColorMask::RED),
                mask.contains(ColorMask::GREEN),
                mask.contains(ColorMask::BLUE),
                mask.contains(ColorMask::ALPHA),
            );
        }
        if saved.1 {
            ctx.depth_mask(false);
        }
        if let Some((front, back)) = saved.2 {
            ctx.stencil_mask_separate(gl::FRONT, front);
            ctx.stencil_mask_separate(gl::BACK, back);
        }
    }

    /// First subpass that renders to each attachment; clears happen there.
    fn first_use_subpass(render_pass: &n::RenderPass, attachment: u32) -> Option<u32> {
        render_pass
            .0
            .desc
            .subpasses
            .iter()
            .position(|subpass| subpass.attachment_using(attachment).is_some())
            .map(|i| i as u32)
    }

    fn begin_subpass(&mut self) {
        let pass = self.pass.as_ref().unwrap();
        let subpass_index = pass.subpass;
        let fbo = pass.framebuffer.0.fbos[subpass_index as usize];
        let render_pass = pass.render_pass.clone();
        let subpass = &render_pass.0.desc.subpasses[subpass_index as usize];

        self.invert_y = fbo != 0;
        let ctx = self.ctx();
        ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, fbo);

        if fbo == 0 {
            ctx.draw_buffers(&[gl::BACK_LEFT]);
        } else {
            let draw_buffers: SmallVec<[u32; 4]> = (0..subpass.color_attachments.len())
                .map(|i| gl::COLOR_ATTACHMENT0 + i as u32)
                .collect();
            ctx.draw_buffers(&draw_buffers);
        }

        // Clear every attachment first used by this subpass.
        let mut clear_value_index = 0;
        let typed_clears = fbo != 0 && self.caps().contains(PrivateCaps::CLEAR_BUFFER);
        let mut composite_mask = 0;
        let pass_state = self.pass.as_ref().unwrap();
        let mut pending: SmallVec<[(u32, ClearValue); 4]> = SmallVec::new();
        for (index, attachment) in render_pass.0.desc.attachments.iter().enumerate() {
            if !attachment.has_clear() {
                continue;
            }
            let value = match pass_state.clear_values.get(clear_value_index) {
                Some(value) => *value,
                None => break,
            };
            clear_value_index += 1;
            if Self::first_use_subpass(&render_pass, index as u32) != Some(subpass_index) {
                continue;
            }
            pending.push((index as u32, value));
        }

        let saved = self.open_write_masks(true, true, true);
        let ctx = self.ctx();
        for (attachment_index, value) in &pending {
            let format = render_pass.0.desc.attachments[*attachment_index as usize].format;
            if typed_clears {
                if format.is_color() {
                    let output = subpass
                        .attachment_using(*attachment_index)
                        .unwrap_or(0) as i32;
                    match value {
                        ClearValue::ColorFloat(values) => {
                            ctx.clear_buffer_fv(gl::COLOR, output, *values)
                        }
                        ClearValue::ColorInt(values) => {
                            ctx.clear_buffer_iv(gl::COLOR, output, *values)
                        }
                        ClearValue::ColorUint(values) => {
                            ctx.clear_buffer_uiv(gl::COLOR, output, *values)
                        }
                        ClearValue::DepthStencil { .. } => {
                            error!("depth/stencil clear value for a color attachment")
                        }
                    }
                } else if let ClearValue::DepthStencil { depth, stencil } = value {
                    if format.is_depth() && format.is_stencil() {
                        ctx.clear_buffer_depth_stencil(0, *depth, *stencil as i32);
                    } else if format.is_depth() {
                        ctx.clear_buffer_fv(gl::DEPTH, 0, [*depth, 0.0, 0.0, 0.0]);
                    } else {
                        ctx.clear_buffer_iv(gl::STENCIL, 0, [*stencil as i32, 0, 0, 0]);
                    }
                }
            } else {
                // The default surface (and drivers without typed clears)
                // takes one composite clear.
                match value {
                    ClearValue::ColorFloat(values) => {
                        ctx.clear_color(values[0], values[1], values[2], values[3]);
                        composite_mask |= gl::COLOR_BUFFER_BIT;
                    }
                    ClearValue::ColorInt(_) | ClearValue::ColorUint(_) => {
                        error!("integer clears need typed buffer clears");
                    }
                    ClearValue::DepthStencil { depth, stencil } => {
                        if format.is_depth() {
                            ctx.clear_depth(*depth);
                            composite_mask |= gl::DEPTH_BUFFER_BIT;
                        }
                        if format.is_stencil() {
                            ctx.clear_stencil(*stencil as i32);
                            composite_mask |= gl::STENCIL_BUFFER_BIT;
                        }
                    }
                }
            }
        }
        if composite_mask != 0 {
            ctx.clear(composite_mask);
        }
        self.restore_write_masks(saved);
        self.check("begin_subpass");
    }

    fn end_subpass(&mut self) {
        let pass = self.pass.as_ref().unwrap();
        let subpass_index = pass.subpass as usize;
        let framebuffer = pass.framebuffer.clone();
        let render_pass = pass.render_pass.clone();
        let subpass = &render_pass.0.desc.subpasses[subpass_index];
        let (width, height) = framebuffer.extent();

        // Resolve multisampled attachments into their single-sample
        // surfaces through temporary read/draw framebuffers.
        let resolves: SmallVec<[(u32, u32); 2]> = subpass
            .color_attachments
            .iter()
            .enumerate()
            .filter(|(_, reference)| reference.resolve)
            .filter_map(|(output, reference)| {
                framebuffer
                    .0
                    .resolves
                    .iter()
                    .find(|pair| pair.attachment == reference.index)
                    .map(|_| (output as u32, reference.index))
            })
            .collect();

        if resolves.is_empty() {
            return;
        }

        let src_fbo = framebuffer.0.fbos[subpass_index];
        let draw_fbo = self.ensure_draw_fbo();
        let ctx = self.ctx();
        for (output, attachment) in resolves {
            ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, src_fbo);
            ctx.read_buffer(gl::COLOR_ATTACHMENT0 + output);
            ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, draw_fbo);
            match &framebuffer.0.attachments[attachment as usize] {
                n::Surface::Texture(texture) => {
                    ctx.framebuffer_texture(
                        gl::DRAW_FRAMEBUFFER,
                        gl::COLOR_ATTACHMENT0,
                        texture.raw(),
                        0,
                    );
                }
                n::Surface::Renderbuffer(renderbuffer) => {
                    ctx.framebuffer_renderbuffer(
                        gl::DRAW_FRAMEBUFFER,
                        gl::COLOR_ATTACHMENT0,
                        renderbuffer.raw(),
                    );
                }
                n::Surface::RenderSurface(_) => continue,
            }
            ctx.draw_buffers(&[gl::COLOR_ATTACHMENT0]);
            ctx.blit_framebuffer(
                0,
                0,
                width as i32,
                height as i32,
                0,
                0,
                width as i32,
                height as i32,
                gl::COLOR_BUFFER_BIT,
                gl::NEAREST,
            );
        }
        ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, 0);
        ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, src_fbo);
        self.check("end_subpass");
    }

    fn bind_geometry(&mut self, geometry: &n::Geometry, base_vertex: u32) -> Result<u32> {
        let emulate_base =
            base_vertex > 0 && !self.legacy().contains(LegacyFeatures::DRAW_INDEXED_BASE);
        let applied_base = if emulate_base { base_vertex } else { 0 };
        let vao = geometry.0.vao;

        if self.bound_geometry != Some((vao, applied_base)) {
            let has_vao = self.caps().contains(PrivateCaps::VERTEX_ARRAY) && vao != 0;
            if has_vao {
                self.ctx().bind_vertex_array(vao);
            }
            if applied_base != 0 || !has_vao {
                // Rebind attribute pointers, shifting by the base vertex
                // where the driver lacks base-vertex draws.
                for binding in &geometry.0.vertex_buffers {
                    device::bind_attributes(
                        self.ctx(),
                        binding.buffer.raw(),
                        binding.offset,
                        &binding.format,
                        applied_base,
                    );
                }
                if let Some(index) = &geometry.0.index {
                    self.ctx()
                        .bind_buffer(gl::ELEMENT_ARRAY_BUFFER, index.buffer.raw());
                }
            }
            self.bound_geometry = Some((vao, applied_base));
        }
        Ok(if emulate_base { 0 } else { base_vertex })
    }

    /// Clear a color surface outside of a render pass.
    pub fn clear_color_surface(
        &mut self,
        surface: SurfaceRef<GlBackend>,
        value: ClearValue,
    ) -> Result<()> {
        let previous_fbo = self.current_fbo();
        match surface {
            SurfaceRef::RenderSurface(_) => {
                let ctx = self.ctx();
                ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
                let saved = self.open_write_masks(true, false, false);
                let ctx = self.ctx();
                if let ClearValue::ColorFloat(values) = value {
                    ctx.clear_color(values[0], values[1], values[2], values[3]);
                    ctx.clear(gl::COLOR_BUFFER_BIT);
                } else {
                    return Err(Error::InvalidArg(
                        "the default surface takes float clear values",
                    ));
                }
                self.restore_write_masks(saved);
            }
            SurfaceRef::Texture(_) | SurfaceRef::Renderbuffer(_) => {
                let draw_fbo = self.ensure_draw_fbo();
                let ctx = self.ctx();
                ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, draw_fbo);
                match surface {
                    SurfaceRef::Texture(texture) => ctx.framebuffer_texture(
                        gl::DRAW_FRAMEBUFFER,
                        gl::COLOR_ATTACHMENT0,
                        texture.raw(),
                        0,
                    ),
                    SurfaceRef::Renderbuffer(renderbuffer) => ctx.framebuffer_renderbuffer(
                        gl::DRAW_FRAMEBUFFER,
                        gl::COLOR_ATTACHMENT0,
                        renderbuffer.raw(),
                    ),
                    SurfaceRef::RenderSurface(_) => unreachable!(),
                }
                ctx.draw_buffers(&[gl::COLOR_ATTACHMENT0]);
                let saved = self.open_write_masks(true, false, false);
                let ctx = self.ctx();
                if self.caps().contains(PrivateCaps::CLEAR_BUFFER) {
                    match value {
                        ClearValue::ColorFloat(values) => ctx.clear_buffer_fv(gl::COLOR, 0, values),
                        ClearValue::ColorInt(values) => ctx.clear_buffer_iv(gl::COLOR, 0, values),
                        ClearValue::ColorUint(values) => ctx.clear_buffer_uiv(gl::COLOR, 0, values),
                        ClearValue::DepthStencil { .. } => {
                            return Err(Error::InvalidArg("color clear value expected"))
                        }
                    }
                } else if let ClearValue::ColorFloat(values) = value {
                    ctx.clear_color(values[0], values[1], values[2], values[3]);
                    ctx.clear(gl::COLOR_BUFFER_BIT);
                } else {
                    return Err(Error::NotSupported("integer clears on this driver"));
                }
                self.restore_write_masks(saved);
            }
        }
        self.ctx().bind_framebuffer(gl::DRAW_FRAMEBUFFER, previous_fbo);
        self.check("clear_color_surface");
        Ok(())
    }

    /// Clear a depth/stencil surface outside of a render pass.
    pub fn clear_depth_stencil_surface(
        &mut self,
        surface: SurfaceRef<GlBackend>,
        depth: Option<f32>,
        stencil: Option<u32>,
    ) -> Result<()> {
        if depth.is_none() && stencil.is_none() {
            return Err(Error::InvalidArg("nothing to clear"));
        }
        let previous_fbo = self.current_fbo();
        let (format, width, height, samples) = match surface {
            SurfaceRef::Texture(texture) => {
                let info = *texture.info();
                (info.format, info.width, info.height, info.samples)
            }
            SurfaceRef::Renderbuffer(renderbuffer) => (
                renderbuffer.0.format,
                renderbuffer.0.width,
                renderbuffer.0.height,
                renderbuffer.0.samples,
            ),
            SurfaceRef::RenderSurface(_) => {
                // The default surface owns its depth/stencil planes.
                self.ctx().bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
                let saved = self.open_write_masks(false, depth.is_some(), stencil.is_some());
                let ctx = self.ctx();
                let mut mask = 0;
                if let Some(depth) = depth {
                    ctx.clear_depth(depth);
                    mask |= gl::DEPTH_BUFFER_BIT;
                }
                if let Some(stencil) = stencil {
                    ctx.clear_stencil(stencil as i32);
                    mask |= gl::STENCIL_BUFFER_BIT;
                }
                ctx.clear(mask);
                self.restore_write_masks(saved);
                self.ctx().bind_framebuffer(gl::DRAW_FRAMEBUFFER, previous_fbo);
                return Ok(());
            }
        };

        let draw_fbo = self.ensure_draw_fbo();
        let ctx = self.ctx();
        ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, draw_fbo);
        let attachment = if format.is_depth() && format.is_stencil() {
            gl::DEPTH_STENCIL_ATTACHMENT
        } else if format.is_depth() {
            gl::DEPTH_ATTACHMENT
        } else {
            gl::STENCIL_ATTACHMENT
        };
        match surface {
            SurfaceRef::Texture(texture) => {
                ctx.framebuffer_texture(gl::DRAW_FRAMEBUFFER, attachment, texture.raw(), 0)
            }
            SurfaceRef::Renderbuffer(renderbuffer) => {
                ctx.framebuffer_renderbuffer(gl::DRAW_FRAMEBUFFER, attachment, renderbuffer.raw())
            }
            SurfaceRef::RenderSurface(_) => unreachable!(),
        }

        if self.caps().contains(PrivateCaps::CLEAR_BUFFER) {
            // No color output is needed for a typed clear.
            ctx.draw_buffers(&[]);
            let saved = self.open_write_masks(false, depth.is_some(), stencil.is_some());
            let ctx = self.ctx();
            match (depth, stencil) {
                (Some(depth), Some(stencil)) => {
                    ctx.clear_buffer_depth_stencil(0, depth, stencil as i32)
                }
                (Some(depth), None) => ctx.clear_buffer_fv(gl::DEPTH, 0, [depth, 0.0, 0.0, 0.0]),
                (None, Some(stencil)) => {
                    ctx.clear_buffer_iv(gl::STENCIL, 0, [stencil as i32, 0, 0, 0])
                }
                (None, None) => unreachable!(),
            }
            self.restore_write_masks(saved);
        } else {
            // Without typed clears some drivers refuse framebuffers with
            // no color attachment; borrow a matching temp renderbuffer.
            let temp = self
                .temp_renderbuffers
                .get(&*self.share.context, width, height, samples);
            let ctx = self.ctx();
            ctx.framebuffer_renderbuffer(gl::DRAW_FRAMEBUFFER, gl::COLOR_ATTACHMENT0, temp);
            ctx.color_mask(false, false, false, false);
            let saved = self.open_write_masks(false, depth.is_some(), stencil.is_some());
            let ctx = self.ctx();
            let mut mask = 0;
            if let Some(depth) = depth {
                ctx.clear_depth(depth);
                mask |= gl::DEPTH_BUFFER_BIT;
            }
            if let Some(stencil) = stencil {
                ctx.clear_stencil(stencil as i32);
                mask |= gl::STENCIL_BUFFER_BIT;
            }
            ctx.clear(mask);
            self.restore_write_masks(saved);
            let ctx = self.ctx();
            ctx.framebuffer_renderbuffer(gl::DRAW_FRAMEBUFFER, gl::COLOR_ATTACHMENT0, 0);
            ctx.color_mask(true, true, true, true);
        }

        self.ctx().bind_framebuffer(gl::DRAW_FRAMEBUFFER, previous_fbo);
        self.check("clear_depth_stencil_surface");
        Ok(())
    }

    fn bind_read_surface(&mut self, surface: SurfaceRef<GlBackend>) {
        match surface {
            SurfaceRef::RenderSurface(_) => {
                let ctx = self.ctx();
                ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, 0);
                ctx.read_buffer(gl::BACK);
            }
            _ => {
                let read_fbo = self.ensure_read_fbo();
                let ctx = self.ctx();
                ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, read_fbo);
                match surface {
                    SurfaceRef::Texture(texture) => ctx.framebuffer_texture(
                        gl::READ_FRAMEBUFFER,
                        surface_attachment_point(texture.info().format),
                        texture.raw(),
                        0,
                    ),
                    SurfaceRef::Renderbuffer(renderbuffer) => ctx.framebuffer_renderbuffer(
                        gl::READ_FRAMEBUFFER,
                        surface_attachment_point(renderbuffer.0.format),
                        renderbuffer.raw(),
                    ),
                    SurfaceRef::RenderSurface(_) => unreachable!(),
                }
                if surface_format(&surface).is_color() {
                    ctx.read_buffer(gl::COLOR_ATTACHMENT0);
                }
            }
        }
    }

    fn bind_draw_surface(&mut self, surface: SurfaceRef<GlBackend>) {
        match surface {
            SurfaceRef::RenderSurface(_) => {
                self.ctx().bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
            }
            _ => {
                let draw_fbo = self.ensure_draw_fbo();
                let ctx = self.ctx();
                ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, draw_fbo);
                match surface {
                    SurfaceRef::Texture(texture) => ctx.framebuffer_texture(
                        gl::DRAW_FRAMEBUFFER,
                        surface_attachment_point(texture.info().format),
                        texture.raw(),
                        0,
                    ),
                    SurfaceRef::Renderbuffer(renderbuffer) => ctx.framebuffer_renderbuffer(
                        gl::DRAW_FRAMEBUFFER,
                        surface_attachment_point(renderbuffer.0.format),
                        renderbuffer.raw(),
                    ),
                    SurfaceRef::RenderSurface(_) => unreachable!(),
                }
                if surface_format(&surface).is_color() {
                    ctx.draw_buffers(&[gl::COLOR_ATTACHMENT0]);
                }
            }
        }
    }
}

fn surface_format(surface: &SurfaceRef<GlBackend>) -> Format {
    match surface {
        SurfaceRef::Texture(texture) => texture.info().format,
        SurfaceRef::Renderbuffer(renderbuffer) => renderbuffer.0.format,
        SurfaceRef::RenderSurface(_) => {
            Format::Standard(hal::format::SurfaceType::Rgba8, hal::format::ChannelType::Unorm)
        }
    }
}

fn surface_attachment_point(format: Format) -> u32 {
    if format.is_depth() && format.is_stencil() {
        gl::DEPTH_STENCIL_ATTACHMENT
    } else if format.is_depth() {
        gl::DEPTH_ATTACHMENT
    } else if format.is_stencil() {
        gl::STENCIL_ATTACHMENT
    } else {
        gl::COLOR_ATTACHMENT0
    }
}

fn blit_mask(format: Format) -> u32 {
    let mut mask = 0;
    if format.is_color() {
        mask |= gl::COLOR_BUFFER_BIT;
    }
    if format.is_depth() {
        mask |= gl::DEPTH_BUFFER_BIT;
    }
    if format.is_stencil() {
        mask |= gl::STENCIL_BUFFER_BIT;
    }
    mask
}

/// Reinterpret uniform bytes as a typed slice. The data always originates
/// from a `&[T]` upload, so the cast only undoes the type erasure of the
/// byte interface.
fn cast_slice<T>(data: &[u8]) -> &[T] {
    debug_assert_eq!(data.len() % std::mem::size_of::<T>(), 0);
    debug_assert_eq!(data.as_ptr() as usize % std::mem::align_of::<T>(), 0);
    unsafe {
        std::slice::from_raw_parts(data.as_ptr() as *const T, data.len() / std::mem::size_of::<T>())
    }
}

impl CommandBuffer<GlBackend> for MainCommandBuffer {
    fn copy_buffer_data(&mut self, buffer: &n::Buffer, offset: usize, data: &[u8]) -> Result<()> {
        if offset + data.len() > buffer.size() {
            return Err(Error::IndexOutOfRange("buffer data copy range"));
        }
        let ctx = self.ctx();
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, buffer.raw());
        ctx.buffer_sub_data(gl::COPY_WRITE_BUFFER, offset as isize, data);
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
        self.check("copy_buffer_data");
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
        if src_offset + size > src.size() || dst_offset + size > dst.size() {
            return Err(Error::IndexOutOfRange("buffer copy range"));
        }
        let ctx = self.ctx();
        ctx.bind_buffer(gl::COPY_READ_BUFFER, src.raw());
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, dst.raw());
        ctx.copy_buffer_sub_data(
            gl::COPY_READ_BUFFER,
            gl::COPY_WRITE_BUFFER,
            src_offset as isize,
            dst_offset as isize,
            size as isize,
        );
        ctx.bind_buffer(gl::COPY_READ_BUFFER, 0);
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
        self.check("copy_buffer");
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
        let gl_format = self
            .share
            .formats
            .get(dst.info().format)
            .ok_or(Error::NotSupported("texture format"))?;
        let (external, data_type) = (gl_format.external, gl_format.data_type);
        let target = dst.target();
        let layered = dst.info().depth > 0 || dst.info().dim == hal::image::TextureDim::Dim3D;
        let ctx = self.ctx();
        ctx.bind_buffer(gl::PIXEL_UNPACK_BUFFER, src.raw());
        ctx.bind_texture(target, dst.raw());
        for region in regions {
            let position = region.texture_position;
            if layered {
                ctx.tex_sub_image_3d_pbo(
                    target,
                    position.mip_level as i32,
                    position.x as i32,
                    position.y as i32,
                    position.depth as i32,
                    region.width as i32,
                    region.height as i32,
                    region.layers.max(1) as i32,
                    external,
                    data_type,
                    region.buffer_offset,
                );
            } else {
                ctx.tex_sub_image_2d_pbo(
                    target,
                    position.mip_level as i32,
                    position.x as i32,
                    position.y as i32,
                    region.width as i32,
                    region.height as i32,
                    external,
                    data_type,
                    region.buffer_offset,
                );
            }
        }
        ctx.bind_texture(target, 0);
        ctx.bind_buffer(gl::PIXEL_UNPACK_BUFFER, 0);
        self.check("copy_buffer_to_texture");
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
        let expected = texture.info().format.surface_size(width, height, layers.max(1));
        if data.len() < expected {
            return Err(Error::InvalidArg("texture data too small"));
        }
        let gl_format = self
            .share
            .formats
            .get(texture.info().format)
            .ok_or(Error::NotSupported("texture format"))?;
        let (external, data_type) = (gl_format.external, gl_format.data_type);
        let target = texture.target();
        let layered = texture.info().depth > 0 || texture.info().dim == hal::image::TextureDim::Dim3D;
        let ctx = self.ctx();
        ctx.bind_texture(target, texture.raw());
        if layered {
            ctx.tex_sub_image_3d(
                target,
                position.mip_level as i32,
                position.x as i32,
                position.y as i32,
                position.depth as i32,
                width as i32,
                height as i32,
                layers.max(1) as i32,
                external,
                data_type,
                Some(data),
            );
        } else {
            ctx.tex_sub_image_2d(
                target,
                position.mip_level as i32,
                position.x as i32,
                position.y as i32,
                width as i32,
                height as i32,
                external,
                data_type,
                Some(data),
            );
        }
        ctx.bind_texture(target, 0);
        self.check("copy_texture_data");
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
        if self.caps().contains(PrivateCaps::COPY_IMAGE) {
            let ctx = self.ctx();
            for region in regions {
                ctx.copy_image_sub_data(
                    src.raw(),
                    src.target(),
                    region.src_position.mip_level as i32,
                    region.src_position.x as i32,
                    region.src_position.y as i32,
                    region.src_position.depth as i32,
                    dst.raw(),
                    dst.target(),
                    region.dst_position.mip_level as i32,
                    region.dst_position.x as i32,
                    region.dst_position.y as i32,
                    region.dst_position.depth as i32,
                    region.width as i32,
                    region.height as i32,
                    region.layers.max(1) as i32,
                );
            }
            self.check("copy_texture");
            return Ok(());
        }

        // Fallback: one blit per layer per region through temp
        // framebuffers.
        let mask = blit_mask(src.info().format);
        let read_fbo = self.ensure_read_fbo();
        let draw_fbo = self.ensure_draw_fbo();
        let previous_fbo = self.current_fbo();
        let src_point = surface_attachment_point(src.info().format);
        let dst_point = surface_attachment_point(dst.info().format);
        let ctx = self.ctx();
        ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, read_fbo);
        ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, draw_fbo);
        for region in regions {
            for layer in 0..region.layers.max(1) {
                let src_layer = region.src_position.depth + layer;
                let dst_layer = region.dst_position.depth + layer;
                if src.info().depth > 0 {
                    ctx.framebuffer_texture_layer(
                        gl::READ_FRAMEBUFFER,
                        src_point,
                        src.raw(),
                        region.src_position.mip_level as i32,
                        src_layer as i32,
                    );
                } else {
                    ctx.framebuffer_texture(
                        gl::READ_FRAMEBUFFER,
                        src_point,
                        src.raw(),
                        region.src_position.mip_level as i32,
                    );
                }
                if dst.info().depth > 0 {
                    ctx.framebuffer_texture_layer(
                        gl::DRAW_FRAMEBUFFER,
                        dst_point,
                        dst.raw(),
                        region.dst_position.mip_level as i32,
                        dst_layer as i32,
                    );
                } else {
                    ctx.framebuffer_texture(
                        gl::DRAW_FRAMEBUFFER,
                        dst_point,
                        dst.raw(),
                        region.dst_position.mip_level as i32,
                    );
                }
                if mask == gl::COLOR_BUFFER_BIT {
                    ctx.read_buffer(gl::COLOR_ATTACHMENT0);
                    ctx.draw_buffers(&[gl::COLOR_ATTACHMENT0]);
                }
                ctx.blit_framebuffer(
                    region.src_position.x as i32,
                    region.src_position.y as i32,
                    (region.src_position.x + region.width) as i32,
                    (region.src_position.y + region.height) as i32,
                    region.dst_position.x as i32,
                    region.dst_position.y as i32,
                    (region.dst_position.x + region.width) as i32,
                    (region.dst_position.y + region.height) as i32,
                    mask,
                    gl::NEAREST,
                );
            }
        }
        ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, 0);
        ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, previous_fbo);
        self.check("copy_texture");
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
        let gl_format = self
            .share
            .formats
            .get(src.info().format)
            .ok_or(Error::NotSupported("texture format"))?;
        let (external, data_type) = (gl_format.external, gl_format.data_type);
        let read_fbo = self.ensure_read_fbo();
        let point = surface_attachment_point(src.info().format);
        let ctx = self.ctx();
        ctx.bind_buffer(gl::PIXEL_PACK_BUFFER, dst.raw());
        ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, read_fbo);
        for region in regions {
            for layer in 0..region.layers.max(1) {
                if src.info().depth > 0 {
                    ctx.framebuffer_texture_layer(
                        gl::READ_FRAMEBUFFER,
                        point,
                        src.raw(),
                        region.texture_position.mip_level as i32,
                        (region.texture_position.depth + layer) as i32,
                    );
                } else {
                    ctx.framebuffer_texture(
                        gl::READ_FRAMEBUFFER,
                        point,
                        src.raw(),
                        region.texture_position.mip_level as i32,
                    );
                }
                if src.info().format.is_color() {
                    ctx.read_buffer(gl::COLOR_ATTACHMENT0);
                }
                let layer_size = src
                    .info()
                    .format
                    .surface_size(region.width, region.height, 1);
                ctx.read_pixels(
                    region.texture_position.x as i32,
                    region.texture_position.y as i32,
                    region.width as i32,
                    region.height as i32,
                    external,
                    data_type,
                    region.buffer_offset + layer as usize * layer_size,
                );
            }
        }
        ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, 0);
        ctx.bind_buffer(gl::PIXEL_PACK_BUFFER, 0);
        self.check("copy_texture_to_buffer");
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: &n::Texture) -> Result<()> {
        if texture.info().mip_levels <= 1 {
            return Ok(());
        }
        let ctx = self.ctx();
        ctx.bind_texture(texture.target(), texture.raw());
        ctx.generate_mipmap(texture.target());
        ctx.bind_texture(texture.target(), 0);
        self.check("generate_mipmaps");
        Ok(())
    }

    fn set_fence_syncs(&mut self, fences: &[n::SyncRef]) -> Result<()> {
        if self.pass.is_some() {
            // Issuing a sync mid-pass would split the pass; queue until
            // the pass ends.
            self.queued_fences.extend_from_slice(fences);
            return Ok(());
        }
        self.issue_fences(fences)
    }

    fn memory_barrier(
        &mut self,
        _before_stages: PipelineStages,
        _after_stages: PipelineStages,
        barriers: &[MemoryBarrier],
    ) -> Result<()> {
        let mut bits = 0;
        for barrier in barriers {
            bits |= conv::access_to_barrier_bits(barrier.before_access | barrier.after_access);
        }
        self.issue_barrier(bits);
        Ok(())
    }

    fn begin_query(&mut self, pool: &n::QueryPool, query: u32) -> Result<()> {
        let raw = *pool
            .0
            .queries
            .get(query as usize)
            .ok_or(Error::IndexOutOfRange("query index"))?;
        let target = match pool.0.ty {
            hal::query::QueryType::SamplesPassed => gl::SAMPLES_PASSED,
            hal::query::QueryType::AnySamplesPassed => gl::ANY_SAMPLES_PASSED,
            hal::query::QueryType::Timestamp => {
                return Err(Error::InvalidArg("timestamp queries cannot be begun"))
            }
        };
        self.ctx().begin_query(target, raw);
        Ok(())
    }

    fn end_query(&mut self, pool: &n::QueryPool, query: u32) -> Result<()> {
        if query >= pool.count() {
            return Err(Error::IndexOutOfRange("query index"));
        }
        let target = match pool.0.ty {
            hal::query::QueryType::SamplesPassed => gl::SAMPLES_PASSED,
            hal::query::QueryType::AnySamplesPassed => gl::ANY_SAMPLES_PASSED,
            hal::query::QueryType::Timestamp => {
                return Err(Error::InvalidArg("timestamp queries cannot be ended"))
            }
        };
        self.ctx().end_query(target);
        Ok(())
    }

    fn query_timestamp(&mut self, pool: &n::QueryPool, query: u32) -> Result<()> {
        if !self.legacy().contains(LegacyFeatures::TIMESTAMP_QUERY) {
            return Err(Error::NotSupported("timestamp queries"));
        }
        let raw = *pool
            .0
            .queries
            .get(query as usize)
            .ok_or(Error::IndexOutOfRange("query index"))?;
        self.ctx().query_counter(raw, gl::TIMESTAMP);
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
        if elem_size != 4 && elem_size != 8 {
            return Err(Error::InvalidArg("query element size must be 4 or 8"));
        }
        let ctx = self.ctx();
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, buffer.raw());
        for i in 0..count {
            let raw = pool.0.queries[(first + i) as usize];
            let result = ctx.get_query_result(raw, !check_availability);
            let (value, available) = match result {
                Some(value) => (value, 1u64),
                None => (0, 0),
            };
            let write_offset = (offset + i as usize * stride) as isize;
            let bytes_wide;
            let bytes: [u8; 8];
            if elem_size == 8 {
                bytes = value.to_le_bytes();
                bytes_wide = 8;
            } else {
                bytes = (value as u32 as u64).to_le_bytes();
                bytes_wide = 4;
            }
            ctx.buffer_sub_data(gl::COPY_WRITE_BUFFER, write_offset, &bytes[..bytes_wide]);
            if check_availability {
                let avail_bytes = if elem_size == 8 {
                    available.to_le_bytes().to_vec()
                } else {
                    (available as u32).to_le_bytes().to_vec()
                };
                ctx.buffer_sub_data(
                    gl::COPY_WRITE_BUFFER,
                    write_offset + bytes_wide as isize,
                    &avail_bytes,
                );
            }
        }
        ctx.bind_buffer(gl::COPY_WRITE_BUFFER, 0);
        self.check("copy_query_values");
        Ok(())
    }

    fn bind_shader(
        &mut self,
        shader: &n::Shader,
        states: Option<&DynamicRenderStates>,
    ) -> Result<()> {
        let program_changed = self
            .bound_shader
            .as_ref()
            .map_or(true, |bound| bound.0.program != shader.0.program);
        if program_changed {
            self.ctx().use_program(shader.0.program);
        }
        let applied = state::update_state(
            self.ctx(),
            self.applied_state.as_ref(),
            shader.render_state(),
            states,
            self.invert_y,
            &self.share.info.limits,
            self.caps(),
        );
        self.applied_state = Some(applied);
        self.bound_shader = Some(shader.clone());
        Ok(())
    }

    fn set_texture(&mut self, slot: u32, texture: &n::Texture) -> Result<()> {
        let use_shadow = texture.info().format.is_depth();
        let samplers = if self.caps().contains(PrivateCaps::SAMPLER_OBJECT) {
            Some(self.ensure_samplers())
        } else {
            None
        };
        let ctx = self.ctx();
        ctx.active_texture(gl::TEXTURE0 + slot);
        ctx.bind_texture(texture.target(), texture.raw());
        if let Some((plain, shadow)) = samplers {
            ctx.bind_sampler(slot, if use_shadow { shadow } else { plain });
        }
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
        if !self.caps().contains(PrivateCaps::TEXTURE_BUFFER) {
            return Err(Error::NotSupported("texture buffers"));
        }
        let gl_format = self
            .share
            .formats
            .get(format)
            .filter(|f| f.caps.contains(crate::tex::FormatCaps::TEXTURE_BUFFER))
            .ok_or(Error::NotSupported("texture buffer format"))?;
        let internal = gl_format.internal;
        let size = count * format.block_size();
        if offset + size > buffer.size() {
            return Err(Error::IndexOutOfRange("texture buffer range"));
        }
        if self.texture_buffer_texture == 0 {
            self.texture_buffer_texture = self.ctx().create_texture();
        }
        let ctx = self.ctx();
        ctx.active_texture(gl::TEXTURE0 + slot);
        ctx.bind_texture(gl::TEXTURE_BUFFER, self.texture_buffer_texture);
        ctx.tex_buffer_range(internal, buffer.raw(), offset as isize, size as isize);
        Ok(())
    }

    fn set_shader_buffer(
        &mut self,
        slot: u32,
        buffer: &n::Buffer,
        offset: usize,
        size: usize,
    ) -> Result<()> {
        if offset + size > buffer.size() {
            return Err(Error::IndexOutOfRange("shader buffer range"));
        }
        let target = if buffer.usage().contains(hal::buffer::BufferUsage::UNIFORM_BLOCK) {
            gl::UNIFORM_BUFFER
        } else {
            gl::SHADER_STORAGE_BUFFER
        };
        self.ctx()
            .bind_buffer_range(target, slot, buffer.raw(), offset as isize, size as isize);
        Ok(())
    }

    fn set_uniform(&mut self, location: i32, ty: UniformType, data: &[u8]) -> Result<()> {
        if data.is_empty() || data.len() % ty.size() != 0 {
            return Err(Error::InvalidArg("uniform data size mismatch"));
        }
        let ctx = self.ctx();
        match ty {
            UniformType::Float => ctx.uniform_1fv(location, cast_slice(data)),
            UniformType::Vec2 => ctx.uniform_2fv(location, cast_slice(data)),
            UniformType::Vec3 => ctx.uniform_3fv(location, cast_slice(data)),
            UniformType::Vec4 => ctx.uniform_4fv(location, cast_slice(data)),
            UniformType::Int => ctx.uniform_1iv(location, cast_slice(data)),
            UniformType::IVec2 => ctx.uniform_2iv(location, cast_slice(data)),
            UniformType::IVec3 => ctx.uniform_3iv(location, cast_slice(data)),
            UniformType::IVec4 => ctx.uniform_4iv(location, cast_slice(data)),
            UniformType::Mat3 => ctx.uniform_matrix_3fv(location, cast_slice(data)),
            UniformType::Mat4 => ctx.uniform_matrix_4fv(location, cast_slice(data)),
        }
        Ok(())
    }

    fn update_dynamic_render_states(&mut self, states: &DynamicRenderStates) -> Result<()> {
        let shader = self
            .bound_shader
            .clone()
            .ok_or(Error::InvalidState("no shader bound"))?;
        let mut applied = match self.applied_state.take() {
            Some(applied) => applied,
            None => state::update_state(
                self.ctx(),
                None,
                shader.render_state(),
                Some(states),
                self.invert_y,
                &self.share.info.limits,
                self.caps(),
            ),
        };
        state::update_dynamic_state(
            self.ctx(),
            &mut applied,
            shader.render_state(),
            states,
            &self.share.info.limits,
            self.caps(),
        );
        self.applied_state = Some(applied);
        Ok(())
    }

    fn unbind_shader(&mut self) -> Result<()> {
        if self.bound_shader.take().is_some() {
            self.ctx().use_program(0);
        }
        Ok(())
    }

    fn bind_compute_shader(&mut self, shader: &n::Shader) -> Result<()> {
        if !self.legacy().contains(LegacyFeatures::COMPUTE) {
            return Err(Error::NotSupported("compute shaders"));
        }
        let changed = self
            .bound_compute
            .as_ref()
            .map_or(true, |bound| bound.0.program != shader.0.program);
        if changed {
            self.ctx().use_program(shader.0.program);
            self.bound_compute = Some(shader.clone());
        }
        Ok(())
    }

    fn unbind_compute_shader(&mut self) -> Result<()> {
        if self.bound_compute.take().is_some() {
            self.ctx().use_program(0);
        }
        Ok(())
    }

    fn begin_render_surface(&mut self, surface: &n::RenderSurface) -> Result<()> {
        if self.pass.is_some() {
            return Err(Error::InvalidState("surface change inside a render pass"));
        }
        self.ctx().make_current(surface.0.surface);
        // A context switch invalidates every cached binding.
        self.applied_state = None;
        self.bound_geometry = None;
        self.bound_shader = None;
        self.bound_compute = None;
        Ok(())
    }

    fn end_render_surface(&mut self, _surface: &n::RenderSurface) -> Result<()> {
        if self.pass.is_some() {
            return Err(Error::InvalidState("surface change inside a render pass"));
        }
        self.ctx().flush();
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &n::RenderPass,
        framebuffer: &n::Framebuffer,
        viewport: Option<Viewport>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        if self.pass.is_some() {
            return Err(Error::InvalidState("render pass already begun"));
        }
        if !Arc::ptr_eq(&render_pass.0, &framebuffer.0.render_pass.0) {
            return Err(Error::InvalidArg(
                "framebuffer was created for a different render pass",
            ));
        }

        self.pass = Some(PassState {
            render_pass: render_pass.clone(),
            framebuffer: framebuffer.clone(),
            clear_values: clear_values.iter().copied().collect(),
            subpass: 0,
        });
        self.set_viewport(viewport)?;
        self.issue_barrier(render_pass.0.boundary_barriers[0]);
        self.begin_subpass();
        Ok(())
    }

    fn next_subpass(&mut self) -> Result<()> {
        let (subpass, count, barrier) = match &self.pass {
            Some(pass) => (
                pass.subpass,
                pass.render_pass.subpass_count() as u32,
                pass.render_pass.0.boundary_barriers[pass.subpass as usize + 1],
            ),
            None => return Err(Error::InvalidState("no render pass begun")),
        };
        if subpass + 1 >= count {
            return Err(Error::IndexOutOfRange("no further subpasses"));
        }
        self.end_subpass();
        self.issue_barrier(barrier);
        self.pass.as_mut().unwrap().subpass += 1;
        self.begin_subpass();
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        let final_barrier = match &self.pass {
            Some(pass) => *pass.render_pass.0.boundary_barriers.last().unwrap(),
            None => return Err(Error::InvalidState("no render pass begun")),
        };
        self.end_subpass();
        self.issue_barrier(final_barrier);
        self.pass = None;
        self.invert_y = false;
        self.ctx().bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);

        // Fences requested during the pass are issued now, in order.
        if !self.queued_fences.is_empty() {
            let fences = std::mem::take(&mut self.queued_fences);
            self.issue_fences(&fences)?;
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Option<Viewport>) -> Result<()> {
        let pass = self
            .pass
            .as_ref()
            .ok_or(Error::InvalidState("viewport outside a render pass"))?;
        let (fb_width, fb_height) = pass.framebuffer.extent();
        let ctx = self.ctx();
        match viewport {
            Some(viewport) => {
                ctx.viewport(
                    viewport.x as i32,
                    viewport.y as i32,
                    viewport.width as i32,
                    viewport.height as i32,
                );
                ctx.depth_range(viewport.min_depth, viewport.max_depth);
            }
            None => {
                ctx.viewport(0, 0, fb_width as i32, fb_height as i32);
                ctx.depth_range(0.0, 1.0);
            }
        }
        Ok(())
    }

    fn clear_attachments(
        &mut self,
        attachments: &[ClearAttachment],
        regions: &[ClearRect],
    ) -> Result<()> {
        if self.pass.is_none() {
            return Err(Error::InvalidState(
                "clear_attachments is only valid inside a render pass",
            ));
        }
        if attachments.is_empty() || regions.is_empty() {
            return Err(Error::InvalidArg("empty attachment or region list"));
        }
        if !self.caps().contains(PrivateCaps::CLEAR_BUFFER) {
            return Err(Error::NotSupported("typed attachment clears"));
        }
        let saved = self.open_write_masks(true, true, true);
        let ctx = self.ctx();
        ctx.enable(gl::SCISSOR_TEST);
        for region in regions {
            ctx.scissor(
                region.rect.x,
                region.rect.y,
                region.rect.width as i32,
                region.rect.height as i32,
            );
            for attachment in attachments {
                match attachment {
                    ClearAttachment::Color { index, value } => match value {
                        ClearValue::ColorFloat(values) => {
                            ctx.clear_buffer_fv(gl::COLOR, *index as i32, *values)
                        }
                        ClearValue::ColorInt(values) => {
                            ctx.clear_buffer_iv(gl::COLOR, *index as i32, *values)
                        }
                        ClearValue::ColorUint(values) => {
                            ctx.clear_buffer_uiv(gl::COLOR, *index as i32, *values)
                        }
                        ClearValue::DepthStencil { .. } => {
                            return Err(Error::InvalidArg("color clear value expected"))
                        }
                    },
                    ClearAttachment::DepthStencil { depth, stencil } => match (depth, stencil) {
                        (Some(depth), Some(stencil)) => {
                            ctx.clear_buffer_depth_stencil(0, *depth, *stencil as i32)
                        }
                        (Some(depth), None) => {
                            ctx.clear_buffer_fv(gl::DEPTH, 0, [*depth, 0.0, 0.0, 0.0])
                        }
                        (None, Some(stencil)) => {
                            ctx.clear_buffer_iv(gl::STENCIL, 0, [*stencil as i32, 0, 0, 0])
                        }
                        (None, None) => return Err(Error::InvalidArg("nothing to clear")),
                    },
                }
            }
        }
        ctx.disable(gl::SCISSOR_TEST);
        self.restore_write_masks(saved);
        self.check("clear_attachments");
        Ok(())
    }

    fn draw(
        &mut self,
        geometry: &n::Geometry,
        range: DrawRange,
        primitive: PrimitiveType,
    ) -> Result<()> {
        if primitive == PrimitiveType::PatchList
            && !self.legacy().contains(LegacyFeatures::TESSELLATION)
        {
            return Err(Error::NotSupported("tessellation patches"));
        }
        self.bind_geometry(geometry, 0)?;
        let mode = conv::map_primitive(primitive);
        let ctx = self.ctx();
        if range.instance_count <= 1 && range.first_instance == 0 {
            ctx.draw_arrays(mode, range.first_vertex as i32, range.vertex_count as i32);
        } else if self.legacy().contains(LegacyFeatures::DRAW_INSTANCED) {
            if range.first_instance != 0 {
                return Err(Error::NotSupported("non-zero base instance"));
            }
            ctx.draw_arrays_instanced(
                mode,
                range.first_vertex as i32,
                range.vertex_count as i32,
                range.instance_count as i32,
            );
        } else {
            return Err(Error::NotSupported("instanced draws"));
        }
        self.check("draw");
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        geometry: &n::Geometry,
        range: DrawIndexedRange,
        primitive: PrimitiveType,
    ) -> Result<()> {
        let index = geometry
            .0
            .index
            .as_ref()
            .ok_or(Error::InvalidArg("geometry has no index buffer"))?
            .clone();
        let base_vertex = self.bind_geometry(geometry, range.vertex_offset)?;
        let mode = conv::map_primitive(primitive);
        let index_type = if index.index_size == 2 {
            gl::UNSIGNED_SHORT
        } else {
            gl::UNSIGNED_INT
        };
        let offset = index.offset + range.first_index as usize * index.index_size as usize;
        let count = range.index_count as i32;

        let ctx = self.ctx();
        if range.instance_count <= 1 && range.first_instance == 0 {
            if base_vertex == 0 {
                ctx.draw_elements(mode, count, index_type, offset);
            } else {
                ctx.draw_elements_base_vertex(mode, count, index_type, offset, base_vertex as i32);
            }
        } else if self.legacy().contains(LegacyFeatures::DRAW_INSTANCED) {
            if range.first_instance != 0 {
                return Err(Error::NotSupported("non-zero base instance"));
            }
            if base_vertex == 0 {
                ctx.draw_elements_instanced(
                    mode,
                    count,
                    index_type,
                    offset,
                    range.instance_count as i32,
                );
            } else if self
                .legacy()
                .contains(LegacyFeatures::DRAW_INDEXED_INSTANCED_BASE)
            {
                ctx.draw_elements_instanced_base_vertex(
                    mode,
                    count,
                    index_type,
                    offset,
                    range.instance_count as i32,
                    base_vertex as i32,
                );
            } else {
                return Err(Error::NotSupported(
                    "base vertex with instanced indexed draws",
                ));
            }
        } else {
            return Err(Error::NotSupported("instanced draws"));
        }
        self.check("draw_indexed");
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
        if !self.legacy().contains(LegacyFeatures::INDIRECT_EXECUTION) {
            return Err(Error::NotSupported("indirect draws"));
        }
        self.bind_geometry(geometry, 0)?;
        let mode = conv::map_primitive(primitive);
        let ctx = self.ctx();
        ctx.bind_buffer(gl::DRAW_INDIRECT_BUFFER, buffer.raw());
        for i in 0..count {
            ctx.draw_arrays_indirect(mode, offset + (i * stride) as usize);
        }
        ctx.bind_buffer(gl::DRAW_INDIRECT_BUFFER, 0);
        self.check("draw_indirect");
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
        if !self.legacy().contains(LegacyFeatures::INDIRECT_EXECUTION) {
            return Err(Error::NotSupported("indirect draws"));
        }
        let index = geometry
            .0
            .index
            .as_ref()
            .ok_or(Error::InvalidArg("geometry has no index buffer"))?;
        let index_type = if index.index_size == 2 {
            gl::UNSIGNED_SHORT
        } else {
            gl::UNSIGNED_INT
        };
        self.bind_geometry(geometry, 0)?;
        let mode = conv::map_primitive(primitive);
        let ctx = self.ctx();
        ctx.bind_buffer(gl::DRAW_INDIRECT_BUFFER, buffer.raw());
        for i in 0..count {
            ctx.draw_elements_indirect(mode, index_type, offset + (i * stride) as usize);
        }
        ctx.bind_buffer(gl::DRAW_INDIRECT_BUFFER, 0);
        self.check("draw_indexed_indirect");
        Ok(())
    }

    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        if !self.legacy().contains(LegacyFeatures::COMPUTE) {
            return Err(Error::NotSupported("compute dispatch"));
        }
        if self.bound_compute.is_none() {
            return Err(Error::InvalidState("no compute shader bound"));
        }
        self.ctx().dispatch_compute(x, y, z);
        self.check("dispatch_compute");
        Ok(())
    }

    fn dispatch_compute_indirect(&mut self, buffer: &n::Buffer, offset: usize) -> Result<()> {
        if !self.legacy().contains(LegacyFeatures::COMPUTE)
            || !self.legacy().contains(LegacyFeatures::INDIRECT_EXECUTION)
        {
            return Err(Error::NotSupported("indirect compute dispatch"));
        }
        if self.bound_compute.is_none() {
            return Err(Error::InvalidState("no compute shader bound"));
        }
        let ctx = self.ctx();
        ctx.bind_buffer(gl::DISPATCH_INDIRECT_BUFFER, buffer.raw());
        ctx.dispatch_compute_indirect(offset as isize);
        ctx.bind_buffer(gl::DISPATCH_INDIRECT_BUFFER, 0);
        self.check("dispatch_compute_indirect");
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
        let src_format = surface_format(&src);
        let dst_format = surface_format(&dst);
        let mask = blit_mask(src_format);
        if mask != blit_mask(dst_format) {
            return Err(Error::InvalidArg("blit surfaces have mismatched aspects"));
        }
        // Scaling filters only apply to color data.
        let gl_filter = if mask == gl::COLOR_BUFFER_BIT {
            conv::map_filter(filter)
        } else {
            gl::NEAREST
        };

        let previous_fbo = self.current_fbo();
        self.bind_read_surface(src);
        self.bind_draw_surface(dst);
        let ctx = self.ctx();
        for region in regions {
            ctx.blit_framebuffer(
                region.src_position.x as i32,
                region.src_position.y as i32,
                (region.src_position.x + region.src_width) as i32,
                (region.src_position.y + region.src_height) as i32,
                region.dst_position.x as i32,
                region.dst_position.y as i32,
                (region.dst_position.x + region.dst_width) as i32,
                (region.dst_position.y + region.dst_height) as i32,
                mask,
                gl_filter,
            );
        }
        ctx.bind_framebuffer(gl::READ_FRAMEBUFFER, 0);
        ctx.bind_framebuffer(gl::DRAW_FRAMEBUFFER, previous_fbo);
        self.check("blit_surface");
        Ok(())
    }

    fn push_debug_group(&mut self, name: &str) -> Result<()> {
        if self.caps().contains(PrivateCaps::DEBUG_GROUPS) {
            self.ctx().push_debug_group(name);
        }
        Ok(())
    }

    fn pop_debug_group(&mut self) -> Result<()> {
        if self.caps().contains(PrivateCaps::DEBUG_GROUPS) {
            self.ctx().pop_debug_group();
        }
        Ok(())
    }

    fn accepts_submits(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockContext;
    use crate::Adapter;
    use hal::buffer::{BufferUsage, MemoryFlags};
    use hal::Device as _;

    fn setup() -> (Arc<MockContext>, crate::Device, MainCommandBuffer) {
        let ctx = Arc::new(MockContext::new());
        let adapter = Adapter::new(ctx.clone(), 1);
        let device = adapter.device();
        let main = adapter.main_command_buffer();
        (ctx, device, main)
    }

    fn make_buffer(device: &crate::Device, size: usize) -> n::Buffer {
        device
            .create_buffer(
                BufferUsage::VERTEX | BufferUsage::COPY_TO,
                MemoryFlags::STATIC | MemoryFlags::DRAW,
                size,
                None,
            )
            .unwrap()
    }

    #[test]
    fn copy_buffer_data_binds_and_uploads() {
        let (ctx, device, mut main) = setup();
        let buffer = make_buffer(&device, 64);
        ctx.take_calls();
        main.copy_buffer_data(&buffer, 16, &[1, 2, 3, 4]).unwrap();
        let calls = ctx.take_calls();
        assert!(calls.iter().any(|c| c.starts_with("buffer_sub_data") && c.contains("16, 4 bytes")));
    }

    #[test]
    fn out_of_range_copy_is_rejected() {
        let (_ctx, device, mut main) = setup();
        let buffer = make_buffer(&device, 8);
        assert!(matches!(
            main.copy_buffer_data(&buffer, 8, &[1]),
            Err(Error::IndexOutOfRange(_))
        ));
    }

    #[test]
    fn fences_issue_immediately_outside_a_pass() {
        let (ctx, device, mut main) = setup();
        let fence = device.create_fence();
        ctx.take_calls();
        main.set_fence_syncs(&[fence.clone()]).unwrap();
        assert!(fence.is_set());
        let calls = ctx.take_calls();
        assert!(calls.iter().any(|c| c.starts_with("fence_sync")));
        assert!(main.wait_fence(&fence, 1000).unwrap());
    }

    #[test]
    fn fences_queue_inside_a_pass() {
        use hal::format::{ChannelType, SurfaceType};
        use hal::image::{TextureInfo, TextureUsage};
        use hal::pass::*;

        let (ctx, device, mut main) = setup();
        let format = hal::format::Format::Standard(SurfaceType::Rgba8, ChannelType::Unorm);
        let render_pass = device
            .create_render_pass(RenderPassDesc {
                attachments: vec![Attachment {
                    format,
                    samples: 1,
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::Store,
                    stencil_load_op: LoadOp::DontCare,
                    stencil_store_op: StoreOp::DontCare,
                }],
                subpasses: vec![SubpassDesc {
                    input_attachments: vec![],
                    color_attachments: vec![AttachmentRef {
                        index: 0,
                        resolve: false,
                    }],
                    depth_stencil_attachment: None,
                }],
                dependencies: vec![],
            })
            .unwrap();
        let texture = device
            .create_texture(
                &TextureInfo::new_2d(format, 16, 16),
                TextureUsage::TEXTURE | TextureUsage::OFFSCREEN,
                MemoryFlags::GPU_ONLY,
                None,
            )
            .unwrap();
        let framebuffer = device
            .create_framebuffer(&render_pass, &[n::Surface::Texture(texture)], 16, 16)
            .unwrap();

        let fence = device.create_fence();
        main.begin_render_pass(
            &render_pass,
            &framebuffer,
            None,
            &[ClearValue::ColorFloat([0.0; 4])],
        )
        .unwrap();
        ctx.take_calls();
        main.set_fence_syncs(&[fence.clone()]).unwrap();
        // Queued, not issued: no driver call and the fence is unset.
        assert!(ctx.take_calls().is_empty());
        assert!(!fence.is_set());

        main.end_render_pass().unwrap();
        assert!(fence.is_set());
        assert!(ctx.take_calls().iter().any(|c| c.starts_with("fence_sync")));
    }

    #[test]
    fn render_pass_clears_typed_buffers() {
        use hal::format::{ChannelType, SurfaceType};
        use hal::image::{TextureInfo, TextureUsage};
        use hal::pass::*;

        let (ctx, device, mut main) = setup();
        let format = hal::format::Format::Standard(SurfaceType::Rgba8, ChannelType::Unorm);
        let render_pass = device
            .create_render_pass(RenderPassDesc {
                attachments: vec![Attachment {
                    format,
                    samples: 1,
                    load_op: LoadOp::Clear,
                    store_op: StoreOp::Store,
                    stencil_load_op: LoadOp::DontCare,
                    stencil_store_op: StoreOp::DontCare,
                }],
                subpasses: vec![SubpassDesc {
                    input_attachments: vec![],
                    color_attachments: vec![AttachmentRef {
                        index: 0,
                        resolve: false,
                    }],
                    depth_stencil_attachment: None,
                }],
                dependencies: vec![],
            })
            .unwrap();
        let texture = device
            .create_texture(
                &TextureInfo::new_2d(format, 16, 16),
                TextureUsage::TEXTURE | TextureUsage::OFFSCREEN,
                MemoryFlags::GPU_ONLY,
                None,
            )
            .unwrap();
        let framebuffer = device
            .create_framebuffer(&render_pass, &[n::Surface::Texture(texture)], 16, 16)
            .unwrap();

        ctx.take_calls();
        main.begin_render_pass(
            &render_pass,
            &framebuffer,
            None,
            &[ClearValue::ColorFloat([1.0, 0.0, 0.0, 1.0])],
        )
        .unwrap();
        let calls = ctx.take_calls();
        assert!(calls.iter().any(|c| c.starts_with("clear_buffer_fv")));
        main.end_render_pass().unwrap();
    }

    #[test]
    fn draw_rebinds_geometry_only_on_change() {
        let (ctx, device, mut main) = setup();
        let vertex_buffer = make_buffer(&device, 1024);
        let format = hal::buffer::VertexFormat {
            attributes: vec![hal::buffer::VertexAttribute {
                location: 0,
                format: hal::format::Format::Standard(
                    hal::format::SurfaceType::Rg32,
                    hal::format::ChannelType::Float,
                ),
                offset: 0,
            }],
            stride: 8,
        };
        let geometry = device
            .create_geometry(
                &[hal::buffer::VertexBufferBinding {
                    buffer: &vertex_buffer,
                    offset: 0,
                    count: 128,
                    format,
                }],
                None,
            )
            .unwrap();

        ctx.take_calls();
        let range = DrawRange {
            vertex_count: 3,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        };
        main.draw(&geometry, range, PrimitiveType::TriangleList).unwrap();
        let first = ctx.take_calls();
        assert!(first.iter().any(|c| c.starts_with("bind_vertex_array")));

        main.draw(&geometry, range, PrimitiveType::TriangleList).unwrap();
        let second = ctx.take_calls();
        assert!(!second.iter().any(|c| c.starts_with("bind_vertex_array")));
        assert!(second.iter().any(|c| c.starts_with("draw_arrays")));
    }

    #[test]
    fn temp_renderbuffer_cache_reuses_and_evicts() {
        let ctx = MockContext::new();
        let mut cache = TempRenderbuffers::default();
        let a = cache.get(&ctx, 64, 64, 1);
        assert_eq!(cache.get(&ctx, 64, 64, 1), a);
        let _b = cache.get(&ctx, 32, 32, 1);
        let _c = cache.get(&ctx, 16, 16, 1);
        let _d = cache.get(&ctx, 8, 8, 1);
        ctx.take_calls();
        // A fifth distinct size evicts the least recently used entry,
        // which is the 32x32 one (64x64 was touched more recently).
        let _e = cache.get(&ctx, 4, 4, 1);
        let calls = ctx.take_calls();
        assert!(calls.iter().any(|c| c.starts_with("delete_renderbuffer")));
        // The 64x64 entry survived.
        ctx.take_calls();
        assert_eq!(cache.get(&ctx, 64, 64, 1), a);
        assert!(ctx.take_calls().is_empty());
    }
}
