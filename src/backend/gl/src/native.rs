//! Native resource handles.
//!
//! Every handle is a shared-ownership wrapper over the raw driver object:
//! cloning takes an internal reference, dropping releases it. The driver
//! object itself cannot be deleted from an arbitrary thread, so the last
//! drop pushes the raw name onto the shared reclaim queue, which the device
//! drains on the driver thread at frame boundaries.

use std::sync::Arc;

use parking_lot::Mutex;

use hal::buffer::{BufferUsage, MapFlags, MemoryFlags, VertexFormat};
use hal::image::{TextureDim, TextureInfo, TextureUsage};
use hal::pass::RenderPassDesc;
use hal::pso::RenderState;
use hal::query::QueryType;
use hal::{Error, Result};

use crate::gl::{consts, Object, SyncHandle};

/// A raw driver object queued for deletion.
#[derive(Debug)]
pub(crate) enum Reclaim {
    Buffer(Object),
    Texture(Object),
    Renderbuffer(Object),
    Framebuffer(Object),
    VertexArray(Object),
    Queries(Vec<Object>),
    Program(Object),
    Sync(SyncHandle),
}

/// Deletion queue shared by all resources of one adapter.
#[derive(Debug, Default)]
pub(crate) struct ReclaimQueue {
    pending: Mutex<Vec<Reclaim>>,
}

impl ReclaimQueue {
    pub(crate) fn push(&self, item: Reclaim) {
        self.pending.lock().push(item);
    }

    pub(crate) fn drain(&self) -> Vec<Reclaim> {
        std::mem::take(&mut *self.pending.lock())
    }
}

/// Host-side state of a buffer mapping.
#[derive(Debug, Default)]
pub(crate) struct MapState {
    /// `(offset, size, flags)` of the active mapping.
    pub range: Option<(usize, usize, MapFlags)>,
    /// Host mirror used when the driver cannot map directly.
    pub shadow: Option<Vec<u8>>,
    /// Whether the active mapping is a real driver mapping.
    pub driver_mapped: bool,
}

#[derive(Debug)]
pub(crate) struct BufferInner {
    pub raw: Object,
    pub size: usize,
    pub usage: BufferUsage,
    pub memory: MemoryFlags,
    pub map: Mutex<MapState>,
    reclaim: Arc<ReclaimQueue>,
}

impl Drop for BufferInner {
    fn drop(&mut self) {
        self.reclaim.push(Reclaim::Buffer(self.raw));
    }
}

/// A GPU data buffer.
#[derive(Clone, Debug)]
pub struct Buffer(pub(crate) Arc<BufferInner>);

impl Buffer {
    pub(crate) fn new(
        raw: Object,
        size: usize,
        usage: BufferUsage,
        memory: MemoryFlags,
        reclaim: Arc<ReclaimQueue>,
    ) -> Self {
        Buffer(Arc::new(BufferInner {
            raw,
            size,
            usage,
            memory,
            map: Mutex::new(MapState::default()),
            reclaim,
        }))
    }

    /// Raw driver name.
    pub fn raw(&self) -> Object {
        self.0.raw
    }

    /// Byte size of the buffer.
    pub fn size(&self) -> usize {
        self.0.size
    }

    /// Usage the buffer was created with.
    pub fn usage(&self) -> BufferUsage {
        self.0.usage
    }
}

#[derive(Debug)]
pub(crate) struct TextureInner {
    pub raw: Object,
    pub target: u32,
    pub info: TextureInfo,
    pub usage: TextureUsage,
    reclaim: Arc<ReclaimQueue>,
}

impl Drop for TextureInner {
    fn drop(&mut self) {
        self.reclaim.push(Reclaim::Texture(self.raw));
    }
}

/// A sampled or renderable texture.
#[derive(Clone, Debug)]
pub struct Texture(pub(crate) Arc<TextureInner>);

impl PartialEq for Texture {
    fn eq(&self, other: &Texture) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Texture {
    pub(crate) fn new(
        raw: Object,
        info: TextureInfo,
        usage: TextureUsage,
        reclaim: Arc<ReclaimQueue>,
    ) -> Self {
        Texture(Arc::new(TextureInner {
            raw,
            target: texture_target(&info),
            info,
            usage,
            reclaim,
        }))
    }

    /// Raw driver name.
    pub fn raw(&self) -> Object {
        self.0.raw
    }

    /// The bind target matching the texture's dimensionality.
    pub fn target(&self) -> u32 {
        self.0.target
    }

    /// Description the texture was created with.
    pub fn info(&self) -> &TextureInfo {
        &self.0.info
    }
}

/// The bind target for a texture description.
pub(crate) fn texture_target(info: &TextureInfo) -> u32 {
    match info.dim {
        TextureDim::Dim1D => {
            if info.depth > 0 {
                consts::TEXTURE_1D_ARRAY
            } else {
                consts::TEXTURE_1D
            }
        }
        TextureDim::Dim2D => {
            if info.samples > 1 {
                consts::TEXTURE_2D_MULTISAMPLE
            } else if info.depth > 0 {
                consts::TEXTURE_2D_ARRAY
            } else {
                consts::TEXTURE_2D
            }
        }
        TextureDim::Dim3D => consts::TEXTURE_3D,
        TextureDim::Cube => consts::TEXTURE_CUBE_MAP,
    }
}

#[derive(Debug)]
pub(crate) struct RenderbufferInner {
    pub raw: Object,
    pub format: hal::format::Format,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    reclaim: Arc<ReclaimQueue>,
}

impl Drop for RenderbufferInner {
    fn drop(&mut self) {
        self.reclaim.push(Reclaim::Renderbuffer(self.raw));
    }
}

/// A render-only surface without sampling capability.
#[derive(Clone, Debug)]
pub struct Renderbuffer(pub(crate) Arc<RenderbufferInner>);

impl Renderbuffer {
    pub(crate) fn new(
        raw: Object,
        format: hal::format::Format,
        width: u32,
        height: u32,
        samples: u32,
        reclaim: Arc<ReclaimQueue>,
    ) -> Self {
        Renderbuffer(Arc::new(RenderbufferInner {
            raw,
            format,
            width,
            height,
            samples,
            reclaim,
        }))
    }

    /// Raw driver name.
    pub fn raw(&self) -> Object {
        self.0.raw
    }
}

/// One vertex buffer bound into a geometry.
#[derive(Clone, Debug)]
pub(crate) struct VertexBinding {
    pub buffer: Buffer,
    pub offset: usize,
    pub format: VertexFormat,
}

/// The index buffer bound into a geometry.
#[derive(Clone, Debug)]
pub(crate) struct IndexBinding {
    pub buffer: Buffer,
    pub offset: usize,
    pub index_size: u32,
}

#[derive(Debug)]
pub(crate) struct GeometryInner {
    /// 0 when vertex array objects are unsupported.
    pub vao: Object,
    pub vertex_buffers: Vec<VertexBinding>,
    pub index: Option<IndexBinding>,
    reclaim: Arc<ReclaimQueue>,
}

impl Drop for GeometryInner {
    fn drop(&mut self) {
        if self.vao != 0 {
            self.reclaim.push(Reclaim::VertexArray(self.vao));
        }
    }
}

/// Vertex and index buffers packaged for drawing.
#[derive(Clone, Debug)]
pub struct Geometry(pub(crate) Arc<GeometryInner>);

impl Geometry {
    pub(crate) fn new(
        vao: Object,
        vertex_buffers: Vec<VertexBinding>,
        index: Option<IndexBinding>,
        reclaim: Arc<ReclaimQueue>,
    ) -> Self {
        Geometry(Arc::new(GeometryInner {
            vao,
            vertex_buffers,
            index,
            reclaim,
        }))
    }
}

/// A window or offscreen presentation surface. The raw name identifies the
/// driver-provided default framebuffer of the surface.
#[derive(Clone, Debug)]
pub struct RenderSurface(pub(crate) Arc<RenderSurfaceInner>);

#[derive(Debug)]
pub(crate) struct RenderSurfaceInner {
    pub surface: Object,
    pub width: u32,
    pub height: u32,
}

impl RenderSurface {
    /// Wrap a driver surface handle.
    pub fn new(surface: Object, width: u32, height: u32) -> Self {
        RenderSurface(Arc::new(RenderSurfaceInner {
            surface,
            width,
            height,
        }))
    }
}

/// A compiled render pass with precomputed subpass boundary barriers.
#[derive(Clone, Debug)]
pub struct RenderPass(pub(crate) Arc<RenderPassInner>);

#[derive(Debug)]
pub(crate) struct RenderPassInner {
    pub desc: RenderPassDesc,
    /// GL barrier bit mask implied before each subpass; the last entry is
    /// the `N-1 -> External` barrier issued at render pass end.
    pub boundary_barriers: Vec<u32>,
}

impl RenderPass {
    /// Subpass count.
    pub fn subpass_count(&self) -> usize {
        self.0.desc.subpasses.len()
    }
}

/// An attachment or presentation surface bound into a framebuffer.
#[derive(Clone, Debug)]
pub enum Surface {
    Texture(Texture),
    Renderbuffer(Renderbuffer),
    RenderSurface(RenderSurface),
}

/// A multisampled attachment backed by an internal renderbuffer that is
/// resolved into its single-sample surface at subpass end.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvePair {
    /// Index into the render pass attachment list.
    pub attachment: u32,
    /// The internal multisampled renderbuffer bound in the framebuffer.
    pub renderbuffer: Object,
}

#[derive(Debug)]
pub(crate) struct FramebufferInner {
    /// One driver framebuffer per subpass; 0 denotes the default surface.
    pub fbos: Vec<Object>,
    pub attachments: Vec<Surface>,
    pub resolves: Vec<ResolvePair>,
    pub render_pass: RenderPass,
    pub width: u32,
    pub height: u32,
    reclaim: Arc<ReclaimQueue>,
}

impl Drop for FramebufferInner {
    fn drop(&mut self) {
        for &fbo in &self.fbos {
            if fbo != 0 {
                self.reclaim.push(Reclaim::Framebuffer(fbo));
            }
        }
        for resolve in &self.resolves {
            self.reclaim.push(Reclaim::Renderbuffer(resolve.renderbuffer));
        }
    }
}

/// A set of attachments to render into.
#[derive(Clone, Debug)]
pub struct Framebuffer(pub(crate) Arc<FramebufferInner>);

impl Framebuffer {
    pub(crate) fn new(
        fbos: Vec<Object>,
        attachments: Vec<Surface>,
        resolves: Vec<ResolvePair>,
        render_pass: RenderPass,
        width: u32,
        height: u32,
        reclaim: Arc<ReclaimQueue>,
    ) -> Self {
        Framebuffer(Arc::new(FramebufferInner {
            fbos,
            attachments,
            resolves,
            render_pass,
            width,
            height,
            reclaim,
        }))
    }

    /// Dimensions of the framebuffer.
    pub fn extent(&self) -> (u32, u32) {
        (self.0.width, self.0.height)
    }
}

#[derive(Debug)]
pub(crate) struct ShaderInner {
    pub program: Object,
    pub render_state: RenderState,
    reclaim: Arc<ReclaimQueue>,
}

impl Drop for ShaderInner {
    fn drop(&mut self) {
        self.reclaim.push(Reclaim::Program(self.program));
    }
}

/// An opaque shader program together with its baked render state.
#[derive(Clone, Debug)]
pub struct Shader(pub(crate) Arc<ShaderInner>);

impl Shader {
    pub(crate) fn new(program: Object, render_state: RenderState, reclaim: Arc<ReclaimQueue>) -> Self {
        Shader(Arc::new(ShaderInner {
            program,
            render_state,
            reclaim,
        }))
    }

    /// The render state the shader was created with.
    pub fn render_state(&self) -> &RenderState {
        &self.0.render_state
    }
}

#[derive(Debug)]
pub(crate) struct QueryPoolInner {
    pub queries: Vec<Object>,
    pub ty: QueryType,
    reclaim: Arc<ReclaimQueue>,
}

impl Drop for QueryPoolInner {
    fn drop(&mut self) {
        self.reclaim
            .push(Reclaim::Queries(std::mem::take(&mut self.queries)));
    }
}

/// A pool of queries.
#[derive(Clone, Debug)]
pub struct QueryPool(pub(crate) Arc<QueryPoolInner>);

impl QueryPool {
    pub(crate) fn new(queries: Vec<Object>, ty: QueryType, reclaim: Arc<ReclaimQueue>) -> Self {
        QueryPool(Arc::new(QueryPoolInner { queries, ty, reclaim }))
    }

    /// Number of queries in the pool.
    pub fn count(&self) -> u32 {
        self.0.queries.len() as u32
    }
}

/// The inner level of a fence: owns the driver sync handle.
#[derive(Debug)]
pub(crate) struct FenceSync {
    pub handle: SyncHandle,
    reclaim: Arc<ReclaimQueue>,
}

impl FenceSync {
    pub(crate) fn new(handle: SyncHandle, reclaim: Arc<ReclaimQueue>) -> Self {
        FenceSync { handle, reclaim }
    }
}

impl Drop for FenceSync {
    fn drop(&mut self) {
        self.reclaim.push(Reclaim::Sync(self.handle));
    }
}

#[derive(Debug, Default)]
pub(crate) struct SyncRefInner {
    pub sync: Mutex<Option<Arc<FenceSync>>>,
}

/// The outer level of a fence: a client-visible slot that a command buffer
/// fills with a sync object when the fenced work is submitted.
#[derive(Clone, Debug, Default)]
pub struct SyncRef(pub(crate) Arc<SyncRefInner>);

impl SyncRef {
    /// An unset fence.
    pub fn new() -> Self {
        SyncRef::default()
    }

    /// Whether the fence currently holds a sync object.
    pub fn is_set(&self) -> bool {
        self.0.sync.lock().is_some()
    }

    /// Clear the fence so it can be set again.
    pub fn reset(&self) {
        *self.0.sync.lock() = None;
    }

    pub(crate) fn set(&self, sync: Arc<FenceSync>) -> Result<()> {
        let mut slot = self.0.sync.lock();
        if slot.is_some() {
            return Err(Error::PermissionDenied("fence set twice without reset"));
        }
        *slot = Some(sync);
        Ok(())
    }

    pub(crate) fn current(&self) -> Option<Arc<FenceSync>> {
        self.0.sync.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reclaim() -> Arc<ReclaimQueue> {
        Arc::new(ReclaimQueue::default())
    }

    #[test]
    fn buffer_reclaims_on_last_drop() {
        let queue = reclaim();
        let buffer = Buffer::new(7, 64, BufferUsage::VERTEX, MemoryFlags::STATIC, queue.clone());
        let clone = buffer.clone();
        drop(buffer);
        assert!(queue.drain().is_empty());
        drop(clone);
        let drained = queue.drain();
        assert!(matches!(drained.as_slice(), [Reclaim::Buffer(7)]));
    }

    #[test]
    fn fence_set_twice_is_denied() {
        let queue = reclaim();
        let fence = SyncRef::new();
        assert!(!fence.is_set());
        fence.set(Arc::new(FenceSync::new(1, queue.clone()))).unwrap();
        assert!(fence.is_set());
        let again = fence.set(Arc::new(FenceSync::new(2, queue.clone())));
        assert!(matches!(again, Err(Error::PermissionDenied(_))));
        fence.reset();
        fence.set(Arc::new(FenceSync::new(3, queue))).unwrap();
    }

    #[test]
    fn fence_sync_reclaims_handle() {
        let queue = reclaim();
        let fence = SyncRef::new();
        fence.set(Arc::new(FenceSync::new(42, queue.clone()))).unwrap();
        fence.reset();
        let drained = queue.drain();
        assert!(matches!(drained.as_slice(), [Reclaim::Sync(42)]));
    }
}
