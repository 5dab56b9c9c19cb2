#![warn(missing_docs)]

//! Hardware abstraction for the vector image renderer. Mostly operates on
//! data, not driver objects: concrete resources are associated types of a
//! [`Backend`], created through its [`Device`] and recorded against through
//! the [`command::CommandBuffer`] trait.

#[macro_use]
extern crate bitflags;

use std::fmt::Debug;

pub use self::error::{Error, Result};

pub mod buffer;
pub mod command;
pub mod error;
pub mod format;
pub mod image;
pub mod memory;
pub mod pass;
pub mod pso;
pub mod query;

/// Draw vertex count.
pub type VertexCount = u32;
/// Draw index count.
pub type IndexCount = u32;
/// Draw instance count.
pub type InstanceCount = u32;

/// The types a concrete graphics backend provides.
///
/// All resource handles use shared ownership: cloning a handle takes an
/// internal reference, dropping releases it, and the backing driver object
/// is destroyed only when the last handle goes away. Command buffers rely
/// on exactly this — clone on record, drop on reset.
pub trait Backend: Sized + Debug + 'static {
    /// Resource-creating device.
    type Device: Device<Self>;
    /// A GPU data buffer.
    type Buffer: Debug + Clone + Send + Sync;
    /// A sampled or renderable texture. Equality is handle identity, used
    /// to coalesce draw pieces by bound texture.
    type Texture: Debug + Clone + Send + Sync + PartialEq;
    /// A render-only surface without sampling capability.
    type Renderbuffer: Debug + Clone;
    /// Vertex/index buffer bindings packaged for drawing.
    type Geometry: Debug + Clone;
    /// A set of attachments to render into.
    type Framebuffer: Debug + Clone;
    /// A compiled render pass description.
    type RenderPass: Debug + Clone;
    /// A window or offscreen presentation surface.
    type RenderSurface: Debug + Clone;
    /// An opaque shader program.
    type Shader: Debug + Clone;
    /// A pool of queries.
    type QueryPool: Debug + Clone;
    /// A client-visible reference to a GPU sync point.
    type SyncRef: Debug + Clone;
}

/// Resource creation interface of a backend.
///
/// Creation calls are safe from any thread holding a resource context;
/// see the backend for context claiming.
pub trait Device<B: Backend> {
    /// Create a buffer, optionally with initial contents.
    fn create_buffer(
        &self,
        usage: buffer::BufferUsage,
        memory: buffer::MemoryFlags,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<B::Buffer>;

    /// Create a texture, optionally with initial contents for the base
    /// level of every layer.
    fn create_texture(
        &self,
        info: &image::TextureInfo,
        usage: image::TextureUsage,
        memory: buffer::MemoryFlags,
        data: Option<&[u8]>,
    ) -> Result<B::Texture>;

    /// Package vertex and index buffers for drawing.
    fn create_geometry(
        &self,
        vertex_buffers: &[buffer::VertexBufferBinding<B>],
        index_buffer: Option<buffer::IndexBufferBinding<B>>,
    ) -> Result<B::Geometry>;

    /// Whether the format can be sampled as a texture.
    fn texture_format_supported(&self, format: format::Format) -> bool;

    /// Whether the format can source vertex attributes.
    fn vertex_format_supported(&self, format: format::Format) -> bool;

    /// Largest supported texture extent.
    fn max_texture_size(&self) -> u32;
}
