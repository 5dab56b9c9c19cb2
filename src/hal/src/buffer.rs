//! Graphics buffer usage, memory and mapping flags, and vertex layouts.

use crate::format::Format;
use crate::Backend;

bitflags! {
    /// How a buffer will be bound by the pipeline.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BufferUsage: u32 {
        /// Source of vertex data.
        const VERTEX = 0x1;
        /// Source of index data.
        const INDEX = 0x2;
        /// Source of indirect draw/dispatch arguments.
        const INDIRECT = 0x4;
        /// Bound as a uniform block.
        const UNIFORM_BLOCK = 0x8;
        /// Bound as a texture buffer.
        const TEXTURE_BUFFER = 0x10;
        /// Source of copy operations.
        const COPY_FROM = 0x20;
        /// Destination of copy operations.
        const COPY_TO = 0x40;
    }
}

bitflags! {
    /// Where and how buffer or texture memory lives.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MemoryFlags: u32 {
        /// Never accessed on the host after creation.
        const GPU_ONLY = 0x1;
        /// Written once, drawn many times.
        const STATIC = 0x2;
        /// Updated occasionally.
        const DYNAMIC = 0x4;
        /// Re-written nearly every use.
        const STREAM = 0x8;
        /// Used as a draw source.
        const DRAW = 0x10;
        /// Read back on the host.
        const READ = 0x20;
        /// Mappable while in use by the device.
        const PERSISTENT = 0x40;
        /// Host writes don't require an explicit flush.
        const COHERENT = 0x80;
    }
}

bitflags! {
    /// Requested behavior of a buffer map operation.
    ///
    /// Backends honor these directly when the driver supports them and
    /// otherwise emulate with a shadow copy uploaded on unmap/flush.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MapFlags: u32 {
        /// The mapped range will be read.
        const READ = 0x1;
        /// The mapped range will be written.
        const WRITE = 0x2;
        /// Keep the mapping alive across device use.
        const PERSISTENT = 0x4;
        /// The previous contents of the whole buffer may be discarded.
        const ORPHAN = 0x8;
        /// Block until pending device access to the range finishes.
        const SYNCHRONIZE = 0x10;
        /// Writes through the mapping are visible to the device without
        /// an explicit flush.
        const COHERENT = 0x20;
    }
}

/// A single attribute inside a vertex layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexAttribute {
    /// Shader attribute location.
    pub location: u32,
    /// Format of the attribute data.
    pub format: Format,
    /// Byte offset from the start of a vertex.
    pub offset: u32,
}

/// Layout of the vertices inside one vertex buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexFormat {
    /// The enabled attributes.
    pub attributes: Vec<VertexAttribute>,
    /// Byte stride between consecutive vertices.
    pub stride: u32,
}

/// A vertex buffer binding used to create draw geometry.
#[derive(Debug)]
pub struct VertexBufferBinding<'a, B: Backend> {
    /// Buffer holding the vertex data.
    pub buffer: &'a B::Buffer,
    /// Byte offset of the first vertex.
    pub offset: usize,
    /// Number of vertices.
    pub count: u32,
    /// Layout of each vertex.
    pub format: VertexFormat,
}

/// An index buffer binding used to create draw geometry.
#[derive(Debug)]
pub struct IndexBufferBinding<'a, B: Backend> {
    /// Buffer holding the index data.
    pub buffer: &'a B::Buffer,
    /// Byte offset of the first index.
    pub offset: usize,
    /// Number of indices.
    pub count: u32,
    /// Size of one index in bytes (2 or 4).
    pub index_size: u32,
}
