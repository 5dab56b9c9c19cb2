//! Pipeline stages, access masks and memory barriers.

bitflags! {
    /// Stages of the graphics and compute pipelines, used to scope
    /// barriers and subpass dependencies.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PipelineStages: u32 {
        const TOP = 0x1;
        const DRAW_INDIRECT = 0x2;
        const VERTEX_INPUT = 0x4;
        const VERTEX_SHADER = 0x8;
        const FRAGMENT_SHADER = 0x10;
        const EARLY_FRAGMENT_TESTS = 0x20;
        const LATE_FRAGMENT_TESTS = 0x40;
        const COLOR_OUTPUT = 0x80;
        const COMPUTE_SHADER = 0x100;
        const TRANSFER = 0x200;
        const BOTTOM = 0x400;
        const HOST = 0x800;
        const ALL_GRAPHICS = 0x1000;
        const ALL_COMMANDS = 0x2000;
    }
}

bitflags! {
    /// Memory access types, used to scope barriers and subpass
    /// dependencies.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Access: u32 {
        const INDIRECT_COMMAND_READ = 0x1;
        const INDEX_READ = 0x2;
        const VERTEX_ATTRIBUTE_READ = 0x4;
        const UNIFORM_READ = 0x8;
        const INPUT_ATTACHMENT_READ = 0x10;
        const SHADER_READ = 0x20;
        const SHADER_WRITE = 0x40;
        const COLOR_ATTACHMENT_READ = 0x80;
        const COLOR_ATTACHMENT_WRITE = 0x100;
        const DEPTH_STENCIL_READ = 0x200;
        const DEPTH_STENCIL_WRITE = 0x400;
        const TRANSFER_READ = 0x800;
        const TRANSFER_WRITE = 0x1000;
        const HOST_READ = 0x2000;
        const HOST_WRITE = 0x4000;
        const MEMORY_READ = 0x8000;
        const MEMORY_WRITE = 0x10000;
    }
}

/// One element of a memory barrier: which prior writes must be visible to
/// which subsequent accesses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryBarrier {
    pub before_access: Access,
    pub after_access: Access,
}
