//! OpenGL-style backend.
//!
//! The driver is consumed through the [`gl::Context`] trait; everything
//! else — resource creation, the live and deferred command buffers, state
//! diffing and the format capability table — is driver-agnostic and can be
//! exercised against the call-recording [`mock::MockContext`].

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate log;

use std::sync::Arc;

use parking_lot::Mutex;

use hal::{Error, Result};

pub mod command;
mod conv;
pub mod device;
pub mod gl;
pub mod info;
pub mod mock;
pub mod native;
pub mod queue;
mod state;
pub mod tex;

pub use command::DeferredCommandBuffer;
pub use device::Device;
pub use queue::MainCommandBuffer;

/// State shared by every object created from one adapter.
#[derive(Debug)]
pub struct Share {
    /// The driver interface.
    pub context: Arc<dyn gl::Context>,
    /// Probed driver information and capability sets.
    pub info: info::Info,
    /// Format capability table seeded from `info`.
    pub formats: tex::FormatTable,
    pub(crate) reclaim: Arc<native::ReclaimQueue>,
    contexts: ResourceContexts,
}

impl Share {
    /// Delete every driver object whose last handle was dropped. Must be
    /// called on the driver thread; the live command buffer does so at
    /// frame boundaries.
    pub fn drain_reclaimed(&self) {
        for item in self.reclaim.drain() {
            match item {
                native::Reclaim::Buffer(raw) => self.context.delete_buffer(raw),
                native::Reclaim::Texture(raw) => self.context.delete_texture(raw),
                native::Reclaim::Renderbuffer(raw) => self.context.delete_renderbuffer(raw),
                native::Reclaim::Framebuffer(raw) => self.context.delete_framebuffer(raw),
                native::Reclaim::VertexArray(raw) => self.context.delete_vertex_array(raw),
                native::Reclaim::Queries(queries) => {
                    for query in queries {
                        self.context.delete_query(query);
                    }
                }
                native::Reclaim::Program(raw) => self.context.delete_program(raw),
                native::Reclaim::Sync(handle) => self.context.delete_sync(handle),
            }
        }
    }
}

/// Claimable slots that allow worker threads to create resources. The
/// mutex guards claim and release only; a claimed context is single-owner.
#[derive(Debug)]
struct ResourceContexts {
    claimed: Mutex<Vec<bool>>,
}

impl ResourceContexts {
    fn new(count: usize) -> Self {
        ResourceContexts {
            claimed: Mutex::new(vec![false; count]),
        }
    }
}

/// A claimed resource context. Dropping releases the slot.
#[derive(Debug)]
pub struct ResourceContext {
    share: Arc<Share>,
    slot: usize,
}

impl ResourceContext {
    /// A device that creates resources through this context.
    pub fn device(&self) -> Device {
        Device::new(self.share.clone())
    }
}

impl Drop for ResourceContext {
    fn drop(&mut self) {
        self.share.contexts.claimed.lock()[self.slot] = false;
    }
}

/// Entry point of the backend: wraps a driver context, probes its
/// capabilities once, and hands out devices and command buffers.
#[derive(Debug)]
pub struct Adapter {
    share: Arc<Share>,
}

impl Adapter {
    /// Probe the driver and build the shared tables.
    /// `resource_context_count` bounds how many worker threads may create
    /// resources concurrently.
    pub fn new(context: Arc<dyn gl::Context>, resource_context_count: usize) -> Self {
        let probed = info::Info::get(&*context);
        let formats = tex::FormatTable::new(&probed);
        Adapter {
            share: Arc::new(Share {
                context,
                info: probed,
                formats,
                reclaim: Arc::new(native::ReclaimQueue::default()),
                contexts: ResourceContexts::new(resource_context_count),
            }),
        }
    }

    /// The shared state, for introspection.
    pub fn share(&self) -> &Arc<Share> {
        &self.share
    }

    /// Device for the main thread.
    pub fn device(&self) -> Device {
        Device::new(self.share.clone())
    }

    /// The live command buffer. Rendering is confined to the thread that
    /// owns it.
    pub fn main_command_buffer(&self) -> MainCommandBuffer {
        MainCommandBuffer::new(self.share.clone())
    }

    /// Claim a resource context for a worker thread. Fails when all
    /// configured slots are claimed.
    pub fn claim_resource_context(&self) -> Result<ResourceContext> {
        let mut claimed = self.share.contexts.claimed.lock();
        match claimed.iter().position(|c| !c) {
            Some(slot) => {
                claimed[slot] = true;
                Ok(ResourceContext {
                    share: self.share.clone(),
                    slot,
                })
            }
            None => Err(Error::PermissionDenied("all resource contexts claimed")),
        }
    }
}

/// The backend type bundle.
#[derive(Debug)]
pub enum GlBackend {}

impl hal::Backend for GlBackend {
    type Device = Device;
    type Buffer = native::Buffer;
    type Texture = native::Texture;
    type Renderbuffer = native::Renderbuffer;
    type Geometry = native::Geometry;
    type Framebuffer = native::Framebuffer;
    type RenderPass = native::RenderPass;
    type RenderSurface = native::RenderSurface;
    type Shader = native::Shader;
    type QueryPool = native::QueryPool;
    type SyncRef = native::SyncRef;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_context_slots() {
        let adapter = Adapter::new(Arc::new(mock::MockContext::new()), 2);
        let first = adapter.claim_resource_context().unwrap();
        let _second = adapter.claim_resource_context().unwrap();
        assert!(adapter.claim_resource_context().is_err());
        drop(first);
        let _third = adapter.claim_resource_context().unwrap();
    }
}
