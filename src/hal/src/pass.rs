//! Render pass descriptions: attachments, subpasses, dependencies.

use crate::format::Format;
use crate::memory::{Access, PipelineStages};

/// Sentinel subpass index denoting "before the first" or "after the last"
/// subpass of a render pass.
pub const EXTERNAL_SUBPASS: u32 = !0;

/// What happens to an attachment's contents when a render pass begins.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadOp {
    /// Keep the previous contents.
    Load,
    /// Clear with the value passed to `begin_render_pass`.
    Clear,
    /// Contents are undefined.
    DontCare,
}

/// What happens to an attachment's contents when a render pass ends.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreOp {
    /// Keep the rendered contents.
    Store,
    /// Contents may be discarded.
    DontCare,
}

/// One attachment of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    pub format: Format,
    /// Sample count, minimum 1.
    pub samples: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
}

impl Attachment {
    /// Whether `begin_render_pass` consumes a clear value for this
    /// attachment.
    pub fn has_clear(&self) -> bool {
        self.load_op == LoadOp::Clear || self.stencil_load_op == LoadOp::Clear
    }
}

/// Reference to an attachment from a subpass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttachmentRef {
    /// Index into the render pass attachment list.
    pub index: u32,
    /// Resolve the multisampled contents into the paired single-sample
    /// surface at subpass end.
    pub resolve: bool,
}

/// One subpass of a render pass.
#[derive(Clone, Debug, Default)]
pub struct SubpassDesc {
    /// Attachments read as input attachments.
    pub input_attachments: Vec<u32>,
    /// Color attachments written by the subpass, in output order.
    pub color_attachments: Vec<AttachmentRef>,
    /// Depth/stencil attachment, if any.
    pub depth_stencil_attachment: Option<u32>,
}

impl SubpassDesc {
    /// The output index using the given attachment, if any.
    pub fn attachment_using(&self, attachment: u32) -> Option<u32> {
        if self.depth_stencil_attachment == Some(attachment) {
            return Some(attachment);
        }
        self.color_attachments
            .iter()
            .position(|r| r.index == attachment)
            .map(|i| i as u32)
    }
}

/// An execution/memory dependency between two subpasses.
///
/// `EXTERNAL_SUBPASS` on either side scopes the dependency against work
/// outside the render pass. Backends reduce the dependencies crossing a
/// subpass boundary to the maximum-required barrier bit set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: Access,
    pub dst_access: Access,
}

/// Full description of a render pass.
#[derive(Clone, Debug, Default)]
pub struct RenderPassDesc {
    pub attachments: Vec<Attachment>,
    pub subpasses: Vec<SubpassDesc>,
    pub dependencies: Vec<SubpassDependency>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ChannelType, Format, SurfaceType};

    #[test]
    fn attachment_clear_detection() {
        let mut attachment = Attachment {
            format: Format::Standard(SurfaceType::Rgba8, ChannelType::Unorm),
            samples: 1,
            load_op: LoadOp::DontCare,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
        };
        assert!(!attachment.has_clear());
        attachment.load_op = LoadOp::Clear;
        assert!(attachment.has_clear());
        attachment.load_op = LoadOp::Load;
        attachment.stencil_load_op = LoadOp::Clear;
        assert!(attachment.has_clear());
    }

    #[test]
    fn subpass_attachment_lookup() {
        let subpass = SubpassDesc {
            input_attachments: vec![],
            color_attachments: vec![
                AttachmentRef { index: 2, resolve: false },
                AttachmentRef { index: 0, resolve: false },
            ],
            depth_stencil_attachment: Some(1),
        };
        assert_eq!(subpass.attachment_using(2), Some(0));
        assert_eq!(subpass.attachment_using(0), Some(1));
        assert_eq!(subpass.attachment_using(1), Some(1));
        assert_eq!(subpass.attachment_using(3), None);
    }
}
