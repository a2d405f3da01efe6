//! Render pass descriptions.

use crate::format::Format;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// Image layouts are kept for API-shape fidelity; the GL backend has no
/// layout transitions to perform and only inspects them for validation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachmentOptimal,
    DepthStencilAttachmentOptimal,
    ShaderReadOnlyOptimal,
    TransferSrcOptimal,
    TransferDstOptimal,
    PresentSrc,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AttachmentDescription {
    pub format: Format,
    pub samples: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

impl AttachmentDescription {
    pub fn color(format: Format, load_op: LoadOp, store_op: StoreOp) -> AttachmentDescription {
        AttachmentDescription {
            format,
            samples: 1,
            load_op,
            store_op,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ColorAttachmentOptimal,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AttachmentReference {
    /// Index into [RenderPassDescription::attachments].
    pub attachment: u32,
    pub layout: ImageLayout,
}

#[derive(Clone, Debug, Default)]
pub struct SubpassDescription {
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    /// Multisample resolve targets, pairwise with `color_attachments`.
    /// Empty when the subpass does not resolve.
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
}

#[derive(Clone, Debug)]
pub struct RenderPassDescription {
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
}

impl RenderPassDescription {
    /// Single-subpass pass over all attachments, colors first in array order.
    pub fn single_subpass(attachments: Vec<AttachmentDescription>) -> RenderPassDescription {
        let mut color_attachments = Vec::new();
        let mut depth_stencil_attachment = None;
        for (i, a) in attachments.iter().enumerate() {
            if a.format.is_depth_or_stencil() {
                depth_stencil_attachment = Some(AttachmentReference {
                    attachment: i as u32,
                    layout: ImageLayout::DepthStencilAttachmentOptimal,
                });
            } else {
                color_attachments.push(AttachmentReference {
                    attachment: i as u32,
                    layout: ImageLayout::ColorAttachmentOptimal,
                });
            }
        }
        RenderPassDescription {
            attachments,
            subpasses: vec![SubpassDescription {
                input_attachments: Vec::new(),
                color_attachments,
                resolve_attachments: Vec::new(),
                depth_stencil_attachment,
            }],
        }
    }
}
