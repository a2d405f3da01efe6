//! Render passes.
//!
//! The GL attachment point of every render-pass attachment is precomputed at
//! pass-creation time: depth+stencil formats take the combined point, then
//! stencil-only, then depth-only, and color formats take sequential color
//! points in attachment-array order. Draw-buffer sets are recomputed from
//! the active subpass's color references every time a subpass begins, since
//! different subpasses may activate different attachment subsets.

use crate::api as gl;
use crate::api::types::*;
use prism::format::AspectFlags;
use prism::pass::{AttachmentDescription, RenderPassDescription, SubpassDescription};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    pub(crate) fn to_gl(self) -> GLenum {
        match self {
            AttachmentPoint::Color(i) => gl::COLOR_ATTACHMENT0 + i,
            AttachmentPoint::Depth => gl::DEPTH_ATTACHMENT,
            AttachmentPoint::Stencil => gl::STENCIL_ATTACHMENT,
            AttachmentPoint::DepthStencil => gl::DEPTH_STENCIL_ATTACHMENT,
        }
    }

    pub(crate) fn is_color(self) -> bool {
        match self {
            AttachmentPoint::Color(_) => true,
            _ => false,
        }
    }
}

/// Pure classification of attachment descriptions to GL attachment points.
pub(crate) fn classify_attachments(attachments: &[AttachmentDescription]) -> Vec<AttachmentPoint> {
    let mut next_color = 0;
    attachments
        .iter()
        .map(|a| {
            let aspects = a.format.aspects();
            if aspects.contains(AspectFlags::DEPTH | AspectFlags::STENCIL) {
                AttachmentPoint::DepthStencil
            } else if aspects.contains(AspectFlags::STENCIL) {
                AttachmentPoint::Stencil
            } else if aspects.contains(AspectFlags::DEPTH) {
                AttachmentPoint::Depth
            } else {
                let p = AttachmentPoint::Color(next_color);
                next_color += 1;
                p
            }
        })
        .collect()
}

#[derive(Debug)]
pub struct GlRenderPass {
    pub(crate) description: RenderPassDescription,
    pub(crate) attachment_points: Vec<AttachmentPoint>,
}

impl GlRenderPass {
    pub(crate) fn new(description: &RenderPassDescription) -> GlRenderPass {
        let attachment_points = classify_attachments(&description.attachments);
        for sp in &description.subpasses {
            for r in sp
                .color_attachments
                .iter()
                .chain(sp.input_attachments.iter())
                .chain(sp.resolve_attachments.iter())
                .chain(sp.depth_stencil_attachment.iter())
            {
                assert!(
                    (r.attachment as usize) < description.attachments.len(),
                    "subpass references attachment {} out of range",
                    r.attachment
                );
            }
        }
        GlRenderPass {
            description: description.clone(),
            attachment_points,
        }
    }

    pub(crate) fn attachment(&self, index: usize) -> &AttachmentDescription {
        &self.description.attachments[index]
    }

    pub(crate) fn subpass(&self, index: usize) -> &SubpassDescription {
        &self.description.subpasses[index]
    }

    pub fn subpass_count(&self) -> usize {
        self.description.subpasses.len()
    }

    /// Draw-buffer array for one subpass, in color-reference order.
    pub(crate) fn subpass_draw_buffers(&self, subpass: usize) -> Vec<GLenum> {
        self.description.subpasses[subpass]
            .color_attachments
            .iter()
            .map(|r| {
                let p = self.attachment_points[r.attachment as usize];
                debug_assert!(p.is_color(), "subpass color reference to a non-color attachment");
                p.to_gl()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism::format::Format;
    use prism::pass::{AttachmentReference, ImageLayout, LoadOp, StoreOp};

    fn att(format: Format) -> AttachmentDescription {
        AttachmentDescription {
            format,
            samples: 1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ColorAttachmentOptimal,
        }
    }

    #[test]
    fn depth_stencil_takes_the_combined_point() {
        let points = classify_attachments(&[
            att(Format::R8G8B8A8_UNORM),
            att(Format::D24_UNORM_S8_UINT),
            att(Format::R16G16B16A16_SFLOAT),
        ]);
        assert_eq!(
            points,
            vec![
                AttachmentPoint::Color(0),
                AttachmentPoint::DepthStencil,
                AttachmentPoint::Color(1),
            ]
        );
    }

    #[test]
    fn depth_only_and_stencil_only_take_their_own_points() {
        let points = classify_attachments(&[att(Format::S8_UINT), att(Format::D32_SFLOAT)]);
        assert_eq!(points, vec![AttachmentPoint::Stencil, AttachmentPoint::Depth]);
    }

    #[test]
    fn color_points_are_sequential_in_array_order() {
        let points = classify_attachments(&[
            att(Format::R8G8B8A8_UNORM),
            att(Format::R8G8B8A8_SRGB),
            att(Format::R32G32B32A32_SFLOAT),
        ]);
        assert_eq!(
            points,
            vec![
                AttachmentPoint::Color(0),
                AttachmentPoint::Color(1),
                AttachmentPoint::Color(2),
            ]
        );
    }

    #[test]
    fn draw_buffers_follow_the_subpass_not_the_framebuffer() {
        let desc = RenderPassDescription {
            attachments: vec![
                att(Format::R8G8B8A8_UNORM),
                att(Format::R8G8B8A8_UNORM),
                att(Format::D32_SFLOAT),
            ],
            subpasses: vec![
                SubpassDescription {
                    color_attachments: vec![AttachmentReference {
                        attachment: 0,
                        layout: ImageLayout::ColorAttachmentOptimal,
                    }],
                    ..SubpassDescription::default()
                },
                SubpassDescription {
                    color_attachments: vec![AttachmentReference {
                        attachment: 1,
                        layout: ImageLayout::ColorAttachmentOptimal,
                    }],
                    ..SubpassDescription::default()
                },
            ],
        };
        let pass = GlRenderPass::new(&desc);
        assert_eq!(pass.subpass_draw_buffers(0), vec![gl::COLOR_ATTACHMENT0]);
        assert_eq!(pass.subpass_draw_buffers(1), vec![gl::COLOR_ATTACHMENT0 + 1]);
    }
}
