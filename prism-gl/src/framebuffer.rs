//! Framebuffer emulation.
//!
//! At creation time every attachment is classified and either bound to a real
//! FBO attachment point or flagged as the implicit swapchain back buffer, in
//! which case FBO creation is bypassed entirely and rendering goes to the
//! default framebuffer. Multisample and single-sample color attachments are
//! tracked as two separate sets; the framebuffer is multisampled when any
//! attachment is, and binding switches wholesale between the two sets (mixing
//! inside one set is not supported).

use crate::api as gl;
use crate::api::types::*;
use crate::context::ContextGuard;
use crate::image::GlImageView;
use crate::pass::{AttachmentPoint, GlRenderPass};
use prism::{Error, Result};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum FboTarget {
    Texture {
        name: GLuint,
        level: u32,
        /// Whole-array (layered) attachment; uses `glNamedFramebufferTexture`.
        layered: bool,
        /// Single layer of an array or one cube face; uses
        /// `glNamedFramebufferTextureLayer` (the DSA equivalent of the
        /// per-face 2D attachment form).
        layer: Option<u32>,
    },
    Renderbuffer {
        name: GLuint,
    },
    BackBuffer,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct FboAttachment {
    pub(crate) point: AttachmentPoint,
    pub(crate) target: FboTarget,
    pub(crate) samples: u32,
}

/// Pure classification of one framebuffer's attachments; no GL calls.
pub(crate) fn plan_attachments(
    render_pass: &GlRenderPass,
    views: &[&GlImageView],
) -> Vec<FboAttachment> {
    assert_eq!(
        views.len(),
        render_pass.description.attachments.len(),
        "framebuffer must provide one view per render-pass attachment"
    );

    views
        .iter()
        .enumerate()
        .map(|(i, view)| {
            let point = render_pass.attachment_points[i];
            let target = if view.is_back_buffer {
                FboTarget::BackBuffer
            } else if view.target == gl::RENDERBUFFER {
                FboTarget::Renderbuffer { name: view.obj }
            } else {
                let whole_array = view.range.layer_count == view.image_layers;
                let layered = view.image_layers > 1 && whole_array && !view.cube_compatible;
                let layer = if view.image_layers > 1 && (!whole_array || view.cube_compatible) {
                    Some(view.range.base_array_layer)
                } else {
                    None
                };
                FboTarget::Texture {
                    name: view.obj,
                    level: view.range.base_mip_level,
                    layered,
                    layer,
                }
            };
            FboAttachment {
                point,
                target,
                samples: view.samples,
            }
        })
        .collect()
}

/// Indices of single-sample and multisample color attachments, and whether
/// the framebuffer as a whole is multisampled.
pub(crate) fn partition_color_attachments(
    attachments: &[FboAttachment],
) -> (Vec<usize>, Vec<usize>, bool) {
    let mut colour_attaches = Vec::new();
    let mut colour_ms_attaches = Vec::new();
    for (i, a) in attachments.iter().enumerate() {
        if a.point.is_color() {
            if a.samples > 1 {
                colour_ms_attaches.push(i);
            } else {
                colour_attaches.push(i);
            }
        }
    }
    let multisampled = attachments.iter().any(|a| a.samples > 1);
    (colour_attaches, colour_ms_attaches, multisampled)
}

fn decode_framebuffer_status(status: GLenum) -> &'static str {
    match status {
        gl::FRAMEBUFFER_UNDEFINED => "framebuffer undefined",
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "incomplete attachment",
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "no attachments",
        gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "incomplete draw buffer",
        gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "incomplete read buffer",
        gl::FRAMEBUFFER_UNSUPPORTED => "unsupported attachment combination",
        gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "inconsistent sample counts",
        gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => "inconsistent layer targets",
        _ => "unknown framebuffer status",
    }
}

#[derive(Debug)]
pub struct GlFramebuffer {
    /// 0 when the framebuffer renders to the default framebuffer.
    pub(crate) fbo: GLuint,
    /// Destination FBO for multisample resolve; 0 when the pass does not
    /// resolve.
    pub(crate) resolve_fbo: GLuint,
    pub(crate) render_pass: Arc<GlRenderPass>,
    pub(crate) attachments: Vec<FboAttachment>,
    pub(crate) colour_attaches: Vec<usize>,
    pub(crate) colour_ms_attaches: Vec<usize>,
    pub(crate) multisampled: bool,
    pub(crate) extent: (u32, u32),
    pub(crate) is_back_buffer: bool,
}

fn attach(gl: &gl::Gl, fbo: GLuint, point: GLenum, target: &FboTarget) {
    match *target {
        FboTarget::Renderbuffer { name } => unsafe {
            gl.NamedFramebufferRenderbuffer(fbo, point, gl::RENDERBUFFER, name);
        },
        FboTarget::Texture {
            name,
            level,
            layered: _,
            layer,
        } => unsafe {
            if let Some(layer) = layer {
                gl.NamedFramebufferTextureLayer(fbo, point, name, level as i32, layer as i32);
            } else {
                // attaches every layer when the texture is an array
                gl.NamedFramebufferTexture(fbo, point, name, level as i32);
            }
        },
        FboTarget::BackBuffer => unreachable!("back-buffer attachments never touch an FBO"),
    }
}

impl GlFramebuffer {
    pub(crate) fn new(
        guard: &ContextGuard,
        render_pass: &Arc<GlRenderPass>,
        views: &[&GlImageView],
        extent: (u32, u32),
    ) -> Result<GlFramebuffer> {
        let attachments = plan_attachments(render_pass, views);
        let (colour_attaches, colour_ms_attaches, multisampled) =
            partition_color_attachments(&attachments);

        if attachments
            .iter()
            .any(|a| a.target == FboTarget::BackBuffer)
        {
            assert!(
                attachments.iter().all(|a| a.target == FboTarget::BackBuffer),
                "back-buffer and image attachments cannot mix in one framebuffer"
            );
            return Ok(GlFramebuffer {
                fbo: 0,
                resolve_fbo: 0,
                render_pass: render_pass.clone(),
                attachments,
                colour_attaches,
                colour_ms_attaches,
                multisampled,
                extent,
                is_back_buffer: true,
            });
        }

        let gl = guard.gl();
        let mut fbo = 0;
        unsafe {
            gl.CreateFramebuffers(1, &mut fbo);
        }

        // the active color set: multisampled framebuffers bind the
        // multisample set, the single-sample set becomes the resolve target
        let active = if multisampled {
            &colour_ms_attaches
        } else {
            &colour_attaches
        };
        for &i in active {
            let a = &attachments[i];
            attach(gl, fbo, a.point.to_gl(), &a.target);
        }
        for a in &attachments {
            if !a.point.is_color() {
                attach(gl, fbo, a.point.to_gl(), &a.target);
            }
        }
        unsafe {
            let bufs: Vec<GLenum> = active
                .iter()
                .map(|&i| attachments[i].point.to_gl())
                .collect();
            gl.NamedFramebufferDrawBuffers(fbo, bufs.len() as i32, bufs.as_ptr());
        }

        let status = unsafe { gl.CheckNamedFramebufferStatus(fbo, gl::DRAW_FRAMEBUFFER) };
        if status != gl::FRAMEBUFFER_COMPLETE {
            let what = decode_framebuffer_status(status);
            error!("framebuffer incomplete (status {:#x}): {}", status, what);
            unsafe {
                gl.DeleteFramebuffers(1, &fbo);
            }
            // a combination the emulation failed to express; a bug in the
            // classification logic, not a runtime condition
            debug_assert!(false, "framebuffer incomplete: {}", what);
            return Err(Error::FramebufferIncomplete(what));
        }

        // resolve FBO: single-sample color set of a multisampled pass
        let mut resolve_fbo = 0;
        if multisampled && !colour_attaches.is_empty() {
            unsafe {
                gl.CreateFramebuffers(1, &mut resolve_fbo);
            }
            for &i in &colour_attaches {
                let a = &attachments[i];
                attach(gl, resolve_fbo, a.point.to_gl(), &a.target);
            }
            let status =
                unsafe { gl.CheckNamedFramebufferStatus(resolve_fbo, gl::DRAW_FRAMEBUFFER) };
            if status != gl::FRAMEBUFFER_COMPLETE {
                let what = decode_framebuffer_status(status);
                error!("resolve framebuffer incomplete (status {:#x}): {}", status, what);
                unsafe {
                    gl.DeleteFramebuffers(1, &fbo);
                    gl.DeleteFramebuffers(1, &resolve_fbo);
                }
                debug_assert!(false, "resolve framebuffer incomplete: {}", what);
                return Err(Error::FramebufferIncomplete(what));
            }
        }

        Ok(GlFramebuffer {
            fbo,
            resolve_fbo,
            render_pass: render_pass.clone(),
            attachments,
            colour_attaches,
            colour_ms_attaches,
            multisampled,
            extent,
            is_back_buffer: false,
        })
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn destroy(&self, guard: &ContextGuard) {
        unsafe {
            if self.fbo != 0 {
                guard.gl().DeleteFramebuffers(1, &self.fbo);
            }
            if self.resolve_fbo != 0 {
                guard.gl().DeleteFramebuffers(1, &self.resolve_fbo);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism::format::Format;
    use prism::image::{ComponentMapping, SubresourceRange};
    use prism::pass::{AttachmentDescription, LoadOp, RenderPassDescription, StoreOp};

    fn fake_view(format: Format, samples: u32, layers: u32) -> GlImageView {
        GlImageView {
            obj: 42,
            target: gl::TEXTURE_2D,
            format,
            samples,
            range: SubresourceRange {
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: layers,
            },
            image_layers: layers,
            cube_compatible: false,
            swizzle: ComponentMapping::identity(),
            is_back_buffer: false,
            owns_view: false,
        }
    }

    fn pass(formats: &[(Format, u32)]) -> GlRenderPass {
        GlRenderPass::new(&RenderPassDescription::single_subpass(
            formats
                .iter()
                .map(|&(f, samples)| AttachmentDescription {
                    samples,
                    ..AttachmentDescription::color(f, LoadOp::Clear, StoreOp::Store)
                })
                .collect(),
        ))
    }

    #[test]
    fn combined_depth_stencil_never_splits() {
        let rp = pass(&[
            (Format::R8G8B8A8_UNORM, 1),
            (Format::D24_UNORM_S8_UINT, 1),
        ]);
        let color = fake_view(Format::R8G8B8A8_UNORM, 1, 1);
        let ds = fake_view(Format::D24_UNORM_S8_UINT, 1, 1);
        let plan = plan_attachments(&rp, &[&color, &ds]);
        assert_eq!(plan[0].point, AttachmentPoint::Color(0));
        assert_eq!(plan[1].point, AttachmentPoint::DepthStencil);
    }

    #[test]
    fn multisample_and_single_sample_sets_are_separate() {
        let rp = pass(&[
            (Format::R8G8B8A8_UNORM, 4),
            (Format::R8G8B8A8_UNORM, 1),
        ]);
        let ms = fake_view(Format::R8G8B8A8_UNORM, 4, 1);
        let ss = fake_view(Format::R8G8B8A8_UNORM, 1, 1);
        let plan = plan_attachments(&rp, &[&ms, &ss]);
        let (colour, colour_ms, multisampled) = partition_color_attachments(&plan);
        assert_eq!(colour, vec![1]);
        assert_eq!(colour_ms, vec![0]);
        assert!(multisampled);
    }

    #[test]
    fn layered_images_use_whole_texture_attachment() {
        let rp = pass(&[(Format::R8G8B8A8_UNORM, 1)]);
        let layered = fake_view(Format::R8G8B8A8_UNORM, 1, 6);
        let plan = plan_attachments(&rp, &[&layered]);
        match plan[0].target {
            FboTarget::Texture { layered, layer, .. } => {
                assert!(layered);
                assert_eq!(layer, None);
            }
            ref other => panic!("unexpected target {:?}", other),
        }

        // a single layer of the same image attaches through the layer form
        let mut one_layer = fake_view(Format::R8G8B8A8_UNORM, 1, 6);
        one_layer.range.layer_count = 1;
        one_layer.range.base_array_layer = 2;
        let plan = plan_attachments(&rp, &[&one_layer]);
        match plan[0].target {
            FboTarget::Texture { layered, layer, .. } => {
                assert!(!layered);
                assert_eq!(layer, Some(2));
            }
            ref other => panic!("unexpected target {:?}", other),
        }
    }

    #[test]
    fn back_buffer_views_bypass_the_fbo() {
        let rp = pass(&[(Format::B8G8R8A8_UNORM, 1)]);
        let bb = GlImageView::back_buffer(Format::B8G8R8A8_UNORM, 1);
        let plan = plan_attachments(&rp, &[&bb]);
        assert_eq!(plan[0].target, FboTarget::BackBuffer);
    }
}
