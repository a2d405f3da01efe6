//! Images and image views.
//!
//! An image maps to a texture name, or to a renderbuffer when it is only
//! ever a render target (renderbuffer storage cannot be sampled but avoids
//! the texture-completeness rules for pure attachments). Views reuse the
//! texture name when they cover the whole image and carry the same format;
//! any narrower subresource range gets a real texture-view object.

use crate::api as gl;
use crate::api::types::*;
use crate::context::ContextGuard;
use crate::format::GlFormatInfo;
use prism::image::{ComponentMapping, ImageCreateInfo, ImageType, SubresourceRange};

#[derive(Debug)]
pub struct GlImage {
    pub(crate) obj: GLuint,
    /// `gl::RENDERBUFFER` or the texture target.
    pub(crate) target: GLenum,
    pub(crate) info: ImageCreateInfo,
}

fn texture_target(info: &ImageCreateInfo) -> GLenum {
    match info.image_type {
        ImageType::T1d => {
            if info.array_layers > 1 {
                gl::TEXTURE_1D_ARRAY
            } else {
                gl::TEXTURE_1D
            }
        }
        ImageType::T2d => {
            if info.cube_compatible {
                gl::TEXTURE_CUBE_MAP
            } else if info.samples > 1 {
                if info.array_layers > 1 {
                    gl::TEXTURE_2D_MULTISAMPLE_ARRAY
                } else {
                    gl::TEXTURE_2D_MULTISAMPLE
                }
            } else if info.array_layers > 1 {
                gl::TEXTURE_2D_ARRAY
            } else {
                gl::TEXTURE_2D
            }
        }
        ImageType::T3d => gl::TEXTURE_3D,
    }
}

impl GlImage {
    pub(crate) fn new(guard: &ContextGuard, info: &ImageCreateInfo) -> GlImage {
        let gl = guard.gl();
        let fmtinfo = GlFormatInfo::from_format(info.format);
        let mut obj = 0;

        if info.usage.is_attachment_only() && info.mip_levels == 1 && info.array_layers == 1 {
            unsafe {
                gl.CreateRenderbuffers(1, &mut obj);
                gl.NamedRenderbufferStorageMultisample(
                    obj,
                    if info.samples > 1 { info.samples as i32 } else { 0 },
                    fmtinfo.internal_fmt,
                    info.extent.width as i32,
                    info.extent.height as i32,
                );
            }
            return GlImage {
                obj,
                target: gl::RENDERBUFFER,
                info: *info,
            };
        }

        let target = texture_target(info);
        unsafe {
            gl.CreateTextures(target, 1, &mut obj);
            match target {
                gl::TEXTURE_1D => {
                    gl.TextureStorage1D(
                        obj,
                        info.mip_levels as i32,
                        fmtinfo.internal_fmt,
                        info.extent.width as i32,
                    );
                }
                gl::TEXTURE_2D | gl::TEXTURE_CUBE_MAP | gl::TEXTURE_1D_ARRAY => {
                    gl.TextureStorage2D(
                        obj,
                        info.mip_levels as i32,
                        fmtinfo.internal_fmt,
                        info.extent.width as i32,
                        info.extent.height as i32,
                    );
                }
                gl::TEXTURE_2D_MULTISAMPLE => {
                    gl.TextureStorage2DMultisample(
                        obj,
                        info.samples as i32,
                        fmtinfo.internal_fmt,
                        info.extent.width as i32,
                        info.extent.height as i32,
                        gl::TRUE,
                    );
                }
                gl::TEXTURE_2D_ARRAY => {
                    gl.TextureStorage3D(
                        obj,
                        info.mip_levels as i32,
                        fmtinfo.internal_fmt,
                        info.extent.width as i32,
                        info.extent.height as i32,
                        info.array_layers as i32,
                    );
                }
                gl::TEXTURE_2D_MULTISAMPLE_ARRAY => {
                    gl.TextureStorage3DMultisample(
                        obj,
                        info.samples as i32,
                        fmtinfo.internal_fmt,
                        info.extent.width as i32,
                        info.extent.height as i32,
                        info.array_layers as i32,
                        gl::TRUE,
                    );
                }
                gl::TEXTURE_3D => {
                    gl.TextureStorage3D(
                        obj,
                        info.mip_levels as i32,
                        fmtinfo.internal_fmt,
                        info.extent.width as i32,
                        info.extent.height as i32,
                        info.extent.depth as i32,
                    );
                }
                _ => unreachable!(),
            }
        }

        GlImage {
            obj,
            target,
            info: *info,
        }
    }

    pub fn info(&self) -> &ImageCreateInfo {
        &self.info
    }

    /// Destroys the GL object. All views on this image must already be
    /// destroyed; this ordering is the caller's contract.
    pub fn destroy(&self, guard: &ContextGuard) {
        unsafe {
            if self.target == gl::RENDERBUFFER {
                guard.gl().DeleteRenderbuffers(1, &self.obj);
            } else {
                guard.gl().DeleteTextures(1, &self.obj);
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct GlImageView {
    /// Texture name to bind: the image's own name, a texture-view object, or
    /// 0 for the implicit swapchain back buffer.
    pub(crate) obj: GLuint,
    pub(crate) target: GLenum,
    pub(crate) format: prism::format::Format,
    pub(crate) samples: u32,
    pub(crate) range: SubresourceRange,
    /// Total layer count of the underlying image, to distinguish layered
    /// attachment from single-layer attachment.
    pub(crate) image_layers: u32,
    pub(crate) cube_compatible: bool,
    pub(crate) swizzle: ComponentMapping,
    /// The implicit swapchain back buffer: rendering bypasses FBO creation
    /// and goes to the default framebuffer.
    pub(crate) is_back_buffer: bool,
    /// True when `obj` is a texture-view object owned by this view.
    pub(crate) owns_view: bool,
}

impl GlImageView {
    pub(crate) fn new(
        guard: &ContextGuard,
        image: &GlImage,
        range: SubresourceRange,
        swizzle: ComponentMapping,
    ) -> GlImageView {
        let whole = range == SubresourceRange::whole(&image.info);

        let (obj, owns_view) = if whole || image.target == gl::RENDERBUFFER {
            (image.obj, false)
        } else {
            // narrower subresource windows need a real texture view
            let gl = guard.gl();
            let fmtinfo = GlFormatInfo::from_format(image.info.format);
            let mut view = 0;
            unsafe {
                gl.GenTextures(1, &mut view);
                gl.TextureView(
                    view,
                    image.target,
                    image.obj,
                    fmtinfo.internal_fmt,
                    range.base_mip_level,
                    range.level_count,
                    range.base_array_layer,
                    range.layer_count,
                );
            }
            (view, true)
        };

        GlImageView {
            obj,
            target: image.target,
            format: image.info.format,
            samples: image.info.samples,
            range,
            image_layers: image.info.array_layers,
            cube_compatible: image.info.cube_compatible,
            swizzle,
            is_back_buffer: false,
            owns_view,
        }
    }

    /// View standing in for the swapchain's default framebuffer.
    pub(crate) fn back_buffer(format: prism::format::Format, samples: u32) -> GlImageView {
        GlImageView {
            obj: 0,
            target: gl::TEXTURE_2D,
            format,
            samples,
            range: SubresourceRange {
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_layers: 1,
            cube_compatible: false,
            swizzle: ComponentMapping::identity(),
            is_back_buffer: true,
            owns_view: false,
        }
    }

    pub fn format(&self) -> prism::format::Format {
        self.format
    }

    pub fn destroy(&self, guard: &ContextGuard) {
        if self.owns_view {
            unsafe {
                guard.gl().DeleteTextures(1, &self.obj);
            }
        }
    }
}
