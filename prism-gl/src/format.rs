//! Static lookup tables mapping the abstract format enumeration to GL enums.

use crate::api as gl;
use crate::api::types::*;
use prism::format::Format;

pub struct GlFormatInfo {
    pub internal_fmt: GLenum,
    /// Matching external format for uploads/reads (so that OpenGL does not
    /// have to convert).
    pub upload_components: GLenum,
    /// Matching element type for uploads/reads.
    pub upload_ty: GLenum,
}

static GLF_R8_UNORM: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::R8,
    upload_components: gl::RED,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_R8_SNORM: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::R8_SNORM,
    upload_components: gl::RED,
    upload_ty: gl::BYTE,
};
static GLF_R8_UINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::R8UI,
    upload_components: gl::RED_INTEGER,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_R8_SINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::R8I,
    upload_components: gl::RED_INTEGER,
    upload_ty: gl::BYTE,
};
static GLF_R8G8B8A8_UNORM: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGBA8,
    upload_components: gl::RGBA,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_R8G8B8A8_SNORM: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGBA8_SNORM,
    upload_components: gl::RGBA,
    upload_ty: gl::BYTE,
};
static GLF_R8G8B8A8_UINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGBA8UI,
    upload_components: gl::RGBA_INTEGER,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_R8G8B8A8_SINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGBA8I,
    upload_components: gl::RGBA_INTEGER,
    upload_ty: gl::BYTE,
};
static GLF_R8G8B8A8_SRGB: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::SRGB8_ALPHA8,
    upload_components: gl::RGBA,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_B8G8R8A8_UNORM: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGBA8,
    upload_components: gl::BGRA,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_B8G8R8A8_SRGB: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::SRGB8_ALPHA8,
    upload_components: gl::BGRA,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_R16G16_SFLOAT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RG16F,
    upload_components: gl::RG,
    upload_ty: gl::FLOAT,
}; // XXX no half-float for upload!
static GLF_R16G16B16A16_SFLOAT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGBA16F,
    upload_components: gl::RGBA,
    upload_ty: gl::FLOAT,
}; // XXX no half-float for upload!
static GLF_R32_UINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::R32UI,
    upload_components: gl::RED_INTEGER,
    upload_ty: gl::UNSIGNED_INT,
};
static GLF_R32_SFLOAT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::R32F,
    upload_components: gl::RED,
    upload_ty: gl::FLOAT,
};
static GLF_R32G32_SFLOAT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RG32F,
    upload_components: gl::RG,
    upload_ty: gl::FLOAT,
};
static GLF_R32G32B32_SFLOAT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGB32F,
    upload_components: gl::RGB,
    upload_ty: gl::FLOAT,
};
static GLF_R32G32B32A32_SFLOAT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::RGBA32F,
    upload_components: gl::RGBA,
    upload_ty: gl::FLOAT,
};
static GLF_D16_UNORM: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::DEPTH_COMPONENT16,
    upload_components: gl::DEPTH_COMPONENT,
    upload_ty: gl::UNSIGNED_SHORT,
};
static GLF_D32_SFLOAT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::DEPTH_COMPONENT32F,
    upload_components: gl::DEPTH_COMPONENT,
    upload_ty: gl::FLOAT,
};
static GLF_S8_UINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::STENCIL_INDEX8,
    upload_components: gl::STENCIL_INDEX,
    upload_ty: gl::UNSIGNED_BYTE,
};
static GLF_D24_UNORM_S8_UINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::DEPTH24_STENCIL8,
    upload_components: gl::DEPTH_STENCIL,
    upload_ty: gl::UNSIGNED_INT_24_8,
};
static GLF_D32_SFLOAT_S8_UINT: GlFormatInfo = GlFormatInfo {
    internal_fmt: gl::DEPTH32F_STENCIL8,
    upload_components: gl::DEPTH_STENCIL,
    upload_ty: gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
};

impl GlFormatInfo {
    pub fn from_format(fmt: Format) -> &'static GlFormatInfo {
        match fmt {
            Format::R8_UNORM => &GLF_R8_UNORM,
            Format::R8_SNORM => &GLF_R8_SNORM,
            Format::R8_UINT => &GLF_R8_UINT,
            Format::R8_SINT => &GLF_R8_SINT,
            Format::R8G8B8A8_UNORM => &GLF_R8G8B8A8_UNORM,
            Format::R8G8B8A8_SNORM => &GLF_R8G8B8A8_SNORM,
            Format::R8G8B8A8_UINT => &GLF_R8G8B8A8_UINT,
            Format::R8G8B8A8_SINT => &GLF_R8G8B8A8_SINT,
            Format::R8G8B8A8_SRGB => &GLF_R8G8B8A8_SRGB,
            Format::B8G8R8A8_UNORM => &GLF_B8G8R8A8_UNORM,
            Format::B8G8R8A8_SRGB => &GLF_B8G8R8A8_SRGB,
            Format::R16G16_SFLOAT => &GLF_R16G16_SFLOAT,
            Format::R16G16B16A16_SFLOAT => &GLF_R16G16B16A16_SFLOAT,
            Format::R32_UINT => &GLF_R32_UINT,
            Format::R32_SFLOAT => &GLF_R32_SFLOAT,
            Format::R32G32_SFLOAT => &GLF_R32G32_SFLOAT,
            Format::R32G32B32_SFLOAT => &GLF_R32G32B32_SFLOAT,
            Format::R32G32B32A32_SFLOAT => &GLF_R32G32B32A32_SFLOAT,
            Format::D16_UNORM => &GLF_D16_UNORM,
            Format::D32_SFLOAT => &GLF_D32_SFLOAT,
            Format::S8_UINT => &GLF_S8_UINT,
            Format::D24_UNORM_S8_UINT => &GLF_D24_UNORM_S8_UINT,
            Format::D32_SFLOAT_S8_UINT => &GLF_D32_SFLOAT_S8_UINT,
        }
    }

    /// Component count and normalized flag for vertex attribute setup.
    pub fn vertex_attrib_info(fmt: Format) -> (i32, bool) {
        match fmt {
            Format::R8_UNORM | Format::R8_SNORM => (1, true),
            Format::R8_UINT | Format::R8_SINT => (1, false),
            Format::R32_UINT | Format::R32_SFLOAT => (1, false),
            Format::R16G16_SFLOAT | Format::R32G32_SFLOAT => (2, false),
            Format::R32G32B32_SFLOAT => (3, false),
            Format::R8G8B8A8_UNORM | Format::R8G8B8A8_SNORM => (4, true),
            Format::R8G8B8A8_UINT | Format::R8G8B8A8_SINT => (4, false),
            Format::R16G16B16A16_SFLOAT | Format::R32G32B32A32_SFLOAT => (4, false),
            _ => panic!("format {:?} is not usable as a vertex attribute", fmt),
        }
    }
}
