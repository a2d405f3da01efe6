//! Image, image view and sampler descriptions.

use crate::format::Format;
use bitflags::bitflags;

bitflags! {
    pub struct ImageUsageFlags: u32 {
        const TRANSFER_SRC = 0x01;
        const TRANSFER_DST = 0x02;
        const SAMPLED = 0x04;
        const STORAGE = 0x08;
        const COLOR_ATTACHMENT = 0x10;
        const DEPTH_STENCIL_ATTACHMENT = 0x20;
        const INPUT_ATTACHMENT = 0x40;
    }
}

impl ImageUsageFlags {
    /// True when the image is only ever a render target: such images can live
    /// in renderbuffer-style storage that cannot be sampled.
    pub fn is_attachment_only(self) -> bool {
        !self.intersects(
            ImageUsageFlags::SAMPLED
                | ImageUsageFlags::STORAGE
                | ImageUsageFlags::TRANSFER_SRC
                | ImageUsageFlags::TRANSFER_DST
                | ImageUsageFlags::INPUT_ATTACHMENT,
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ImageType {
    T1d,
    T2d,
    T3d,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Extent3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Offset3D {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ImageCreateInfo {
    pub image_type: ImageType,
    pub format: Format,
    pub extent: Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: u32,
    pub usage: ImageUsageFlags,
    /// 2D-array images with six-layer multiples may be viewed as cube maps;
    /// cube-compatible images attach to framebuffers per-face.
    pub cube_compatible: bool,
}

/// Subresource range addressed by an image view.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubresourceRange {
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

impl SubresourceRange {
    pub fn whole(info: &ImageCreateInfo) -> SubresourceRange {
        SubresourceRange {
            base_mip_level: 0,
            level_count: info.mip_levels,
            base_array_layer: 0,
            layer_count: info.array_layers,
        }
    }
}

//--------------------------------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ComponentSwizzle {
    Identity,
    Zero,
    One,
    R,
    G,
    B,
    A,
}

/// Per-channel remap declared on an image view, applied through GL texture
/// swizzle parameters only for the channels that are not identity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ComponentMapping {
    pub r: ComponentSwizzle,
    pub g: ComponentSwizzle,
    pub b: ComponentSwizzle,
    pub a: ComponentSwizzle,
}

impl ComponentMapping {
    pub fn identity() -> ComponentMapping {
        ComponentMapping {
            r: ComponentSwizzle::Identity,
            g: ComponentSwizzle::Identity,
            b: ComponentSwizzle::Identity,
            a: ComponentSwizzle::Identity,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == ComponentMapping::identity()
    }
}

impl Default for ComponentMapping {
    fn default() -> ComponentMapping {
        ComponentMapping::identity()
    }
}

//--------------------------------------------------------------------------------------------------

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SamplerMipmapMode {
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SamplerAddressMode {
    Wrap,
    Mirror,
    Clamp,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SamplerDescription {
    pub addr_u: SamplerAddressMode,
    pub addr_v: SamplerAddressMode,
    pub addr_w: SamplerAddressMode,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmap_mode: SamplerMipmapMode,
}

impl Default for SamplerDescription {
    fn default() -> SamplerDescription {
        SamplerDescription {
            addr_u: SamplerAddressMode::Clamp,
            addr_v: SamplerAddressMode::Clamp,
            addr_w: SamplerAddressMode::Clamp,
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            mipmap_mode: SamplerMipmapMode::Linear,
        }
    }
}
