//! Pixel format enumeration and pure per-format lookups.

use bitflags::bitflags;

bitflags! {
    pub struct AspectFlags: u32 {
        const COLOR = 0b001;
        const DEPTH = 0b010;
        const STENCIL = 0b100;
    }
}

/// Subset of the Vulkan 1.0 format enumeration covered by the emulation core.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[allow(non_camel_case_types)]
pub enum Format {
    R8_UNORM,
    R8_SNORM,
    R8_UINT,
    R8_SINT,
    R8G8B8A8_UNORM,
    R8G8B8A8_SNORM,
    R8G8B8A8_UINT,
    R8G8B8A8_SINT,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16_SFLOAT,
    R16G16B16A16_SFLOAT,
    R32_UINT,
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    D32_SFLOAT,
    S8_UINT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
}

impl Format {
    /// Which aspects (color / depth / stencil) a format carries.
    ///
    /// This drives the framebuffer attachment-point classification: a
    /// depth+stencil format maps to the combined attachment point, never the
    /// separate depth or stencil points.
    pub fn aspects(self) -> AspectFlags {
        match self {
            Format::D16_UNORM | Format::D32_SFLOAT => AspectFlags::DEPTH,
            Format::S8_UINT => AspectFlags::STENCIL,
            Format::D24_UNORM_S8_UINT | Format::D32_SFLOAT_S8_UINT => {
                AspectFlags::DEPTH | AspectFlags::STENCIL
            }
            _ => AspectFlags::COLOR,
        }
    }

    pub fn is_depth_or_stencil(self) -> bool {
        !self.aspects().intersects(AspectFlags::COLOR)
    }

    /// Byte size of one texel (one element for packed depth-stencil formats).
    pub fn size_in_bytes(self) -> usize {
        match self {
            Format::R8_UNORM | Format::R8_SNORM | Format::R8_UINT | Format::R8_SINT => 1,
            Format::S8_UINT => 1,
            Format::D16_UNORM => 2,
            Format::R8G8B8A8_UNORM
            | Format::R8G8B8A8_SNORM
            | Format::R8G8B8A8_UINT
            | Format::R8G8B8A8_SINT
            | Format::R8G8B8A8_SRGB
            | Format::B8G8R8A8_UNORM
            | Format::B8G8R8A8_SRGB => 4,
            Format::R16G16_SFLOAT => 4,
            Format::R32_UINT | Format::R32_SFLOAT => 4,
            Format::D32_SFLOAT | Format::D24_UNORM_S8_UINT => 4,
            Format::D32_SFLOAT_S8_UINT => 8,
            Format::R16G16B16A16_SFLOAT => 8,
            Format::R32G32_SFLOAT => 8,
            Format::R32G32B32_SFLOAT => 12,
            Format::R32G32B32A32_SFLOAT => 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_stencil_aspects() {
        assert_eq!(
            Format::D24_UNORM_S8_UINT.aspects(),
            AspectFlags::DEPTH | AspectFlags::STENCIL
        );
        assert_eq!(Format::D32_SFLOAT.aspects(), AspectFlags::DEPTH);
        assert_eq!(Format::S8_UINT.aspects(), AspectFlags::STENCIL);
        assert_eq!(Format::R8G8B8A8_UNORM.aspects(), AspectFlags::COLOR);
        assert!(Format::D32_SFLOAT_S8_UINT.is_depth_or_stencil());
        assert!(!Format::B8G8R8A8_SRGB.is_depth_or_stencil());
    }
}
