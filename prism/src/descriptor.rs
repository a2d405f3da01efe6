//! Descriptor-set layout model.
//!
//! The layout captures the Vulkan-shaped binding model (binding index, array
//! size, descriptor type) without touching the GPU; resolution to flat GL
//! binding points happens in the backend pipeline layout.

use crate::pipeline::ShaderStageFlags;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    UniformBuffer,
    StorageBuffer,
    UniformBufferDynamic,
    StorageBufferDynamic,
    InputAttachment,
}

impl DescriptorType {
    /// The two dynamic buffer kinds are the only descriptor types that accept
    /// per-bind dynamic offsets.
    pub fn is_dynamic(self) -> bool {
        match self {
            DescriptorType::UniformBufferDynamic | DescriptorType::StorageBufferDynamic => true,
            _ => false,
        }
    }

    pub fn is_buffer(self) -> bool {
        match self {
            DescriptorType::UniformBuffer
            | DescriptorType::StorageBuffer
            | DescriptorType::UniformBufferDynamic
            | DescriptorType::StorageBufferDynamic => true,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    /// Array size of the binding; a count of zero is legal and contributes no
    /// binding points.
    pub count: u32,
    pub stage_flags: ShaderStageFlags,
}

#[derive(Clone, Debug, Default)]
pub struct DescriptorSetLayoutDescription {
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutDescription {
    /// Dynamic-typed bindings in ascending binding order; a bind call must
    /// supply exactly one offset per dynamic descriptor in this order.
    pub fn dynamic_bindings(&self) -> impl Iterator<Item = &DescriptorSetLayoutBinding> {
        let mut v: Vec<_> = self
            .bindings
            .iter()
            .filter(|b| b.descriptor_type.is_dynamic())
            .collect();
        v.sort_by_key(|b| b.binding);
        v.into_iter()
    }

    /// Total number of dynamic descriptors (array elements included).
    pub fn dynamic_descriptor_count(&self) -> usize {
        self.dynamic_bindings().map(|b| b.count as usize).sum()
    }
}
