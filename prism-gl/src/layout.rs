//! Pipeline layout: the (set, binding) → flat GL slot remap.
//!
//! Vulkan addresses resources with (descriptor set, binding, array element)
//! triples; GL has flat per-kind namespaces (texture units, image units, UBO
//! and SSBO indices). The remap is computed once at layout-creation time by
//! walking the descriptor-set layouts in set order with one monotone counter
//! per binding space. Resolution is deterministic: the same layouts always
//! produce the same table.

use prism::descriptor::{DescriptorSetLayoutBinding, DescriptorSetLayoutDescription, DescriptorType};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) enum BindingSpace {
    UniformBuffer,
    ShaderStorageBuffer,
    Texture,
    Image,
    Empty,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct FlatBinding {
    pub(crate) space: BindingSpace,
    pub(crate) location: u32,
}

pub(crate) fn binding_space(ty: DescriptorType) -> BindingSpace {
    match ty {
        DescriptorType::Sampler
        | DescriptorType::CombinedImageSampler
        | DescriptorType::SampledImage
        | DescriptorType::UniformTexelBuffer
        | DescriptorType::InputAttachment => BindingSpace::Texture,
        DescriptorType::StorageImage => BindingSpace::Image,
        DescriptorType::UniformBuffer | DescriptorType::UniformBufferDynamic => {
            BindingSpace::UniformBuffer
        }
        DescriptorType::StorageBuffer | DescriptorType::StorageBufferDynamic => {
            BindingSpace::ShaderStorageBuffer
        }
    }
}

#[derive(Debug)]
pub struct GlDescriptorSetLayout {
    pub(crate) description: DescriptorSetLayoutDescription,
}

impl GlDescriptorSetLayout {
    pub(crate) fn new(description: &DescriptorSetLayoutDescription) -> GlDescriptorSetLayout {
        GlDescriptorSetLayout {
            description: description.clone(),
        }
    }

    pub(crate) fn binding(&self, binding: u32) -> Option<&DescriptorSetLayoutBinding> {
        self.description.bindings.iter().find(|b| b.binding == binding)
    }
}

//--------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct GlPipelineLayout {
    /// `sets[set][binding]` → flat slot; `Empty` marks holes in the binding
    /// range.
    sets: Vec<Vec<FlatBinding>>,
    /// Dynamic-typed bindings in (set, binding) order, with their array
    /// counts; a bind call's `dynamic_offsets` must match this table.
    dynamic: Vec<(u32, u32, DescriptorType, u32)>,
    num_texture_units: u32,
    num_image_units: u32,
    num_uniform_buffers: u32,
    num_storage_buffers: u32,
}

impl GlPipelineLayout {
    pub(crate) fn new(set_layouts: &[&GlDescriptorSetLayout]) -> GlPipelineLayout {
        let mut sets = Vec::with_capacity(set_layouts.len());
        let mut dynamic = Vec::new();
        let mut next_tex = 0u32;
        let mut next_img = 0u32;
        let mut next_ubo = 0u32;
        let mut next_ssbo = 0u32;

        for (set_index, layout) in set_layouts.iter().enumerate() {
            let mut bindings = layout.description.bindings.clone();
            bindings.sort_by_key(|b| b.binding);

            let table_len = bindings.iter().map(|b| b.binding + 1).max().unwrap_or(0);
            let mut table = vec![
                FlatBinding {
                    space: BindingSpace::Empty,
                    location: 0,
                };
                table_len as usize
            ];

            for b in &bindings {
                let space = binding_space(b.descriptor_type);
                let next = match space {
                    BindingSpace::Texture => &mut next_tex,
                    BindingSpace::Image => &mut next_img,
                    BindingSpace::UniformBuffer => &mut next_ubo,
                    BindingSpace::ShaderStorageBuffer => &mut next_ssbo,
                    BindingSpace::Empty => unreachable!(),
                };
                table[b.binding as usize] = FlatBinding {
                    space,
                    location: *next,
                };
                // an array binding reserves one slot per element
                *next += b.count;

                if b.descriptor_type.is_dynamic() {
                    dynamic.push((set_index as u32, b.binding, b.descriptor_type, b.count));
                }
            }
            sets.push(table);
        }

        GlPipelineLayout {
            sets,
            dynamic,
            num_texture_units: next_tex,
            num_image_units: next_img,
            num_uniform_buffers: next_ubo,
            num_storage_buffers: next_ssbo,
        }
    }

    /// Flat slot for a (set, binding) pair; `None` for unpopulated bindings.
    pub(crate) fn flat_binding(&self, set: u32, binding: u32) -> Option<FlatBinding> {
        self.sets.get(set as usize).and_then(|s| {
            s.get(binding as usize).and_then(|loc| {
                if loc.space == BindingSpace::Empty {
                    None
                } else {
                    Some(*loc)
                }
            })
        })
    }

    /// Number of dynamic descriptors (array elements included) declared by
    /// the given set.
    pub(crate) fn dynamic_descriptor_count(&self, set: u32) -> usize {
        self.dynamic
            .iter()
            .filter(|(s, ..)| *s == set)
            .map(|&(_, _, _, count)| count as usize)
            .sum()
    }

    pub(crate) fn num_texture_units(&self) -> u32 {
        self.num_texture_units
    }
    pub(crate) fn num_image_units(&self) -> u32 {
        self.num_image_units
    }
    pub(crate) fn num_uniform_buffers(&self) -> u32 {
        self.num_uniform_buffers
    }
    pub(crate) fn num_storage_buffers(&self) -> u32 {
        self.num_storage_buffers
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use prism::pipeline::ShaderStageFlags;

    fn layout(bindings: Vec<DescriptorSetLayoutBinding>) -> GlDescriptorSetLayout {
        GlDescriptorSetLayout::new(&DescriptorSetLayoutDescription { bindings })
    }

    fn binding(binding: u32, ty: DescriptorType, count: u32) -> DescriptorSetLayoutBinding {
        DescriptorSetLayoutBinding {
            binding,
            descriptor_type: ty,
            count,
            stage_flags: ShaderStageFlags::ALL_GRAPHICS,
        }
    }

    #[test]
    fn per_space_counters_walk_sets_in_order() {
        let set0 = layout(vec![
            binding(0, DescriptorType::UniformBuffer, 1),
            binding(1, DescriptorType::CombinedImageSampler, 2),
        ]);
        let set1 = layout(vec![
            binding(0, DescriptorType::SampledImage, 1),
            binding(3, DescriptorType::UniformBuffer, 1),
        ]);
        let pl = GlPipelineLayout::new(&[&set0, &set1]);

        assert_eq!(
            pl.flat_binding(0, 0),
            Some(FlatBinding {
                space: BindingSpace::UniformBuffer,
                location: 0
            })
        );
        assert_eq!(
            pl.flat_binding(0, 1),
            Some(FlatBinding {
                space: BindingSpace::Texture,
                location: 0
            })
        );
        // set 1's texture slots start after set 0's two array elements
        assert_eq!(
            pl.flat_binding(1, 0),
            Some(FlatBinding {
                space: BindingSpace::Texture,
                location: 2
            })
        );
        assert_eq!(
            pl.flat_binding(1, 3),
            Some(FlatBinding {
                space: BindingSpace::UniformBuffer,
                location: 1
            })
        );
        // holes resolve to nothing
        assert_eq!(pl.flat_binding(1, 1), None);
        assert_eq!(pl.flat_binding(2, 0), None);

        assert_eq!(pl.num_texture_units(), 3);
        assert_eq!(pl.num_uniform_buffers(), 2);
    }

    #[test]
    fn resolution_is_deterministic() {
        let set = layout(vec![
            binding(2, DescriptorType::StorageBuffer, 1),
            binding(0, DescriptorType::StorageImage, 1),
        ]);
        let a = GlPipelineLayout::new(&[&set]);
        let b = GlPipelineLayout::new(&[&set]);
        for bi in 0..3 {
            assert_eq!(a.flat_binding(0, bi), b.flat_binding(0, bi));
        }
    }

    #[test]
    fn dynamic_descriptors_are_counted_per_set() {
        let set0 = layout(vec![
            binding(0, DescriptorType::UniformBufferDynamic, 1),
            binding(1, DescriptorType::UniformBuffer, 1),
            binding(2, DescriptorType::StorageBufferDynamic, 2),
        ]);
        let set1 = layout(vec![binding(0, DescriptorType::SampledImage, 1)]);
        let pl = GlPipelineLayout::new(&[&set0, &set1]);
        assert_eq!(pl.dynamic_descriptor_count(0), 3);
        assert_eq!(pl.dynamic_descriptor_count(1), 0);
    }
}
