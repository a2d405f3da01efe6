//! Descriptor sets.
//!
//! A set groups its writes by GL binding kind; engine handles are resolved to
//! GL names at `update()` time (record-time resolution), so replay only has
//! to add the pipeline layout's flat base slot. The set holds no strong
//! reference to the written resources: destroying a resource that a live set
//! still references is undefined behavior, as in the source API.

use crate::api as gl;
use crate::api::types::*;
use crate::buffer::{GlBuffer, GlBufferView};
use crate::format::GlFormatInfo;
use crate::image::GlImageView;
use crate::layout::GlDescriptorSetLayout;
use crate::sampler::GlSampler;
use prism::descriptor::DescriptorType;
use prism::image::ComponentMapping;
use smallvec::SmallVec;
use std::sync::Arc;

//--------------------------------------------------------------------------------------------------
// write API surface

#[derive(Copy, Clone, Debug)]
pub struct BufferDescriptor<'a> {
    pub buffer: &'a GlBuffer,
    pub offset: usize,
    pub range: usize,
}

#[derive(Copy, Clone, Debug)]
pub struct ImageDescriptor<'a> {
    pub view: &'a GlImageView,
    /// Required for combined-image-sampler writes, ignored otherwise.
    pub sampler: Option<&'a GlSampler>,
}

/// One `update()` entry: fully-populated, const, non-owning.
#[derive(Copy, Clone, Debug)]
pub struct DescriptorWrite<'a> {
    pub binding: u32,
    pub first_array_element: u32,
    pub descriptor_type: DescriptorType,
    pub images: &'a [ImageDescriptor<'a>],
    pub buffers: &'a [BufferDescriptor<'a>],
    pub texel_buffers: &'a [&'a GlBufferView],
    pub samplers: &'a [&'a GlSampler],
}

impl<'a> Default for DescriptorWrite<'a> {
    fn default() -> DescriptorWrite<'a> {
        DescriptorWrite {
            binding: 0,
            first_array_element: 0,
            descriptor_type: DescriptorType::UniformBuffer,
            images: &[],
            buffers: &[],
            texel_buffers: &[],
            samplers: &[],
        }
    }
}

//--------------------------------------------------------------------------------------------------
// resolved records

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct TextureBinding {
    pub(crate) texture: GLuint,
    /// 0 when the binding has no sampler (sampled image, texel buffer).
    pub(crate) sampler: GLuint,
    pub(crate) swizzle: ComponentMapping,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextureWrite {
    pub(crate) binding: u32,
    pub(crate) first_array_element: u32,
    pub(crate) entries: SmallVec<[TextureBinding; 1]>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SamplerWrite {
    pub(crate) binding: u32,
    pub(crate) first_array_element: u32,
    pub(crate) samplers: SmallVec<[GLuint; 1]>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct ImageUnitBinding {
    pub(crate) texture: GLuint,
    pub(crate) level: i32,
    pub(crate) layered: bool,
    pub(crate) layer: i32,
    pub(crate) format: GLenum,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ImageUnitWrite {
    pub(crate) binding: u32,
    pub(crate) first_array_element: u32,
    pub(crate) entries: SmallVec<[ImageUnitBinding; 1]>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct BufferBinding {
    pub(crate) buffer: GLuint,
    pub(crate) offset: usize,
    pub(crate) range: usize,
    /// Total buffer size, to clamp dynamic-offset ranges.
    pub(crate) buffer_size: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BufferWrite {
    pub(crate) binding: u32,
    pub(crate) first_array_element: u32,
    pub(crate) entries: SmallVec<[BufferBinding; 1]>,
}

//--------------------------------------------------------------------------------------------------

#[derive(Debug)]
pub struct GlDescriptorSet {
    pub(crate) layout: Arc<GlDescriptorSetLayout>,
    pub(crate) input_attachments: Vec<TextureWrite>,
    pub(crate) combined_image_samplers: Vec<TextureWrite>,
    pub(crate) samplers: Vec<SamplerWrite>,
    pub(crate) sampled_images: Vec<TextureWrite>,
    pub(crate) storage_images: Vec<ImageUnitWrite>,
    pub(crate) uniform_buffers: Vec<BufferWrite>,
    pub(crate) storage_buffers: Vec<BufferWrite>,
    pub(crate) texel_buffers: Vec<TextureWrite>,
    /// Dynamic-offset subsets, kept in ascending binding order so per-bind
    /// offsets can be consumed positionally.
    pub(crate) dynamic_uniform_buffers: Vec<BufferWrite>,
    pub(crate) dynamic_storage_buffers: Vec<BufferWrite>,
}

impl GlDescriptorSet {
    pub(crate) fn new(layout: Arc<GlDescriptorSetLayout>) -> GlDescriptorSet {
        GlDescriptorSet {
            layout,
            input_attachments: Vec::new(),
            combined_image_samplers: Vec::new(),
            samplers: Vec::new(),
            sampled_images: Vec::new(),
            storage_images: Vec::new(),
            uniform_buffers: Vec::new(),
            storage_buffers: Vec::new(),
            texel_buffers: Vec::new(),
            dynamic_uniform_buffers: Vec::new(),
            dynamic_storage_buffers: Vec::new(),
        }
    }

    /// Resolves and stores the writes. A write with a descriptor count of
    /// zero contributes nothing. The set is expected to be fully updated
    /// before its first bind and not touched afterwards; dynamic offsets are
    /// supplied per bind call, never stored here.
    pub fn update(&mut self, writes: &[DescriptorWrite]) {
        for w in writes {
            debug_assert!(
                self.layout
                    .binding(w.binding)
                    .map_or(false, |b| b.descriptor_type == w.descriptor_type),
                "descriptor write (binding={}, type={:?}) does not match the set layout",
                w.binding,
                w.descriptor_type
            );

            match w.descriptor_type {
                DescriptorType::CombinedImageSampler => {
                    let entries: SmallVec<[TextureBinding; 1]> = w
                        .images
                        .iter()
                        .map(|d| TextureBinding {
                            texture: d.view.obj,
                            sampler: d
                                .sampler
                                .expect("combined image sampler write without a sampler")
                                .obj,
                            swizzle: d.view.swizzle,
                        })
                        .collect();
                    if !entries.is_empty() {
                        self.combined_image_samplers.push(TextureWrite {
                            binding: w.binding,
                            first_array_element: w.first_array_element,
                            entries,
                        });
                    }
                }
                DescriptorType::SampledImage => {
                    let entries: SmallVec<[TextureBinding; 1]> = w
                        .images
                        .iter()
                        .map(|d| TextureBinding {
                            texture: d.view.obj,
                            sampler: 0,
                            swizzle: d.view.swizzle,
                        })
                        .collect();
                    if !entries.is_empty() {
                        self.sampled_images.push(TextureWrite {
                            binding: w.binding,
                            first_array_element: w.first_array_element,
                            entries,
                        });
                    }
                }
                DescriptorType::InputAttachment => {
                    let entries: SmallVec<[TextureBinding; 1]> = w
                        .images
                        .iter()
                        .map(|d| TextureBinding {
                            texture: d.view.obj,
                            sampler: 0,
                            swizzle: d.view.swizzle,
                        })
                        .collect();
                    if !entries.is_empty() {
                        self.input_attachments.push(TextureWrite {
                            binding: w.binding,
                            first_array_element: w.first_array_element,
                            entries,
                        });
                    }
                }
                DescriptorType::Sampler => {
                    let samplers: SmallVec<[GLuint; 1]> =
                        w.samplers.iter().map(|s| s.obj).collect();
                    if !samplers.is_empty() {
                        self.samplers.push(SamplerWrite {
                            binding: w.binding,
                            first_array_element: w.first_array_element,
                            samplers,
                        });
                    }
                }
                DescriptorType::StorageImage => {
                    let entries: SmallVec<[ImageUnitBinding; 1]> = w
                        .images
                        .iter()
                        .map(|d| ImageUnitBinding {
                            texture: d.view.obj,
                            level: d.view.range.base_mip_level as i32,
                            layered: d.view.range.layer_count > 1,
                            layer: d.view.range.base_array_layer as i32,
                            format: GlFormatInfo::from_format(d.view.format).internal_fmt,
                        })
                        .collect();
                    if !entries.is_empty() {
                        self.storage_images.push(ImageUnitWrite {
                            binding: w.binding,
                            first_array_element: w.first_array_element,
                            entries,
                        });
                    }
                }
                DescriptorType::UniformTexelBuffer => {
                    let entries: SmallVec<[TextureBinding; 1]> = w
                        .texel_buffers
                        .iter()
                        .map(|v| TextureBinding {
                            texture: v.texture,
                            sampler: 0,
                            swizzle: ComponentMapping::identity(),
                        })
                        .collect();
                    if !entries.is_empty() {
                        self.texel_buffers.push(TextureWrite {
                            binding: w.binding,
                            first_array_element: w.first_array_element,
                            entries,
                        });
                    }
                }
                DescriptorType::UniformBuffer
                | DescriptorType::StorageBuffer
                | DescriptorType::UniformBufferDynamic
                | DescriptorType::StorageBufferDynamic => {
                    let entries: SmallVec<[BufferBinding; 1]> = w
                        .buffers
                        .iter()
                        .map(|b| BufferBinding {
                            buffer: b.buffer.obj,
                            offset: b.offset,
                            range: b.range,
                            buffer_size: b.buffer.size,
                        })
                        .collect();
                    if entries.is_empty() {
                        continue;
                    }
                    let write = BufferWrite {
                        binding: w.binding,
                        first_array_element: w.first_array_element,
                        entries,
                    };
                    match w.descriptor_type {
                        DescriptorType::UniformBuffer => self.uniform_buffers.push(write),
                        DescriptorType::StorageBuffer => self.storage_buffers.push(write),
                        DescriptorType::UniformBufferDynamic => {
                            self.dynamic_uniform_buffers.push(write)
                        }
                        DescriptorType::StorageBufferDynamic => {
                            self.dynamic_storage_buffers.push(write)
                        }
                        _ => unreachable!(),
                    }
                }
            }
        }

        // dynamic offsets are consumed in binding order at bind time
        self.dynamic_uniform_buffers.sort_by_key(|w| w.binding);
        self.dynamic_storage_buffers.sort_by_key(|w| w.binding);
    }

    /// Number of dynamic descriptors actually written; a bind call must
    /// supply exactly this many offsets, in binding order.
    pub fn dynamic_descriptor_count(&self) -> usize {
        self.dynamic_uniform_buffers
            .iter()
            .chain(self.dynamic_storage_buffers.iter())
            .map(|w| w.entries.len())
            .sum()
    }

    /// Dynamic buffer writes in consumption order: uniform-dynamic and
    /// storage-dynamic interleaved by ascending binding index.
    pub(crate) fn dynamic_writes(&self) -> Vec<(&BufferWrite, GLenum)> {
        let mut v: Vec<(&BufferWrite, GLenum)> = self
            .dynamic_uniform_buffers
            .iter()
            .map(|w| (w, gl::UNIFORM_BUFFER))
            .chain(
                self.dynamic_storage_buffers
                    .iter()
                    .map(|w| (w, gl::SHADER_STORAGE_BUFFER)),
            )
            .collect();
        v.sort_by_key(|(w, _)| w.binding);
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism::descriptor::{DescriptorSetLayoutBinding, DescriptorSetLayoutDescription};
    use prism::pipeline::ShaderStageFlags;

    fn set_with_layout(bindings: Vec<DescriptorSetLayoutBinding>) -> GlDescriptorSet {
        GlDescriptorSet::new(Arc::new(GlDescriptorSetLayout::new(
            &DescriptorSetLayoutDescription { bindings },
        )))
    }

    #[test]
    fn zero_count_write_resolves_to_nothing() {
        let mut set = set_with_layout(vec![DescriptorSetLayoutBinding {
            binding: 0,
            descriptor_type: DescriptorType::UniformBuffer,
            count: 4,
            stage_flags: ShaderStageFlags::ALL_GRAPHICS,
        }]);
        set.update(&[DescriptorWrite {
            binding: 0,
            descriptor_type: DescriptorType::UniformBuffer,
            buffers: &[],
            ..DescriptorWrite::default()
        }]);
        assert!(set.uniform_buffers.is_empty());
        assert_eq!(set.dynamic_descriptor_count(), 0);
    }

    #[test]
    fn dynamic_writes_are_ordered_by_binding() {
        let mut set = set_with_layout(vec![
            DescriptorSetLayoutBinding {
                binding: 0,
                descriptor_type: DescriptorType::StorageBufferDynamic,
                count: 1,
                stage_flags: ShaderStageFlags::ALL_GRAPHICS,
            },
            DescriptorSetLayoutBinding {
                binding: 1,
                descriptor_type: DescriptorType::UniformBufferDynamic,
                count: 1,
                stage_flags: ShaderStageFlags::ALL_GRAPHICS,
            },
        ]);
        // resolved records are constructed directly to keep the test headless
        set.dynamic_uniform_buffers.push(BufferWrite {
            binding: 1,
            first_array_element: 0,
            entries: smallvec::smallvec![BufferBinding {
                buffer: 1,
                offset: 0,
                range: 64,
                buffer_size: 1024
            }],
        });
        set.dynamic_storage_buffers.push(BufferWrite {
            binding: 0,
            first_array_element: 0,
            entries: smallvec::smallvec![BufferBinding {
                buffer: 2,
                offset: 0,
                range: 64,
                buffer_size: 1024
            }],
        });
        let order: Vec<u32> = set.dynamic_writes().iter().map(|(w, _)| w.binding).collect();
        assert_eq!(order, vec![0, 1]);
        assert_eq!(set.dynamic_descriptor_count(), 2);
    }
}
