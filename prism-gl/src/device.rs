//! Logical device.
//!
//! The device owns the context, the queue map, the device-wide dummy
//! geometry (an index buffer written exactly once at initialization and a
//! VAO whose element binding the after-submit lists keep re-asserting), the
//! sampler cache, and the context state cache shared by queue replay.

use crate::api as gl;
use crate::api::types::*;
use crate::buffer::{create_buffer, BufferUsageFlags, GlBuffer, GlBufferView};
use crate::command::GlCommandBuffer;
use crate::context::{ContextGuard, GlContext};
use crate::descriptor::GlDescriptorSet;
use crate::framebuffer::GlFramebuffer;
use crate::image::{GlImage, GlImageView};
use crate::layout::{GlDescriptorSetLayout, GlPipelineLayout};
use crate::pass::GlRenderPass;
use crate::pipeline::{
    create_compute_pipeline_internal, create_graphics_pipeline_internal, ComputePipelineCreateInfo,
    GlComputePipeline, GlGraphicsPipeline, GraphicsPipelineCreateInfo,
};
use crate::sampler::{GlSampler, SamplerCache};
use crate::shader::GlShaderModule;
use crate::state::StateCache;
use crate::sync::{GlFence, GlSemaphore};
use prism::descriptor::DescriptorSetLayoutDescription;
use prism::format::Format;
use prism::image::{ComponentMapping, ImageCreateInfo, SamplerDescription, SubresourceRange};
use prism::limits::{DeviceFeatures, DeviceLimits};
use prism::pass::RenderPassDescription;
use prism::pipeline::ShaderStageFlags;
use prism::Result;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

/// Number of indices in the device dummy index buffer.
const DUMMY_INDEX_COUNT: u32 = 1024;

pub(crate) struct DeviceInner {
    pub(crate) context: Arc<GlContext>,
    pub(crate) limits: DeviceLimits,
    pub(crate) features: DeviceFeatures,
    pub(crate) state_cache: RefCell<StateCache>,
    pub(crate) sampler_cache: RefCell<SamplerCache>,
    pub(crate) dummy_vao: GLuint,
    pub(crate) dummy_index_buffer: GLuint,
}

pub struct GlDevice {
    inner: Arc<DeviceInner>,
    /// Queue count per family index; GL exposes a single universal family.
    queue_families: Vec<u32>,
}

fn populate_limits(gl: &gl::Gl) -> DeviceLimits {
    let getint = |param| unsafe {
        let mut v = 0;
        gl.GetIntegerv(param, &mut v);
        v
    };
    DeviceLimits {
        max_color_attachments: getint(gl::MAX_COLOR_ATTACHMENTS) as u32,
        max_draw_buffers: getint(gl::MAX_DRAW_BUFFERS) as u32,
        max_viewports: getint(gl::MAX_VIEWPORTS) as u32,
        max_combined_texture_units: getint(gl::MAX_COMBINED_TEXTURE_IMAGE_UNITS) as u32,
        max_image_units: getint(gl::MAX_IMAGE_UNITS) as u32,
        max_uniform_buffer_bindings: getint(gl::MAX_UNIFORM_BUFFER_BINDINGS) as u32,
        max_storage_buffer_bindings: getint(gl::MAX_SHADER_STORAGE_BUFFER_BINDINGS) as u32,
        uniform_buffer_offset_alignment: getint(gl::UNIFORM_BUFFER_OFFSET_ALIGNMENT) as usize,
        storage_buffer_offset_alignment: getint(gl::SHADER_STORAGE_BUFFER_OFFSET_ALIGNMENT)
            as usize,
        max_samples: getint(gl::MAX_SAMPLES) as u32,
        max_vertex_attributes: getint(gl::MAX_VERTEX_ATTRIBS) as u32,
    }
}

fn extension_set(gl: &gl::Gl) -> HashSet<String> {
    let mut extensions = HashSet::new();
    unsafe {
        let mut count = 0;
        gl.GetIntegerv(gl::NUM_EXTENSIONS, &mut count);
        for i in 0..count as u32 {
            let name = gl.GetStringi(gl::EXTENSIONS, i);
            if !name.is_null() {
                extensions.insert(
                    std::ffi::CStr::from_ptr(name as *const _)
                        .to_string_lossy()
                        .into_owned(),
                );
            }
        }
    }
    extensions
}

fn populate_features(gl: &gl::Gl, version: (u32, u32)) -> DeviceFeatures {
    let extensions = extension_set(gl);
    DeviceFeatures {
        independent_blend: version >= (4, 0),
        spirv_shaders: extensions.contains("GL_ARB_gl_spirv") && gl.SpecializeShader.is_loaded(),
        sample_shading: version >= (4, 0),
        texture_views: version >= (4, 3) || extensions.contains("GL_ARB_texture_view"),
        tessellation: version >= (4, 0),
        compute: version >= (4, 3),
    }
}

impl GlDevice {
    /// Creates the device on an existing context. Queries limits and
    /// features once, then initializes the dummy geometry.
    pub fn new(context: Arc<GlContext>) -> Result<GlDevice> {
        let (limits, features, dummy_vao, dummy_index_buffer) = {
            let guard = context.enable()?;
            let gl = guard.gl();
            let limits = populate_limits(gl);
            let features = populate_features(gl, context.version());

            // written once here, read-only for the device's whole lifetime
            let indices: Vec<u32> = (0..DUMMY_INDEX_COUNT).collect();
            let bytes = unsafe {
                std::slice::from_raw_parts(indices.as_ptr() as *const u8, indices.len() * 4)
            };
            let dummy_index_buffer = create_buffer(gl, bytes.len(), 0, Some(bytes));
            let mut dummy_vao = 0;
            unsafe {
                gl.CreateVertexArrays(1, &mut dummy_vao);
                gl.VertexArrayElementBuffer(dummy_vao, dummy_index_buffer);
            }
            (limits, features, dummy_vao, dummy_index_buffer)
        };

        debug!(
            "device limits: {:?}; features: {:?}",
            limits, features
        );

        Ok(GlDevice {
            inner: Arc::new(DeviceInner {
                context,
                limits,
                features,
                state_cache: RefCell::new(StateCache::new(&features)),
                sampler_cache: RefCell::new(SamplerCache::new()),
                dummy_vao,
                dummy_index_buffer,
            }),
            queue_families: vec![1],
        })
    }

    pub fn context(&self) -> &Arc<GlContext> {
        &self.inner.context
    }

    pub fn limits(&self) -> &DeviceLimits {
        &self.inner.limits
    }

    pub fn features(&self) -> &DeviceFeatures {
        &self.inner.features
    }

    pub fn queue_family_count(&self) -> usize {
        self.queue_families.len()
    }

    pub fn queue(&self, family: u32, index: u32) -> crate::queue::GlQueue {
        assert!(
            (family as usize) < self.queue_families.len()
                && index < self.queue_families[family as usize],
            "queue ({}, {}) does not exist",
            family,
            index
        );
        crate::queue::GlQueue {
            inner: self.inner.clone(),
            family,
            index,
        }
    }

    /// Object deletions can silently unbind live state; forget the cache so
    /// the next submission re-applies from scratch.
    pub fn invalidate_state_cache(&self) {
        self.inner.state_cache.borrow_mut().invalidate();
    }

    //----------------------------------------------------------------------------------------------
    // object creation

    pub fn create_buffer(
        &self,
        guard: &ContextGuard,
        size: usize,
        usage: BufferUsageFlags,
        initial_data: Option<&[u8]>,
    ) -> Arc<GlBuffer> {
        Arc::new(GlBuffer::new(guard, size, usage, initial_data))
    }

    pub fn create_buffer_view(
        &self,
        guard: &ContextGuard,
        buffer: &GlBuffer,
        format: Format,
        offset: usize,
        range: usize,
    ) -> Arc<GlBufferView> {
        Arc::new(GlBufferView::new(guard, buffer, format, offset, range))
    }

    pub fn create_image(&self, guard: &ContextGuard, info: &ImageCreateInfo) -> Arc<GlImage> {
        Arc::new(GlImage::new(guard, info))
    }

    pub fn create_image_view(
        &self,
        guard: &ContextGuard,
        image: &GlImage,
        range: SubresourceRange,
        swizzle: ComponentMapping,
    ) -> Arc<GlImageView> {
        Arc::new(GlImageView::new(guard, image, range, swizzle))
    }

    pub fn create_sampler(&self, guard: &ContextGuard, desc: &SamplerDescription) -> GlSampler {
        let obj = self
            .inner
            .sampler_cache
            .borrow_mut()
            .get_sampler(guard, desc);
        GlSampler { obj, desc: *desc }
    }

    /// Shader modules are opaque blobs; no GL work happens until pipeline
    /// creation, so no guard is needed.
    pub fn create_shader_module(&self, data: &[u8], stage: ShaderStageFlags) -> Arc<GlShaderModule> {
        Arc::new(GlShaderModule::new(data, stage))
    }

    pub fn create_descriptor_set_layout(
        &self,
        description: &DescriptorSetLayoutDescription,
    ) -> Arc<GlDescriptorSetLayout> {
        Arc::new(GlDescriptorSetLayout::new(description))
    }

    pub fn create_descriptor_set(&self, layout: &Arc<GlDescriptorSetLayout>) -> GlDescriptorSet {
        GlDescriptorSet::new(layout.clone())
    }

    pub fn create_pipeline_layout(
        &self,
        set_layouts: &[&GlDescriptorSetLayout],
    ) -> Arc<GlPipelineLayout> {
        Arc::new(GlPipelineLayout::new(set_layouts))
    }

    pub fn create_render_pass(&self, description: &RenderPassDescription) -> Arc<GlRenderPass> {
        Arc::new(GlRenderPass::new(description))
    }

    pub fn create_framebuffer(
        &self,
        guard: &ContextGuard,
        render_pass: &Arc<GlRenderPass>,
        attachments: &[&GlImageView],
        extent: (u32, u32),
    ) -> Result<Arc<GlFramebuffer>> {
        GlFramebuffer::new(guard, render_pass, attachments, extent).map(Arc::new)
    }

    pub fn create_graphics_pipeline(
        &self,
        guard: &ContextGuard,
        create_info: &GraphicsPipelineCreateInfo,
    ) -> Result<Arc<GlGraphicsPipeline>> {
        create_graphics_pipeline_internal(
            guard,
            &self.inner.features,
            self.inner.dummy_vao,
            create_info,
        )
        .map(Arc::new)
    }

    pub fn create_compute_pipeline(
        &self,
        guard: &ContextGuard,
        create_info: &ComputePipelineCreateInfo,
    ) -> Result<Arc<GlComputePipeline>> {
        create_compute_pipeline_internal(guard, &self.inner.features, create_info).map(Arc::new)
    }

    pub fn create_command_buffer(&self) -> GlCommandBuffer {
        GlCommandBuffer::new(self.inner.dummy_vao, self.inner.dummy_index_buffer)
    }

    pub fn create_fence(&self) -> GlFence {
        GlFence::new()
    }

    pub fn create_semaphore(&self) -> GlSemaphore {
        GlSemaphore::new()
    }

    /// Destroys the dummy geometry. All dependent objects must already be
    /// gone; the context itself dies with the last `Arc<GlContext>`.
    pub fn destroy(&self, guard: &ContextGuard) {
        unsafe {
            guard.gl().DeleteVertexArrays(1, &self.inner.dummy_vao);
            guard.gl().DeleteBuffers(1, &self.inner.dummy_index_buffer);
        }
    }
}
