//! Device-wide limits and feature flags, queried once at device creation.

#[derive(Copy, Clone, Debug)]
pub struct DeviceLimits {
    pub max_color_attachments: u32,
    pub max_draw_buffers: u32,
    pub max_viewports: u32,
    pub max_combined_texture_units: u32,
    pub max_image_units: u32,
    pub max_uniform_buffer_bindings: u32,
    pub max_storage_buffer_bindings: u32,
    pub uniform_buffer_offset_alignment: usize,
    pub storage_buffer_offset_alignment: usize,
    pub max_samples: u32,
    pub max_vertex_attributes: u32,
}

impl Default for DeviceLimits {
    /// Conservative GL 4.x minimums; real devices overwrite these with
    /// queried values.
    fn default() -> DeviceLimits {
        DeviceLimits {
            max_color_attachments: 8,
            max_draw_buffers: 8,
            max_viewports: 16,
            max_combined_texture_units: 48,
            max_image_units: 8,
            max_uniform_buffer_bindings: 36,
            max_storage_buffer_bindings: 8,
            uniform_buffer_offset_alignment: 256,
            storage_buffer_offset_alignment: 256,
            max_samples: 4,
            max_vertex_attributes: 16,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DeviceFeatures {
    /// Per-draw-buffer blend equations/functions (`glBlendFuncSeparatei`).
    /// Without it a single aggregate blend toggle is all GL can express and
    /// the state cache degrades accordingly.
    pub independent_blend: bool,
    /// `GL_ARB_gl_spirv`: shader modules can be consumed as SPIR-V binaries.
    pub spirv_shaders: bool,
    pub sample_shading: bool,
    pub texture_views: bool,
    pub tessellation: bool,
    pub compute: bool,
}

impl Default for DeviceFeatures {
    fn default() -> DeviceFeatures {
        DeviceFeatures {
            independent_blend: true,
            spirv_shaders: false,
            sample_shading: true,
            texture_views: true,
            tessellation: true,
            compute: true,
        }
    }
}
