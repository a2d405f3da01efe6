//! Graphics and compute pipelines.
//!
//! A pipeline bakes a linked program, a complete fixed-function state
//! snapshot, the attached layout and the dynamic-state table at creation
//! time. Binding a pipeline at replay is a pure state-cache diff against
//! whatever was applied before.

use crate::api::types::*;
use crate::context::ContextGuard;
use crate::format::GlFormatInfo;
use crate::layout::GlPipelineLayout;
use crate::ops::GlOp;
use crate::pass::GlRenderPass;
use crate::shader::{create_program, GlShaderModule};
use crate::state::StateCache;
use prism::limits::DeviceFeatures;
use prism::pipeline::{
    ColorBlendState, DepthStencilState, DynamicStateFlags, InputAssemblyState, MultisampleState,
    RasterizationState, Scissor, TessellationState, VertexInputBindingDescription,
    VertexInputState, Viewport,
};
use prism::Result;
use std::sync::Arc;

pub struct GraphicsShaderStages<'a> {
    pub vertex: &'a GlShaderModule,
    pub fragment: Option<&'a GlShaderModule>,
    pub geometry: Option<&'a GlShaderModule>,
    pub tess_control: Option<&'a GlShaderModule>,
    pub tess_eval: Option<&'a GlShaderModule>,
}

#[derive(Clone, Debug, Default)]
pub struct ViewportState {
    pub viewports: Vec<Viewport>,
    pub scissors: Vec<Scissor>,
}

pub struct GraphicsPipelineCreateInfo<'a> {
    pub stages: GraphicsShaderStages<'a>,
    pub vertex_input: VertexInputState,
    pub input_assembly: InputAssemblyState,
    pub tessellation: Option<TessellationState>,
    /// Ignored for the states marked dynamic.
    pub viewport_state: ViewportState,
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub depth_stencil: DepthStencilState,
    pub color_blend: ColorBlendState,
    pub dynamic: DynamicStateFlags,
    pub layout: Arc<GlPipelineLayout>,
    pub render_pass: Arc<GlRenderPass>,
    pub subpass: u32,
}

#[derive(Debug)]
pub struct GlGraphicsPipeline {
    pub(crate) program: GLuint,
    pub(crate) vao: GLuint,
    pub(crate) owns_vao: bool,
    pub(crate) layout: Arc<GlPipelineLayout>,
    pub(crate) input_assembly: InputAssemblyState,
    pub(crate) rasterization: RasterizationState,
    pub(crate) depth_stencil: DepthStencilState,
    pub(crate) color_blend: ColorBlendState,
    pub(crate) multisample: MultisampleState,
    pub(crate) tessellation: Option<TessellationState>,
    pub(crate) viewports: Vec<Viewport>,
    pub(crate) scissors: Vec<Scissor>,
    pub(crate) dynamic: DynamicStateFlags,
    pub(crate) vertex_bindings: Vec<VertexInputBindingDescription>,
}

pub(crate) fn create_vertex_array_object(guard: &ContextGuard, input: &VertexInputState) -> GLuint {
    let gl = guard.gl();
    let mut vao = 0;
    unsafe {
        gl.CreateVertexArrays(1, &mut vao);
    }
    for a in &input.attributes {
        let (size, normalized) = GlFormatInfo::vertex_attrib_info(a.format);
        let glfmt = GlFormatInfo::from_format(a.format);
        unsafe {
            gl.EnableVertexArrayAttrib(vao, a.location);
            gl.VertexArrayAttribFormat(
                vao,
                a.location,
                size,
                glfmt.upload_ty,
                normalized as u8,
                a.offset,
            );
            gl.VertexArrayAttribBinding(vao, a.location, a.binding);
        }
    }
    for b in &input.bindings {
        if b.input_rate == prism::pipeline::VertexInputRate::Instance {
            unsafe {
                gl.VertexArrayBindingDivisor(vao, b.binding, 1);
            }
        }
    }
    vao
}

pub(crate) fn create_graphics_pipeline_internal(
    guard: &ContextGuard,
    features: &DeviceFeatures,
    dummy_vao: GLuint,
    ci: &GraphicsPipelineCreateInfo,
) -> Result<GlGraphicsPipeline> {
    let mut modules = vec![ci.stages.vertex];
    if let Some(m) = ci.stages.tess_control {
        modules.push(m);
    }
    if let Some(m) = ci.stages.tess_eval {
        modules.push(m);
    }
    if let Some(m) = ci.stages.geometry {
        modules.push(m);
    }
    if let Some(m) = ci.stages.fragment {
        modules.push(m);
    }
    let program = create_program(guard, &modules, features.spirv_shaders)?;

    // mesh-less pipelines share the device's dummy VAO
    let (vao, owns_vao) = if ci.vertex_input.attributes.is_empty() {
        (dummy_vao, false)
    } else {
        (create_vertex_array_object(guard, &ci.vertex_input), true)
    };

    if !features.independent_blend {
        let enabled: Vec<_> = ci
            .color_blend
            .attachments
            .iter()
            .filter(|a| a.is_enabled())
            .collect();
        if enabled.len() > 1 && enabled.windows(2).any(|w| w[0] != w[1]) {
            // structural GL limitation: without per-draw-buffer blend only
            // the first enabled attachment's function can be expressed
            warn!(
                "pipeline declares diverging per-attachment blend states on a target \
                 without per-draw-buffer blend; the first enabled attachment's \
                 function applies to all draw buffers"
            );
        }
    }

    Ok(GlGraphicsPipeline {
        program,
        vao,
        owns_vao,
        layout: ci.layout.clone(),
        input_assembly: ci.input_assembly,
        rasterization: ci.rasterization,
        depth_stencil: ci.depth_stencil,
        color_blend: ci.color_blend.clone(),
        multisample: ci.multisample,
        tessellation: ci.tessellation,
        viewports: ci.viewport_state.viewports.clone(),
        scissors: ci.viewport_state.scissors.clone(),
        dynamic: ci.dynamic,
        vertex_bindings: ci.vertex_input.bindings.clone(),
    })
}

impl GlGraphicsPipeline {
    pub(crate) fn apply(&self, cache: &mut StateCache, force: bool, out: &mut Vec<GlOp>) {
        cache.set_program(self.program, force, out);
        cache.set_vertex_array(self.vao, force, out);
        cache.apply_input_assembly(&self.input_assembly, force, out);
        cache.apply_rasterization(&self.rasterization, self.dynamic, force, out);
        cache.apply_depth_stencil(&self.depth_stencil, force, out);
        cache.apply_color_blend(&self.color_blend, self.dynamic, force, out);
        cache.apply_multisample(&self.multisample, force, out);
        cache.apply_tessellation(self.tessellation, force, out);
        if !self.dynamic.contains(DynamicStateFlags::VIEWPORT) && !self.viewports.is_empty() {
            cache.set_viewports(&self.viewports, force, out);
        }
        if !self.dynamic.contains(DynamicStateFlags::SCISSOR) && !self.scissors.is_empty() {
            cache.set_scissors(&self.scissors, force, out);
        }
    }

    pub fn destroy(&self, guard: &ContextGuard) {
        unsafe {
            guard.gl().DeleteProgram(self.program);
            if self.owns_vao {
                guard.gl().DeleteVertexArrays(1, &self.vao);
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------

pub struct ComputePipelineCreateInfo<'a> {
    pub stage: &'a GlShaderModule,
    pub layout: Arc<GlPipelineLayout>,
}

#[derive(Debug)]
pub struct GlComputePipeline {
    pub(crate) program: GLuint,
    pub(crate) layout: Arc<GlPipelineLayout>,
}

pub(crate) fn create_compute_pipeline_internal(
    guard: &ContextGuard,
    features: &DeviceFeatures,
    ci: &ComputePipelineCreateInfo,
) -> Result<GlComputePipeline> {
    let program = create_program(guard, &[ci.stage], features.spirv_shaders)?;
    Ok(GlComputePipeline {
        program,
        layout: ci.layout.clone(),
    })
}

impl GlComputePipeline {
    pub fn destroy(&self, guard: &ContextGuard) {
        unsafe {
            guard.gl().DeleteProgram(self.program);
        }
    }
}
