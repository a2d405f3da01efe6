//! Context state cache.
//!
//! Holds the currently-applied fixed-function state and emits only the ops
//! needed to move the live context from the old state to the new one. The
//! cache never issues GL calls itself: setters push [GlOp]s into the active
//! op stream, which keeps the diff logic testable without a context.
//!
//! Invariant: after a setter returns, the cached value reflects exactly what
//! the live context will hold once the emitted ops execute. State is only
//! ever mutated through the setters.

use crate::api as gl;
use crate::api::types::*;
use crate::ops::GlOp;
use ordered_float::NotNan;
use prism::command::IndexType;
use prism::limits::DeviceFeatures;
use prism::pipeline::{
    BlendFactor, BlendOp, ColorBlendAttachmentState, ColorBlendState, CompareOp, CullModeFlags,
    DepthBias, DepthStencilState, DynamicStateFlags, FrontFace, InputAssemblyState, LogicOp,
    MultisampleState, PolygonMode, PrimitiveTopology, RasterizationState, Scissor, StencilOp,
    StencilOpState, StencilTest, TessellationState, Viewport,
};

//--------------------------------------------------------------------------------------------------
// enum translation

pub(crate) fn topology_to_gl(topo: PrimitiveTopology) -> GLenum {
    match topo {
        PrimitiveTopology::PointList => gl::POINTS,
        PrimitiveTopology::LineList => gl::LINES,
        PrimitiveTopology::LineStrip => gl::LINE_STRIP,
        PrimitiveTopology::TriangleList => gl::TRIANGLES,
        PrimitiveTopology::TriangleStrip => gl::TRIANGLE_STRIP,
        PrimitiveTopology::TriangleFan => gl::TRIANGLE_FAN,
        PrimitiveTopology::PatchList => gl::PATCHES,
    }
}

fn stencil_op_to_gl(op: StencilOp) -> GLenum {
    match op {
        StencilOp::Keep => gl::KEEP,
        StencilOp::Zero => gl::ZERO,
        StencilOp::Replace => gl::REPLACE,
        StencilOp::IncrementAndClamp => gl::INCR,
        StencilOp::DecrementAndClamp => gl::DECR,
        StencilOp::Invert => gl::INVERT,
        StencilOp::IncrementAndWrap => gl::INCR_WRAP,
        StencilOp::DecrementAndWrap => gl::DECR_WRAP,
    }
}

fn compare_op_to_gl(op: CompareOp) -> GLenum {
    match op {
        CompareOp::Never => gl::NEVER,
        CompareOp::Less => gl::LESS,
        CompareOp::Equal => gl::EQUAL,
        CompareOp::LessOrEqual => gl::LEQUAL,
        CompareOp::Greater => gl::GREATER,
        CompareOp::NotEqual => gl::NOTEQUAL,
        CompareOp::GreaterOrEqual => gl::GEQUAL,
        CompareOp::Always => gl::ALWAYS,
    }
}

fn blend_factor_to_gl(f: BlendFactor) -> GLenum {
    match f {
        BlendFactor::Zero => gl::ZERO,
        BlendFactor::One => gl::ONE,
        BlendFactor::SrcColor => gl::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => gl::DST_COLOR,
        BlendFactor::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => gl::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => gl::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => gl::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => gl::ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::ConstantAlpha => gl::CONSTANT_ALPHA,
        BlendFactor::OneMinusConstantAlpha => gl::ONE_MINUS_CONSTANT_ALPHA,
        BlendFactor::SrcAlphaSaturate => gl::SRC_ALPHA_SATURATE,
        BlendFactor::Src1Color => gl::SRC1_COLOR,
        BlendFactor::OneMinusSrc1Color => gl::ONE_MINUS_SRC1_COLOR,
        BlendFactor::Src1Alpha => gl::SRC1_ALPHA,
        BlendFactor::OneMinusSrc1Alpha => gl::ONE_MINUS_SRC1_ALPHA,
    }
}

fn blend_op_to_gl(op: BlendOp) -> GLenum {
    match op {
        BlendOp::Add => gl::FUNC_ADD,
        BlendOp::Subtract => gl::FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => gl::MIN,
        BlendOp::Max => gl::MAX,
    }
}

fn logic_op_to_gl(op: LogicOp) -> GLenum {
    match op {
        LogicOp::Clear => gl::CLEAR,
        LogicOp::And => gl::AND,
        LogicOp::AndReverse => gl::AND_REVERSE,
        LogicOp::Copy => gl::COPY,
        LogicOp::AndInverted => gl::AND_INVERTED,
        LogicOp::NoOp => gl::NOOP,
        LogicOp::Xor => gl::XOR,
        LogicOp::Or => gl::OR,
        LogicOp::Nor => gl::NOR,
        LogicOp::Equivalent => gl::EQUIV,
        LogicOp::Invert => gl::INVERT,
        LogicOp::OrReverse => gl::OR_REVERSE,
        LogicOp::CopyInverted => gl::COPY_INVERTED,
        LogicOp::OrInverted => gl::OR_INVERTED,
        LogicOp::Nand => gl::NAND,
        LogicOp::Set => gl::SET,
    }
}

fn front_face_to_gl(f: FrontFace) -> GLenum {
    match f {
        FrontFace::CounterClockwise => gl::CCW,
        FrontFace::Clockwise => gl::CW,
    }
}

fn polygon_mode_to_gl(m: PolygonMode) -> GLenum {
    match m {
        PolygonMode::Fill => gl::FILL,
        PolygonMode::Line => gl::LINE,
        PolygonMode::Point => gl::POINT,
    }
}

pub(crate) fn index_type_to_gl(ty: IndexType) -> GLenum {
    match ty {
        IndexType::U16 => gl::UNSIGNED_SHORT,
        IndexType::U32 => gl::UNSIGNED_INT,
    }
}

//--------------------------------------------------------------------------------------------------

/// `force` treats the cached value as unknown; used on the very first bind of
/// a command buffer, where "previous state" is otherwise undefined.
fn update<T: PartialEq + Clone>(slot: &mut Option<T>, new: &T, force: bool) -> bool {
    if force || slot.as_ref() != Some(new) {
        *slot = Some(new.clone());
        true
    } else {
        false
    }
}

pub struct StateCache {
    independent_blend: bool,

    program: Option<GLuint>,
    vertex_array: Option<GLuint>,
    draw_framebuffer: Option<GLuint>,
    index_buffer: Option<GLuint>,
    index_offset: Option<usize>,
    index_type: Option<IndexType>,

    primitive_restart: Option<bool>,

    cull_enable: Option<bool>,
    cull_mode: Option<CullModeFlags>,
    front_face: Option<FrontFace>,
    polygon_mode: Option<PolygonMode>,
    depth_bias_enable: Option<bool>,
    depth_bias: Option<DepthBias>,
    line_width: Option<NotNan<f32>>,

    depth_test_enable: Option<bool>,
    depth_write_enable: Option<bool>,
    depth_compare_op: Option<CompareOp>,
    stencil_test_enable: Option<bool>,
    stencil_front: Option<StencilOpState>,
    stencil_back: Option<StencilOpState>,

    logic_op: Option<Option<LogicOp>>,
    blend_separate: Vec<Option<ColorBlendAttachmentState>>,
    blend_aggregate: Option<ColorBlendAttachmentState>,
    blend_constants: Option<[NotNan<f32>; 4]>,

    alpha_to_coverage: Option<bool>,
    alpha_to_one: Option<bool>,
    sample_shading: Option<Option<NotNan<f32>>>,

    patch_control_points: Option<u32>,

    viewports: Option<Vec<Viewport>>,
    scissors: Option<Vec<Scissor>>,
}

impl StateCache {
    pub fn new(features: &DeviceFeatures) -> StateCache {
        StateCache {
            independent_blend: features.independent_blend,
            program: None,
            vertex_array: None,
            draw_framebuffer: None,
            index_buffer: None,
            index_offset: None,
            index_type: None,
            primitive_restart: None,
            cull_enable: None,
            cull_mode: None,
            front_face: None,
            polygon_mode: None,
            depth_bias_enable: None,
            depth_bias: None,
            line_width: None,
            depth_test_enable: None,
            depth_write_enable: None,
            depth_compare_op: None,
            stencil_test_enable: None,
            stencil_front: None,
            stencil_back: None,
            logic_op: None,
            blend_separate: Vec::new(),
            blend_aggregate: None,
            blend_constants: None,
            alpha_to_coverage: None,
            alpha_to_one: None,
            sample_shading: None,
            patch_control_points: None,
            viewports: None,
            scissors: None,
        }
    }

    /// Forgets everything; the next setters re-emit unconditionally. Used
    /// when the live context may have changed behind the cache's back
    /// (object deletion unbinds, context switch).
    pub fn invalidate(&mut self) {
        *self = StateCache::new(&DeviceFeatures {
            independent_blend: self.independent_blend,
            ..DeviceFeatures::default()
        });
    }

    //----------------------------------------------------------------------------------------------
    // objects

    pub fn set_program(&mut self, program: GLuint, force: bool, out: &mut Vec<GlOp>) {
        if update(&mut self.program, &program, force) {
            out.push(GlOp::UseProgram(program));
        }
    }

    pub fn set_vertex_array(&mut self, vao: GLuint, force: bool, out: &mut Vec<GlOp>) {
        if update(&mut self.vertex_array, &vao, force) {
            out.push(GlOp::BindVertexArray(vao));
            // the element-array binding lives in the VAO
            self.index_buffer = None;
            self.index_offset = None;
            self.index_type = None;
        }
    }

    pub fn set_draw_framebuffer(&mut self, framebuffer: GLuint, out: &mut Vec<GlOp>) {
        if update(&mut self.draw_framebuffer, &framebuffer, false) {
            out.push(GlOp::BindFramebuffer {
                target: gl::DRAW_FRAMEBUFFER,
                framebuffer,
            });
        }
    }

    pub fn set_index_buffer(
        &mut self,
        buffer: GLuint,
        offset: usize,
        ty: IndexType,
        out: &mut Vec<GlOp>,
    ) {
        if update(&mut self.index_buffer, &buffer, false) {
            out.push(GlOp::BindBuffer {
                target: gl::ELEMENT_ARRAY_BUFFER,
                buffer,
            });
        }
        self.index_offset = Some(offset);
        self.index_type = Some(ty);
    }

    //----------------------------------------------------------------------------------------------
    // fixed function

    pub fn apply_input_assembly(
        &mut self,
        ia: &InputAssemblyState,
        force: bool,
        out: &mut Vec<GlOp>,
    ) {
        if update(&mut self.primitive_restart, &ia.primitive_restart_enable, force) {
            if ia.primitive_restart_enable {
                out.push(GlOp::Enable(gl::PRIMITIVE_RESTART_FIXED_INDEX));
            } else {
                out.push(GlOp::Disable(gl::PRIMITIVE_RESTART_FIXED_INDEX));
            }
        }
    }

    pub fn apply_rasterization(
        &mut self,
        rs: &RasterizationState,
        dynamic: DynamicStateFlags,
        force: bool,
        out: &mut Vec<GlOp>,
    ) {
        let cull_enable = rs.cull_mode != CullModeFlags::NONE;
        if update(&mut self.cull_enable, &cull_enable, force) {
            if cull_enable {
                out.push(GlOp::Enable(gl::CULL_FACE));
            } else {
                out.push(GlOp::Disable(gl::CULL_FACE));
            }
        }
        if cull_enable && update(&mut self.cull_mode, &rs.cull_mode, force) {
            let mode = if rs.cull_mode.contains(CullModeFlags::FRONT_AND_BACK) {
                gl::FRONT_AND_BACK
            } else if rs.cull_mode.contains(CullModeFlags::FRONT) {
                gl::FRONT
            } else {
                gl::BACK
            };
            out.push(GlOp::CullFace(mode));
        }
        if update(&mut self.front_face, &rs.front_face, force) {
            out.push(GlOp::FrontFace(front_face_to_gl(rs.front_face)));
        }
        if update(&mut self.polygon_mode, &rs.polygon_mode, force) {
            out.push(GlOp::PolygonMode(polygon_mode_to_gl(rs.polygon_mode)));
        }

        if !dynamic.contains(DynamicStateFlags::DEPTH_BIAS) {
            self.set_depth_bias(rs.depth_bias, force, out);
        }
        if !dynamic.contains(DynamicStateFlags::LINE_WIDTH) {
            self.set_line_width(rs.line_width, force, out);
        }
    }

    pub fn set_depth_bias(&mut self, bias: Option<DepthBias>, force: bool, out: &mut Vec<GlOp>) {
        let enable = bias.is_some();
        if update(&mut self.depth_bias_enable, &enable, force) {
            if enable {
                out.push(GlOp::Enable(gl::POLYGON_OFFSET_FILL));
                out.push(GlOp::Enable(gl::POLYGON_OFFSET_LINE));
                out.push(GlOp::Enable(gl::POLYGON_OFFSET_POINT));
            } else {
                out.push(GlOp::Disable(gl::POLYGON_OFFSET_FILL));
                out.push(GlOp::Disable(gl::POLYGON_OFFSET_LINE));
                out.push(GlOp::Disable(gl::POLYGON_OFFSET_POINT));
            }
        }
        if let Some(bias) = bias {
            if update(&mut self.depth_bias, &bias, force) {
                out.push(GlOp::PolygonOffset {
                    factor: bias.slope_factor.into_inner(),
                    units: bias.constant_factor.into_inner(),
                });
            }
        }
    }

    pub fn set_line_width(&mut self, width: NotNan<f32>, force: bool, out: &mut Vec<GlOp>) {
        if update(&mut self.line_width, &width, force) {
            out.push(GlOp::LineWidth(width.into_inner()));
        }
    }

    pub fn apply_depth_stencil(
        &mut self,
        ds: &DepthStencilState,
        force: bool,
        out: &mut Vec<GlOp>,
    ) {
        if update(&mut self.depth_test_enable, &ds.depth_test_enable, force) {
            if ds.depth_test_enable {
                out.push(GlOp::Enable(gl::DEPTH_TEST));
            } else {
                out.push(GlOp::Disable(gl::DEPTH_TEST));
            }
        }
        if update(&mut self.depth_write_enable, &ds.depth_write_enable, force) {
            out.push(GlOp::DepthMask(ds.depth_write_enable));
        }
        if update(&mut self.depth_compare_op, &ds.depth_compare_op, force) {
            out.push(GlOp::DepthFunc(compare_op_to_gl(ds.depth_compare_op)));
        }

        match ds.stencil_test {
            StencilTest::Disabled => self.set_stencil_test_enable(false, force, out),
            StencilTest::Enabled { front, back } => {
                self.set_stencil_test_enable(true, force, out);
                self.set_stencil_op(&front, &back, force, out);
            }
        }
    }

    fn set_stencil_test_enable(&mut self, enable: bool, force: bool, out: &mut Vec<GlOp>) {
        if update(&mut self.stencil_test_enable, &enable, force) {
            if enable {
                out.push(GlOp::Enable(gl::STENCIL_TEST));
            } else {
                out.push(GlOp::Disable(gl::STENCIL_TEST));
            }
        }
    }

    /// Does not implicitly enable the stencil test.
    fn set_stencil_op(
        &mut self,
        front: &StencilOpState,
        back: &StencilOpState,
        force: bool,
        out: &mut Vec<GlOp>,
    ) {
        fn emit(face: GLenum, s: &StencilOpState, out: &mut Vec<GlOp>) {
            out.push(GlOp::StencilFuncSeparate {
                face,
                func: compare_op_to_gl(s.compare_op),
                reference: s.reference as i32,
                mask: s.compare_mask,
            });
            out.push(GlOp::StencilOpSeparate {
                face,
                sfail: stencil_op_to_gl(s.fail_op),
                dpfail: stencil_op_to_gl(s.depth_fail_op),
                dppass: stencil_op_to_gl(s.pass_op),
            });
            out.push(GlOp::StencilMaskSeparate {
                face,
                mask: s.write_mask,
            });
        }

        if update(&mut self.stencil_front, front, force) {
            emit(gl::FRONT, front, out);
        }
        if update(&mut self.stencil_back, back, force) {
            emit(gl::BACK, back, out);
        }
    }

    pub fn apply_color_blend(
        &mut self,
        cb: &ColorBlendState,
        dynamic: DynamicStateFlags,
        force: bool,
        out: &mut Vec<GlOp>,
    ) {
        if update(&mut self.logic_op, &cb.logic_op, force) {
            match cb.logic_op {
                Some(op) => {
                    out.push(GlOp::Enable(gl::COLOR_LOGIC_OP));
                    out.push(GlOp::LogicOp(logic_op_to_gl(op)));
                }
                None => out.push(GlOp::Disable(gl::COLOR_LOGIC_OP)),
            }
        }

        if self.independent_blend {
            for (i, att) in cb.attachments.iter().enumerate() {
                if i >= self.blend_separate.len() {
                    self.blend_separate.resize(i + 1, None);
                }
                if force || self.blend_separate[i].as_ref() != Some(att) {
                    self.blend_separate[i] = Some(*att);
                    emit_blend_attachment(Some(i as u32), att, out);
                }
            }
        } else {
            // GL without per-draw-buffer blend exposes one global toggle:
            // enabled if any attachment blends, and only the first enabled
            // attachment's functions are expressible. Attachments that
            // disagree silently degrade to that function.
            let aggregate = cb
                .attachments
                .iter()
                .find(|a| a.is_enabled())
                .copied()
                .unwrap_or(ColorBlendAttachmentState::Disabled);
            if update(&mut self.blend_aggregate, &aggregate, force) {
                emit_blend_attachment(None, &aggregate, out);
            }
        }

        if !dynamic.contains(DynamicStateFlags::BLEND_CONSTANTS) {
            self.set_blend_constants(cb.blend_constants, force, out);
        }
    }

    pub fn set_blend_constants(
        &mut self,
        constants: [NotNan<f32>; 4],
        force: bool,
        out: &mut Vec<GlOp>,
    ) {
        if update(&mut self.blend_constants, &constants, force) {
            out.push(GlOp::BlendColor([
                constants[0].into_inner(),
                constants[1].into_inner(),
                constants[2].into_inner(),
                constants[3].into_inner(),
            ]));
        }
    }

    pub fn apply_multisample(&mut self, ms: &MultisampleState, force: bool, out: &mut Vec<GlOp>) {
        if update(&mut self.alpha_to_coverage, &ms.alpha_to_coverage_enable, force) {
            if ms.alpha_to_coverage_enable {
                out.push(GlOp::Enable(gl::SAMPLE_ALPHA_TO_COVERAGE));
            } else {
                out.push(GlOp::Disable(gl::SAMPLE_ALPHA_TO_COVERAGE));
            }
        }
        if update(&mut self.alpha_to_one, &ms.alpha_to_one_enable, force) {
            if ms.alpha_to_one_enable {
                out.push(GlOp::Enable(gl::SAMPLE_ALPHA_TO_ONE));
            } else {
                out.push(GlOp::Disable(gl::SAMPLE_ALPHA_TO_ONE));
            }
        }
        if update(&mut self.sample_shading, &ms.sample_shading, force) {
            match ms.sample_shading {
                Some(min) => {
                    out.push(GlOp::Enable(gl::SAMPLE_SHADING));
                    out.push(GlOp::MinSampleShading(min.into_inner()));
                }
                None => out.push(GlOp::Disable(gl::SAMPLE_SHADING)),
            }
        }
    }

    pub fn apply_tessellation(
        &mut self,
        ts: Option<TessellationState>,
        force: bool,
        out: &mut Vec<GlOp>,
    ) {
        if let Some(ts) = ts {
            if update(&mut self.patch_control_points, &ts.patch_control_points, force) {
                out.push(GlOp::PatchParameteri {
                    pname: gl::PATCH_VERTICES,
                    value: ts.patch_control_points as i32,
                });
            }
        }
    }

    //----------------------------------------------------------------------------------------------
    // viewport/scissor

    /// Whole arrays are compared order-sensitively; any difference re-emits
    /// the entire array.
    pub fn set_viewports(&mut self, viewports: &[Viewport], force: bool, out: &mut Vec<GlOp>) {
        if update(&mut self.viewports, &viewports.to_vec(), force) {
            let mut gl_viewports = Vec::with_capacity(viewports.len());
            let mut gl_depth_ranges = Vec::with_capacity(viewports.len());
            for vp in viewports {
                gl_viewports.push([
                    vp.x.into_inner(),
                    vp.y.into_inner(),
                    vp.width.into_inner(),
                    vp.height.into_inner(),
                ]);
                gl_depth_ranges.push([
                    f64::from(vp.min_depth.into_inner()),
                    f64::from(vp.max_depth.into_inner()),
                ]);
            }
            out.push(GlOp::ViewportArray {
                first: 0,
                viewports: gl_viewports,
            });
            out.push(GlOp::DepthRangeArray {
                first: 0,
                ranges: gl_depth_ranges,
            });
        }
    }

    pub fn set_scissors(&mut self, scissors: &[Scissor], force: bool, out: &mut Vec<GlOp>) {
        if update(&mut self.scissors, &scissors.to_vec(), force) {
            let mut rects = Vec::with_capacity(scissors.len());
            let mut all_disabled = true;
            let mut all_enabled = true;
            for s in scissors {
                match s {
                    Scissor::Disabled => {
                        all_enabled = false;
                        rects.push([0, 0, 0, 0]);
                    }
                    Scissor::Enabled(r) => {
                        all_disabled = false;
                        rects.push([r.x, r.y, r.width as i32, r.height as i32]);
                    }
                }
            }

            match (all_disabled, all_enabled) {
                (true, _) => out.push(GlOp::Disable(gl::SCISSOR_TEST)),
                (false, true) => {
                    out.push(GlOp::Enable(gl::SCISSOR_TEST));
                    out.push(GlOp::ScissorArray { first: 0, rects });
                }
                (false, false) => {
                    for (i, s) in scissors.iter().enumerate() {
                        match s {
                            Scissor::Disabled => {
                                out.push(GlOp::Disablei(gl::SCISSOR_TEST, i as u32))
                            }
                            Scissor::Enabled(_) => {
                                out.push(GlOp::Enablei(gl::SCISSOR_TEST, i as u32));
                                out.push(GlOp::ScissorArray {
                                    first: i as u32,
                                    rects: vec![rects[i]],
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    /// Force the scissor test off (full-surface clears and blits ignore any
    /// application scissor). Emitted unconditionally so a re-submitted
    /// buffer lowers to the same sequence regardless of prior state.
    pub fn disable_scissor(&mut self, out: &mut Vec<GlOp>) {
        self.set_scissors(&[Scissor::Disabled], true, out);
    }

    /// Depth clears write through the depth mask; open it unconditionally
    /// (same re-submission determinism argument as [disable_scissor]).
    pub fn prepare_depth_clear(&mut self, out: &mut Vec<GlOp>) {
        self.depth_write_enable = Some(true);
        out.push(GlOp::DepthMask(true));
    }

    //----------------------------------------------------------------------------------------------
    // draws

    pub fn draw(
        &mut self,
        topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
        out: &mut Vec<GlOp>,
    ) {
        out.push(GlOp::DrawArraysInstancedBaseInstance {
            mode: topology_to_gl(topology),
            first: first_vertex as i32,
            count: vertex_count as i32,
            instances: instance_count as i32,
            base_instance: first_instance,
        });
    }

    pub fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
        out: &mut Vec<GlOp>,
    ) {
        let offset = self
            .index_offset
            .expect("no index buffer was bound before an indexed draw");
        let ty = self.index_type.unwrap();
        out.push(GlOp::DrawElementsInstancedBaseVertexBaseInstance {
            mode: topology_to_gl(topology),
            count: index_count as i32,
            ty: index_type_to_gl(ty),
            offset: offset + first_index as usize * ty.size_in_bytes(),
            instances: instance_count as i32,
            base_vertex: vertex_offset,
            base_instance: first_instance,
        });
    }
}

fn emit_blend_attachment(index: Option<u32>, state: &ColorBlendAttachmentState, out: &mut Vec<GlOp>) {
    match *state {
        ColorBlendAttachmentState::Disabled => match index {
            Some(i) => out.push(GlOp::Disablei(gl::BLEND, i)),
            None => out.push(GlOp::Disable(gl::BLEND)),
        },
        ColorBlendAttachmentState::Enabled {
            src_color_blend_factor,
            dst_color_blend_factor,
            color_blend_op,
            src_alpha_blend_factor,
            dst_alpha_blend_factor,
            alpha_blend_op,
            color_write_mask,
        } => {
            let (r, g, b, a) = (
                color_write_mask.contains(prism::pipeline::ColorWriteFlags::R),
                color_write_mask.contains(prism::pipeline::ColorWriteFlags::G),
                color_write_mask.contains(prism::pipeline::ColorWriteFlags::B),
                color_write_mask.contains(prism::pipeline::ColorWriteFlags::A),
            );
            match index {
                Some(i) => {
                    out.push(GlOp::Enablei(gl::BLEND, i));
                    out.push(GlOp::BlendEquationSeparatei {
                        buf: i,
                        color: blend_op_to_gl(color_blend_op),
                        alpha: blend_op_to_gl(alpha_blend_op),
                    });
                    out.push(GlOp::BlendFuncSeparatei {
                        buf: i,
                        src_color: blend_factor_to_gl(src_color_blend_factor),
                        dst_color: blend_factor_to_gl(dst_color_blend_factor),
                        src_alpha: blend_factor_to_gl(src_alpha_blend_factor),
                        dst_alpha: blend_factor_to_gl(dst_alpha_blend_factor),
                    });
                    out.push(GlOp::ColorMaski { buf: i, r, g, b, a });
                }
                None => {
                    out.push(GlOp::Enable(gl::BLEND));
                    out.push(GlOp::BlendEquationSeparate {
                        color: blend_op_to_gl(color_blend_op),
                        alpha: blend_op_to_gl(alpha_blend_op),
                    });
                    out.push(GlOp::BlendFuncSeparate {
                        src_color: blend_factor_to_gl(src_color_blend_factor),
                        dst_color: blend_factor_to_gl(dst_color_blend_factor),
                        src_alpha: blend_factor_to_gl(src_alpha_blend_factor),
                        dst_alpha: blend_factor_to_gl(dst_alpha_blend_factor),
                    });
                    out.push(GlOp::ColorMask { r, g, b, a });
                }
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use prism::pipeline::ColorWriteFlags;

    fn cache() -> StateCache {
        StateCache::new(&DeviceFeatures::default())
    }

    #[test]
    fn identical_state_emits_nothing_on_second_apply() {
        let mut c = cache();
        let rs = RasterizationState::default();
        let mut out = Vec::new();
        c.apply_rasterization(&rs, DynamicStateFlags::empty(), true, &mut out);
        assert!(!out.is_empty());

        let mut out2 = Vec::new();
        c.apply_rasterization(&rs, DynamicStateFlags::empty(), false, &mut out2);
        assert_eq!(out2, Vec::new());
    }

    #[test]
    fn single_field_change_emits_only_that_field() {
        let mut c = cache();
        let mut rs = RasterizationState::default();
        let mut out = Vec::new();
        c.apply_rasterization(&rs, DynamicStateFlags::empty(), true, &mut out);

        rs.cull_mode = CullModeFlags::BACK;
        let mut out2 = Vec::new();
        c.apply_rasterization(&rs, DynamicStateFlags::empty(), false, &mut out2);
        assert_eq!(
            out2,
            vec![GlOp::Enable(gl::CULL_FACE), GlOp::CullFace(gl::BACK)]
        );
    }

    #[test]
    fn force_reemits_identical_state() {
        let mut c = cache();
        let ds = DepthStencilState::default();
        let mut out = Vec::new();
        c.apply_depth_stencil(&ds, true, &mut out);
        let n = out.len();

        let mut out2 = Vec::new();
        c.apply_depth_stencil(&ds, true, &mut out2);
        assert_eq!(out2.len(), n);
    }

    #[test]
    fn dynamic_depth_bias_is_not_baked() {
        let mut c = cache();
        let rs = RasterizationState {
            depth_bias: Some(DepthBias {
                constant_factor: 1.0.into(),
                clamp: 0.0.into(),
                slope_factor: 2.0.into(),
            }),
            ..RasterizationState::default()
        };
        let mut out = Vec::new();
        c.apply_rasterization(&rs, DynamicStateFlags::DEPTH_BIAS, true, &mut out);
        assert!(out
            .iter()
            .all(|op| match op {
                GlOp::PolygonOffset { .. }
                | GlOp::Enable(gl::POLYGON_OFFSET_FILL)
                | GlOp::Enable(gl::POLYGON_OFFSET_LINE)
                | GlOp::Enable(gl::POLYGON_OFFSET_POINT) => false,
                _ => true,
            }));
    }

    #[test]
    fn aggregate_blend_uses_first_enabled_attachment() {
        let mut c = StateCache::new(&DeviceFeatures {
            independent_blend: false,
            ..DeviceFeatures::default()
        });
        let cb = ColorBlendState {
            logic_op: None,
            attachments: vec![
                ColorBlendAttachmentState::Disabled,
                ColorBlendAttachmentState::ALPHA_BLENDING,
                ColorBlendAttachmentState::Enabled {
                    src_color_blend_factor: BlendFactor::One,
                    dst_color_blend_factor: BlendFactor::One,
                    color_blend_op: BlendOp::Add,
                    src_alpha_blend_factor: BlendFactor::One,
                    dst_alpha_blend_factor: BlendFactor::One,
                    alpha_blend_op: BlendOp::Add,
                    color_write_mask: ColorWriteFlags::ALL,
                },
            ],
            blend_constants: ColorBlendState::default().blend_constants,
        };
        let mut out = Vec::new();
        c.apply_color_blend(&cb, DynamicStateFlags::empty(), true, &mut out);

        // one global enable, functions from the first *enabled* attachment
        assert!(out.contains(&GlOp::Enable(gl::BLEND)));
        assert!(out.contains(&GlOp::BlendFuncSeparate {
            src_color: gl::SRC_ALPHA,
            dst_color: gl::ONE_MINUS_SRC_ALPHA,
            src_alpha: gl::ONE,
            dst_alpha: gl::ONE_MINUS_SRC_ALPHA,
        }));
        assert!(out.iter().all(|op| match op {
            GlOp::Enablei(..) | GlOp::BlendFuncSeparatei { .. } => false,
            _ => true,
        }));
    }

    #[test]
    fn separate_blend_emits_per_attachment() {
        let mut c = cache();
        let cb = ColorBlendState {
            logic_op: None,
            attachments: vec![
                ColorBlendAttachmentState::Disabled,
                ColorBlendAttachmentState::ALPHA_BLENDING,
            ],
            blend_constants: ColorBlendState::default().blend_constants,
        };
        let mut out = Vec::new();
        c.apply_color_blend(&cb, DynamicStateFlags::empty(), true, &mut out);
        assert!(out.contains(&GlOp::Disablei(gl::BLEND, 0)));
        assert!(out.contains(&GlOp::Enablei(gl::BLEND, 1)));
    }

    #[test]
    fn viewport_arrays_reemit_whole_array_on_any_difference() {
        let mut c = cache();
        let vps = [Viewport::new(0.0, 0.0, 64.0, 64.0), Viewport::new(0.0, 0.0, 32.0, 32.0)];
        let mut out = Vec::new();
        c.set_viewports(&vps, false, &mut out);
        assert_eq!(out.len(), 2); // viewports + depth ranges

        // identical: nothing
        let mut out2 = Vec::new();
        c.set_viewports(&vps, false, &mut out2);
        assert!(out2.is_empty());

        // one entry differs: the whole array comes back
        let vps2 = [Viewport::new(0.0, 0.0, 64.0, 64.0), Viewport::new(0.0, 0.0, 16.0, 16.0)];
        let mut out3 = Vec::new();
        c.set_viewports(&vps2, false, &mut out3);
        match &out3[0] {
            GlOp::ViewportArray { first, viewports } => {
                assert_eq!(*first, 0);
                assert_eq!(viewports.len(), 2);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn index_cache_is_per_vao() {
        let mut c = cache();
        let mut out = Vec::new();
        c.set_vertex_array(3, false, &mut out);
        c.set_index_buffer(7, 0, IndexType::U16, &mut out);
        out.clear();

        // same buffer on the same VAO: no rebind
        c.set_index_buffer(7, 16, IndexType::U16, &mut out);
        assert!(out.is_empty());

        // switching VAOs invalidates the element-array binding
        c.set_vertex_array(4, false, &mut out);
        out.clear();
        c.set_index_buffer(7, 0, IndexType::U16, &mut out);
        assert_eq!(
            out,
            vec![GlOp::BindBuffer {
                target: gl::ELEMENT_ARRAY_BUFFER,
                buffer: 7
            }]
        );
    }
}
