//! Command buffers: the deferred command list.
//!
//! Recording happens on the client thread with no context required. Every
//! Vulkan-shaped command appends one data record; engine handles are resolved
//! to GL names *at record time*. Only context-state diffing and descriptor
//! binding resolution are deferred to replay, because they are inherently
//! stateful against the live state cache.
//!
//! A buffer also carries a secondary after-submit list of idempotent ops that
//! run after the main list on *every* submission (dummy-geometry VAO
//! initialization the first time a mesh-less draw is used).

use crate::api as gl;
use crate::api::types::*;
use crate::buffer::GlBuffer;
use crate::descriptor::GlDescriptorSet;
use crate::format::GlFormatInfo;
use crate::framebuffer::GlFramebuffer;
use crate::image::GlImage;
use crate::layout::GlPipelineLayout;
use crate::ops::GlOp;
use crate::pipeline::{GlComputePipeline, GlGraphicsPipeline};
use ordered_float::NotNan;
use prism::command::{
    AccessFlags, ClearValue, CommandBufferUsageFlags, DrawIndexedParams, DrawParams, IndexType,
    MemoryBarrier, PipelineStageFlags, Rect2D,
};
use prism::image::{Extent3D, Offset3D};
use prism::pipeline::{DepthBias, Scissor, Viewport};
use smallvec::SmallVec;
use std::cell::Cell;
use std::sync::Arc;

#[derive(Copy, Clone, Debug)]
pub struct BufferCopy {
    pub src_offset: usize,
    pub dst_offset: usize,
    pub size: usize,
}

#[derive(Clone, Debug)]
pub(crate) enum Cmd {
    BindGraphicsPipeline {
        pipeline: Arc<GlGraphicsPipeline>,
    },
    BindComputePipeline {
        pipeline: Arc<GlComputePipeline>,
    },
    BindDescriptorSet {
        set_index: u32,
        set: Arc<GlDescriptorSet>,
        layout: Arc<GlPipelineLayout>,
        dynamic_offsets: SmallVec<[u32; 4]>,
    },
    BindVertexBuffers {
        first_binding: u32,
        buffers: SmallVec<[(GLuint, isize); 4]>,
    },
    BindIndexBuffer {
        buffer: GLuint,
        offset: usize,
        index_type: IndexType,
    },
    BeginRenderPass {
        framebuffer: Arc<GlFramebuffer>,
        render_area: Rect2D,
        clear_values: Vec<ClearValue>,
    },
    NextSubpass,
    EndRenderPass,
    Draw {
        params: DrawParams,
    },
    DrawIndexed {
        params: DrawIndexedParams,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
    CopyBuffer {
        src: GLuint,
        dst: GLuint,
        src_offset: isize,
        dst_offset: isize,
        size: isize,
    },
    CopyImage {
        src: GLuint,
        src_target: GLenum,
        src_level: i32,
        src_offset: [i32; 3],
        dst: GLuint,
        dst_target: GLenum,
        dst_level: i32,
        dst_offset: [i32; 3],
        extent: [i32; 3],
    },
    CopyBufferToImage {
        buffer: GLuint,
        texture: GLuint,
        level: i32,
        offset: [i32; 3],
        extent: [i32; 3],
        components: GLenum,
        ty: GLenum,
        buffer_offset: usize,
        is_3d: bool,
    },
    PipelineBarrier {
        barriers: GLbitfield,
    },
    SetViewports {
        viewports: SmallVec<[Viewport; 1]>,
    },
    SetScissors {
        scissors: SmallVec<[Scissor; 1]>,
    },
    SetLineWidth(NotNan<f32>),
    SetDepthBias(DepthBias),
    SetBlendConstants([NotNan<f32>; 4]),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum RecordingState {
    Initial,
    Recording,
    Executable,
}

pub struct GlCommandBuffer {
    state: RecordingState,
    usage: CommandBufferUsageFlags,
    pub(crate) commands: Vec<Cmd>,
    pub(crate) after_submit: Vec<GlOp>,
    pub(crate) submit_count: Cell<u64>,
    dummy_vao: GLuint,
    dummy_index_buffer: GLuint,
    // record-time bookkeeping
    current_pipeline_uses_dummy: bool,
    dummy_geometry_initialized: bool,
    in_render_pass: bool,
}

impl GlCommandBuffer {
    pub(crate) fn new(dummy_vao: GLuint, dummy_index_buffer: GLuint) -> GlCommandBuffer {
        GlCommandBuffer {
            state: RecordingState::Initial,
            usage: CommandBufferUsageFlags::empty(),
            commands: Vec::new(),
            after_submit: Vec::new(),
            submit_count: Cell::new(0),
            dummy_vao,
            dummy_index_buffer,
            current_pipeline_uses_dummy: false,
            dummy_geometry_initialized: false,
            in_render_pass: false,
        }
    }

    pub fn usage(&self) -> CommandBufferUsageFlags {
        self.usage
    }

    /// Starts recording. A previously recorded one-time-submit buffer must be
    /// explicitly `reset()` before it can be re-begun.
    pub fn begin(&mut self, usage: CommandBufferUsageFlags) {
        assert!(
            self.state != RecordingState::Recording,
            "begin() called on a command buffer that is already recording"
        );
        debug_assert!(
            !(self.usage.contains(CommandBufferUsageFlags::ONE_TIME_SUBMIT)
                && self.submit_count.get() > 0),
            "a submitted one-time command buffer must be reset before re-recording"
        );
        self.state = RecordingState::Recording;
        self.usage = usage;
        self.commands.clear();
        self.after_submit.clear();
        self.submit_count.set(0);
        self.current_pipeline_uses_dummy = false;
        self.dummy_geometry_initialized = false;
        self.in_render_pass = false;
    }

    /// Ends recording; the buffer is immutable afterwards.
    pub fn end(&mut self) {
        assert_eq!(
            self.state,
            RecordingState::Recording,
            "end() called on a command buffer that is not recording"
        );
        debug_assert!(!self.in_render_pass, "end() inside a render pass");
        self.state = RecordingState::Executable;
    }

    pub fn reset(&mut self) {
        self.state = RecordingState::Initial;
        self.usage = CommandBufferUsageFlags::empty();
        self.commands.clear();
        self.after_submit.clear();
        self.submit_count.set(0);
        self.current_pipeline_uses_dummy = false;
        self.dummy_geometry_initialized = false;
        self.in_render_pass = false;
    }

    pub(crate) fn expect_executable(&self) {
        assert_eq!(
            self.state,
            RecordingState::Executable,
            "submitted command buffer was not ended"
        );
        debug_assert!(
            !self.usage.contains(CommandBufferUsageFlags::ONE_TIME_SUBMIT)
                || self.submit_count.get() == 0,
            "one-time command buffer submitted twice without a reset"
        );
    }

    fn push(&mut self, cmd: Cmd) {
        debug_assert_eq!(
            self.state,
            RecordingState::Recording,
            "recording into a command buffer outside begin()/end()"
        );
        self.commands.push(cmd);
    }

    //----------------------------------------------------------------------------------------------
    // binds

    pub fn bind_graphics_pipeline(&mut self, pipeline: &Arc<GlGraphicsPipeline>) {
        self.current_pipeline_uses_dummy = !pipeline.owns_vao;
        self.push(Cmd::BindGraphicsPipeline {
            pipeline: pipeline.clone(),
        });
    }

    pub fn bind_compute_pipeline(&mut self, pipeline: &Arc<GlComputePipeline>) {
        self.push(Cmd::BindComputePipeline {
            pipeline: pipeline.clone(),
        });
    }

    /// The count and order of `dynamic_offsets` must exactly match the
    /// dynamic-typed descriptors written into the set, in binding order.
    pub fn bind_descriptor_set(
        &mut self,
        layout: &Arc<GlPipelineLayout>,
        set_index: u32,
        set: &Arc<GlDescriptorSet>,
        dynamic_offsets: &[u32],
    ) {
        assert_eq!(
            dynamic_offsets.len(),
            set.dynamic_descriptor_count(),
            "dynamic offset count does not match the set's dynamic descriptors"
        );
        self.push(Cmd::BindDescriptorSet {
            set_index,
            set: set.clone(),
            layout: layout.clone(),
            dynamic_offsets: SmallVec::from_slice(dynamic_offsets),
        });
    }

    pub fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[(&GlBuffer, usize)]) {
        self.push(Cmd::BindVertexBuffers {
            first_binding,
            buffers: buffers
                .iter()
                .map(|&(b, offset)| (b.obj, offset as isize))
                .collect(),
        });
    }

    pub fn bind_index_buffer(&mut self, buffer: &GlBuffer, offset: usize, index_type: IndexType) {
        self.push(Cmd::BindIndexBuffer {
            buffer: buffer.obj,
            offset,
            index_type,
        });
    }

    //----------------------------------------------------------------------------------------------
    // render passes

    pub fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<GlFramebuffer>,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) {
        debug_assert!(!self.in_render_pass, "render passes cannot nest");
        self.in_render_pass = true;
        self.push(Cmd::BeginRenderPass {
            framebuffer: framebuffer.clone(),
            render_area,
            clear_values: clear_values.to_vec(),
        });
    }

    pub fn next_subpass(&mut self) {
        debug_assert!(self.in_render_pass);
        self.push(Cmd::NextSubpass);
    }

    pub fn end_render_pass(&mut self) {
        debug_assert!(self.in_render_pass, "end_render_pass outside a render pass");
        self.in_render_pass = false;
        self.push(Cmd::EndRenderPass);
    }

    //----------------------------------------------------------------------------------------------
    // draws

    pub fn draw(&mut self, params: DrawParams) {
        self.note_geometry_use();
        self.push(Cmd::Draw { params });
    }

    pub fn draw_indexed(&mut self, params: DrawIndexedParams) {
        self.note_geometry_use();
        self.push(Cmd::DrawIndexed { params });
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.push(Cmd::Dispatch { x, y, z });
    }

    /// Draws on a pipeline without vertex input run on the device's dummy
    /// geometry; its element-buffer binding is (re-)established after every
    /// submission through the after-submit list.
    fn note_geometry_use(&mut self) {
        if self.current_pipeline_uses_dummy && !self.dummy_geometry_initialized {
            self.dummy_geometry_initialized = true;
            let vao = self.dummy_vao;
            let buffer = self.dummy_index_buffer;
            self.after_submit
                .push(GlOp::VertexArrayElementBuffer { vao, buffer });
        }
    }

    //----------------------------------------------------------------------------------------------
    // transfer

    pub fn copy_buffer(&mut self, src: &GlBuffer, dst: &GlBuffer, regions: &[BufferCopy]) {
        for r in regions {
            debug_assert!(r.src_offset + r.size <= src.size);
            debug_assert!(r.dst_offset + r.size <= dst.size);
            self.push(Cmd::CopyBuffer {
                src: src.obj,
                dst: dst.obj,
                src_offset: r.src_offset as isize,
                dst_offset: r.dst_offset as isize,
                size: r.size as isize,
            });
        }
    }

    pub fn copy_image(
        &mut self,
        src: &GlImage,
        dst: &GlImage,
        src_level: u32,
        src_offset: Offset3D,
        dst_level: u32,
        dst_offset: Offset3D,
        extent: Extent3D,
    ) {
        self.push(Cmd::CopyImage {
            src: src.obj,
            src_target: src.target,
            src_level: src_level as i32,
            src_offset: [src_offset.x, src_offset.y, src_offset.z],
            dst: dst.obj,
            dst_target: dst.target,
            dst_level: dst_level as i32,
            dst_offset: [dst_offset.x, dst_offset.y, dst_offset.z],
            extent: [
                extent.width as i32,
                extent.height as i32,
                extent.depth as i32,
            ],
        });
    }

    pub fn copy_buffer_to_image(
        &mut self,
        buffer: &GlBuffer,
        buffer_offset: usize,
        image: &GlImage,
        level: u32,
        offset: Offset3D,
        extent: Extent3D,
    ) {
        let fmtinfo = GlFormatInfo::from_format(image.info.format);
        let is_3d = image.target == gl::TEXTURE_3D || image.target == gl::TEXTURE_2D_ARRAY;
        self.push(Cmd::CopyBufferToImage {
            buffer: buffer.obj,
            texture: image.obj,
            level: level as i32,
            offset: [offset.x, offset.y, offset.z],
            extent: [
                extent.width as i32,
                extent.height as i32,
                extent.depth as i32,
            ],
            components: fmtinfo.upload_components,
            ty: fmtinfo.upload_ty,
            buffer_offset,
            is_3d,
        });
    }

    //----------------------------------------------------------------------------------------------
    // sync / dynamic state

    pub fn pipeline_barrier(
        &mut self,
        _src_stages: PipelineStageFlags,
        _dst_stages: PipelineStageFlags,
        barriers: &[MemoryBarrier],
    ) {
        let mut bits = 0;
        for b in barriers {
            bits |= access_flags_to_barrier_bits(b.dst_access);
        }
        // pure execution dependencies are implicit in GL's command stream
        if bits != 0 {
            self.push(Cmd::PipelineBarrier { barriers: bits });
        }
    }

    pub fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.push(Cmd::SetViewports {
            viewports: SmallVec::from_slice(viewports),
        });
    }

    pub fn set_scissors(&mut self, scissors: &[Scissor]) {
        self.push(Cmd::SetScissors {
            scissors: SmallVec::from_slice(scissors),
        });
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.push(Cmd::SetLineWidth(width.into()));
    }

    pub fn set_depth_bias(&mut self, constant_factor: f32, clamp: f32, slope_factor: f32) {
        self.push(Cmd::SetDepthBias(DepthBias {
            constant_factor: constant_factor.into(),
            clamp: clamp.into(),
            slope_factor: slope_factor.into(),
        }));
    }

    pub fn set_blend_constants(&mut self, constants: [f32; 4]) {
        self.push(Cmd::SetBlendConstants([
            constants[0].into(),
            constants[1].into(),
            constants[2].into(),
            constants[3].into(),
        ]));
    }
}

pub(crate) fn access_flags_to_barrier_bits(access: AccessFlags) -> GLbitfield {
    let mut bits = 0;
    if access.contains(AccessFlags::INDIRECT_COMMAND_READ) {
        bits |= gl::COMMAND_BARRIER_BIT;
    }
    if access.contains(AccessFlags::INDEX_READ) {
        bits |= gl::ELEMENT_ARRAY_BARRIER_BIT;
    }
    if access.contains(AccessFlags::VERTEX_ATTRIBUTE_READ) {
        bits |= gl::VERTEX_ATTRIB_ARRAY_BARRIER_BIT;
    }
    if access.contains(AccessFlags::UNIFORM_READ) {
        bits |= gl::UNIFORM_BARRIER_BIT;
    }
    if access.contains(AccessFlags::INPUT_ATTACHMENT_READ) {
        bits |= gl::TEXTURE_FETCH_BARRIER_BIT;
    }
    if access.contains(AccessFlags::SHADER_READ) {
        bits |= gl::TEXTURE_FETCH_BARRIER_BIT
            | gl::SHADER_IMAGE_ACCESS_BARRIER_BIT
            | gl::SHADER_STORAGE_BARRIER_BIT;
    }
    if access.contains(AccessFlags::SHADER_WRITE) {
        bits |= gl::SHADER_IMAGE_ACCESS_BARRIER_BIT | gl::SHADER_STORAGE_BARRIER_BIT;
    }
    if access.intersects(
        AccessFlags::COLOR_ATTACHMENT_READ
            | AccessFlags::COLOR_ATTACHMENT_WRITE
            | AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
            | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
    ) {
        bits |= gl::FRAMEBUFFER_BARRIER_BIT;
    }
    if access.intersects(AccessFlags::TRANSFER_READ | AccessFlags::TRANSFER_WRITE) {
        bits |= gl::BUFFER_UPDATE_BARRIER_BIT
            | gl::TEXTURE_UPDATE_BARRIER_BIT
            | gl::PIXEL_BUFFER_BARRIER_BIT;
    }
    if access.intersects(AccessFlags::HOST_READ | AccessFlags::HOST_WRITE) {
        bits |= gl::CLIENT_MAPPED_BUFFER_BARRIER_BIT;
    }
    bits
}
