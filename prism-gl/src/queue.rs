//! Queue submission: replay of recorded command lists.
//!
//! `submit` walks each command buffer's records strictly in recorded order
//! and lowers them to the flat [GlOp] stream, running context-state diffing
//! and descriptor-binding resolution inline, immediately before the draw or
//! dispatch that consumes them. The lowered stream is then executed against
//! the live context.
//!
//! The very first pipeline bind of every command buffer applies with `force`:
//! "previous state" is undefined at buffer granularity, and the forced bind
//! is also what makes a simultaneous-use buffer lower to a byte-identical op
//! stream on every submission.

use crate::api as gl;
use crate::api::types::*;
use crate::command::{Cmd, GlCommandBuffer};
use crate::context::ContextGuard;
use crate::descriptor::GlDescriptorSet;
use crate::device::DeviceInner;
use crate::framebuffer::GlFramebuffer;
use crate::layout::{BindingSpace, GlPipelineLayout};
use crate::ops::{execute, GlOp};
use crate::pipeline::GlGraphicsPipeline;
use crate::state::StateCache;
use crate::sync::{GlFence, GlSemaphore};
use prism::command::ClearValue;
use prism::image::ComponentSwizzle;
use prism::pass::{LoadOp, StoreOp};
use prism::Result;
use std::cmp;
use std::sync::Arc;

pub struct GlQueue {
    pub(crate) inner: Arc<DeviceInner>,
    pub(crate) family: u32,
    pub(crate) index: u32,
}

impl GlQueue {
    pub fn family(&self) -> u32 {
        self.family
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Fire-and-forget submission; cannot be cancelled once issued.
    ///
    /// Command buffers execute in array order; ordering against other
    /// `submit` calls is only what the single GL command stream provides.
    pub fn submit(
        &self,
        guard: &ContextGuard,
        buffers: &[&GlCommandBuffer],
        wait_semaphores: &[&GlSemaphore],
        signal_semaphores: &[&GlSemaphore],
        fence: Option<&GlFence>,
    ) -> Result<()> {
        for s in wait_semaphores {
            s.note_wait();
        }

        let ops = {
            let mut cache = self.inner.state_cache.borrow_mut();
            lower_command_buffers(&mut cache, buffers)
        };
        execute(guard, &ops);

        for cb in buffers {
            cb.submit_count.set(cb.submit_count.get() + 1);
        }
        for s in signal_semaphores {
            s.note_signal();
        }
        if let Some(fence) = fence {
            fence.arm(guard);
        }
        Ok(())
    }

    /// Blocks until every submitted command has finished.
    pub fn wait_idle(&self, guard: &ContextGuard) {
        unsafe {
            guard.gl().Finish();
        }
    }
}

//--------------------------------------------------------------------------------------------------
// lowering

/// Lowers command buffers to the op stream. Pure with respect to GL: only
/// the state cache is mutated, which is what makes the whole replay path
/// testable without a context.
pub(crate) fn lower_command_buffers(
    cache: &mut StateCache,
    buffers: &[&GlCommandBuffer],
) -> Vec<GlOp> {
    let mut ops = Vec::new();
    for cb in buffers {
        cb.expect_executable();
        let mut ctx = ReplayContext::new(cache);
        for cmd in &cb.commands {
            ctx.lower(cmd, &mut ops);
        }
        // idempotent per-submission initialization, after the main list
        ops.extend(cb.after_submit.iter().cloned());
    }
    ops
}

struct ReplayContext<'a> {
    cache: &'a mut StateCache,
    current_graphics: Option<Arc<GlGraphicsPipeline>>,
    current_framebuffer: Option<Arc<GlFramebuffer>>,
    subpass: usize,
    /// Vertex/index bindings are resolved against the current pipeline right
    /// before the draw that uses them, so record order does not matter.
    pending_vertex_buffers: Vec<(u32, GLuint, isize)>,
    vertex_buffers_dirty: bool,
    pending_index_buffer: Option<(GLuint, usize, prism::command::IndexType)>,
    force_next_bind: bool,
}

impl<'a> ReplayContext<'a> {
    fn new(cache: &'a mut StateCache) -> ReplayContext<'a> {
        ReplayContext {
            cache,
            current_graphics: None,
            current_framebuffer: None,
            subpass: 0,
            pending_vertex_buffers: Vec::new(),
            vertex_buffers_dirty: false,
            pending_index_buffer: None,
            force_next_bind: true,
        }
    }

    fn lower(&mut self, cmd: &Cmd, out: &mut Vec<GlOp>) {
        match *cmd {
            Cmd::BindGraphicsPipeline { ref pipeline } => {
                let force = self.force_next_bind;
                self.force_next_bind = false;
                pipeline.apply(self.cache, force, out);
                self.current_graphics = Some(pipeline.clone());
                self.vertex_buffers_dirty = !self.pending_vertex_buffers.is_empty();
            }
            Cmd::BindComputePipeline { ref pipeline } => {
                let force = self.force_next_bind;
                self.force_next_bind = false;
                self.cache.set_program(pipeline.program, force, out);
            }
            Cmd::BindDescriptorSet {
                set_index,
                ref set,
                ref layout,
                ref dynamic_offsets,
            } => {
                resolve_descriptor_set(set_index, set, layout, dynamic_offsets, out);
            }
            Cmd::BindVertexBuffers {
                first_binding,
                ref buffers,
            } => {
                for (i, &(buffer, offset)) in buffers.iter().enumerate() {
                    let binding = first_binding + i as u32;
                    self.pending_vertex_buffers
                        .retain(|&(b, _, _)| b != binding);
                    self.pending_vertex_buffers.push((binding, buffer, offset));
                }
                self.vertex_buffers_dirty = true;
            }
            Cmd::BindIndexBuffer {
                buffer,
                offset,
                index_type,
            } => {
                self.pending_index_buffer = Some((buffer, offset, index_type));
            }
            Cmd::BeginRenderPass {
                ref framebuffer,
                render_area: _,
                ref clear_values,
            } => {
                self.begin_render_pass(framebuffer, clear_values, out);
            }
            Cmd::NextSubpass => {
                self.subpass += 1;
                let fb = self
                    .current_framebuffer
                    .as_ref()
                    .expect("next_subpass outside a render pass")
                    .clone();
                self.emit_draw_buffers(&fb, out);
            }
            Cmd::EndRenderPass => {
                self.end_render_pass(out);
            }
            Cmd::Draw { params } => {
                let pipeline = self
                    .current_graphics
                    .clone()
                    .expect("draw recorded with no graphics pipeline bound");
                self.flush_geometry(&pipeline, false, out);
                self.cache.draw(
                    pipeline.input_assembly.topology,
                    params.vertex_count,
                    params.instance_count,
                    params.first_vertex,
                    params.first_instance,
                    out,
                );
            }
            Cmd::DrawIndexed { params } => {
                let pipeline = self
                    .current_graphics
                    .clone()
                    .expect("indexed draw recorded with no graphics pipeline bound");
                self.flush_geometry(&pipeline, true, out);
                self.cache.draw_indexed(
                    pipeline.input_assembly.topology,
                    params.index_count,
                    params.instance_count,
                    params.first_index,
                    params.vertex_offset,
                    params.first_instance,
                    out,
                );
            }
            Cmd::Dispatch { x, y, z } => {
                out.push(GlOp::DispatchCompute { x, y, z });
            }
            Cmd::CopyBuffer {
                src,
                dst,
                src_offset,
                dst_offset,
                size,
            } => {
                out.push(GlOp::CopyBufferSubData {
                    src,
                    dst,
                    src_offset,
                    dst_offset,
                    size,
                });
            }
            Cmd::CopyImage {
                src,
                src_target,
                src_level,
                src_offset,
                dst,
                dst_target,
                dst_level,
                dst_offset,
                extent,
            } => {
                out.push(GlOp::CopyImageSubData {
                    src,
                    src_target,
                    src_level,
                    src_offset,
                    dst,
                    dst_target,
                    dst_level,
                    dst_offset,
                    extent,
                });
            }
            Cmd::CopyBufferToImage {
                buffer,
                texture,
                level,
                offset,
                extent,
                components,
                ty,
                buffer_offset,
                is_3d,
            } => {
                out.push(GlOp::BindBuffer {
                    target: gl::PIXEL_UNPACK_BUFFER,
                    buffer,
                });
                if is_3d {
                    out.push(GlOp::TextureSubImage3D {
                        texture,
                        level,
                        offset,
                        extent,
                        format: components,
                        ty,
                        pixels_offset: buffer_offset,
                    });
                } else {
                    out.push(GlOp::TextureSubImage2D {
                        texture,
                        level,
                        xoffset: offset[0],
                        yoffset: offset[1],
                        width: extent[0],
                        height: extent[1],
                        format: components,
                        ty,
                        pixels_offset: buffer_offset,
                    });
                }
                out.push(GlOp::BindBuffer {
                    target: gl::PIXEL_UNPACK_BUFFER,
                    buffer: 0,
                });
            }
            Cmd::PipelineBarrier { barriers } => {
                out.push(GlOp::MemoryBarrier(barriers));
            }
            Cmd::SetViewports { ref viewports } => {
                self.cache.set_viewports(viewports, false, out);
            }
            Cmd::SetScissors { ref scissors } => {
                self.cache.set_scissors(scissors, false, out);
            }
            Cmd::SetLineWidth(width) => {
                self.cache.set_line_width(width, false, out);
            }
            Cmd::SetDepthBias(bias) => {
                self.cache.set_depth_bias(Some(bias), false, out);
            }
            Cmd::SetBlendConstants(constants) => {
                self.cache.set_blend_constants(constants, false, out);
            }
        }
    }

    fn emit_draw_buffers(&mut self, fb: &GlFramebuffer, out: &mut Vec<GlOp>) {
        if fb.fbo == 0 {
            // the default framebuffer draws to the back buffer
            return;
        }
        out.push(GlOp::DrawBuffers {
            framebuffer: fb.fbo,
            buffers: fb.render_pass.subpass_draw_buffers(self.subpass),
        });
    }

    fn begin_render_pass(
        &mut self,
        framebuffer: &Arc<GlFramebuffer>,
        clear_values: &[ClearValue],
        out: &mut Vec<GlOp>,
    ) {
        self.subpass = 0;
        self.cache.set_draw_framebuffer(framebuffer.fbo, out);
        self.current_framebuffer = Some(framebuffer.clone());
        self.emit_draw_buffers(framebuffer, out);

        let rp = &framebuffer.render_pass;
        let subpass = rp.subpass(0);
        let needs_clear = rp
            .description
            .attachments
            .iter()
            .any(|a| a.load_op == LoadOp::Clear || a.stencil_load_op == LoadOp::Clear);
        if needs_clear {
            // clears ignore the application scissor
            self.cache.disable_scissor(out);
        }

        // color clears address draw-buffer indices, in subpass reference order
        for (slot, r) in subpass.color_attachments.iter().enumerate() {
            let index = r.attachment as usize;
            if rp.attachment(index).load_op == LoadOp::Clear {
                let color = match clear_values.get(index) {
                    Some(ClearValue::Color(c)) => *c,
                    _ => panic!(
                        "attachment {} has load_op CLEAR but no color clear value",
                        index
                    ),
                };
                out.push(GlOp::ClearColorBuffer {
                    framebuffer: framebuffer.fbo,
                    drawbuffer: slot as i32,
                    color,
                });
            }
        }

        // depth/stencil clear, split per aspect load op
        for (index, a) in rp.description.attachments.iter().enumerate() {
            if !a.format.is_depth_or_stencil() {
                continue;
            }
            let aspects = a.format.aspects();
            let clear_depth = aspects.contains(prism::format::AspectFlags::DEPTH)
                && a.load_op == LoadOp::Clear;
            let clear_stencil = aspects.contains(prism::format::AspectFlags::STENCIL)
                && a.stencil_load_op == LoadOp::Clear;
            if !clear_depth && !clear_stencil {
                continue;
            }
            let (depth, stencil) = match clear_values.get(index) {
                Some(ClearValue::DepthStencil { depth, stencil }) => (*depth, *stencil as i32),
                _ => panic!(
                    "attachment {} has load_op CLEAR but no depth-stencil clear value",
                    index
                ),
            };
            if clear_depth {
                // depth clears write through the depth mask
                self.cache.prepare_depth_clear(out);
            }
            match (clear_depth, clear_stencil) {
                (true, true) => out.push(GlOp::ClearDepthStencil {
                    framebuffer: framebuffer.fbo,
                    depth,
                    stencil,
                }),
                (true, false) => out.push(GlOp::ClearDepth {
                    framebuffer: framebuffer.fbo,
                    depth,
                }),
                (false, true) => out.push(GlOp::ClearStencil {
                    framebuffer: framebuffer.fbo,
                    stencil,
                }),
                (false, false) => unreachable!(),
            }
        }
    }

    fn end_render_pass(&mut self, out: &mut Vec<GlOp>) {
        let fb = self
            .current_framebuffer
            .take()
            .expect("end_render_pass outside a render pass");
        let rp = &fb.render_pass;

        // storeOp DONT_CARE maps to framebuffer invalidation
        let mut invalidate = Vec::new();
        for (i, a) in rp.description.attachments.iter().enumerate() {
            let point = rp.attachment_points[i];
            let aspects = a.format.aspects();
            let discard_color =
                aspects.contains(prism::format::AspectFlags::COLOR) && a.store_op == StoreOp::DontCare;
            let discard_depth = aspects.contains(prism::format::AspectFlags::DEPTH)
                && a.store_op == StoreOp::DontCare;
            let discard_stencil = aspects.contains(prism::format::AspectFlags::STENCIL)
                && a.stencil_store_op == StoreOp::DontCare;
            if discard_color || discard_depth || discard_stencil {
                invalidate.push(if fb.fbo == 0 {
                    // default-framebuffer attachment names differ
                    match point {
                        crate::pass::AttachmentPoint::Color(_) => gl::COLOR,
                        crate::pass::AttachmentPoint::Depth => gl::DEPTH,
                        crate::pass::AttachmentPoint::Stencil => gl::STENCIL,
                        crate::pass::AttachmentPoint::DepthStencil => gl::DEPTH_STENCIL,
                    }
                } else {
                    point.to_gl()
                });
            }
        }
        if !invalidate.is_empty() {
            out.push(GlOp::InvalidateFramebufferData {
                framebuffer: fb.fbo,
                attachments: invalidate,
            });
        }

        // multisample resolve into the single-sample color set
        if fb.multisampled && fb.resolve_fbo != 0 {
            let (w, h) = fb.extent;
            out.push(GlOp::BlitFramebuffer {
                read: fb.fbo,
                draw: fb.resolve_fbo,
                src: [0, 0, w as i32, h as i32],
                dst: [0, 0, w as i32, h as i32],
                mask: gl::COLOR_BUFFER_BIT,
                filter: gl::NEAREST,
            });
        }

        // leave the default framebuffer bound between passes
        self.cache.set_draw_framebuffer(0, out);
        self.subpass = 0;
    }

    fn flush_geometry(
        &mut self,
        pipeline: &GlGraphicsPipeline,
        indexed: bool,
        out: &mut Vec<GlOp>,
    ) {
        if self.vertex_buffers_dirty {
            for &(binding, buffer, offset) in &self.pending_vertex_buffers {
                let stride = pipeline
                    .vertex_bindings
                    .iter()
                    .find(|b| b.binding == binding)
                    .map(|b| b.stride as i32)
                    .unwrap_or(0);
                out.push(GlOp::BindVertexBuffer {
                    binding,
                    buffer,
                    offset,
                    stride,
                });
            }
            self.vertex_buffers_dirty = false;
        }
        if indexed {
            let (buffer, offset, ty) = self
                .pending_index_buffer
                .expect("no index buffer was bound before an indexed draw");
            self.cache.set_index_buffer(buffer, offset, ty, out);
        }
    }
}

//--------------------------------------------------------------------------------------------------
// descriptor binding resolution

fn swizzle_to_gl(sw: ComponentSwizzle, identity: GLenum) -> GLenum {
    match sw {
        ComponentSwizzle::Identity => identity,
        ComponentSwizzle::Zero => gl::ZERO,
        ComponentSwizzle::One => gl::ONE,
        ComponentSwizzle::R => gl::RED,
        ComponentSwizzle::G => gl::GREEN,
        ComponentSwizzle::B => gl::BLUE,
        ComponentSwizzle::A => gl::ALPHA,
    }
}

fn expect_flat(
    layout: &GlPipelineLayout,
    set_index: u32,
    binding: u32,
    space: BindingSpace,
) -> u32 {
    let flat = layout
        .flat_binding(set_index, binding)
        .unwrap_or_else(|| {
            panic!(
                "descriptor (set={}, binding={}) is not mapped to any GL binding point",
                set_index, binding
            )
        });
    assert_eq!(
        flat.space, space,
        "descriptor (set={}, binding={}) bound through the wrong binding space",
        set_index, binding
    );
    flat.location
}

fn emit_texture_binds(
    set_index: u32,
    layout: &GlPipelineLayout,
    writes: &[crate::descriptor::TextureWrite],
    out: &mut Vec<GlOp>,
) {
    for w in writes {
        let base = expect_flat(layout, set_index, w.binding, BindingSpace::Texture);
        for (i, entry) in w.entries.iter().enumerate() {
            let unit = base + w.first_array_element + i as u32;
            out.push(GlOp::BindTextureUnit {
                unit,
                texture: entry.texture,
            });
            if entry.sampler != 0 {
                out.push(GlOp::BindSampler {
                    unit,
                    sampler: entry.sampler,
                });
            }
            // swizzle only for non-identity channels to avoid state churn
            if !entry.swizzle.is_identity() {
                let sw = entry.swizzle;
                let params = [
                    (gl::TEXTURE_SWIZZLE_R, sw.r, gl::RED),
                    (gl::TEXTURE_SWIZZLE_G, sw.g, gl::GREEN),
                    (gl::TEXTURE_SWIZZLE_B, sw.b, gl::BLUE),
                    (gl::TEXTURE_SWIZZLE_A, sw.a, gl::ALPHA),
                ];
                for &(pname, channel, identity) in &params {
                    if channel != ComponentSwizzle::Identity {
                        out.push(GlOp::TextureParameteri {
                            texture: entry.texture,
                            pname,
                            value: swizzle_to_gl(channel, identity) as i32,
                        });
                    }
                }
            }
        }
    }
}

fn emit_buffer_binds(
    set_index: u32,
    layout: &GlPipelineLayout,
    writes: &[crate::descriptor::BufferWrite],
    target: GLenum,
    space: BindingSpace,
    out: &mut Vec<GlOp>,
) {
    for w in writes {
        let base = expect_flat(layout, set_index, w.binding, space);
        for (i, entry) in w.entries.iter().enumerate() {
            let index = base + w.first_array_element + i as u32;
            let size = cmp::min(entry.range, entry.buffer_size.saturating_sub(entry.offset));
            out.push(GlOp::BindBufferRange {
                target,
                index,
                buffer: entry.buffer,
                offset: entry.offset as isize,
                size: size as isize,
            });
        }
    }
}

/// Translates one descriptor set's write lists into bind ops.
///
/// Processing order is fixed: input attachments, combined image samplers,
/// samplers, sampled images, storage images, uniform buffers, storage
/// buffers, texel buffers, then the dynamic-offset buffers last, because
/// dynamic offsets add the caller-supplied per-bind offset on top of the
/// stored write offset.
fn resolve_descriptor_set(
    set_index: u32,
    set: &GlDescriptorSet,
    layout: &GlPipelineLayout,
    dynamic_offsets: &[u32],
    out: &mut Vec<GlOp>,
) {
    emit_texture_binds(set_index, layout, &set.input_attachments, out);
    emit_texture_binds(set_index, layout, &set.combined_image_samplers, out);

    for w in &set.samplers {
        let base = expect_flat(layout, set_index, w.binding, BindingSpace::Texture);
        for (i, &sampler) in w.samplers.iter().enumerate() {
            out.push(GlOp::BindSampler {
                unit: base + w.first_array_element + i as u32,
                sampler,
            });
        }
    }

    emit_texture_binds(set_index, layout, &set.sampled_images, out);

    for w in &set.storage_images {
        let base = expect_flat(layout, set_index, w.binding, BindingSpace::Image);
        for (i, entry) in w.entries.iter().enumerate() {
            out.push(GlOp::BindImageTexture {
                unit: base + w.first_array_element + i as u32,
                texture: entry.texture,
                level: entry.level,
                layered: entry.layered,
                layer: entry.layer,
                access: gl::READ_WRITE,
                format: entry.format,
            });
        }
    }

    emit_buffer_binds(
        set_index,
        layout,
        &set.uniform_buffers,
        gl::UNIFORM_BUFFER,
        BindingSpace::UniformBuffer,
        out,
    );
    emit_buffer_binds(
        set_index,
        layout,
        &set.storage_buffers,
        gl::SHADER_STORAGE_BUFFER,
        BindingSpace::ShaderStorageBuffer,
        out,
    );

    emit_texture_binds(set_index, layout, &set.texel_buffers, out);

    // dynamic buffers: stored offset + caller offset, clamped to the buffer
    let mut k = 0;
    for (w, target) in set.dynamic_writes() {
        let space = if target == gl::UNIFORM_BUFFER {
            BindingSpace::UniformBuffer
        } else {
            BindingSpace::ShaderStorageBuffer
        };
        let base = expect_flat(layout, set_index, w.binding, space);
        for (i, entry) in w.entries.iter().enumerate() {
            assert!(
                k < dynamic_offsets.len(),
                "dynamic offset count does not match the set's dynamic descriptors"
            );
            let offset = entry.offset + dynamic_offsets[k] as usize;
            k += 1;
            let size = cmp::min(entry.range, entry.buffer_size.saturating_sub(offset));
            out.push(GlOp::BindBufferRange {
                target,
                index: base + w.first_array_element + i as u32,
                buffer: entry.buffer,
                offset: offset as isize,
                size: size as isize,
            });
        }
    }
    assert_eq!(
        k,
        dynamic_offsets.len(),
        "dynamic offset count does not match the set's dynamic descriptors"
    );
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::GlCommandBuffer;
    use crate::descriptor::{BufferBinding, BufferWrite};
    use crate::framebuffer::{partition_color_attachments, plan_attachments};
    use crate::image::GlImageView;
    use crate::layout::GlDescriptorSetLayout;
    use crate::pass::GlRenderPass;
    use prism::command::{CommandBufferUsageFlags, DrawParams, Rect2D};
    use prism::descriptor::{
        DescriptorSetLayoutBinding, DescriptorSetLayoutDescription, DescriptorType,
    };
    use prism::format::Format;
    use prism::image::{ComponentMapping, SubresourceRange};
    use prism::limits::DeviceFeatures;
    use prism::pass::{AttachmentDescription, LoadOp, RenderPassDescription, StoreOp};
    use prism::pipeline::{
        ColorBlendState, DepthStencilState, DynamicStateFlags, InputAssemblyState,
        MultisampleState, PrimitiveTopology, RasterizationState, ShaderStageFlags,
    };

    fn fake_color_view(format: Format) -> GlImageView {
        GlImageView {
            obj: 21,
            target: gl::TEXTURE_2D,
            format,
            samples: 1,
            range: SubresourceRange {
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_layers: 1,
            cube_compatible: false,
            swizzle: ComponentMapping::identity(),
            is_back_buffer: false,
            owns_view: false,
        }
    }

    fn fake_framebuffer(fbo: GLuint, render_pass: Arc<GlRenderPass>) -> Arc<GlFramebuffer> {
        let view = fake_color_view(Format::R8G8B8A8_UNORM);
        let views: Vec<&GlImageView> = vec![&view];
        let attachments = plan_attachments(&render_pass, &views);
        let (colour_attaches, colour_ms_attaches, multisampled) =
            partition_color_attachments(&attachments);
        Arc::new(GlFramebuffer {
            fbo,
            resolve_fbo: 0,
            render_pass,
            attachments,
            colour_attaches,
            colour_ms_attaches,
            multisampled,
            extent: (64, 64),
            is_back_buffer: false,
        })
    }

    fn fake_pipeline(topology: PrimitiveTopology) -> Arc<GlGraphicsPipeline> {
        Arc::new(GlGraphicsPipeline {
            program: 5,
            vao: 9,
            owns_vao: true,
            layout: Arc::new(GlPipelineLayout::new(&[])),
            input_assembly: InputAssemblyState {
                topology,
                primitive_restart_enable: false,
            },
            rasterization: RasterizationState::default(),
            depth_stencil: DepthStencilState::default(),
            color_blend: ColorBlendState::default(),
            multisample: MultisampleState::default(),
            tessellation: None,
            viewports: Vec::new(),
            scissors: Vec::new(),
            dynamic: DynamicStateFlags::VIEWPORT | DynamicStateFlags::SCISSOR,
            vertex_bindings: Vec::new(),
        })
    }

    fn record_clear_and_draw(cb: &mut GlCommandBuffer, fb: &Arc<GlFramebuffer>) {
        cb.begin(CommandBufferUsageFlags::SIMULTANEOUS_USE);
        cb.begin_render_pass(
            fb,
            Rect2D {
                x: 0,
                y: 0,
                width: 64,
                height: 64,
            },
            &[ClearValue::Color([0.1, 0.2, 0.3, 1.0])],
        );
        cb.bind_graphics_pipeline(&fake_pipeline(PrimitiveTopology::TriangleStrip));
        cb.draw(DrawParams {
            vertex_count: 4,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        });
        cb.end_render_pass();
        cb.end();
    }

    #[test]
    fn round_trip_clear_and_draw() {
        let rp = Arc::new(GlRenderPass::new(&RenderPassDescription::single_subpass(
            vec![AttachmentDescription::color(
                Format::R8G8B8A8_UNORM,
                LoadOp::Clear,
                StoreOp::Store,
            )],
        )));
        let fb = fake_framebuffer(7, rp);
        let mut cb = GlCommandBuffer::new(1, 2);
        record_clear_and_draw(&mut cb, &fb);

        let mut cache = StateCache::new(&DeviceFeatures::default());
        let ops = lower_command_buffers(&mut cache, &[&cb]);

        // the framebuffer is bound once, to the one FBO
        let fbo_binds: Vec<_> = ops
            .iter()
            .filter(|op| match op {
                GlOp::BindFramebuffer { .. } => true,
                _ => false,
            })
            .collect();
        assert_eq!(
            fbo_binds[0],
            &GlOp::BindFramebuffer {
                target: gl::DRAW_FRAMEBUFFER,
                framebuffer: 7
            }
        );

        // color attachment point 0 is the active draw buffer
        assert!(ops.contains(&GlOp::DrawBuffers {
            framebuffer: 7,
            buffers: vec![gl::COLOR_ATTACHMENT0],
        }));

        // cleared with the requested color
        assert!(ops.contains(&GlOp::ClearColorBuffer {
            framebuffer: 7,
            drawbuffer: 0,
            color: [0.1, 0.2, 0.3, 1.0],
        }));

        // exactly one draw: 4 vertices as a triangle strip
        let draws: Vec<_> = ops
            .iter()
            .filter(|op| match op {
                GlOp::DrawArraysInstancedBaseInstance { .. } => true,
                _ => false,
            })
            .collect();
        assert_eq!(
            draws,
            vec![&GlOp::DrawArraysInstancedBaseInstance {
                mode: gl::TRIANGLE_STRIP,
                first: 0,
                count: 4,
                instances: 1,
                base_instance: 0,
            }]
        );

        // after endRenderPass the default framebuffer is bound again
        let draw_pos = ops
            .iter()
            .position(|op| match op {
                GlOp::DrawArraysInstancedBaseInstance { .. } => true,
                _ => false,
            })
            .unwrap();
        assert!(ops[draw_pos..].contains(&GlOp::BindFramebuffer {
            target: gl::DRAW_FRAMEBUFFER,
            framebuffer: 0
        }));
    }

    #[test]
    fn simultaneous_use_replay_is_identical() {
        let rp = Arc::new(GlRenderPass::new(&RenderPassDescription::single_subpass(
            vec![AttachmentDescription::color(
                Format::R8G8B8A8_UNORM,
                LoadOp::Clear,
                StoreOp::Store,
            )],
        )));
        let fb = fake_framebuffer(7, rp);
        let mut cb = GlCommandBuffer::new(1, 2);
        record_clear_and_draw(&mut cb, &fb);

        let mut cache = StateCache::new(&DeviceFeatures::default());
        let first = lower_command_buffers(&mut cache, &[&cb]);
        let second = lower_command_buffers(&mut cache, &[&cb]);
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "one-time command buffer submitted twice")]
    fn one_time_submit_twice_is_a_contract_violation() {
        let mut cb = GlCommandBuffer::new(1, 2);
        cb.begin(CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        cb.end();
        cb.submit_count.set(1);
        cb.expect_executable();
    }

    fn dynamic_set(offset: usize, range: usize, buffer_size: usize) -> (GlDescriptorSet, Arc<GlPipelineLayout>) {
        let layout = Arc::new(GlDescriptorSetLayout::new(&DescriptorSetLayoutDescription {
            bindings: vec![DescriptorSetLayoutBinding {
                binding: 0,
                descriptor_type: DescriptorType::UniformBufferDynamic,
                count: 1,
                stage_flags: ShaderStageFlags::ALL_GRAPHICS,
            }],
        }));
        let pipeline_layout = Arc::new(GlPipelineLayout::new(&[layout.as_ref()]));
        let mut set = GlDescriptorSet::new(layout);
        set.dynamic_uniform_buffers.push(BufferWrite {
            binding: 0,
            first_array_element: 0,
            entries: smallvec::smallvec![BufferBinding {
                buffer: 3,
                offset,
                range,
                buffer_size,
            }],
        });
        (set, pipeline_layout)
    }

    #[test]
    fn dynamic_offsets_are_additive_and_clamped() {
        let (set, layout) = dynamic_set(64, 128, 1024);

        let mut ops = Vec::new();
        resolve_descriptor_set(0, &set, &layout, &[512], &mut ops);
        assert_eq!(
            ops,
            vec![GlOp::BindBufferRange {
                target: gl::UNIFORM_BUFFER,
                index: 0,
                buffer: 3,
                offset: 64 + 512,
                size: 128,
            }]
        );

        // close to the end of the buffer the range clamps to what is left
        let mut ops = Vec::new();
        resolve_descriptor_set(0, &set, &layout, &[896], &mut ops);
        assert_eq!(
            ops,
            vec![GlOp::BindBufferRange {
                target: gl::UNIFORM_BUFFER,
                index: 0,
                buffer: 3,
                offset: 64 + 896,
                size: 64,
            }]
        );
    }

    #[test]
    #[should_panic(expected = "dynamic offset count")]
    fn dynamic_offset_count_mismatch_is_asserted() {
        let (set, layout) = dynamic_set(0, 64, 1024);
        let mut ops = Vec::new();
        resolve_descriptor_set(0, &set, &layout, &[], &mut ops);
    }

    #[test]
    fn binding_resolution_is_deterministic() {
        let (set, layout) = dynamic_set(0, 64, 1024);
        let mut a = Vec::new();
        let mut b = Vec::new();
        resolve_descriptor_set(0, &set, &layout, &[128], &mut a);
        resolve_descriptor_set(0, &set, &layout, &[128], &mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_descriptor_set_emits_no_binds() {
        let layout = Arc::new(GlDescriptorSetLayout::new(&DescriptorSetLayoutDescription {
            bindings: vec![DescriptorSetLayoutBinding {
                binding: 0,
                descriptor_type: DescriptorType::SampledImage,
                count: 4,
                stage_flags: ShaderStageFlags::FRAGMENT,
            }],
        }));
        let pipeline_layout = Arc::new(GlPipelineLayout::new(&[layout.as_ref()]));
        let set = GlDescriptorSet::new(layout);
        let mut ops = Vec::new();
        resolve_descriptor_set(0, &set, &pipeline_layout, &[], &mut ops);
        assert!(ops.is_empty());
    }

    #[test]
    fn meshless_draws_initialize_dummy_geometry_after_the_main_list() {
        let rp = Arc::new(GlRenderPass::new(&RenderPassDescription::single_subpass(
            vec![AttachmentDescription::color(
                Format::R8G8B8A8_UNORM,
                LoadOp::DontCare,
                StoreOp::Store,
            )],
        )));
        let fb = fake_framebuffer(7, rp);
        let mut cb = GlCommandBuffer::new(11, 12);
        cb.begin(CommandBufferUsageFlags::SIMULTANEOUS_USE);
        cb.begin_render_pass(
            &fb,
            Rect2D {
                x: 0,
                y: 0,
                width: 64,
                height: 64,
            },
            &[],
        );
        let mut pipeline = fake_pipeline(PrimitiveTopology::TriangleList);
        Arc::get_mut(&mut pipeline).unwrap().owns_vao = false;
        Arc::get_mut(&mut pipeline).unwrap().vao = 11;
        cb.bind_graphics_pipeline(&pipeline);
        cb.draw(DrawParams {
            vertex_count: 3,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        });
        cb.end_render_pass();
        cb.end();

        let mut cache = StateCache::new(&DeviceFeatures::default());
        let ops = lower_command_buffers(&mut cache, &[&cb]);
        assert_eq!(
            ops.last(),
            Some(&GlOp::VertexArrayElementBuffer { vao: 11, buffer: 12 })
        );
    }
}
