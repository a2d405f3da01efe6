//! The low-level GL instruction set.
//!
//! Replay lowers recorded commands into a flat stream of [GlOp] records; each
//! record names one GL entry point together with concrete, already-resolved
//! arguments (object names, enums, offsets — never engine-level handles).
//! Keeping the stream as plain data decouples lowering from execution: the
//! state cache and binding resolver can be exercised without a live context,
//! and [execute] is a single exhaustive dispatch over the loaded function
//! table.

use crate::api as gl;
use crate::api::types::*;
use crate::context::ContextGuard;

#[derive(Clone, Debug, PartialEq)]
pub enum GlOp {
    // capability toggles
    Enable(GLenum),
    Disable(GLenum),
    Enablei(GLenum, u32),
    Disablei(GLenum, u32),

    // blend
    BlendEquationSeparate {
        color: GLenum,
        alpha: GLenum,
    },
    BlendEquationSeparatei {
        buf: u32,
        color: GLenum,
        alpha: GLenum,
    },
    BlendFuncSeparate {
        src_color: GLenum,
        dst_color: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    },
    BlendFuncSeparatei {
        buf: u32,
        src_color: GLenum,
        dst_color: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    },
    BlendColor([f32; 4]),
    LogicOp(GLenum),
    ColorMask {
        r: bool,
        g: bool,
        b: bool,
        a: bool,
    },
    ColorMaski {
        buf: u32,
        r: bool,
        g: bool,
        b: bool,
        a: bool,
    },

    // rasterization
    CullFace(GLenum),
    FrontFace(GLenum),
    PolygonMode(GLenum),
    PolygonOffset {
        factor: f32,
        units: f32,
    },
    LineWidth(f32),

    // depth/stencil
    DepthMask(bool),
    DepthFunc(GLenum),
    StencilFuncSeparate {
        face: GLenum,
        func: GLenum,
        reference: i32,
        mask: u32,
    },
    StencilOpSeparate {
        face: GLenum,
        sfail: GLenum,
        dpfail: GLenum,
        dppass: GLenum,
    },
    StencilMaskSeparate {
        face: GLenum,
        mask: u32,
    },

    // multisample / tessellation
    MinSampleShading(f32),
    PatchParameteri {
        pname: GLenum,
        value: i32,
    },

    // viewport/scissor arrays
    ViewportArray {
        first: u32,
        viewports: Vec<[f32; 4]>,
    },
    DepthRangeArray {
        first: u32,
        ranges: Vec<[f64; 2]>,
    },
    ScissorArray {
        first: u32,
        rects: Vec<[i32; 4]>,
    },

    // program / vertex array / framebuffer
    UseProgram(GLuint),
    BindVertexArray(GLuint),
    BindFramebuffer {
        target: GLenum,
        framebuffer: GLuint,
    },
    DrawBuffers {
        framebuffer: GLuint,
        buffers: Vec<GLenum>,
    },

    // clears / invalidation / blits
    ClearColorBuffer {
        framebuffer: GLuint,
        drawbuffer: i32,
        color: [f32; 4],
    },
    ClearDepth {
        framebuffer: GLuint,
        depth: f32,
    },
    ClearStencil {
        framebuffer: GLuint,
        stencil: i32,
    },
    ClearDepthStencil {
        framebuffer: GLuint,
        depth: f32,
        stencil: i32,
    },
    InvalidateFramebufferData {
        framebuffer: GLuint,
        attachments: Vec<GLenum>,
    },
    BlitFramebuffer {
        read: GLuint,
        draw: GLuint,
        src: [i32; 4],
        dst: [i32; 4],
        mask: GLbitfield,
        filter: GLenum,
    },

    // resource binding
    BindTextureUnit {
        unit: u32,
        texture: GLuint,
    },
    BindSampler {
        unit: u32,
        sampler: GLuint,
    },
    BindImageTexture {
        unit: u32,
        texture: GLuint,
        level: i32,
        layered: bool,
        layer: i32,
        access: GLenum,
        format: GLenum,
    },
    BindBufferRange {
        target: GLenum,
        index: u32,
        buffer: GLuint,
        offset: isize,
        size: isize,
    },
    BindBuffer {
        target: GLenum,
        buffer: GLuint,
    },
    BindVertexBuffer {
        binding: u32,
        buffer: GLuint,
        offset: isize,
        stride: i32,
    },
    TextureParameteri {
        texture: GLuint,
        pname: GLenum,
        value: i32,
    },
    VertexArrayElementBuffer {
        vao: GLuint,
        buffer: GLuint,
    },

    // draws / dispatch
    DrawArraysInstancedBaseInstance {
        mode: GLenum,
        first: i32,
        count: i32,
        instances: i32,
        base_instance: u32,
    },
    DrawElementsInstancedBaseVertexBaseInstance {
        mode: GLenum,
        count: i32,
        ty: GLenum,
        offset: usize,
        instances: i32,
        base_vertex: i32,
        base_instance: u32,
    },
    DispatchCompute {
        x: u32,
        y: u32,
        z: u32,
    },

    // transfer
    CopyBufferSubData {
        src: GLuint,
        dst: GLuint,
        src_offset: isize,
        dst_offset: isize,
        size: isize,
    },
    CopyImageSubData {
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
    TextureSubImage2D {
        texture: GLuint,
        level: i32,
        xoffset: i32,
        yoffset: i32,
        width: i32,
        height: i32,
        format: GLenum,
        ty: GLenum,
        pixels_offset: usize,
    },
    TextureSubImage3D {
        texture: GLuint,
        level: i32,
        offset: [i32; 3],
        extent: [i32; 3],
        format: GLenum,
        ty: GLenum,
        pixels_offset: usize,
    },
    MemoryBarrier(GLbitfield),
}

/// Executes an op stream against the live context.
///
/// Requiring the [ContextGuard] makes "a context is current on this thread"
/// a compile-time obligation of every execution site.
pub fn execute(guard: &ContextGuard, ops: &[GlOp]) {
    let gl = guard.gl();
    for op in ops {
        unsafe {
            dispatch(gl, op);
        }
    }
}

fn to_gl_bool(b: bool) -> GLboolean {
    if b {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

unsafe fn dispatch(gl: &gl::Gl, op: &GlOp) {
    match *op {
        GlOp::Enable(cap) => gl.Enable(cap),
        GlOp::Disable(cap) => gl.Disable(cap),
        GlOp::Enablei(cap, index) => gl.Enablei(cap, index),
        GlOp::Disablei(cap, index) => gl.Disablei(cap, index),

        GlOp::BlendEquationSeparate { color, alpha } => gl.BlendEquationSeparate(color, alpha),
        GlOp::BlendEquationSeparatei { buf, color, alpha } => {
            gl.BlendEquationSeparatei(buf, color, alpha)
        }
        GlOp::BlendFuncSeparate {
            src_color,
            dst_color,
            src_alpha,
            dst_alpha,
        } => gl.BlendFuncSeparate(src_color, dst_color, src_alpha, dst_alpha),
        GlOp::BlendFuncSeparatei {
            buf,
            src_color,
            dst_color,
            src_alpha,
            dst_alpha,
        } => gl.BlendFuncSeparatei(buf, src_color, dst_color, src_alpha, dst_alpha),
        GlOp::BlendColor(c) => gl.BlendColor(c[0], c[1], c[2], c[3]),
        GlOp::LogicOp(op) => gl.LogicOp(op),
        GlOp::ColorMask { r, g, b, a } => {
            gl.ColorMask(to_gl_bool(r), to_gl_bool(g), to_gl_bool(b), to_gl_bool(a))
        }
        GlOp::ColorMaski { buf, r, g, b, a } => gl.ColorMaski(
            buf,
            to_gl_bool(r),
            to_gl_bool(g),
            to_gl_bool(b),
            to_gl_bool(a),
        ),

        GlOp::CullFace(mode) => gl.CullFace(mode),
        GlOp::FrontFace(dir) => gl.FrontFace(dir),
        GlOp::PolygonMode(mode) => gl.PolygonMode(gl::FRONT_AND_BACK, mode),
        GlOp::PolygonOffset { factor, units } => gl.PolygonOffset(factor, units),
        GlOp::LineWidth(w) => gl.LineWidth(w),

        GlOp::DepthMask(flag) => gl.DepthMask(to_gl_bool(flag)),
        GlOp::DepthFunc(func) => gl.DepthFunc(func),
        GlOp::StencilFuncSeparate {
            face,
            func,
            reference,
            mask,
        } => gl.StencilFuncSeparate(face, func, reference, mask),
        GlOp::StencilOpSeparate {
            face,
            sfail,
            dpfail,
            dppass,
        } => gl.StencilOpSeparate(face, sfail, dpfail, dppass),
        GlOp::StencilMaskSeparate { face, mask } => gl.StencilMaskSeparate(face, mask),

        GlOp::MinSampleShading(v) => gl.MinSampleShading(v),
        GlOp::PatchParameteri { pname, value } => gl.PatchParameteri(pname, value),

        GlOp::ViewportArray {
            first,
            ref viewports,
        } => gl.ViewportArrayv(first, viewports.len() as i32, viewports.as_ptr() as *const _),
        GlOp::DepthRangeArray { first, ref ranges } => {
            gl.DepthRangeArrayv(first, ranges.len() as i32, ranges.as_ptr() as *const _)
        }
        GlOp::ScissorArray { first, ref rects } => {
            gl.ScissorArrayv(first, rects.len() as i32, rects.as_ptr() as *const _)
        }

        GlOp::UseProgram(program) => gl.UseProgram(program),
        GlOp::BindVertexArray(vao) => gl.BindVertexArray(vao),
        GlOp::BindFramebuffer {
            target,
            framebuffer,
        } => gl.BindFramebuffer(target, framebuffer),
        GlOp::DrawBuffers {
            framebuffer,
            ref buffers,
        } => gl.NamedFramebufferDrawBuffers(framebuffer, buffers.len() as i32, buffers.as_ptr()),

        GlOp::ClearColorBuffer {
            framebuffer,
            drawbuffer,
            ref color,
        } => gl.ClearNamedFramebufferfv(framebuffer, gl::COLOR, drawbuffer, color.as_ptr()),
        GlOp::ClearDepth { framebuffer, depth } => {
            gl.ClearNamedFramebufferfv(framebuffer, gl::DEPTH, 0, &depth)
        }
        GlOp::ClearStencil {
            framebuffer,
            stencil,
        } => gl.ClearNamedFramebufferiv(framebuffer, gl::STENCIL, 0, &stencil),
        GlOp::ClearDepthStencil {
            framebuffer,
            depth,
            stencil,
        } => gl.ClearNamedFramebufferfi(framebuffer, gl::DEPTH_STENCIL, 0, depth, stencil),
        GlOp::InvalidateFramebufferData {
            framebuffer,
            ref attachments,
        } => gl.InvalidateNamedFramebufferData(
            framebuffer,
            attachments.len() as i32,
            attachments.as_ptr(),
        ),
        GlOp::BlitFramebuffer {
            read,
            draw,
            src,
            dst,
            mask,
            filter,
        } => gl.BlitNamedFramebuffer(
            read, draw, src[0], src[1], src[2], src[3], dst[0], dst[1], dst[2], dst[3], mask,
            filter,
        ),

        GlOp::BindTextureUnit { unit, texture } => gl.BindTextureUnit(unit, texture),
        GlOp::BindSampler { unit, sampler } => gl.BindSampler(unit, sampler),
        GlOp::BindImageTexture {
            unit,
            texture,
            level,
            layered,
            layer,
            access,
            format,
        } => gl.BindImageTexture(unit, texture, level, to_gl_bool(layered), layer, access, format),
        GlOp::BindBufferRange {
            target,
            index,
            buffer,
            offset,
            size,
        } => gl.BindBufferRange(target, index, buffer, offset, size),
        GlOp::BindBuffer { target, buffer } => gl.BindBuffer(target, buffer),
        GlOp::BindVertexBuffer {
            binding,
            buffer,
            offset,
            stride,
        } => gl.BindVertexBuffer(binding, buffer, offset, stride),
        GlOp::TextureParameteri {
            texture,
            pname,
            value,
        } => gl.TextureParameteri(texture, pname, value),
        GlOp::VertexArrayElementBuffer { vao, buffer } => gl.VertexArrayElementBuffer(vao, buffer),

        GlOp::DrawArraysInstancedBaseInstance {
            mode,
            first,
            count,
            instances,
            base_instance,
        } => gl.DrawArraysInstancedBaseInstance(mode, first, count, instances, base_instance),
        GlOp::DrawElementsInstancedBaseVertexBaseInstance {
            mode,
            count,
            ty,
            offset,
            instances,
            base_vertex,
            base_instance,
        } => gl.DrawElementsInstancedBaseVertexBaseInstance(
            mode,
            count,
            ty,
            offset as *const GLvoid,
            instances,
            base_vertex,
            base_instance,
        ),
        GlOp::DispatchCompute { x, y, z } => gl.DispatchCompute(x, y, z),

        GlOp::CopyBufferSubData {
            src,
            dst,
            src_offset,
            dst_offset,
            size,
        } => gl.CopyNamedBufferSubData(src, dst, src_offset, dst_offset, size),
        GlOp::CopyImageSubData {
            src,
            src_target,
            src_level,
            src_offset,
            dst,
            dst_target,
            dst_level,
            dst_offset,
            extent,
        } => gl.CopyImageSubData(
            src,
            src_target,
            src_level,
            src_offset[0],
            src_offset[1],
            src_offset[2],
            dst,
            dst_target,
            dst_level,
            dst_offset[0],
            dst_offset[1],
            dst_offset[2],
            extent[0],
            extent[1],
            extent[2],
        ),
        GlOp::TextureSubImage2D {
            texture,
            level,
            xoffset,
            yoffset,
            width,
            height,
            format,
            ty,
            pixels_offset,
        } => gl.TextureSubImage2D(
            texture,
            level,
            xoffset,
            yoffset,
            width,
            height,
            format,
            ty,
            pixels_offset as *const GLvoid,
        ),
        GlOp::TextureSubImage3D {
            texture,
            level,
            offset,
            extent,
            format,
            ty,
            pixels_offset,
        } => gl.TextureSubImage3D(
            texture,
            level,
            offset[0],
            offset[1],
            offset[2],
            extent[0],
            extent[1],
            extent[2],
            format,
            ty,
            pixels_offset as *const GLvoid,
        ),
        GlOp::MemoryBarrier(barriers) => gl.MemoryBarrier(barriers),
    }
}
