//! Buffer objects.
//!
//! Buffers map 1:1 to GL buffer names created eagerly with immutable storage.
//! Host-visible buffers keep a persistent coherent mapping so uploads are a
//! plain memcpy.

use crate::api as gl;
use crate::api::types::*;
use crate::context::ContextGuard;
use crate::format::GlFormatInfo;
use bitflags::bitflags;
use prism::format::Format;
use std::ptr;
use std::slice;

bitflags! {
    pub struct BufferUsageFlags: u32 {
        const TRANSFER_SRC = 0x001;
        const TRANSFER_DST = 0x002;
        const UNIFORM_TEXEL_BUFFER = 0x004;
        const UNIFORM_BUFFER = 0x010;
        const STORAGE_BUFFER = 0x020;
        const INDEX_BUFFER = 0x040;
        const VERTEX_BUFFER = 0x080;
        const HOST_VISIBLE = 0x100;
    }
}

pub(crate) fn create_buffer(
    gl: &gl::Gl,
    byte_size: usize,
    flags: GLenum,
    initial_data: Option<&[u8]>,
) -> GLuint {
    let mut obj: GLuint = 0;
    unsafe {
        gl.CreateBuffers(1, &mut obj);
        gl.NamedBufferStorage(
            obj,
            byte_size as isize,
            if let Some(data) = initial_data {
                debug_assert!(data.len() >= byte_size);
                data.as_ptr() as *const GLvoid
            } else {
                ptr::null()
            },
            flags,
        );
    }
    obj
}

#[derive(Debug)]
pub struct GlBuffer {
    pub(crate) obj: GLuint,
    pub(crate) size: usize,
    pub(crate) usage: BufferUsageFlags,
    mapped_ptr: *mut u8,
}

// the mapped pointer is only dereferenced under a current context
unsafe impl Send for GlBuffer {}
unsafe impl Sync for GlBuffer {}

impl GlBuffer {
    pub(crate) fn new(
        guard: &ContextGuard,
        size: usize,
        usage: BufferUsageFlags,
        initial_data: Option<&[u8]>,
    ) -> GlBuffer {
        let gl = guard.gl();
        let mut storage_flags = 0;
        if usage.contains(BufferUsageFlags::HOST_VISIBLE) {
            storage_flags |= gl::MAP_WRITE_BIT | gl::MAP_PERSISTENT_BIT | gl::MAP_COHERENT_BIT;
        }
        let obj = create_buffer(gl, size, storage_flags, initial_data);

        let mapped_ptr = if usage.contains(BufferUsageFlags::HOST_VISIBLE) {
            unsafe {
                gl.MapNamedBufferRange(
                    obj,
                    0,
                    size as isize,
                    gl::MAP_WRITE_BIT | gl::MAP_PERSISTENT_BIT | gl::MAP_COHERENT_BIT,
                ) as *mut u8
            }
        } else {
            ptr::null_mut()
        };

        GlBuffer {
            obj,
            size,
            usage,
            mapped_ptr,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Writable view of a host-visible buffer's persistent mapping.
    ///
    /// Panics when the buffer was not created host-visible. Unsafe because
    /// the mapping is shared: the caller must not overlap writes with GPU
    /// reads of the same range or hold two views at once.
    pub unsafe fn mapped_slice_mut(&self, _guard: &ContextGuard) -> &mut [u8] {
        assert!(
            !self.mapped_ptr.is_null(),
            "buffer is not host-visible and has no mapping"
        );
        slice::from_raw_parts_mut(self.mapped_ptr, self.size)
    }

    pub fn write(&self, guard: &ContextGuard, offset: usize, data: &[u8]) {
        assert!(offset + data.len() <= self.size);
        if self.mapped_ptr.is_null() {
            unsafe {
                guard.gl().NamedBufferSubData(
                    self.obj,
                    offset as isize,
                    data.len() as isize,
                    data.as_ptr() as *const GLvoid,
                );
            }
        } else {
            unsafe {
                self.mapped_slice_mut(guard)[offset..offset + data.len()].copy_from_slice(data);
            }
        }
    }

    /// Destroys the GL object. Views and descriptor sets referencing this
    /// buffer must be destroyed first.
    pub fn destroy(&self, guard: &ContextGuard) {
        unsafe {
            guard.gl().DeleteBuffers(1, &self.obj);
        }
    }
}

//--------------------------------------------------------------------------------------------------

/// Texel-buffer view: GL expresses texel buffers as buffer textures, so the
/// view eagerly owns a `TEXTURE_BUFFER` texture name tied to the buffer's
/// storage.
#[derive(Debug)]
pub struct GlBufferView {
    pub(crate) texture: GLuint,
    pub(crate) format: Format,
}

impl GlBufferView {
    pub(crate) fn new(
        guard: &ContextGuard,
        buffer: &GlBuffer,
        format: Format,
        offset: usize,
        range: usize,
    ) -> GlBufferView {
        let gl = guard.gl();
        let fmtinfo = GlFormatInfo::from_format(format);
        let mut texture = 0;
        unsafe {
            gl.CreateTextures(gl::TEXTURE_BUFFER, 1, &mut texture);
            gl.TextureBufferRange(
                texture,
                fmtinfo.internal_fmt,
                buffer.obj,
                offset as isize,
                range as isize,
            );
        }
        GlBufferView { texture, format }
    }

    pub fn destroy(&self, guard: &ContextGuard) {
        unsafe {
            guard.gl().DeleteTextures(1, &self.texture);
        }
    }
}
