//! Backend-agnostic command parameters.
//!
//! Command *recording* lives in each backend (the deferred op stream is a
//! backend-private encoding); only the parameter structs that cross the API
//! boundary are defined here.

use bitflags::bitflags;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Clear value for one render-pass attachment with `LoadOp::Clear`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawParams {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DrawIndexedParams {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

bitflags! {
    /// Submission contract of a command buffer, enforced by bookkeeping
    /// (assertions in debug builds), not by the data structure itself.
    pub struct CommandBufferUsageFlags: u32 {
        /// The buffer is submitted exactly once and must be reset before any
        /// re-record.
        const ONE_TIME_SUBMIT = 0x1;
        /// The buffer may be submitted multiple times and must lower to an
        /// identical call sequence every time.
        const SIMULTANEOUS_USE = 0x2;
    }
}

bitflags! {
    pub struct PipelineStageFlags: u32 {
        const TOP_OF_PIPE = 0x0001;
        const VERTEX_INPUT = 0x0002;
        const VERTEX_SHADER = 0x0004;
        const FRAGMENT_SHADER = 0x0008;
        const COMPUTE_SHADER = 0x0010;
        const TRANSFER = 0x0020;
        const COLOR_ATTACHMENT_OUTPUT = 0x0040;
        const BOTTOM_OF_PIPE = 0x0080;
        const ALL_COMMANDS = 0xffff;
    }
}

bitflags! {
    pub struct AccessFlags: u32 {
        const INDIRECT_COMMAND_READ = 0x0001;
        const INDEX_READ = 0x0002;
        const VERTEX_ATTRIBUTE_READ = 0x0004;
        const UNIFORM_READ = 0x0008;
        const INPUT_ATTACHMENT_READ = 0x0010;
        const SHADER_READ = 0x0020;
        const SHADER_WRITE = 0x0040;
        const COLOR_ATTACHMENT_READ = 0x0080;
        const COLOR_ATTACHMENT_WRITE = 0x0100;
        const DEPTH_STENCIL_ATTACHMENT_READ = 0x0200;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 0x0400;
        const TRANSFER_READ = 0x0800;
        const TRANSFER_WRITE = 0x1000;
        const HOST_READ = 0x2000;
        const HOST_WRITE = 0x4000;
    }
}

/// Global memory barrier; image/buffer granularity collapses to this on a
/// backend with a single implicit command stream.
#[derive(Copy, Clone, Debug)]
pub struct MemoryBarrier {
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}
