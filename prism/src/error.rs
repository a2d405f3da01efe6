//! Error taxonomy shared by all backends.
//!
//! Expected failure paths (capability negotiation, object creation) are
//! `Result`-returning. Programmer-contract violations (mismatched dynamic
//! offset counts, re-submitting a one-time command buffer) are asserted in
//! debug builds and are undefined behavior in release, mirroring the source
//! API's own contract.

use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,

    #[error("device lost")]
    DeviceLost,

    #[error("surface out of date")]
    OutOfDate,

    #[error("backend `{0}` is not available in this build")]
    BackendUnavailable(&'static str),

    #[error("context creation failed: {0}")]
    Context(String),

    #[error("driver reports OpenGL {major}.{minor}, but {req_major}.{req_minor} is required")]
    VersionNotSupported {
        major: u32,
        minor: u32,
        req_major: u32,
        req_minor: u32,
    },

    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),

    #[error("program link failed: {0}")]
    ProgramLink(String),

    #[error("framebuffer incomplete: {0}")]
    FramebufferIncomplete(&'static str),

    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// Outcome of a bounded wait (`Fence::wait`, `Queue::wait_idle` variants).
///
/// Device-loss is reported through [Error::DeviceLost] instead, so a plain
/// `Ok(WaitResult::…)` always means the device is still usable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WaitResult {
    Success,
    Timeout,
}

/// Timeout value meaning "wait forever".
pub const WAIT_FOREVER: u64 = u64::max_value();
