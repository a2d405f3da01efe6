//! Native context ownership.
//!
//! One `GlContext` owns one native rendering context (windowed through
//! glutin, or an off-screen headless context used to query capabilities
//! before any surface exists) together with its loaded function-pointer
//! table. At most one context may be current on a thread at a time;
//! [GlContext::enable] hands out a [ContextGuard] token and every function
//! that executes GL work takes the guard, making the contract a compile-time
//! obligation. A thread-local marker catches violations at runtime in the
//! remaining cases (two contexts, forgotten guard drop).

use crate::api as gl;
use crate::api::types::*;
use crate::api::Gl;
use glutin::GlContext as GlutinContext;
use glutin::{GlWindow, HeadlessContext, HeadlessRendererBuilder};
use prism::{Error, Result};
use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;
use std::slice;
use std::str;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

thread_local! {
    /// Context id currently enabled on this thread, if any. The marker is
    /// thread-local on purpose: in a multi-context process each thread tracks
    /// its own current context and no state bleeds across threads.
    static CURRENT_CONTEXT: Cell<Option<usize>> = Cell::new(None);
}

static NEXT_CONTEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Version candidates tried while negotiating a headless context, newest
/// first. The attribute-based creation path needs a context to load its own
/// entry points; glutin performs that two-step bootstrap internally.
const CANDIDATE_VERSIONS: &[(u8, u8)] = &[(4, 6), (4, 5)];

extern "system" fn debug_callback(
    _source: GLenum,
    _ty: GLenum,
    _id: GLuint,
    severity: GLenum,
    length: GLsizei,
    msg: *const GLchar,
    _data: *mut GLvoid,
) {
    let text = unsafe {
        str::from_utf8(slice::from_raw_parts(msg as *const u8, length as usize))
            .unwrap_or("<invalid utf-8 in driver message>")
    };
    let level = match severity {
        gl::DEBUG_SEVERITY_HIGH => log::Level::Error,
        gl::DEBUG_SEVERITY_MEDIUM => log::Level::Warn,
        gl::DEBUG_SEVERITY_LOW => log::Level::Info,
        _ => log::Level::Debug,
    };
    log!(level, "(GL) {}", text);
}

enum NativeContext {
    Windowed(Arc<GlWindow>),
    Headless(HeadlessContext),
}

pub struct GlContext {
    native: NativeContext,
    gl: Gl,
    version: (u32, u32),
    id: usize,
}

impl GlContext {
    /// Wraps the context of an already-built window, loads the function
    /// table and verifies the driver meets the version floor.
    pub fn from_window(window: Arc<GlWindow>, min_version: (u32, u32)) -> Result<GlContext> {
        unsafe {
            window
                .make_current()
                .map_err(|e| Error::Context(format!("make_current failed: {:?}", e)))?;
        }
        let gl = Gl::load_with(|symbol| window.get_proc_address(symbol) as *const _);
        Self::finish_init(NativeContext::Windowed(window), gl, min_version)
    }

    /// Off-screen context for capability queries and surfaceless devices.
    pub fn headless(min_version: (u32, u32)) -> Result<GlContext> {
        let mut last_err = None;
        for &(major, minor) in CANDIDATE_VERSIONS {
            if (u32::from(major), u32::from(minor)) < min_version {
                break;
            }
            let built = HeadlessRendererBuilder::new(1, 1)
                .with_gl(glutin::GlRequest::Specific(
                    glutin::Api::OpenGl,
                    (major, minor),
                ))
                .with_gl_profile(glutin::GlProfile::Core)
                .build();
            match built {
                Ok(context) => {
                    unsafe {
                        context.make_current().map_err(|e| {
                            Error::Context(format!("make_current failed: {:?}", e))
                        })?;
                    }
                    let gl = Gl::load_with(|symbol| context.get_proc_address(symbol) as *const _);
                    return Self::finish_init(NativeContext::Headless(context), gl, min_version);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(Error::Context(format!(
            "no headless context candidate succeeded: {:?}",
            last_err
        )))
    }

    fn finish_init(native: NativeContext, gl: Gl, min_version: (u32, u32)) -> Result<GlContext> {
        let (mut major, mut minor) = (0, 0);
        unsafe {
            gl.GetIntegerv(gl::MAJOR_VERSION, &mut major);
            gl.GetIntegerv(gl::MINOR_VERSION, &mut minor);
        }
        let version = (major as u32, minor as u32);

        unsafe {
            let vendor = CStr::from_ptr(gl.GetString(gl::VENDOR) as *const c_char);
            let renderer = CStr::from_ptr(gl.GetString(gl::RENDERER) as *const c_char);
            info!(
                "OpenGL version {}.{} (vendor: {:?}, renderer: {:?})",
                version.0, version.1, vendor, renderer
            );
        }

        if version < min_version {
            return Err(Error::VersionNotSupported {
                major: version.0,
                minor: version.1,
                req_major: min_version.0,
                req_minor: min_version.1,
            });
        }

        // best effort: absence of the debug extension is never fatal
        if gl.DebugMessageCallback.is_loaded() {
            unsafe {
                gl.Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
                gl.DebugMessageCallback(debug_callback as GLDEBUGPROC, ptr::null());
                gl.DebugMessageControl(
                    gl::DONT_CARE,
                    gl::DONT_CARE,
                    gl::DONT_CARE,
                    0,
                    ptr::null(),
                    gl::TRUE,
                );
            }
        } else {
            debug!("glDebugMessageCallback not available, driver diagnostics disabled");
        }

        Ok(GlContext {
            native,
            gl,
            version,
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn version(&self) -> (u32, u32) {
        self.version
    }

    pub fn window(&self) -> Option<&Arc<GlWindow>> {
        match self.native {
            NativeContext::Windowed(ref w) => Some(w),
            NativeContext::Headless(_) => None,
        }
    }

    /// Makes the context current on the calling thread and returns the guard
    /// token required by every GL-executing function. Exactly one guard may
    /// be outstanding per thread; dropping it is `disable()`.
    pub fn enable(&self) -> Result<ContextGuard> {
        CURRENT_CONTEXT.with(|current| {
            assert!(
                current.get().is_none(),
                "a context is already current on this thread"
            );
            current.set(Some(self.id));
        });
        let made = unsafe {
            match self.native {
                NativeContext::Windowed(ref w) => w.make_current(),
                NativeContext::Headless(ref c) => c.make_current(),
            }
        };
        if let Err(e) = made {
            CURRENT_CONTEXT.with(|current| current.set(None));
            return Err(Error::Context(format!("make_current failed: {:?}", e)));
        }
        Ok(ContextGuard { context: self })
    }
}

/// Proof that `enable()` is outstanding on the calling thread.
pub struct ContextGuard<'a> {
    context: &'a GlContext,
}

impl<'a> ContextGuard<'a> {
    pub(crate) fn gl(&self) -> &Gl {
        &self.context.gl
    }

    pub fn context(&self) -> &GlContext {
        self.context
    }

    pub fn swap_buffers(&self) -> Result<()> {
        match self.context.native {
            NativeContext::Windowed(ref w) => w
                .swap_buffers()
                .map_err(|e| Error::Context(format!("swap_buffers failed: {:?}", e))),
            NativeContext::Headless(_) => Ok(()),
        }
    }
}

impl<'a> Drop for ContextGuard<'a> {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|current| {
            debug_assert_eq!(current.get(), Some(self.context.id));
            current.set(None);
        });
    }
}
