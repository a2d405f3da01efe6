//! Windowed device creation glue.

use crate::context::GlContext;
use crate::device::GlDevice;
use crate::instance::MIN_GL_VERSION;
use crate::swapchain::GlSwapchain;
use config::Config;
use glutin::GlWindow;
use prism::format::Format;
use prism::Result;
use std::sync::Arc;
use winit::{EventsLoop, WindowBuilder};

#[derive(Copy, Clone, Debug)]
pub struct WindowOptions {
    pub vsync: bool,
    pub debug_context: bool,
    pub srgb: bool,
}

impl Default for WindowOptions {
    fn default() -> WindowOptions {
        WindowOptions {
            vsync: true,
            debug_context: cfg!(debug_assertions),
            srgb: true,
        }
    }
}

impl WindowOptions {
    /// Layers file/env configuration over the defaults.
    pub fn from_config(cfg: &Config) -> WindowOptions {
        let d = WindowOptions::default();
        WindowOptions {
            vsync: cfg.get_bool("vsync").unwrap_or(d.vsync),
            debug_context: cfg.get_bool("debug_context").unwrap_or(d.debug_context),
            srgb: cfg.get_bool("srgb").unwrap_or(d.srgb),
        }
    }
}

/// Builds the window plus its context, negotiates the GL version, and wires
/// up the device and a swapchain over the default framebuffer.
pub fn create_device_and_swapchain(
    cfg: &Config,
    events_loop: &EventsLoop,
    window_builder: WindowBuilder,
    surface_format: Format,
) -> Result<(GlDevice, GlSwapchain)> {
    let options = WindowOptions::from_config(cfg);

    let context_builder = glutin::ContextBuilder::new()
        .with_gl_profile(glutin::GlProfile::Core)
        .with_gl_debug_flag(options.debug_context)
        .with_vsync(options.vsync)
        .with_srgb(options.srgb)
        .with_gl(glutin::GlRequest::Latest);

    let window = Arc::new(
        GlWindow::new(window_builder, context_builder, events_loop)
            .map_err(|e| prism::Error::Context(format!("unable to create window: {:?}", e)))?,
    );

    let context = Arc::new(GlContext::from_window(window, MIN_GL_VERSION)?);
    let swapchain = GlSwapchain::new(context.clone(), surface_format)?;
    let device = GlDevice::new(context)?;
    Ok((device, swapchain))
}
