//! Swapchain emulation over the default framebuffer.
//!
//! OpenGL has no swapchain: the window system owns the back buffer. This
//! type wraps the windowed context, hands out back-buffer image views that
//! bypass FBO creation, and maps buffer swaps and window resizes onto the
//! acquire/present/out-of-date contract.

use crate::context::{ContextGuard, GlContext};
use crate::image::GlImageView;
use crate::queue::GlQueue;
use prism::format::Format;
use prism::{Error, Result};
use std::cell::Cell;
use std::sync::Arc;

pub struct GlSwapchain {
    context: Arc<GlContext>,
    format: Format,
    extent: Cell<(u32, u32)>,
}

impl GlSwapchain {
    pub fn new(context: Arc<GlContext>, format: Format) -> Result<GlSwapchain> {
        let extent = Self::surface_extent(&context)?;
        Ok(GlSwapchain {
            context,
            format,
            extent: Cell::new(extent),
        })
    }

    fn surface_extent(context: &GlContext) -> Result<(u32, u32)> {
        let window = context
            .window()
            .ok_or(Error::Unsupported("swapchain requires a windowed context"))?;
        let size = window
            .get_inner_size()
            .ok_or(Error::OutOfDate)?;
        let (w, h): (u32, u32) = size.into();
        Ok((w, h))
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent.get()
    }

    /// View of the implicit back buffer; framebuffers built from it render
    /// to the default framebuffer.
    pub fn back_buffer_view(&self) -> GlImageView {
        GlImageView::back_buffer(self.format, 1)
    }

    /// The default framebuffer always has exactly one acquirable image.
    /// A surface resize invalidates the swapchain.
    pub fn acquire_next_image(&self) -> Result<u32> {
        if Self::surface_extent(&self.context)? != self.extent.get() {
            return Err(Error::OutOfDate);
        }
        Ok(0)
    }

    /// Re-reads the surface size after an out-of-date result.
    pub fn recreate(&self) -> Result<()> {
        self.extent.set(Self::surface_extent(&self.context)?);
        Ok(())
    }

    pub fn present(&self, guard: &ContextGuard, _queue: &GlQueue) -> Result<()> {
        if Self::surface_extent(&self.context)? != self.extent.get() {
            return Err(Error::OutOfDate);
        }
        guard.swap_buffers()
    }
}
