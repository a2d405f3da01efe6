//! OpenGL backend for the prism HAL.
//!
//! The client records Vulkan-shaped command buffers on any thread; at submit
//! time the queue lowers the recorded stream onto immediate-mode OpenGL,
//! diffing fixed-function state against the context state cache and flattening
//! descriptor-set bindings onto GL's texture-unit/UBO/SSBO namespaces.

#[macro_use]
extern crate log;

mod api;
pub mod buffer;
pub mod command;
pub mod context;
pub mod descriptor;
pub mod device;
pub mod format;
pub mod framebuffer;
pub mod image;
pub mod instance;
pub mod layout;
pub mod ops;
pub mod pass;
pub mod pipeline;
pub mod queue;
pub mod sampler;
pub mod shader;
pub mod state;
pub mod swapchain;
pub mod sync;
pub mod window;

pub use self::buffer::{BufferUsageFlags, GlBuffer, GlBufferView};
pub use self::command::{BufferCopy, GlCommandBuffer};
pub use self::context::{ContextGuard, GlContext};
pub use self::descriptor::{BufferDescriptor, DescriptorWrite, GlDescriptorSet, ImageDescriptor};
pub use self::device::GlDevice;
pub use self::framebuffer::GlFramebuffer;
pub use self::image::{GlImage, GlImageView};
pub use self::instance::{GlInstance, GlPhysicalDevice, MIN_GL_VERSION};
pub use self::layout::{GlDescriptorSetLayout, GlPipelineLayout};
pub use self::ops::GlOp;
pub use self::pass::GlRenderPass;
pub use self::pipeline::{
    ComputePipelineCreateInfo, GlComputePipeline, GlGraphicsPipeline, GraphicsPipelineCreateInfo,
    GraphicsShaderStages, ViewportState,
};
pub use self::queue::GlQueue;
pub use self::sampler::GlSampler;
pub use self::shader::GlShaderModule;
pub use self::state::StateCache;
pub use self::swapchain::GlSwapchain;
pub use self::sync::{GlFence, GlSemaphore};
pub use self::window::{create_device_and_swapchain, WindowOptions};
