//! Backend-agnostic data model for a Vulkan-shaped hardware abstraction layer.
//!
//! A client application writes one Vulkan-style render path against these types
//! and picks a concrete backend at runtime through the [backend] registry.
//! The types in this crate are plain value structs: they describe pipelines,
//! render passes, descriptor layouts and resources, but never touch a GPU.
//! Each backend crate (e.g. `prism-gl`) owns its object graph and consumes
//! these descriptions at object-creation time.

pub mod backend;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod image;
pub mod limits;
pub mod pass;
pub mod pipeline;

pub use self::backend::{BackendDescription, BackendKind};
pub use self::command::{ClearValue, DrawIndexedParams, DrawParams, IndexType, Rect2D};
pub use self::descriptor::{DescriptorSetLayoutBinding, DescriptorType};
pub use self::error::{Error, Result, WaitResult};
pub use self::format::{AspectFlags, Format};
pub use self::limits::{DeviceFeatures, DeviceLimits};
pub use self::pipeline::{Scissor, Viewport};
