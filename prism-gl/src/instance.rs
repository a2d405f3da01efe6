//! Instance and physical-device enumeration.
//!
//! Capability queries need a live context before any real surface exists;
//! enumeration bootstraps a throwaway off-screen context (the dummy-window
//! trick), reads the driver's limits, and tears it down again.

use crate::context::GlContext;
use crate::device::GlDevice;
use prism::backend::BackendKind;
use prism::limits::{DeviceFeatures, DeviceLimits};
use prism::{Error, Result};
use std::sync::Arc;

/// Version floor of the carried GL generation.
pub const MIN_GL_VERSION: (u32, u32) = (4, 5);

#[derive(Clone, Debug)]
pub struct GlPhysicalDevice {
    pub name: String,
    pub version: (u32, u32),
    pub limits: DeviceLimits,
    pub features: DeviceFeatures,
}

pub struct GlInstance {
    min_version: (u32, u32),
}

impl GlInstance {
    /// Only the `gl4` generation is carried by this crate; other kinds are
    /// external plugins.
    pub fn new(kind: BackendKind) -> Result<GlInstance> {
        match kind {
            BackendKind::Gl4 => Ok(GlInstance {
                min_version: MIN_GL_VERSION,
            }),
            other => Err(Error::BackendUnavailable(other.short_name())),
        }
    }

    /// One physical device per driver; queried through a temporary
    /// off-screen context.
    pub fn enumerate_physical_devices(&self) -> Result<Vec<GlPhysicalDevice>> {
        let context = GlContext::headless(self.min_version)?;
        let device = GlDevice::new(Arc::new(context))?;
        let name = {
            let guard = device.context().enable()?;
            unsafe {
                let renderer = guard.gl().GetString(crate::api::RENDERER);
                std::ffi::CStr::from_ptr(renderer as *const _)
                    .to_string_lossy()
                    .into_owned()
            }
        };
        Ok(vec![GlPhysicalDevice {
            name,
            version: device.context().version(),
            limits: *device.limits(),
            features: *device.features(),
        }])
    }

    /// Surfaceless device for compute/transfer-only use and tests.
    pub fn create_headless_device(&self) -> Result<GlDevice> {
        let context = Arc::new(GlContext::headless(self.min_version)?);
        GlDevice::new(context)
    }
}
