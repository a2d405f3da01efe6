//! Backend registry.
//!
//! Each concrete backend is an independent crate with its own object graph;
//! the registry only names them and describes their capabilities so a caller
//! can select one by short name. There is deliberately no shared object
//! hierarchy across backends beyond this description table.

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BackendKind {
    /// Native Vulkan passthrough (external plugin).
    Vulkan,
    /// Desktop OpenGL, 4.x generation (`prism-gl`).
    Gl4,
    /// Desktop OpenGL, 3.x generation. The legacy generation is not carried
    /// in this build; the short name remains reserved.
    Gl3,
    /// Direct3D 11 (external plugin).
    D3d11,
    /// Headless backend that records instead of rendering (`prism-test`).
    Test,
}

impl BackendKind {
    pub fn short_name(self) -> &'static str {
        match self {
            BackendKind::Vulkan => "vk",
            BackendKind::Gl4 => "gl4",
            BackendKind::Gl3 => "gl3",
            BackendKind::D3d11 => "d3d11",
            BackendKind::Test => "test",
        }
    }

    pub fn from_short_name(name: &str) -> Option<BackendKind> {
        match name {
            "vk" => Some(BackendKind::Vulkan),
            "gl4" => Some(BackendKind::Gl4),
            "gl3" => Some(BackendKind::Gl3),
            "d3d11" => Some(BackendKind::D3d11),
            "test" => Some(BackendKind::Test),
            _ => None,
        }
    }
}

/// Capability description returned for every known backend.
#[derive(Copy, Clone, Debug)]
pub struct BackendDescription {
    pub kind: BackendKind,
    pub name: &'static str,
    pub description: &'static str,
    /// Whether the backend is linked into this build. External plugins
    /// (`vk`, `d3d11`) report `false` here and are loaded out-of-tree.
    pub available: bool,
    /// Selection priority when the caller does not name a backend; higher
    /// wins.
    pub priority: u32,
}

const BACKENDS: &[BackendDescription] = &[
    BackendDescription {
        kind: BackendKind::Vulkan,
        name: "Vulkan",
        description: "native Vulkan passthrough",
        available: false,
        priority: 10,
    },
    BackendDescription {
        kind: BackendKind::Gl4,
        name: "OpenGL 4",
        description: "OpenGL 4.x command-stream emulation",
        available: true,
        priority: 8,
    },
    BackendDescription {
        kind: BackendKind::Gl3,
        name: "OpenGL 3",
        description: "OpenGL 3.x command-stream emulation (not carried in this build)",
        available: false,
        priority: 6,
    },
    BackendDescription {
        kind: BackendKind::D3d11,
        name: "Direct3D 11",
        description: "Direct3D 11 translation",
        available: false,
        priority: 7,
    },
    BackendDescription {
        kind: BackendKind::Test,
        name: "Test",
        description: "headless recording backend",
        available: true,
        priority: 1,
    },
];

/// All known backends, in declaration order.
pub fn enumerate() -> &'static [BackendDescription] {
    BACKENDS
}

/// Looks up a backend by short name (`"vk"`, `"gl4"`, `"gl3"`, `"d3d11"`,
/// `"test"`).
pub fn find(short_name: &str) -> Option<&'static BackendDescription> {
    let kind = BackendKind::from_short_name(short_name)?;
    BACKENDS.iter().find(|d| d.kind == kind)
}

/// The highest-priority backend available in this build.
pub fn default_backend() -> &'static BackendDescription {
    BACKENDS
        .iter()
        .filter(|d| d.available)
        .max_by_key(|d| d.priority)
        .expect("no backend available")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_round_trip() {
        for d in enumerate() {
            assert_eq!(BackendKind::from_short_name(d.kind.short_name()), Some(d.kind));
        }
        assert_eq!(BackendKind::from_short_name("gl5"), None);
    }

    #[test]
    fn default_is_available() {
        let d = default_backend();
        assert!(d.available);
        assert_eq!(d.kind, BackendKind::Gl4);
    }

    #[test]
    fn find_reports_plugin_backends() {
        let vk = find("vk").unwrap();
        assert!(!vk.available);
        assert!(find("test").unwrap().available);
    }
}
