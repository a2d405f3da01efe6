//! Fixed-function pipeline state.
//!
//! These are the value structs baked into a pipeline at creation time and
//! diffed by the backend context-state cache at bind time. Every struct is
//! `Eq + Hash` (floats are stored as `NotNan`) so cached state can be compared
//! field-by-field.

use crate::format::Format;
use bitflags::bitflags;
use ordered_float::NotNan;

//--------------------------------------------------------------------------------------------------
// input assembly

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
    PatchList,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct InputAssemblyState {
    pub topology: PrimitiveTopology,
    pub primitive_restart_enable: bool,
}

impl Default for InputAssemblyState {
    fn default() -> InputAssemblyState {
        InputAssemblyState {
            topology: PrimitiveTopology::TriangleList,
            primitive_restart_enable: false,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// rasterization

bitflags! {
    pub struct CullModeFlags: u32 {
        const NONE = 0;
        const FRONT = 1;
        const BACK = 2;
        const FRONT_AND_BACK = Self::FRONT.bits | Self::BACK.bits;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DepthBias {
    pub constant_factor: NotNan<f32>,
    pub clamp: NotNan<f32>,
    pub slope_factor: NotNan<f32>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RasterizationState {
    pub cull_mode: CullModeFlags,
    pub front_face: FrontFace,
    pub polygon_mode: PolygonMode,
    pub depth_bias: Option<DepthBias>,
    pub line_width: NotNan<f32>,
}

impl Default for RasterizationState {
    fn default() -> RasterizationState {
        RasterizationState {
            cull_mode: CullModeFlags::NONE,
            front_face: FrontFace::CounterClockwise,
            polygon_mode: PolygonMode::Fill,
            depth_bias: None,
            line_width: 1.0.into(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// depth/stencil

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StencilTest {
    Disabled,
    Enabled {
        front: StencilOpState,
        back: StencilOpState,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub stencil_test: StencilTest,
}

impl Default for DepthStencilState {
    fn default() -> DepthStencilState {
        DepthStencilState {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: CompareOp::Less,
            stencil_test: StencilTest::Disabled,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// color blend

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
    Src1Color,
    OneMinusSrc1Color,
    Src1Alpha,
    OneMinusSrc1Alpha,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    NoOp,
    Xor,
    Or,
    Nor,
    Equivalent,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

bitflags! {
    pub struct ColorWriteFlags: u32 {
        const R = 0b0001;
        const G = 0b0010;
        const B = 0b0100;
        const A = 0b1000;
        const ALL = Self::R.bits | Self::G.bits | Self::B.bits | Self::A.bits;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ColorBlendAttachmentState {
    Disabled,
    Enabled {
        src_color_blend_factor: BlendFactor,
        dst_color_blend_factor: BlendFactor,
        color_blend_op: BlendOp,
        src_alpha_blend_factor: BlendFactor,
        dst_alpha_blend_factor: BlendFactor,
        alpha_blend_op: BlendOp,
        color_write_mask: ColorWriteFlags,
    },
}

impl ColorBlendAttachmentState {
    pub const ALPHA_BLENDING: ColorBlendAttachmentState = ColorBlendAttachmentState::Enabled {
        src_color_blend_factor: BlendFactor::SrcAlpha,
        dst_color_blend_factor: BlendFactor::OneMinusSrcAlpha,
        color_blend_op: BlendOp::Add,
        src_alpha_blend_factor: BlendFactor::One,
        dst_alpha_blend_factor: BlendFactor::OneMinusSrcAlpha,
        alpha_blend_op: BlendOp::Add,
        color_write_mask: ColorWriteFlags::ALL,
    };

    pub fn is_enabled(&self) -> bool {
        match self {
            ColorBlendAttachmentState::Disabled => false,
            ColorBlendAttachmentState::Enabled { .. } => true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ColorBlendState {
    pub logic_op: Option<LogicOp>,
    /// One entry per color attachment of the subpass the pipeline is built
    /// for. Targets without per-draw-buffer blend collapse this to a single
    /// aggregate toggle; see the backend state cache for the degrade rule.
    pub attachments: Vec<ColorBlendAttachmentState>,
    pub blend_constants: [NotNan<f32>; 4],
}

impl Default for ColorBlendState {
    fn default() -> ColorBlendState {
        ColorBlendState {
            logic_op: None,
            attachments: vec![ColorBlendAttachmentState::Disabled],
            blend_constants: [
                NotNan::from(0.0f32),
                NotNan::from(0.0f32),
                NotNan::from(0.0f32),
                NotNan::from(0.0f32),
            ],
        }
    }
}

//--------------------------------------------------------------------------------------------------
// multisample / tessellation

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct MultisampleState {
    pub rasterization_samples: u32,
    pub sample_shading: Option<NotNan<f32>>,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

impl Default for MultisampleState {
    fn default() -> MultisampleState {
        MultisampleState {
            rasterization_samples: 1,
            sample_shading: None,
            alpha_to_coverage_enable: false,
            alpha_to_one_enable: false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TessellationState {
    pub patch_control_points: u32,
}

//--------------------------------------------------------------------------------------------------
// viewport/scissor

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub x: NotNan<f32>,
    pub y: NotNan<f32>,
    pub width: NotNan<f32>,
    pub height: NotNan<f32>,
    pub min_depth: NotNan<f32>,
    pub max_depth: NotNan<f32>,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Viewport {
        Viewport {
            x: x.into(),
            y: y.into(),
            width: width.into(),
            height: height.into(),
            min_depth: 0.0.into(),
            max_depth: 1.0.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Scissor {
    Disabled,
    Enabled(crate::command::Rect2D),
}

//--------------------------------------------------------------------------------------------------
// vertex input

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum VertexInputRate {
    Vertex,
    Instance,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VertexInputBindingDescription {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct VertexInputAttributeDescription {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct VertexInputState {
    pub bindings: Vec<VertexInputBindingDescription>,
    pub attributes: Vec<VertexInputAttributeDescription>,
}

impl Default for VertexInputBindingDescription {
    fn default() -> VertexInputBindingDescription {
        VertexInputBindingDescription {
            binding: 0,
            stride: 0,
            input_rate: VertexInputRate::Vertex,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// shader stages / dynamic state

bitflags! {
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x01;
        const TESS_CONTROL = 0x02;
        const TESS_EVAL = 0x04;
        const GEOMETRY = 0x08;
        const FRAGMENT = 0x10;
        const COMPUTE = 0x20;
        const ALL_GRAPHICS = 0x1f;
    }
}

bitflags! {
    /// Pipeline states supplied per-command instead of baked into the
    /// pipeline. A dynamic state is never emitted by the pipeline bind; the
    /// matching `set_*` command carries the value.
    pub struct DynamicStateFlags: u32 {
        const VIEWPORT = 0x01;
        const SCISSOR = 0x02;
        const LINE_WIDTH = 0x04;
        const DEPTH_BIAS = 0x08;
        const BLEND_CONSTANTS = 0x10;
    }
}
