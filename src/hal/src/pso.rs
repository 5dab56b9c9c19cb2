//! Pipeline state descriptions.
//!
//! Fields typed `Option<T>` are *dynamic*: `None` means the value is not
//! baked into the pipeline and is supplied per draw through
//! [`DynamicRenderStates`]. The state diff engine consults the dynamic
//! struct only for such fields.

/// Maximum number of simultaneous color attachments.
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

bitflags! {
    /// Color channel write mask.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ColorMask: u8 {
        const RED = 0x1;
        const GREEN = 0x2;
        const BLUE = 0x4;
        const ALPHA = 0x8;
        const ALL = 0xF;
    }
}

/// Comparison functions for depth, stencil and shadow sampling.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Stencil buffer operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Faces culled by the rasterizer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CullMode {
    None,
    Front,
    Back,
    FrontAndBack,
}

/// Winding order considered front-facing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// How polygons are rasterized.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

/// Blend weighting factors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
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
    ConstColor,
    OneMinusConstColor,
    SrcAlphaSaturate,
}

/// Blend combination operators.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Rasterization portion of the pipeline state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterizationState {
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_bias_enable: bool,
    /// `None` = dynamic.
    pub depth_bias_constant_factor: Option<f32>,
    /// `None` = dynamic.
    pub depth_bias_clamp: Option<f32>,
    /// `None` = dynamic.
    pub depth_bias_slope_factor: Option<f32>,
    /// `None` = dynamic. The value delivered to the driver is always
    /// clamped to the probed line width range.
    pub line_width: Option<f32>,
}

impl Default for RasterizationState {
    fn default() -> Self {
        RasterizationState {
            depth_clamp_enable: false,
            rasterizer_discard_enable: false,
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::None,
            front_face: FrontFace::CounterClockwise,
            depth_bias_enable: false,
            depth_bias_constant_factor: Some(0.0),
            depth_bias_clamp: Some(0.0),
            depth_bias_slope_factor: Some(0.0),
            line_width: Some(1.0),
        }
    }
}

/// Multisample portion of the pipeline state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MultisampleState {
    pub multisample_enable: bool,
    /// `None` = all samples enabled.
    pub sample_mask: Option<u32>,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

/// Per-face stencil state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilFaceState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    /// `None` = dynamic.
    pub compare_mask: Option<u32>,
    /// `None` = dynamic.
    pub write_mask: Option<u32>,
    /// `None` = dynamic.
    pub reference: Option<u32>,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        StencilFaceState {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: Some(!0),
            write_mask: Some(!0),
            reference: Some(0),
        }
    }
}

/// Depth/stencil portion of the pipeline state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub depth_bounds_test_enable: bool,
    /// `None` = dynamic.
    pub min_depth_bounds: Option<f32>,
    /// `None` = dynamic.
    pub max_depth_bounds: Option<f32>,
    pub stencil_test_enable: bool,
    pub front_stencil: StencilFaceState,
    pub back_stencil: StencilFaceState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        DepthStencilState {
            depth_test_enable: false,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,
            depth_bounds_test_enable: false,
            min_depth_bounds: Some(0.0),
            max_depth_bounds: Some(1.0),
            stencil_test_enable: false,
            front_stencil: StencilFaceState::default(),
            back_stencil: StencilFaceState::default(),
        }
    }
}

/// Blend state of one color attachment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendAttachmentState {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_op: BlendOp,
    pub color_write_mask: ColorMask,
}

impl Default for BlendAttachmentState {
    fn default() -> Self {
        BlendAttachmentState {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            color_write_mask: ColorMask::ALL,
        }
    }
}

/// Blend portion of the pipeline state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendState {
    /// When false, attachment 0 is broadcast through the non-indexed
    /// driver entry points.
    pub separate_attachment_blending_enable: bool,
    pub attachments: [BlendAttachmentState; MAX_COLOR_ATTACHMENTS],
    /// `None` = dynamic.
    pub blend_constants: Option<[f32; 4]>,
}

impl Default for BlendState {
    fn default() -> Self {
        BlendState {
            separate_attachment_blending_enable: false,
            attachments: [BlendAttachmentState::default(); MAX_COLOR_ATTACHMENTS],
            blend_constants: Some([0.0; 4]),
        }
    }
}

/// The complete pipeline state tracked by the state diff engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderState {
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub depth_stencil: DepthStencilState,
    pub blend: BlendState,
    /// Control points per patch when drawing patch lists.
    pub patch_control_points: Option<u32>,
    /// Number of enabled user clip distances.
    pub clip_distance_count: u32,
}

/// Values for the dynamically-overridable subset of the render state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynamicRenderStates {
    pub line_width: f32,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub blend_constants: [f32; 4],
    pub depth_bounds: [f32; 2],
    pub front_stencil_compare_mask: u32,
    pub back_stencil_compare_mask: u32,
    pub front_stencil_write_mask: u32,
    pub back_stencil_write_mask: u32,
    pub front_stencil_reference: u32,
    pub back_stencil_reference: u32,
}

impl Default for DynamicRenderStates {
    fn default() -> Self {
        DynamicRenderStates {
            line_width: 1.0,
            depth_bias_constant_factor: 0.0,
            depth_bias_clamp: 0.0,
            depth_bias_slope_factor: 0.0,
            blend_constants: [0.0; 4],
            depth_bounds: [0.0, 1.0],
            front_stencil_compare_mask: !0,
            back_stencil_compare_mask: !0,
            front_stencil_write_mask: !0,
            back_stencil_write_mask: !0,
            front_stencil_reference: 0,
            back_stencil_reference: 0,
        }
    }
}

/// A viewport with a depth range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// An integer rectangle in framebuffer coordinates.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}
