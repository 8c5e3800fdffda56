/// Fixed-function state applied before a draw.
///
/// A technique provides a base state, a material may override it with its
/// additional state, and the render manager may force one for every draw.

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    #[default]
    Back,
    /// Cull everything (only depth/stencil side effects remain)
    FrontAndBack,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    /// Wireframe
    Line,
    Point,
}

/// Comparison operator for the depth test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    #[default]
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Color blending equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source replaces destination
    #[default]
    Off,
    /// src * src_alpha + dst * (1 - src_alpha)
    Alpha,
    /// src + dst
    Additive,
    /// src + dst * (1 - src_alpha)
    PremultAlpha,
    /// src * dst
    Modulate,
}

/// Depth bias parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    /// Slope-based depth offset
    pub factor: f32,
    /// Constant depth offset
    pub units: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub cull_mode: CullMode,
    pub polygon_mode: PolygonMode,
    pub blend_mode: BlendMode,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare_op: CompareOp,
    pub color_write: bool,
    /// None = disabled
    pub depth_bias: Option<DepthBias>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl RenderState {
    pub const DEFAULT: RenderState = RenderState {
        cull_mode: CullMode::Back,
        polygon_mode: PolygonMode::Fill,
        blend_mode: BlendMode::Off,
        depth_test: true,
        depth_write: true,
        depth_compare_op: CompareOp::LessOrEqual,
        color_write: true,
        depth_bias: None,
    };

    /// Depth-only pass: no color output, nothing blended.
    pub fn depth_only() -> Self {
        Self {
            color_write: false,
            ..Self::DEFAULT
        }
    }

    pub fn with_cull_mode(mut self, cull_mode: CullMode) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.polygon_mode = if wireframe { PolygonMode::Line } else { PolygonMode::Fill };
        self
    }

    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    pub fn with_depth_test(mut self, depth_test: bool) -> Self {
        self.depth_test = depth_test;
        self
    }

    pub fn with_depth_write(mut self, depth_write: bool) -> Self {
        self.depth_write = depth_write;
        self
    }

    pub fn with_depth_bias(mut self, factor: f32, units: f32) -> Self {
        self.depth_bias = Some(DepthBias { factor, units });
        self
    }

    pub fn is_wireframe(&self) -> bool {
        self.polygon_mode == PolygonMode::Line
    }
}
