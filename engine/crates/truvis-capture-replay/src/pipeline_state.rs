//! 管线状态快照
//!
//! 每个 draw 记录一份完整的 `PipelineState` 值拷贝。

use std::fmt;

use serde::Serialize;
use truvis_capture::enums::{BlendEquation, BlendFactor, CompareFunc, CullMode, FrontFace, PolygonMode, StencilOp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BlendState {
    pub enabled: bool,
    pub src_rgb: BlendFactor,
    pub dst_rgb: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub equation_rgb: BlendEquation,
    pub equation_alpha: BlendEquation,
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src_rgb: BlendFactor::One,
            dst_rgb: BlendFactor::Zero,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            equation_rgb: BlendEquation::Add,
            equation_alpha: BlendEquation::Add,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DepthState {
    pub test_enabled: bool,
    pub write_enabled: bool,
    pub func: CompareFunc,
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enabled: false,
            write_enabled: true,
            func: CompareFunc::Less,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct StencilState {
    pub enabled: bool,
    pub func: CompareFunc,
    pub reference: i32,
    pub mask: u32,
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            enabled: false,
            func: CompareFunc::Always,
            reference: 0,
            mask: u32::MAX,
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CullState {
    pub enabled: bool,
    pub mode: CullMode,
    pub front_face: FrontFace,
}

impl Default for CullState {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: CullMode::Back,
            front_face: FrontFace::Ccw,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ScissorRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ScissorState {
    pub enabled: bool,
    pub rect: ScissorRect,
}

/// 颜色写掩码
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ColorMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl Default for ColorMask {
    fn default() -> Self {
        Self {
            red: true,
            green: true,
            blue: true,
            alpha: true,
        }
    }
}

/// 输出形如 `RGBA`、`RG`，全部关闭时为 `NONE`
impl fmt::Display for ColorMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = [(self.red, 'R'), (self.green, 'G'), (self.blue, 'B'), (self.alpha, 'A')];
        if channels.iter().all(|(on, _)| !on) {
            return f.write_str("NONE");
        }
        for (_, c) in channels.iter().filter(|(on, _)| *on) {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// 某个 draw 执行时的完整管线状态
///
/// 默认值即 API 的初始状态：
/// - 混合关闭，ONE / ZERO，ADD
/// - 深度测试关闭，深度写开启，LESS
/// - 模板测试关闭，ALWAYS，ref 0，mask 全 1，KEEP×3
/// - 剔除关闭，BACK，CCW
/// - 裁剪关闭，零矩形
/// - FILL，颜色掩码 RGBA
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PipelineState {
    pub blend: BlendState,
    pub depth: DepthState,
    pub stencil: StencilState,
    pub cull: CullState,
    pub scissor: ScissorState,
    pub polygon_mode: PolygonMode,
    pub color_mask: ColorMask,
}
