//! 管线状态追踪
//!
//! 按事件顺序维护 blend / depth / stencil / cull / scissor / 光栅模式 / 颜色掩码，
//! draw 时通过 `snapshot` 取一份值拷贝。

use truvis_capture::call::{ApiCall, classify};
use truvis_capture::enums::Capability;
use truvis_capture::event::Event;

use crate::pipeline_state::PipelineState;

#[derive(Debug, Default)]
pub struct StateTracker {
    state: PipelineState,
}

// new & init
impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 恢复到 API 初始状态
    pub fn reset(&mut self) {
        self.state = PipelineState::default();
    }
}

// update
impl StateTracker {
    /// 处理单个事件，未识别的事件不产生任何影响
    pub fn process_event(&mut self, event: &Event) {
        self.apply(&classify(event));
    }

    /// 应用已分类的调用
    ///
    /// 字段为 `None` 时保留旧值，只更新能读出的那部分。
    pub fn apply(&mut self, call: &ApiCall) {
        let state = &mut self.state;
        match call {
            ApiCall::SetCapability { capability, enabled } => {
                let enabled = *enabled;
                match capability {
                    Capability::Blend => state.blend.enabled = enabled,
                    Capability::DepthTest => state.depth.test_enabled = enabled,
                    Capability::StencilTest => state.stencil.enabled = enabled,
                    Capability::CullFace => state.cull.enabled = enabled,
                    Capability::ScissorTest => state.scissor.enabled = enabled,
                }
            }
            ApiCall::BlendFunc {
                src_rgb,
                dst_rgb,
                src_alpha,
                dst_alpha,
            } => {
                assign(&mut state.blend.src_rgb, *src_rgb);
                assign(&mut state.blend.dst_rgb, *dst_rgb);
                assign(&mut state.blend.src_alpha, *src_alpha);
                assign(&mut state.blend.dst_alpha, *dst_alpha);
            }
            ApiCall::BlendEquation { rgb, alpha } => {
                assign(&mut state.blend.equation_rgb, *rgb);
                assign(&mut state.blend.equation_alpha, *alpha);
            }
            ApiCall::DepthFunc(func) => assign(&mut state.depth.func, *func),
            ApiCall::DepthMask(flag) => assign(&mut state.depth.write_enabled, *flag),
            ApiCall::StencilFunc { func, reference, mask } => {
                assign(&mut state.stencil.func, *func);
                assign(&mut state.stencil.reference, reference.and_then(|v| i32::try_from(v).ok()));
                // mask 是按位的无符号值，捕获里可能以 i32 负数形式出现（-1 即全 1），超出范围则忽略
                let mask = mask.and_then(|v| u32::try_from(v).ok().or_else(|| i32::try_from(v).ok().map(|v| v as u32)));
                assign(&mut state.stencil.mask, mask);
            }
            ApiCall::StencilOp { fail, depth_fail, pass } => {
                assign(&mut state.stencil.fail_op, *fail);
                assign(&mut state.stencil.depth_fail_op, *depth_fail);
                assign(&mut state.stencil.pass_op, *pass);
            }
            ApiCall::CullFace(mode) => assign(&mut state.cull.mode, *mode),
            ApiCall::FrontFace(face) => assign(&mut state.cull.front_face, *face),
            ApiCall::Scissor { x, y, width, height } => {
                let rect = &mut state.scissor.rect;
                assign(&mut rect.x, x.and_then(|v| i32::try_from(v).ok()));
                assign(&mut rect.y, y.and_then(|v| i32::try_from(v).ok()));
                assign(&mut rect.width, width.and_then(|v| i32::try_from(v).ok()));
                assign(&mut rect.height, height.and_then(|v| i32::try_from(v).ok()));
            }
            ApiCall::ColorMask { red, green, blue, alpha } => {
                let mask = &mut state.color_mask;
                assign(&mut mask.red, *red);
                assign(&mut mask.green, *green);
                assign(&mut mask.blue, *blue);
                assign(&mut mask.alpha, *alpha);
            }
            ApiCall::PolygonMode(mode) => assign(&mut state.polygon_mode, *mode),

            ApiCall::ActiveTexture(_)
            | ApiCall::BindTexture(_)
            | ApiCall::BindTextureUnit { .. }
            | ApiCall::SamplerParameter { .. }
            | ApiCall::BindFramebuffer(_)
            | ApiCall::AttachTexture { .. }
            | ApiCall::AttachRenderbuffer { .. }
            | ApiCall::Clear(_)
            | ApiCall::ClearColor(_)
            | ApiCall::ClearDepth(_)
            | ApiCall::ClearStencil(_)
            | ApiCall::DrawBuffers(_)
            | ApiCall::FramebufferLabel { .. }
            | ApiCall::TextureStorage(_)
            | ApiCall::CreateShader { .. }
            | ApiCall::ShaderSource { .. }
            | ApiCall::UseProgram(_)
            | ApiCall::PushDebugGroup(_)
            | ApiCall::PopDebugGroup
            | ApiCall::Draw(_)
            | ApiCall::Unrecognized => {}
        }
    }
}

// getter
impl StateTracker {
    /// 当前状态的值拷贝
    #[inline]
    pub fn snapshot(&self) -> PipelineState {
        self.state
    }
}

#[inline]
fn assign<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}
