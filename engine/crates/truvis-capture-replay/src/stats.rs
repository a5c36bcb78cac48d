//! 整帧统计

use std::collections::HashSet;

use serde::Serialize;

use crate::draw_call::DrawCallRecord;

/// 相邻 draw 之间的切换次数
///
/// 第一个 draw 计为一次切换（从“无”切到它的状态）。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SwitchStats {
    pub marker_switches: usize,
    pub framebuffer_switches: usize,
    /// 相邻 draw 绑定纹理集合的对称差大小之和
    pub texture_binding_changes: usize,
    pub program_switches: usize,
}

impl SwitchStats {
    pub fn from_draws(draws: &[DrawCallRecord]) -> Self {
        let mut stats = Self::default();
        let mut previous: Option<&DrawCallRecord> = None;

        for draw in draws {
            match previous {
                None => {
                    stats.marker_switches += 1;
                    stats.framebuffer_switches += 1;
                    stats.program_switches += 1;
                    stats.texture_binding_changes += draw.bound_textures.iter().collect::<HashSet<_>>().len();
                }
                Some(prev) => {
                    stats.marker_switches += usize::from(prev.marker != draw.marker);
                    stats.framebuffer_switches += usize::from(prev.framebuffer != draw.framebuffer);
                    stats.program_switches += usize::from(prev.program != draw.program);

                    let before: HashSet<&String> = prev.bound_textures.iter().collect();
                    let after: HashSet<&String> = draw.bound_textures.iter().collect();
                    stats.texture_binding_changes += before.symmetric_difference(&after).count();
                }
            }
            previous = Some(draw);
        }

        stats
    }
}

/// 开启各项状态的 draw 数
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StateUsage {
    pub blend_enabled: usize,
    pub depth_test_enabled: usize,
    pub depth_write_enabled: usize,
    pub cull_enabled: usize,
}

impl StateUsage {
    pub fn from_draws(draws: &[DrawCallRecord]) -> Self {
        draws.iter().fold(Self::default(), |mut usage, draw| {
            let state = &draw.state;
            usage.blend_enabled += usize::from(state.blend.enabled);
            usage.depth_test_enabled += usize::from(state.depth.test_enabled);
            usage.depth_write_enabled += usize::from(state.depth.write_enabled);
            usage.cull_enabled += usize::from(state.cull.enabled);
            usage
        })
    }
}

/// 整帧概要
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CaptureSummary {
    pub total_draws: usize,
    pub total_dispatches: usize,
    pub total_passes: usize,
    pub total_triangles: i64,
    pub total_duration_ms: f64,
    pub total_dependencies: usize,
    pub total_framebuffers: usize,
    pub total_textures: usize,
    pub total_shaders: usize,
    /// 各纹理估算显存之和
    pub total_texture_memory_bytes: u64,
    pub switches: SwitchStats,
    pub state_usage: StateUsage,
}
