use serde::Serialize;
use truvis_capture::call::DrawKind;

use crate::framebuffer_tracker::FramebufferId;
use crate::pipeline_state::PipelineState;

/// draw / dispatch 类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawCallKind {
    Draw,
    DrawIndexed,
    Dispatch,
}

impl From<DrawKind> for DrawCallKind {
    fn from(kind: DrawKind) -> Self {
        match kind {
            DrawKind::Arrays => Self::Draw,
            DrawKind::Indexed => Self::DrawIndexed,
            DrawKind::Dispatch => Self::Dispatch,
        }
    }
}

/// 单个 draw / dispatch 的完整记录
///
/// 状态、绑定的纹理、程序与帧缓冲都是命令执行那一刻的快照。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrawCallRecord {
    /// 从 1 开始的序号，严格递增
    pub ordinal: usize,
    pub event_id: u32,
    pub name: String,
    pub kind: DrawCallKind,
    pub duration_ns: Option<u64>,

    /// 非索引绘制的顶点数，缺失时为 0
    pub vertex_count: i64,
    /// 索引绘制的索引数，缺失时为 0
    pub index_count: i64,
    /// 至少为 1
    pub instance_count: i64,

    pub marker: Option<String>,
    pub state: PipelineState,
    /// 按纹理单元升序、去重
    pub bound_textures: Vec<String>,
    pub program: Option<String>,
    pub framebuffer: FramebufferId,
}

impl DrawCallRecord {
    /// 三角形数：优先用索引数，否则用顶点数
    pub fn triangle_count(&self) -> i64 {
        let count = if self.index_count > 0 { self.index_count } else { self.vertex_count };
        count / 3 * self.instance_count
    }

    #[inline]
    pub fn gpu_duration_ms(&self) -> f64 {
        self.duration_ns.unwrap_or(0) as f64 / 1_000_000.0
    }

    #[inline]
    pub fn is_dispatch(&self) -> bool {
        self.kind == DrawCallKind::Dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(vertex_count: i64, index_count: i64, instance_count: i64) -> DrawCallRecord {
        DrawCallRecord {
            ordinal: 1,
            event_id: 10,
            name: "glDrawElementsInstanced".to_string(),
            kind: DrawCallKind::DrawIndexed,
            duration_ns: Some(2_500_000),
            vertex_count,
            index_count,
            instance_count,
            marker: None,
            state: PipelineState::default(),
            bound_textures: Vec::new(),
            program: None,
            framebuffer: FramebufferId::Default,
        }
    }

    #[test]
    fn test_triangle_count() {
        assert_eq!(record(0, 300, 2).triangle_count(), 200);
        assert_eq!(record(36, 0, 1).triangle_count(), 12);
        assert_eq!(record(0, 0, 1).triangle_count(), 0);
    }

    #[test]
    fn test_gpu_duration_ms() {
        assert_eq!(record(3, 0, 1).gpu_duration_ms(), 2.5);
    }
}
