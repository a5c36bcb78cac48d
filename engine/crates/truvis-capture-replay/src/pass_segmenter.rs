//! Pass 切分
//!
//! 把有序的 draw 列表切成连续的若干段，每段即一个 Pass。

use std::ops::Range;

use indexmap::IndexMap;
use serde::Serialize;

use crate::draw_call::DrawCallRecord;
use crate::framebuffer_tracker::{FramebufferDescriptor, FramebufferId};

/// 一个逻辑 render pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PassRecord {
    pub name: String,
    /// 从 0 开始，连续递增
    pub index: usize,
    /// 在整帧 draw 列表中的下标范围
    pub draw_range: Range<usize>,
    pub total_duration_ns: u64,
    pub framebuffer: FramebufferId,
    /// 读取的、由更早 Pass 写入的纹理（读几次记几次）
    pub input_textures: Vec<String>,
    pub output_textures: Vec<String>,
}

impl PassRecord {
    /// 成员 draw
    #[inline]
    pub fn draws<'a>(&self, all: &'a [DrawCallRecord]) -> &'a [DrawCallRecord] {
        &all[self.draw_range.clone()]
    }

    #[inline]
    pub fn draw_count(&self) -> usize {
        self.draw_range.len()
    }

    pub fn triangle_count(&self, all: &[DrawCallRecord]) -> i64 {
        self.draws(all).iter().map(DrawCallRecord::triangle_count).sum()
    }

    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.total_duration_ns as f64 / 1_000_000.0
    }
}

pub struct PassSegmenter<'a> {
    framebuffers: &'a IndexMap<FramebufferId, FramebufferDescriptor>,
    /// `None` 表示不限制
    draw_cap: Option<usize>,
}

impl<'a> PassSegmenter<'a> {
    pub fn new(framebuffers: &'a IndexMap<FramebufferId, FramebufferDescriptor>, draw_cap: Option<usize>) -> Self {
        Self { framebuffers, draw_cap }
    }

    /// 切分 Pass
    ///
    /// 以下任一条件成立时开始新的 Pass：
    /// - 还没有 Pass
    /// - draw 的帧缓冲与当前 Pass 不同
    /// - draw 带有 marker 且与当前 Pass 名字不同
    /// - 当前 Pass 的 draw 数已达上限
    ///
    /// 因上限被切开的后继 Pass 沿用前一个 Pass 的名字。
    pub fn segment(&self, draws: &[DrawCallRecord]) -> Vec<PassRecord> {
        let mut passes: Vec<PassRecord> = Vec::new();

        for (draw_index, draw) in draws.iter().enumerate() {
            let starts_new = match passes.last() {
                None => true,
                Some(pass) => {
                    pass.framebuffer != draw.framebuffer
                        || draw.marker.as_deref().is_some_and(|marker| !marker.is_empty() && marker != pass.name)
                        || self.draw_cap.is_some_and(|cap| pass.draw_count() >= cap)
                }
            };

            if starts_new {
                let name = self.pass_name(draw, passes.len() + 1);
                passes.push(PassRecord {
                    name,
                    index: passes.len(),
                    draw_range: draw_index..draw_index,
                    total_duration_ns: 0,
                    framebuffer: draw.framebuffer.clone(),
                    input_textures: Vec::new(),
                    output_textures: Vec::new(),
                });
            }

            if let Some(pass) = passes.last_mut() {
                pass.draw_range.end = draw_index + 1;
                pass.total_duration_ns += draw.duration_ns.unwrap_or(0);
            }
        }

        log::debug!("segmented {} draws into {} passes", draws.len(), passes.len());
        passes
    }

    /// marker 优先，其次是帧缓冲的名字，最后生成 `Pass_<n>`
    fn pass_name(&self, draw: &DrawCallRecord, ordinal: usize) -> String {
        if let Some(marker) = draw.marker.as_deref().filter(|marker| !marker.is_empty()) {
            return marker.to_string();
        }

        match &draw.framebuffer {
            FramebufferId::Default => format!("Pass_{ordinal}"),
            FramebufferId::Named(id) => {
                let label = self.framebuffers.get(&draw.framebuffer).and_then(|fbo| fbo.name.as_deref());
                match label {
                    Some(label) => label.to_string(),
                    None => format!("Pass_{ordinal}_FBO_{id}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::draw_call::DrawCallKind;
    use crate::pipeline_state::PipelineState;

    use super::*;

    fn draw(ordinal: usize, framebuffer: FramebufferId, marker: Option<&str>) -> DrawCallRecord {
        DrawCallRecord {
            ordinal,
            event_id: ordinal as u32,
            name: "glDrawArrays".to_string(),
            kind: DrawCallKind::Draw,
            duration_ns: Some(1000),
            vertex_count: 3,
            index_count: 0,
            instance_count: 1,
            marker: marker.map(str::to_string),
            state: PipelineState::default(),
            bound_textures: Vec::new(),
            program: None,
            framebuffer,
        }
    }

    fn registry(named: &[(&str, Option<&str>)]) -> IndexMap<FramebufferId, FramebufferDescriptor> {
        let mut framebuffers = IndexMap::new();
        framebuffers.insert(FramebufferId::Default, FramebufferDescriptor::new(FramebufferId::Default));
        for (id, name) in named {
            let id = FramebufferId::Named(id.to_string());
            let mut descriptor = FramebufferDescriptor::new(id.clone());
            descriptor.name = name.map(str::to_string);
            framebuffers.insert(id, descriptor);
        }
        framebuffers
    }

    #[test]
    fn test_split_by_framebuffer_and_naming() {
        let framebuffers = registry(&[("ResourceId::5", Some("GBuffer")), ("ResourceId::6", None)]);
        let gbuffer = FramebufferId::Named("ResourceId::5".to_string());
        let unnamed = FramebufferId::Named("ResourceId::6".to_string());
        let draws = vec![
            draw(1, gbuffer.clone(), None),
            draw(2, gbuffer.clone(), None),
            draw(3, unnamed.clone(), None),
            draw(4, FramebufferId::Default, None),
            draw(5, FramebufferId::Default, Some("UI")),
        ];

        let passes = PassSegmenter::new(&framebuffers, Some(200)).segment(&draws);
        let names: Vec<_> = passes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["GBuffer", "Pass_2_FBO_ResourceId::6", "Pass_3", "UI"]);
        assert_eq!(passes[0].draw_range, 0..2);
        assert_eq!(passes[0].total_duration_ns, 2000);
        assert_eq!(passes[3].index, 3);
    }

    #[test]
    fn test_same_marker_continues_pass() {
        let framebuffers = registry(&[]);
        let draws = vec![
            draw(1, FramebufferId::Default, Some("Sky")),
            draw(2, FramebufferId::Default, None),
            draw(3, FramebufferId::Default, Some("Sky")),
            draw(4, FramebufferId::Default, Some("")),
        ];

        let passes = PassSegmenter::new(&framebuffers, Some(200)).segment(&draws);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].draw_count(), 4);
    }

    #[test]
    fn test_draw_cap_reuses_name() {
        let framebuffers = registry(&[]);
        let draws: Vec<_> = (1..=7).map(|i| draw(i, FramebufferId::Default, Some("Particles"))).collect();

        let passes = PassSegmenter::new(&framebuffers, Some(3)).segment(&draws);
        assert_eq!(passes.len(), 3);
        assert!(passes.iter().all(|p| p.name == "Particles"));
        assert_eq!(passes[2].draw_range, 6..7);

        let uncapped = PassSegmenter::new(&framebuffers, None).segment(&draws);
        assert_eq!(uncapped.len(), 1);
    }

    #[test]
    fn test_empty_draws() {
        let framebuffers = registry(&[]);
        assert!(PassSegmenter::new(&framebuffers, Some(200)).segment(&[]).is_empty());
    }
}
