//! Pass 间资源依赖分析
//!
//! 检测模式：Pass A 渲染到帧缓冲的纹理附件，之后 Pass B 把这张纹理绑定来采样，
//! 则 B 依赖 A（写后读）。

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::draw_call::DrawCallRecord;
use crate::framebuffer_tracker::{FramebufferDescriptor, FramebufferId};
use crate::pass_segmenter::PassRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyKind {
    ReadAfterWrite,
}

/// 依赖边：从写入者 Pass 指向读取者 Pass，始终满足 `source < target`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub source_pass_index: usize,
    pub source_pass_name: String,
    pub target_pass_index: usize,
    pub target_pass_name: String,
    pub resource_id: String,
    pub kind: DependencyKind,
}

pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    /// 填充每个 Pass 的输入 / 输出纹理，并返回依赖边
    ///
    /// 1. 每个 Pass 的输出为其帧缓冲（以最终注册表为准）的颜色附件与深度附件；
    ///    同一纹理的所有者取写入它的最后一个 Pass
    /// 2. draw 绑定的纹理若其所有者下标严格小于当前 Pass，则记为输入并生成一条边；
    ///    同一纹理被读几次就记几次
    pub fn analyze(
        passes: &mut [PassRecord],
        draws: &[DrawCallRecord],
        framebuffers: &IndexMap<FramebufferId, FramebufferDescriptor>,
    ) -> Vec<DependencyEdge> {
        // 纹理 -> 写入它的最后一个 Pass
        let mut owners: HashMap<String, (usize, String)> = HashMap::new();
        for pass in passes.iter_mut() {
            let Some(framebuffer) = framebuffers.get(&pass.framebuffer) else {
                continue;
            };
            for texture in framebuffer.output_textures() {
                owners.insert(texture.to_string(), (pass.index, pass.name.clone()));
                pass.output_textures.push(texture.to_string());
            }
        }

        let mut edges = Vec::new();
        for pass in passes.iter_mut() {
            for draw in pass.draws(draws) {
                for texture in &draw.bound_textures {
                    let Some((owner_index, owner_name)) = owners.get(texture) else {
                        continue;
                    };
                    if *owner_index < pass.index {
                        pass.input_textures.push(texture.clone());
                        edges.push(DependencyEdge {
                            source_pass_index: *owner_index,
                            source_pass_name: owner_name.clone(),
                            target_pass_index: pass.index,
                            target_pass_name: pass.name.clone(),
                            resource_id: texture.clone(),
                            kind: DependencyKind::ReadAfterWrite,
                        });
                    }
                }
            }
        }

        log::debug!("found {} read-after-write dependencies across {} passes", edges.len(), passes.len());
        edges
    }
}

#[cfg(test)]
mod tests {
    use crate::draw_call::DrawCallKind;
    use crate::framebuffer_tracker::RenderTarget;
    use crate::pass_segmenter::PassSegmenter;
    use crate::pipeline_state::PipelineState;

    use super::*;

    fn named(id: &str) -> FramebufferId {
        FramebufferId::Named(id.to_string())
    }

    fn target(slot: &str, texture: &str) -> RenderTarget {
        RenderTarget {
            attachment: slot.to_string(),
            texture_id: texture.to_string(),
            mip_level: 0,
            layer: None,
        }
    }

    fn draw(ordinal: usize, framebuffer: FramebufferId, textures: &[&str]) -> DrawCallRecord {
        DrawCallRecord {
            ordinal,
            event_id: ordinal as u32,
            name: "glDrawArrays".to_string(),
            kind: DrawCallKind::Draw,
            duration_ns: None,
            vertex_count: 3,
            index_count: 0,
            instance_count: 1,
            marker: None,
            state: PipelineState::default(),
            bound_textures: textures.iter().map(|t| t.to_string()).collect(),
            program: None,
            framebuffer,
        }
    }

    /// fbo_a: color=tex_a, depth=depth_a；fbo_b: color=tex_b
    fn registry() -> IndexMap<FramebufferId, FramebufferDescriptor> {
        let mut framebuffers = IndexMap::new();
        framebuffers.insert(FramebufferId::Default, FramebufferDescriptor::new(FramebufferId::Default));

        let mut a = FramebufferDescriptor::new(named("fbo_a"));
        a.color_attachments.push(target("GL_COLOR_ATTACHMENT0", "tex_a"));
        a.depth_attachment = Some(target("GL_DEPTH_ATTACHMENT", "depth_a"));
        a.depth_stencil_attachment = Some(target("GL_DEPTH_STENCIL_ATTACHMENT", "ds_a"));
        framebuffers.insert(named("fbo_a"), a);

        let mut b = FramebufferDescriptor::new(named("fbo_b"));
        b.color_attachments.push(target("GL_COLOR_ATTACHMENT0", "tex_b"));
        framebuffers.insert(named("fbo_b"), b);

        framebuffers
    }

    fn run(draws: &[DrawCallRecord]) -> (Vec<PassRecord>, Vec<DependencyEdge>) {
        let framebuffers = registry();
        let mut passes = PassSegmenter::new(&framebuffers, Some(200)).segment(draws);
        let edges = DependencyAnalyzer::analyze(&mut passes, draws, &framebuffers);
        (passes, edges)
    }

    #[test]
    fn test_read_after_write() {
        let draws = vec![
            draw(1, named("fbo_a"), &[]),
            draw(2, named("fbo_b"), &["tex_a", "depth_a"]),
            draw(3, named("fbo_b"), &["tex_a"]),
            draw(4, FramebufferId::Default, &["tex_b"]),
        ];

        let (passes, edges) = run(&draws);
        assert_eq!(passes.len(), 3);
        assert_eq!(passes[0].output_textures, vec!["tex_a", "depth_a"]);
        assert_eq!(passes[1].input_textures, vec!["tex_a", "depth_a", "tex_a"]);
        assert_eq!(passes[2].input_textures, vec!["tex_b"]);
        assert!(passes[2].output_textures.is_empty());

        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|e| e.source_pass_index < e.target_pass_index));
        assert_eq!(edges[3].source_pass_index, 1);
        assert_eq!(edges[3].target_pass_index, 2);
        assert_eq!(edges[3].resource_id, "tex_b");
    }

    #[test]
    fn test_no_same_pass_or_backward_edges() {
        let draws = vec![
            // 在写入 tex_a 的同一个 Pass 里采样 tex_a
            draw(1, named("fbo_a"), &["tex_a"]),
            // 采样一个之后才被写入的纹理
            draw(2, FramebufferId::Default, &["tex_b"]),
            draw(3, named("fbo_b"), &[]),
        ];

        let (_, edges) = run(&draws);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_owner_is_last_writer() {
        // tex_a 被 Pass 0 与 Pass 2 写入，Pass 1 读取：所有者为 Pass 2，不产生边
        let draws = vec![
            draw(1, named("fbo_a"), &[]),
            draw(2, named("fbo_b"), &["tex_a"]),
            draw(3, named("fbo_a"), &[]),
            draw(4, FramebufferId::Default, &["tex_a"]),
        ];

        let (passes, edges) = run(&draws);
        assert!(passes[1].input_textures.is_empty());
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_pass_index, 2);
        assert_eq!(edges[0].target_pass_index, 3);
    }

    #[test]
    fn test_depth_stencil_not_an_output() {
        let draws = vec![draw(1, named("fbo_a"), &[]), draw(2, named("fbo_b"), &["ds_a"])];

        let (passes, edges) = run(&draws);
        assert!(!passes[0].output_textures.contains(&"ds_a".to_string()));
        assert!(edges.is_empty());
    }
}
