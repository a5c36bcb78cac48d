//! 一次完整的捕获分析
//!
//! 事件日志 -> `DrawCallExtractor` -> `PassSegmenter` -> `DependencyAnalyzer`，
//! 每次分析都创建新的 tracker，结果是只读的值。

use anyhow::Context;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use truvis_capture::event::{CaptureHeader, Event, EventLog};

use crate::config::ReplayConfig;
use crate::dependency::{DependencyAnalyzer, DependencyEdge};
use crate::draw_call::DrawCallRecord;
use crate::extractor::DrawCallExtractor;
use crate::framebuffer_tracker::{FramebufferDescriptor, FramebufferId};
use crate::pass_graph::PassGraph;
use crate::pass_segmenter::{PassRecord, PassSegmenter};
use crate::resource_inventory::{ShaderInfo, TextureInfo};
use crate::sampler_tracker::SamplerDescriptor;
use crate::stats::{CaptureSummary, StateUsage, SwitchStats};

#[derive(Clone, Debug, Serialize)]
pub struct CaptureAnalysis {
    pub header: CaptureHeader,
    pub draws: Vec<DrawCallRecord>,
    pub passes: Vec<PassRecord>,
    pub framebuffers: IndexMap<FramebufferId, FramebufferDescriptor>,
    pub samplers: Vec<SamplerDescriptor>,
    pub textures: Vec<TextureInfo>,
    pub shaders: Vec<ShaderInfo>,
    pub dependencies: Vec<DependencyEdge>,
}

// new & init
impl CaptureAnalysis {
    /// 分析一段事件序列
    pub fn analyze(events: &[Event], config: &ReplayConfig) -> Self {
        let extraction = DrawCallExtractor::new(config).extract(events);

        let mut passes = PassSegmenter::new(&extraction.framebuffers, config.draw_cap()).segment(&extraction.draws);
        let dependencies = DependencyAnalyzer::analyze(&mut passes, &extraction.draws, &extraction.framebuffers);

        Self {
            header: CaptureHeader::default(),
            draws: extraction.draws,
            passes,
            framebuffers: extraction.framebuffers,
            samplers: extraction.samplers,
            textures: extraction.textures,
            shaders: extraction.shaders,
            dependencies,
        }
    }

    pub fn from_event_log(log: &EventLog, config: &ReplayConfig) -> Self {
        let mut analysis = Self::analyze(log.events(), config);
        analysis.header = log.header.clone();
        analysis
    }
}

// getter
impl CaptureAnalysis {
    /// 某个 Pass 的成员 draw
    pub fn pass_draws(&self, pass: &PassRecord) -> &[DrawCallRecord] {
        pass.draws(&self.draws)
    }

    pub fn pass_graph(&self) -> PassGraph {
        PassGraph::build(self.passes.len(), &self.dependencies)
    }

    pub fn summary(&self) -> CaptureSummary {
        CaptureSummary {
            total_draws: self.draws.iter().filter(|draw| !draw.is_dispatch()).count(),
            total_dispatches: self.draws.iter().filter(|draw| draw.is_dispatch()).count(),
            total_passes: self.passes.len(),
            total_triangles: self.draws.iter().map(DrawCallRecord::triangle_count).sum(),
            total_duration_ms: self.passes.iter().map(PassRecord::duration_ms).sum(),
            total_dependencies: self.dependencies.len(),
            total_framebuffers: self.framebuffers.len(),
            total_textures: self.textures.len(),
            total_shaders: self.shaders.len(),
            total_texture_memory_bytes: self.textures.iter().map(|texture| texture.estimated_bytes).sum(),
            switches: SwitchStats::from_draws(&self.draws),
            state_usage: StateUsage::from_draws(&self.draws),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("序列化分析结果失败")
    }
}

// tools
impl CaptureAnalysis {
    /// 打印 Pass 执行计划（用于调试）
    pub fn print_analysis_plan(&self) {
        if !log::log_enabled!(log::Level::Info) {
            return;
        }

        let summary = self.summary();
        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              Capture Replay Analysis                             ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Driver: {}  |  GPU: {}  |  Resolution: {}",
            self.header.driver.as_deref().unwrap_or("-"),
            self.header.gpu_name.as_deref().unwrap_or("-"),
            self.header.resolution.as_deref().unwrap_or("-")
        );
        log::info!(
            "║ Draws: {}  |  Dispatches: {}  |  Passes: {}  |  Triangles: {}  |  GPU: {:.3} ms",
            summary.total_draws,
            summary.total_dispatches,
            summary.total_passes,
            summary.total_triangles,
            summary.total_duration_ms
        );
        log::info!(
            "║ Switches: marker {}, framebuffer {}, program {}, texture {}",
            summary.switches.marker_switches,
            summary.switches.framebuffer_switches,
            summary.switches.program_switches,
            summary.switches.texture_binding_changes
        );
        log::info!(
            "║ Textures: {} (~{:.2} MB)  |  Shaders: {}",
            summary.total_textures,
            summary.total_texture_memory_bytes as f64 / (1024.0 * 1024.0),
            summary.total_shaders
        );
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        for pass in &self.passes {
            log::info!("");
            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!("│ [{}/{}] Pass: \"{}\"", pass.index + 1, self.passes.len(), pass.name);
            log::info!("├─────────────────────────────────────────────────────────────────┤");
            log::info!(
                "│ Framebuffer: {}  |  Draws: {} ({}..{})  |  Triangles: {}  |  GPU: {:.3} ms",
                pass.framebuffer,
                pass.draw_count(),
                pass.draw_range.start,
                pass.draw_range.end,
                pass.triangle_count(&self.draws),
                pass.duration_ms()
            );

            if !pass.input_textures.is_empty() {
                log::info!("│ Reads:");
                for (texture, count) in pass.input_textures.iter().counts().into_iter().sorted() {
                    log::info!("│   📖 \"{}\" x{}", texture, count);
                }
            }

            if !pass.output_textures.is_empty() {
                log::info!("│ Writes:");
                for texture in &pass.output_textures {
                    log::info!("│   ✏️  \"{}\"", texture);
                }
            }

            let producers = self
                .dependencies
                .iter()
                .filter(|edge| edge.target_pass_index == pass.index)
                .map(|edge| edge.source_pass_name.as_str())
                .unique()
                .join(", ");
            if !producers.is_empty() {
                log::info!("│ Depends on: {}", producers);
            }

            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }
    }
}
