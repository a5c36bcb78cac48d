//! 帧捕获回放与状态重建
//!
//! 对一帧捕获的 API 调用日志做单遍回放，为每个 draw / dispatch 重建执行时的完整管线状态，
//! 再把 draw 切分为逻辑 Pass，并计算 Pass 之间的资源依赖。
//!
//! # 核心概念
//!
//! - **StateTracker / SamplerTracker / FramebufferTracker**: 分别追踪管线状态、纹理绑定与采样参数、帧缓冲
//! - **DrawCallExtractor**: 单遍回放，draw 时拍下各 tracker 的快照
//! - **PassSegmenter**: 按帧缓冲、marker 与容量上限切分 Pass
//! - **DependencyAnalyzer**: 写后读依赖
//! - **ResourceInventory**: 纹理分配与着色器对象清单，附带显存估算
//! - **CaptureAnalysis**: 串起整条流水线，输出可序列化的分析结果
//!
//! # 使用示例
//!
//! ```ignore
//! use truvis_capture::event::EventLog;
//! use truvis_capture_replay::{CaptureAnalysis, ReplayConfig};
//!
//! let log = EventLog::from_json_file("assets/captures/deferred_frame.json")?;
//! let analysis = CaptureAnalysis::from_event_log(&log, &ReplayConfig::default());
//! analysis.print_analysis_plan();
//! ```

pub mod analysis;
pub mod config;
pub mod dependency;
pub mod draw_call;
pub mod extractor;
pub mod framebuffer_tracker;
pub mod pass_graph;
pub mod pass_segmenter;
pub mod pipeline_state;
pub mod resource_inventory;
pub mod sampler_tracker;
pub mod state_tracker;
pub mod stats;

pub use analysis::CaptureAnalysis;
pub use config::ReplayConfig;
