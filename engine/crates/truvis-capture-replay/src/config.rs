use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// 回放分析配置
///
/// 对应工作区根目录下的 `capture-replay.toml`，缺省字段取默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// 单个 Pass 最多容纳的 draw 数，超过后强制切分；0 表示不限制
    pub max_draws_per_pass: usize,

    /// 没有 Label 的 draw 是否继承最内层调试分组的名字作为 marker
    pub inherit_debug_group_markers: bool,

    /// 分析完成后是否打印 Pass 执行计划
    pub print_analysis_plan: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_draws_per_pass: 200,
            inherit_debug_group_markers: false,
            print_analysis_plan: true,
        }
    }
}

impl ReplayConfig {
    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("读取配置文件失败: {:?}", path))?;

        Self::from_toml_str(&content).with_context(|| format!("解析 TOML 配置失败: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 当前配置下的 Pass 容量上限
    #[inline]
    pub fn draw_cap(&self) -> Option<usize> {
        (self.max_draws_per_pass > 0).then_some(self.max_draws_per_pass)
    }
}
