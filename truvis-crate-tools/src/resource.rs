use std::path::{Path, PathBuf};

/// 统一路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
/// 避免使用硬编码相对路径，确保在不同构建环境下路径一致。
///
/// # 使用示例
/// ```ignore
/// let capture = TruvisPath::captures_path("deferred_frame.json"); // assets/captures/deferred_frame.json
/// let config = TruvisPath::config_path();                       // capture-replay.toml
/// ```
pub struct TruvisPath {}
// 核心路径
impl TruvisPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // 从当前包的位置推导 workspace 目录
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir.parent().unwrap_or(manifest_dir).to_path_buf()
    }

    pub fn target_path() -> PathBuf {
        Self::workspace_path().join("target")
    }
}
// 根目录下
impl TruvisPath {
    /// 获取 `assets/` 目录下的文件路径
    pub fn assets_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("assets").join(filename)
    }

    /// 获取 `assets/captures/` 目录下的事件日志路径
    pub fn captures_path(filename: &str) -> PathBuf {
        Self::assets_path("captures").join(filename)
    }

    /// 回放分析的默认配置文件
    pub fn config_path() -> PathBuf {
        Self::workspace_path().join("capture-replay.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_workspace() {
        let root = TruvisPath::workspace_path();
        assert!(root.join("truvis-crate-tools").is_dir());
        assert!(TruvisPath::captures_path("a.json").starts_with(root.join("assets")));
        assert_eq!(TruvisPath::config_path().file_name().and_then(|s| s.to_str()), Some("capture-replay.toml"));
    }
}
