//! 纹理与着色器清单
//!
//! 与状态回放共用同一遍事件：纹理来自 `glTexImage*` / `glTexStorage*`，
//! 着色器来自 `glCreateShader*` 与 `glShaderSource`。

use indexmap::IndexMap;
use serde::Serialize;
use truvis_capture::call::{ApiCall, TextureStorage};
use truvis_capture::enums::ShaderStage;

/// 常见格式的每像素字节数，按子串匹配，靠前的优先
///
/// 压缩格式排在前面，避免 `COMPRESSED_RGBA8_ETC2_EAC` 被当成 `RGBA8`。
const BYTES_PER_PIXEL: &[(&str, f64)] = &[
    ("ASTC_4X4", 1.0),
    ("ASTC_6X6", 0.89),
    ("ASTC_8X8", 0.5),
    ("RGBA8_ETC2", 1.0),
    ("RGB8_ETC2", 0.5),
    ("ETC2_RGBA", 1.0),
    ("ETC2_RGB", 0.5),
    ("RGBA32F", 16.0),
    ("RGBA16F", 8.0),
    ("RG16F", 4.0),
    ("R16F", 2.0),
    ("DEPTH24_STENCIL8", 4.0),
    ("DEPTH32F", 4.0),
    ("DEPTH_COMPONENT32F", 4.0),
    ("DEPTH_COMPONENT24", 4.0),
    ("DEPTH_COMPONENT16", 2.0),
    ("DEPTH16", 2.0),
    ("RGBA8", 4.0),
    ("RGB8", 3.0),
    ("RG8", 2.0),
    ("R8", 1.0),
];

/// 未识别格式按 RGBA8 估算
const DEFAULT_BYTES_PER_PIXEL: f64 = 4.0;

/// 完整 mip 链约为基础层的 4/3
const MIP_CHAIN_FACTOR: f64 = 1.33;

/// 纹理存储描述
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextureInfo {
    pub id: String,
    /// 纹理宽度
    pub width: u32,
    /// 纹理高度
    pub height: u32,
    /// 3D 纹理深度或数组层数
    pub depth: u32,
    /// 内部格式符号，例如 `GL_RGBA8`
    pub format: Option<String>,
    /// Mip 级别数
    pub mip_levels: u32,
    /// 采样数
    pub samples: u32,
    /// 由 `estimate_memory` 得到，随每次更新刷新
    pub estimated_bytes: u64,
}

// new & init
impl TextureInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: 0,
            height: 0,
            depth: 1,
            format: None,
            mip_levels: 1,
            samples: 1,
            estimated_bytes: 0,
        }
    }
}

// getter
impl TextureInfo {
    pub fn is_compressed(&self) -> bool {
        self.format.as_deref().is_some_and(|format| {
            let format = format.to_ascii_uppercase();
            ["COMPRESSED", "ASTC", "ETC"].iter().any(|tag| format.contains(tag))
        })
    }

    /// 估算显存占用（字节）
    pub fn estimate_memory(&self) -> u64 {
        let format = self.format.as_deref().unwrap_or_default().to_ascii_uppercase();
        let bytes_per_pixel = BYTES_PER_PIXEL
            .iter()
            .find(|(name, _)| format.contains(name))
            .map_or(DEFAULT_BYTES_PER_PIXEL, |&(_, bpp)| bpp);

        let mut bytes = self.width as f64 * self.height as f64 * self.depth as f64 * bytes_per_pixel;
        if self.mip_levels > 1 {
            bytes *= MIP_CHAIN_FACTOR;
        }
        bytes *= self.samples as f64;
        bytes as u64
    }

    #[inline]
    pub fn memory_mb(&self) -> f64 {
        self.estimated_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// 着色器对象
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShaderInfo {
    pub id: String,
    /// 调用上的 Label，没有时为 `Shader_<id>`
    pub name: String,
    pub stage: Option<ShaderStage>,
    /// 源码字节数，没有见到 `glShaderSource` 时为 0
    pub source_length: usize,
}

impl ShaderInfo {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: format!("Shader_{id}"),
            stage: None,
            source_length: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResourceInventory {
    /// 按首次出现的顺序
    textures: IndexMap<String, TextureInfo>,
    shaders: IndexMap<String, ShaderInfo>,
}

// new & init
impl ResourceInventory {
    pub fn new() -> Self {
        Self::default()
    }
}

// update
impl ResourceInventory {
    /// `bound_texture` 为当前激活纹理单元上绑定的纹理，非 DSA 的分配调用作用于它
    pub fn apply(&mut self, call: &ApiCall, bound_texture: Option<&str>) {
        match call {
            ApiCall::TextureStorage(storage) => self.allocate_texture(storage, bound_texture),
            ApiCall::CreateShader {
                shader,
                stage,
                label,
                source_length,
            } => {
                let info = self.shader_mut(shader);
                if stage.is_some() {
                    info.stage = *stage;
                }
                if let Some(label) = label {
                    info.name = label.to_string();
                }
                if let Some(source_length) = source_length {
                    info.source_length = *source_length;
                }
            }
            ApiCall::ShaderSource { shader, source_length } => {
                self.shader_mut(shader).source_length = *source_length;
            }
            _ => {}
        }
    }

    fn allocate_texture(&mut self, storage: &TextureStorage, bound_texture: Option<&str>) {
        let id = match storage.texture.or(bound_texture) {
            Some(id) => id.to_string(),
            None => format!("tex_{}", self.textures.len()),
        };
        let to_u32 = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
        let level = storage.level.map_or(0, to_u32);

        let texture = self.textures.entry(id).or_insert_with_key(|id| TextureInfo::new(id.as_str()));
        texture.mip_levels = texture.mip_levels.max(level.saturating_add(1));

        if level == 0 {
            if let Some(width) = storage.width {
                texture.width = to_u32(width);
            }
            if let Some(height) = storage.height {
                texture.height = to_u32(height);
            }
            if let Some(depth) = storage.depth {
                texture.depth = to_u32(depth).max(1);
            }
            if let Some(format) = storage.format {
                texture.format = Some(format.to_string());
            }
            if let Some(levels) = storage.levels {
                texture.mip_levels = to_u32(levels).max(1);
            }
            if let Some(samples) = storage.samples {
                texture.samples = to_u32(samples).max(1);
            }
        } else if texture.width == 0 && texture.height == 0 {
            // 只见到了更小的 mip 级别，按级别反推基础层尺寸
            let scale = |v: Option<i64>| v.map_or(0, to_u32).checked_shl(level).unwrap_or(u32::MAX);
            texture.width = scale(storage.width);
            texture.height = scale(storage.height);
            if let Some(format) = storage.format {
                texture.format = Some(format.to_string());
            }
        }

        texture.estimated_bytes = texture.estimate_memory();
    }

    fn shader_mut(&mut self, id: &str) -> &mut ShaderInfo {
        self.shaders.entry(id.to_string()).or_insert_with(|| ShaderInfo::new(id))
    }
}

// getter
impl ResourceInventory {
    #[inline]
    pub fn texture(&self, id: &str) -> Option<&TextureInfo> {
        self.textures.get(id)
    }

    #[inline]
    pub fn shader(&self, id: &str) -> Option<&ShaderInfo> {
        self.shaders.get(id)
    }

    pub fn into_parts(self) -> (Vec<TextureInfo>, Vec<ShaderInfo>) {
        (self.textures.into_values().collect(), self.shaders.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use truvis_capture::call::classify;
    use truvis_capture::event::{AttrValue, Event};

    use super::*;

    fn feed(inventory: &mut ResourceInventory, events: &[Event], bound: Option<&str>) {
        for event in events {
            inventory.apply(&classify(event), bound);
        }
    }

    #[test]
    fn test_texture_storage_on_bound_texture() {
        let mut inventory = ResourceInventory::new();
        feed(
            &mut inventory,
            &[Event::new(1, "glTexStorage2D")
                .with_int("levels", 10)
                .with_enum("internalformat", "GL_RGBA8")
                .with_int("width", 1024)
                .with_int("height", 512)],
            Some("ResourceId::40"),
        );

        let texture = inventory.texture("ResourceId::40").unwrap();
        assert_eq!((texture.width, texture.height, texture.depth), (1024, 512, 1));
        assert_eq!(texture.mip_levels, 10);
        assert!(!texture.is_compressed());
        // 1024 * 512 * 4 * 1.33
        assert_eq!(texture.estimated_bytes, 2_789_212);
        assert!(texture.memory_mb() > 2.6 && texture.memory_mb() < 2.7);
    }

    #[test]
    fn test_tex_image_levels() {
        let mut inventory = ResourceInventory::new();
        feed(
            &mut inventory,
            &[
                Event::new(1, "glTexImage2D")
                    .with_int("level", 0)
                    .with_enum("internalformat", "GL_RGBA16F")
                    .with_int("width", 256)
                    .with_int("height", 256),
                Event::new(2, "glTexImage2D").with_int("level", 1).with_int("width", 128).with_int("height", 128),
                Event::new(3, "glTexImage2D").with_int("level", 2).with_int("width", 64).with_int("height", 64),
            ],
            Some("ResourceId::41"),
        );

        let texture = inventory.texture("ResourceId::41").unwrap();
        assert_eq!(texture.width, 256);
        assert_eq!(texture.mip_levels, 3);
        assert_eq!(texture.format.as_deref(), Some("GL_RGBA16F"));
        assert_eq!(texture.estimated_bytes, (256.0 * 256.0 * 8.0 * 1.33) as u64);
    }

    #[test]
    fn test_dsa_and_unbound_allocation() {
        let mut inventory = ResourceInventory::new();
        feed(
            &mut inventory,
            &[
                Event::new(1, "glTextureStorage2D")
                    .with_resource("texture", "ResourceId::50")
                    .with_int("levels", 1)
                    .with_enum("internalformat", "GL_COMPRESSED_RGBA_ASTC_8x8_KHR")
                    .with_int("width", 64)
                    .with_int("height", 64),
                Event::new(2, "glTexImage2D").with_int("width", 4).with_int("height", 4),
            ],
            None,
        );

        let astc = inventory.texture("ResourceId::50").unwrap();
        assert!(astc.is_compressed());
        assert_eq!(astc.estimated_bytes, 2048);

        // 没有绑定纹理时按出现顺序编号，未知格式按 4 字节估算
        let fallback = inventory.texture("tex_1").unwrap();
        assert_eq!(fallback.estimated_bytes, 64);
    }

    #[test]
    fn test_missing_dimension_keeps_prior_value() {
        let mut inventory = ResourceInventory::new();
        feed(
            &mut inventory,
            &[
                Event::new(1, "glTexImage2D").with_int("width", 32).with_int("height", 16),
                Event::new(2, "glTexImage2D").with_int("width", 64),
            ],
            Some("ResourceId::9"),
        );

        let texture = inventory.texture("ResourceId::9").unwrap();
        assert_eq!((texture.width, texture.height), (64, 16));
    }

    #[test]
    fn test_shaders() {
        let mut inventory = ResourceInventory::new();
        feed(
            &mut inventory,
            &[
                Event::new(1, "glCreateShader")
                    .with_enum("type", "GL_FRAGMENT_SHADER")
                    .with_resource("Shader", "ResourceId::70")
                    .with_string("Label", "lighting.frag"),
                Event::new(2, "glShaderSource").with_resource("shader", "ResourceId::70").with_attr(
                    "string",
                    AttrValue::Array(vec![
                        AttrValue::String("#version 310 es\n".to_string()),
                        AttrValue::String("void main() {}".to_string()),
                    ]),
                ),
                Event::new(3, "glCreateShader")
                    .with_enum("type", "GL_VERTEX_SHADER")
                    .with_resource("Shader", "ResourceId::71"),
                Event::new(4, "glCreateShader").with_enum("type", "GL_VERTEX_SHADER"),
            ],
            None,
        );

        let fragment = inventory.shader("ResourceId::70").unwrap();
        assert_eq!(fragment.name, "lighting.frag");
        assert_eq!(fragment.stage, Some(ShaderStage::Fragment));
        assert_eq!(fragment.source_length, 30);

        let vertex = inventory.shader("ResourceId::71").unwrap();
        assert_eq!(vertex.name, "Shader_ResourceId::71");
        assert_eq!(vertex.source_length, 0);

        let (textures, shaders) = inventory.into_parts();
        assert!(textures.is_empty());
        assert_eq!(shaders.len(), 2);
    }
}
