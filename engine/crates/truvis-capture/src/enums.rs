//! 抽象管线状态枚举
//!
//! 只建模各图形 API 通用的状态类别，符号名去掉 `GL_` 前缀后匹配。

use std::fmt;

use serde::{Serialize, Serializer};

/// 为符号枚举生成 `from_symbol` / `as_str` / `Display` / `Serialize`
macro_rules! symbol_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $symbol:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            /// 按符号名精确匹配，前缀 `GL_` 可有可无
            pub fn from_symbol(symbol: &str) -> Option<Self> {
                match strip_api_prefix(symbol) {
                    $($symbol => Some(Self::$variant),)+
                    _ => None,
                }
            }

            #[inline]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $symbol,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

symbol_enum! {
    pub enum BlendFactor {
        Zero => "ZERO",
        One => "ONE",
        SrcColor => "SRC_COLOR",
        OneMinusSrcColor => "ONE_MINUS_SRC_COLOR",
        DstColor => "DST_COLOR",
        OneMinusDstColor => "ONE_MINUS_DST_COLOR",
        SrcAlpha => "SRC_ALPHA",
        OneMinusSrcAlpha => "ONE_MINUS_SRC_ALPHA",
        DstAlpha => "DST_ALPHA",
        OneMinusDstAlpha => "ONE_MINUS_DST_ALPHA",
        ConstantColor => "CONSTANT_COLOR",
        OneMinusConstantColor => "ONE_MINUS_CONSTANT_COLOR",
        ConstantAlpha => "CONSTANT_ALPHA",
        OneMinusConstantAlpha => "ONE_MINUS_CONSTANT_ALPHA",
        SrcAlphaSaturate => "SRC_ALPHA_SATURATE",
    }
}

symbol_enum! {
    /// 深度与模板共用的比较函数
    pub enum CompareFunc {
        Never => "NEVER",
        Less => "LESS",
        Equal => "EQUAL",
        LessEqual => "LEQUAL",
        Greater => "GREATER",
        NotEqual => "NOTEQUAL",
        GreaterEqual => "GEQUAL",
        Always => "ALWAYS",
    }
}

symbol_enum! {
    pub enum StencilOp {
        Keep => "KEEP",
        Zero => "ZERO",
        Replace => "REPLACE",
        Incr => "INCR",
        IncrWrap => "INCR_WRAP",
        Decr => "DECR",
        DecrWrap => "DECR_WRAP",
        Invert => "INVERT",
    }
}

symbol_enum! {
    pub enum CullMode {
        Front => "FRONT",
        Back => "BACK",
        FrontAndBack => "FRONT_AND_BACK",
    }
}

symbol_enum! {
    pub enum FilterMode {
        Nearest => "NEAREST",
        Linear => "LINEAR",
        NearestMipmapNearest => "NEAREST_MIPMAP_NEAREST",
        LinearMipmapNearest => "LINEAR_MIPMAP_NEAREST",
        NearestMipmapLinear => "NEAREST_MIPMAP_LINEAR",
        LinearMipmapLinear => "LINEAR_MIPMAP_LINEAR",
    }
}

symbol_enum! {
    pub enum WrapMode {
        Repeat => "REPEAT",
        ClampToEdge => "CLAMP_TO_EDGE",
        ClampToBorder => "CLAMP_TO_BORDER",
        MirroredRepeat => "MIRRORED_REPEAT",
        MirrorClampToEdge => "MIRROR_CLAMP_TO_EDGE",
    }
}

symbol_enum! {
    /// 深度纹理的比较模式
    pub enum CompareMode {
        None => "NONE",
        CompareRefToTexture => "COMPARE_REF_TO_TEXTURE",
    }
}

symbol_enum! {
    pub enum BlendEquation {
        Add => "FUNC_ADD",
        Subtract => "FUNC_SUBTRACT",
        ReverseSubtract => "FUNC_REVERSE_SUBTRACT",
        Min => "MIN",
        Max => "MAX",
    }
}

impl BlendEquation {
    /// 宽松解析：按子串识别，`GL_FUNC_ADD_EXT` 之类的扩展名也能匹配
    pub fn parse_lenient(symbol: &str) -> Option<Self> {
        if symbol.contains("ADD") {
            Some(Self::Add)
        } else if symbol.contains("SUBTRACT") {
            if symbol.contains("REVERSE") { Some(Self::ReverseSubtract) } else { Some(Self::Subtract) }
        } else if symbol.contains("MIN") {
            Some(Self::Min)
        } else if symbol.contains("MAX") {
            Some(Self::Max)
        } else {
            None
        }
    }
}

symbol_enum! {
    pub enum FrontFace {
        Cw => "CW",
        Ccw => "CCW",
    }
}

impl FrontFace {
    /// 只认 `CW` / `CCW`，其它符号返回 `None`
    pub fn parse_lenient(symbol: &str) -> Option<Self> {
        if symbol.contains("CCW") {
            Some(Self::Ccw)
        } else if symbol.contains("CW") {
            Some(Self::Cw)
        } else {
            None
        }
    }
}

symbol_enum! {
    pub enum PolygonMode {
        Fill => "FILL",
        Line => "LINE",
        Point => "POINT",
    }
}

impl Default for PolygonMode {
    fn default() -> Self {
        Self::Fill
    }
}

impl PolygonMode {
    pub fn parse_lenient(symbol: &str) -> Option<Self> {
        if symbol.contains("LINE") {
            Some(Self::Line)
        } else if symbol.contains("POINT") {
            Some(Self::Point)
        } else if symbol.contains("FILL") {
            Some(Self::Fill)
        } else {
            None
        }
    }
}

symbol_enum! {
    /// `glEnable` / `glDisable` 能切换的管线能力
    pub enum Capability {
        Blend => "BLEND",
        DepthTest => "DEPTH_TEST",
        StencilTest => "STENCIL_TEST",
        CullFace => "CULL_FACE",
        ScissorTest => "SCISSOR_TEST",
    }
}

impl Capability {
    /// 按子串识别，`GL_BLEND` 与带索引的变体都能匹配
    pub fn parse_lenient(symbol: &str) -> Option<Self> {
        if symbol.contains("BLEND") {
            Some(Self::Blend)
        } else if symbol.contains("DEPTH_TEST") {
            Some(Self::DepthTest)
        } else if symbol.contains("STENCIL_TEST") {
            Some(Self::StencilTest)
        } else if symbol.contains("CULL_FACE") {
            Some(Self::CullFace)
        } else if symbol.contains("SCISSOR_TEST") {
            Some(Self::ScissorTest)
        } else {
            None
        }
    }
}

symbol_enum! {
    pub enum ShaderStage {
        Vertex => "VERTEX",
        TessControl => "TESS_CONTROL",
        TessEvaluation => "TESS_EVALUATION",
        Geometry => "GEOMETRY",
        Fragment => "FRAGMENT",
        Compute => "COMPUTE",
    }
}

impl ShaderStage {
    /// `GL_FRAGMENT_SHADER`、`GL_VERTEX_SHADER_ARB` 之类都按子串识别
    pub fn parse_lenient(symbol: &str) -> Option<Self> {
        let symbol = symbol.to_ascii_uppercase();
        if symbol.contains("TESS_CONTROL") {
            Some(Self::TessControl)
        } else if symbol.contains("TESS_EVALUATION") {
            Some(Self::TessEvaluation)
        } else if symbol.contains("VERTEX") {
            Some(Self::Vertex)
        } else if symbol.contains("GEOMETRY") {
            Some(Self::Geometry)
        } else if symbol.contains("FRAGMENT") {
            Some(Self::Fragment)
        } else if symbol.contains("COMPUTE") {
            Some(Self::Compute)
        } else {
            None
        }
    }
}

/// 去掉 API 前缀，`GL_SRC_ALPHA` -> `SRC_ALPHA`
pub fn strip_api_prefix(symbol: &str) -> &str {
    let symbol = symbol.trim();
    symbol.strip_prefix("GL_").unwrap_or(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_symbol() {
        assert_eq!(BlendFactor::from_symbol("GL_ONE_MINUS_SRC_ALPHA"), Some(BlendFactor::OneMinusSrcAlpha));
        assert_eq!(BlendFactor::from_symbol("SRC_ALPHA"), Some(BlendFactor::SrcAlpha));
        assert_eq!(CompareFunc::from_symbol("GL_LEQUAL"), Some(CompareFunc::LessEqual));
        assert_eq!(StencilOp::from_symbol("GL_INCR_WRAP"), Some(StencilOp::IncrWrap));
        assert_eq!(WrapMode::from_symbol("GL_CLAMP_TO_EDGE"), Some(WrapMode::ClampToEdge));
        assert_eq!(BlendFactor::from_symbol("GL_BOGUS"), None);
    }

    #[test]
    fn test_lenient_parsing() {
        assert_eq!(BlendEquation::parse_lenient("GL_FUNC_REVERSE_SUBTRACT"), Some(BlendEquation::ReverseSubtract));
        assert_eq!(BlendEquation::parse_lenient("GL_FUNC_SUBTRACT"), Some(BlendEquation::Subtract));
        assert_eq!(BlendEquation::parse_lenient("GL_MAX"), Some(BlendEquation::Max));
        assert_eq!(BlendEquation::parse_lenient("GL_NOPE"), None);

        assert_eq!(FrontFace::parse_lenient("GL_CW"), Some(FrontFace::Cw));
        assert_eq!(FrontFace::parse_lenient("GL_CCW"), Some(FrontFace::Ccw));
        assert_eq!(FrontFace::parse_lenient("GL_BOGUS"), None);
        assert_eq!(PolygonMode::parse_lenient("GL_LINE"), Some(PolygonMode::Line));
        assert_eq!(PolygonMode::parse_lenient("GL_FILL"), Some(PolygonMode::Fill));
        assert_eq!(PolygonMode::parse_lenient("GL_FRONT_AND_BACK"), None);
        assert_eq!(Capability::parse_lenient("GL_SCISSOR_TEST"), Some(Capability::ScissorTest));
        assert_eq!(Capability::parse_lenient("GL_DITHER"), None);
        assert_eq!(ShaderStage::parse_lenient("GL_FRAGMENT_SHADER"), Some(ShaderStage::Fragment));
        assert_eq!(ShaderStage::parse_lenient("GL_TESS_EVALUATION_SHADER"), Some(ShaderStage::TessEvaluation));
        assert_eq!(ShaderStage::parse_lenient("GL_NONE"), None);
    }

    #[test]
    fn test_serialize_as_symbol() {
        assert_eq!(serde_json::to_string(&CompareFunc::NotEqual).unwrap(), "\"NOTEQUAL\"");
        assert_eq!(BlendFactor::One.to_string(), "ONE");
    }
}
