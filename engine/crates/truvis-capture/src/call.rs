//! API 调用分类
//!
//! 每个事件只按名字分类一次，得到封闭的 `ApiCall` 联合体；
//! 各个 tracker 对它做穷尽匹配，而不是各自再去比较字符串。
//!
//! 分类阶段只负责把属性读出来，读不出的字段保持为 `None`，
//! 由 tracker 决定是保留旧值还是跳过。

use crate::enums::{
    BlendEquation, BlendFactor, Capability, CompareFunc, CompareMode, CullMode, FilterMode, FrontFace, PolygonMode,
    ShaderStage, StencilOp, WrapMode,
};
use crate::event::{AttrValue, Event, is_null_resource};

/// `GL_TEXTURE0` 的数值
const GL_TEXTURE0: i64 = 0x84C0;
const GL_COLOR_BUFFER_BIT: i64 = 0x4000;
const GL_DEPTH_BUFFER_BIT: i64 = 0x0100;
const GL_STENCIL_BUFFER_BIT: i64 = 0x0400;

/// 识别为绘制 / 分发命令的调用名前缀
const DRAW_PREFIXES: &[&str] = &[
    "glDrawArrays",
    "glDrawElements",
    "glDrawRangeElements",
    "glMultiDrawArrays",
    "glMultiDrawElements",
    "glDispatchCompute",
    "vkCmdDraw",
    "vkCmdDispatch",
];

/// 资源绑定目标：可能为空（解绑）
///
/// 属性缺失与显式的空 ID 不同：前者在分类时是 `None`，tracker 保留旧状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding<'a> {
    Bind(&'a str),
    Unbind,
}

impl<'a> Binding<'a> {
    fn from_resource(id: Option<&'a str>) -> Option<Self> {
        let id = id?;
        Some(if is_null_resource(id) { Self::Unbind } else { Self::Bind(id) })
    }

    #[inline]
    pub fn id(&self) -> Option<&'a str> {
        match self {
            Self::Bind(id) => Some(id),
            Self::Unbind => None,
        }
    }
}

/// 采样参数更新的作用对象
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplerTarget<'a> {
    /// 调用直接给出了 sampler / texture 对象
    Explicit(&'a str),
    /// 作用于当前激活纹理单元上绑定的纹理
    ActiveUnit,
}

/// 单个采样参数
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SamplerParameter {
    MinFilter(FilterMode),
    MagFilter(FilterMode),
    WrapS(WrapMode),
    WrapT(WrapMode),
    WrapR(WrapMode),
    MaxAnisotropy(f32),
    MinLod(f32),
    MaxLod(f32),
    LodBias(f32),
    CompareMode(CompareMode),
    CompareFunc(CompareFunc),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    /// 非索引绘制，计数为顶点数
    Arrays,
    /// 索引绘制，计数为索引数
    Indexed,
    Dispatch,
}

/// 从绘制事件中读出的参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall<'a> {
    pub kind: DrawKind,
    /// 缺失时为 0，负数原样保留
    pub count: i64,
    /// 实例化变体上读出的实例数，非实例化调用为 `None`
    pub instance_count: Option<i64>,
    pub marker: Option<&'a str>,
}

/// 纹理存储分配（`glTexImage*` / `glTexStorage*` 及其 DSA 变体）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureStorage<'a> {
    /// DSA 变体直接给出的纹理，其余调用作用于当前纹理单元上绑定的纹理
    pub texture: Option<&'a str>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub depth: Option<i64>,
    pub format: Option<&'a str>,
    /// `glTexImage*` 上传的 mip 级别
    pub level: Option<i64>,
    /// `glTexStorage*` 一次分配的 mip 级别数
    pub levels: Option<i64>,
    pub samples: Option<i64>,
}

/// 清屏掩码
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
    pub stencil: bool,
}

/// 一次已识别的 API 调用
///
/// 状态字段全部为 `Option`：`None` 表示事件里没有这个属性或属性无法解析。
#[derive(Clone, Debug, PartialEq)]
pub enum ApiCall<'a> {
    // 管线状态
    SetCapability {
        capability: Capability,
        enabled: bool,
    },
    BlendFunc {
        src_rgb: Option<BlendFactor>,
        dst_rgb: Option<BlendFactor>,
        src_alpha: Option<BlendFactor>,
        dst_alpha: Option<BlendFactor>,
    },
    BlendEquation {
        rgb: Option<BlendEquation>,
        alpha: Option<BlendEquation>,
    },
    DepthFunc(Option<CompareFunc>),
    DepthMask(Option<bool>),
    StencilFunc {
        func: Option<CompareFunc>,
        reference: Option<i64>,
        mask: Option<i64>,
    },
    StencilOp {
        fail: Option<StencilOp>,
        depth_fail: Option<StencilOp>,
        pass: Option<StencilOp>,
    },
    CullFace(Option<CullMode>),
    FrontFace(Option<FrontFace>),
    Scissor {
        x: Option<i64>,
        y: Option<i64>,
        width: Option<i64>,
        height: Option<i64>,
    },
    ColorMask {
        red: Option<bool>,
        green: Option<bool>,
        blue: Option<bool>,
        alpha: Option<bool>,
    },
    PolygonMode(Option<PolygonMode>),

    // 纹理与采样
    ActiveTexture(Option<u32>),
    BindTexture(Option<Binding<'a>>),
    BindTextureUnit {
        unit: Option<u32>,
        texture: Option<Binding<'a>>,
    },
    SamplerParameter {
        target: Option<SamplerTarget<'a>>,
        update: Option<SamplerParameter>,
    },

    // 帧缓冲
    /// 没有 framebuffer 属性时视为绑定默认帧缓冲
    BindFramebuffer(Binding<'a>),
    AttachTexture {
        attachment: Option<&'a str>,
        texture: Option<Binding<'a>>,
        level: Option<i64>,
        layer: Option<i64>,
    },
    AttachRenderbuffer {
        attachment: Option<&'a str>,
        renderbuffer: Option<Binding<'a>>,
    },
    Clear(Option<ClearMask>),
    ClearColor(Option<[f32; 4]>),
    ClearDepth(Option<f64>),
    ClearStencil(Option<i64>),
    DrawBuffers(Vec<&'a str>),
    FramebufferLabel {
        framebuffer: &'a str,
        label: &'a str,
    },

    // 资源清单
    TextureStorage(TextureStorage<'a>),
    CreateShader {
        shader: &'a str,
        stage: Option<ShaderStage>,
        label: Option<&'a str>,
        /// `glCreateShaderProgram*` 会同时带上源码
        source_length: Option<usize>,
    },
    ShaderSource {
        shader: &'a str,
        source_length: usize,
    },

    // 程序、调试分组与绘制
    UseProgram(Option<Binding<'a>>),
    PushDebugGroup(Option<&'a str>),
    PopDebugGroup,
    Draw(DrawCall<'a>),

    Unrecognized,
}

/// 把事件分类为 `ApiCall`
pub fn classify(event: &Event) -> ApiCall<'_> {
    let name = event.name.as_str();

    if DRAW_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
        return ApiCall::Draw(classify_draw(event));
    }

    match name {
        "glEnable" | "glDisable" => match event.enum_value("cap").and_then(Capability::parse_lenient) {
            Some(capability) => ApiCall::SetCapability {
                capability,
                enabled: name == "glEnable",
            },
            None => ApiCall::Unrecognized,
        },

        "glBlendFunc" => {
            let src = factor(event, "sfactor");
            let dst = factor(event, "dfactor");
            ApiCall::BlendFunc {
                src_rgb: src,
                dst_rgb: dst,
                src_alpha: src,
                dst_alpha: dst,
            }
        }
        "glBlendFuncSeparate" => ApiCall::BlendFunc {
            src_rgb: factor(event, "srcRGB"),
            dst_rgb: factor(event, "dstRGB"),
            src_alpha: factor(event, "srcAlpha"),
            dst_alpha: factor(event, "dstAlpha"),
        },
        "glBlendEquation" => {
            let mode = event.enum_value("mode").and_then(BlendEquation::parse_lenient);
            ApiCall::BlendEquation { rgb: mode, alpha: mode }
        }
        "glBlendEquationSeparate" => ApiCall::BlendEquation {
            rgb: event.enum_value("modeRGB").and_then(BlendEquation::parse_lenient),
            alpha: event.enum_value("modeAlpha").and_then(BlendEquation::parse_lenient),
        },

        "glDepthFunc" => ApiCall::DepthFunc(event.enum_value("func").and_then(CompareFunc::from_symbol)),
        "glDepthMask" => ApiCall::DepthMask(event.bool_value("flag")),

        "glStencilFunc" | "glStencilFuncSeparate" => ApiCall::StencilFunc {
            func: event.enum_value("func").and_then(CompareFunc::from_symbol),
            reference: event.int_value("ref"),
            mask: event.int_value("mask"),
        },
        "glStencilOp" | "glStencilOpSeparate" => ApiCall::StencilOp {
            fail: stencil_op(event, &["fail", "sfail"]),
            depth_fail: stencil_op(event, &["zfail", "dpfail"]),
            pass: stencil_op(event, &["zpass", "dppass"]),
        },

        "glCullFace" => ApiCall::CullFace(event.enum_value("mode").and_then(CullMode::from_symbol)),
        "glFrontFace" => ApiCall::FrontFace(event.enum_value("mode").and_then(FrontFace::parse_lenient)),
        "glScissor" => ApiCall::Scissor {
            x: event.int_value("x"),
            y: event.int_value("y"),
            width: event.int_value("width"),
            height: event.int_value("height"),
        },
        "glColorMask" => ApiCall::ColorMask {
            red: event.bool_value("red"),
            green: event.bool_value("green"),
            blue: event.bool_value("blue"),
            alpha: event.bool_value("alpha"),
        },
        "glPolygonMode" => ApiCall::PolygonMode(event.enum_value("mode").and_then(PolygonMode::parse_lenient)),

        "glActiveTexture" => ApiCall::ActiveTexture(texture_unit(event.attr("texture"))),
        "glBindTexture" => ApiCall::BindTexture(Binding::from_resource(event.resource_value("texture"))),
        "glBindTextureUnit" => ApiCall::BindTextureUnit {
            unit: event.int_value("unit").and_then(|unit| u32::try_from(unit).ok()),
            texture: Binding::from_resource(event.resource_value("texture")),
        },

        "glBindFramebuffer" => {
            ApiCall::BindFramebuffer(Binding::from_resource(event.resource_value("framebuffer")).unwrap_or(Binding::Unbind))
        }
        "glFramebufferRenderbuffer" | "glNamedFramebufferRenderbuffer" => ApiCall::AttachRenderbuffer {
            attachment: event.enum_value("attachment"),
            renderbuffer: Binding::from_resource(event.resource_value("renderbuffer")),
        },
        "glClear" => ApiCall::Clear(clear_mask(event.attr("mask"))),
        "glClearColor" => ApiCall::ClearColor(clear_color(event)),
        "glClearDepth" | "glClearDepthf" => ApiCall::ClearDepth(event.float_value("depth")),
        "glClearStencil" => ApiCall::ClearStencil(event.int_value("s")),
        "glDrawBuffers" => ApiCall::DrawBuffers(draw_buffers(event)),
        "glDrawBuffer" => ApiCall::DrawBuffers(event.enum_value("buf").into_iter().collect()),
        "glObjectLabel" => framebuffer_label(event),

        "glUseProgram" => ApiCall::UseProgram(Binding::from_resource(event.resource_value("program"))),
        "glPushDebugGroup" | "vkCmdBeginDebugUtilsLabelEXT" => {
            ApiCall::PushDebugGroup(event.first_string(&["message", "pLabelName", "label"]))
        }
        "glPopDebugGroup" | "vkCmdEndDebugUtilsLabelEXT" => ApiCall::PopDebugGroup,

        "glCreateShader" | "glCreateShaderProgramEXT" | "glCreateShaderProgramv" => create_shader(event),
        "glShaderSource" => match (event.resource_value("shader"), source_length(event)) {
            (Some(shader), Some(source_length)) if !is_null_resource(shader) => {
                ApiCall::ShaderSource { shader, source_length }
            }
            _ => ApiCall::Unrecognized,
        },

        _ if is_texture_storage_call(name) => ApiCall::TextureStorage(texture_storage(event)),
        _ if is_sampler_parameter_call(name) => ApiCall::SamplerParameter {
            target: sampler_target(event),
            update: sampler_parameter(event),
        },
        _ if name.starts_with("glFramebufferTexture") || name.starts_with("glNamedFramebufferTexture") => {
            ApiCall::AttachTexture {
                attachment: event.enum_value("attachment"),
                texture: Binding::from_resource(event.resource_value("texture")),
                level: event.int_value("level"),
                layer: event.int_value("layer"),
            }
        }

        _ => ApiCall::Unrecognized,
    }
}

// tools
fn factor(event: &Event, attr: &str) -> Option<BlendFactor> {
    event.enum_value(attr).and_then(BlendFactor::from_symbol)
}

fn stencil_op(event: &Event, attrs: &[&str]) -> Option<StencilOp> {
    event.first_enum(attrs).and_then(StencilOp::from_symbol)
}

fn classify_draw(event: &Event) -> DrawCall<'_> {
    let name = event.name.as_str();
    let is_vulkan = name.starts_with("vk");

    let kind = if name.contains("Dispatch") {
        DrawKind::Dispatch
    } else if name.contains("Elements") || name.contains("Indexed") {
        DrawKind::Indexed
    } else {
        DrawKind::Arrays
    };

    let count = if is_vulkan {
        match kind {
            DrawKind::Indexed => event.first_int(&["indexCount", "count"]),
            _ => event.first_int(&["vertexCount", "count"]),
        }
    } else {
        event.int_value("count")
    };

    let instance_count = if is_vulkan {
        event.int_value("instanceCount")
    } else if name.contains("Instanced") {
        event.first_int(&["instancecount", "primcount"])
    } else {
        None
    };

    DrawCall {
        kind,
        count: count.unwrap_or(0),
        instance_count,
        marker: event.first_string(&["Label", "marker"]),
    }
}

/// `GL_TEXTURE3` -> 3，整数形式的 `GL_TEXTUREi` 常量也会归一化
fn texture_unit(value: Option<&AttrValue>) -> Option<u32> {
    let value = value?;

    if let Some(symbol) = value.as_symbol().filter(|s| s.contains("TEXTURE")) {
        let digits_at = symbol.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits_at < symbol.len() {
            return symbol[digits_at..].parse().ok();
        }
    }

    let raw = value.as_int()?;
    let unit = if raw >= GL_TEXTURE0 { raw - GL_TEXTURE0 } else { raw };
    u32::try_from(unit).ok()
}

fn is_texture_storage_call(name: &str) -> bool {
    ["glTexImage", "glTexStorage", "glTextureStorage", "glCompressedTexImage"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

fn texture_storage(event: &Event) -> TextureStorage<'_> {
    let texture = if event.name.starts_with("glTextureStorage") {
        event.resource_value("texture").filter(|id| !is_null_resource(id))
    } else {
        None
    };

    TextureStorage {
        texture,
        width: event.int_value("width"),
        height: event.int_value("height"),
        depth: event.int_value("depth"),
        format: event.first_enum(&["internalformat", "internalFormat", "format"]),
        level: event.int_value("level"),
        levels: event.int_value("levels"),
        samples: event.int_value("samples"),
    }
}

fn create_shader(event: &Event) -> ApiCall<'_> {
    let Some(shader) = event.first_resource(&["Shader", "Program"]).filter(|id| !is_null_resource(id)) else {
        return ApiCall::Unrecognized;
    };

    ApiCall::CreateShader {
        shader,
        stage: event.enum_value("type").and_then(ShaderStage::parse_lenient),
        label: event.string_value("Label"),
        source_length: source_length(event),
    }
}

/// 源码各段长度之和
fn source_length(event: &Event) -> Option<usize> {
    let value = ["string", "strings", "source"].iter().find_map(|name| event.attr(name))?;
    match value.as_array() {
        Some(items) => Some(items.iter().filter_map(AttrValue::as_str).map(str::len).sum()),
        None => value.as_str().map(str::len),
    }
}

fn is_sampler_parameter_call(name: &str) -> bool {
    ["glTexParameter", "glSamplerParameter", "glTextureParameter"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

fn sampler_target(event: &Event) -> Option<SamplerTarget<'_>> {
    let name = event.name.as_str();
    let explicit = if name.starts_with("glSamplerParameter") {
        event.resource_value("sampler")
    } else if name.starts_with("glTextureParameter") {
        event.resource_value("texture")
    } else {
        return Some(SamplerTarget::ActiveUnit);
    };

    explicit.filter(|id| !is_null_resource(id)).map(SamplerTarget::Explicit)
}

fn sampler_parameter(event: &Event) -> Option<SamplerParameter> {
    let pname = event.enum_value("pname")?;
    let symbol = || event.enum_value("param");
    let float = || event.float_value("param").map(|v| v as f32);

    if pname.contains("MIN_FILTER") {
        symbol().and_then(FilterMode::from_symbol).map(SamplerParameter::MinFilter)
    } else if pname.contains("MAG_FILTER") {
        symbol().and_then(FilterMode::from_symbol).map(SamplerParameter::MagFilter)
    } else if pname.contains("WRAP_S") {
        symbol().and_then(WrapMode::from_symbol).map(SamplerParameter::WrapS)
    } else if pname.contains("WRAP_T") {
        symbol().and_then(WrapMode::from_symbol).map(SamplerParameter::WrapT)
    } else if pname.contains("WRAP_R") {
        symbol().and_then(WrapMode::from_symbol).map(SamplerParameter::WrapR)
    } else if pname.contains("MAX_ANISOTROPY") {
        float().map(SamplerParameter::MaxAnisotropy)
    } else if pname.contains("MIN_LOD") {
        float().map(SamplerParameter::MinLod)
    } else if pname.contains("MAX_LOD") {
        float().map(SamplerParameter::MaxLod)
    } else if pname.contains("LOD_BIAS") {
        float().map(SamplerParameter::LodBias)
    } else if pname.contains("COMPARE_MODE") {
        symbol().and_then(CompareMode::from_symbol).map(SamplerParameter::CompareMode)
    } else if pname.contains("COMPARE_FUNC") {
        symbol().and_then(CompareFunc::from_symbol).map(SamplerParameter::CompareFunc)
    } else {
        None
    }
}

fn clear_mask(value: Option<&AttrValue>) -> Option<ClearMask> {
    let value = value?;
    if let Some(bits) = value.as_int() {
        return Some(ClearMask {
            color: bits & GL_COLOR_BUFFER_BIT != 0,
            depth: bits & GL_DEPTH_BUFFER_BIT != 0,
            stencil: bits & GL_STENCIL_BUFFER_BIT != 0,
        });
    }

    let symbol = value.as_symbol()?;
    Some(ClearMask {
        color: symbol.contains("COLOR"),
        depth: symbol.contains("DEPTH"),
        stencil: symbol.contains("STENCIL"),
    })
}

fn clear_color(event: &Event) -> Option<[f32; 4]> {
    let channel = |name: &str| event.float_value(name).map(|v| v as f32);
    Some([channel("red")?, channel("green")?, channel("blue")?, channel("alpha")?])
}

fn draw_buffers(event: &Event) -> Vec<&str> {
    if let Some(items) = event.attr("bufs").and_then(AttrValue::as_array) {
        return items.iter().filter_map(AttrValue::as_symbol).collect();
    }

    event
        .attributes
        .iter()
        .filter(|(name, _)| name.starts_with("bufs"))
        .filter_map(|(_, value)| value.as_symbol())
        .collect()
}

fn framebuffer_label(event: &Event) -> ApiCall<'_> {
    let is_framebuffer = event.enum_value("identifier").is_some_and(|id| id.contains("FRAMEBUFFER"));
    let framebuffer = event.resource_value("name").filter(|id| !is_null_resource(id));
    let label = event.string_value("label");

    match (is_framebuffer, framebuffer, label) {
        (true, Some(framebuffer), Some(label)) => ApiCall::FramebufferLabel { framebuffer, label },
        _ => ApiCall::Unrecognized,
    }
}
