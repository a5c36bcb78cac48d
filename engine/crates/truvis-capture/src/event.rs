//! 捕获事件与事件日志
//!
//! 一个 `Event` 对应捕获中录制的一次图形 API 调用，属性以名字为键、
//! 以 `AttrValue` 为值。所有读取接口都是宽松的：属性缺失或类型不符时返回 `None`，
//! 由调用方决定保留旧值还是跳过更新。

use std::fs;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 事件属性值
///
/// JSON 中使用外部标签表示，例如 `{ "enum": "GL_BLEND" }`、`{ "int": 36 }`。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    /// 带符号名的枚举，例如 `GL_SRC_ALPHA`
    Enum(String),
    Int(i64),
    Bool(bool),
    Float(f64),
    String(String),
    /// 不透明的资源 ID
    Resource(String),
    Array(Vec<AttrValue>),
}

impl AttrValue {
    /// 作为符号名读取（枚举或字符串）
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Self::Enum(s) | Self::String(s) => non_empty(s),
            _ => None,
        }
    }

    /// 作为整数读取，字符串形式的整数（含 `0x` 前缀）也接受
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Enum(s) | Self::String(s) => parse_int(s),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 作为布尔值读取
    ///
    /// 捕获工具对布尔参数的序列化并不统一：可能是 bool、byte（整数），
    /// 也可能是 `GL_TRUE` 这样的符号。
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(v) => Some(*v != 0),
            Self::Enum(s) | Self::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "gl_true" | "vk_true" => Some(true),
                "false" | "0" | "gl_false" | "vk_false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 作为资源 ID 读取，字符串也接受
    pub fn as_resource(&self) -> Option<&str> {
        match self {
            Self::Resource(s) | Self::String(s) => non_empty(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => non_empty(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AttrValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// 一次录制下来的 API 调用
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// 事件在捕获中的序号
    pub event_id: u32,
    /// API 调用名，例如 `glDrawElements`
    pub name: String,
    #[serde(default)]
    pub attributes: IndexMap<String, AttrValue>,
    /// GPU 耗时（纳秒），计数器不可用时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ns: Option<u64>,
}

// new & init
impl Event {
    pub fn new(event_id: u32, name: impl Into<String>) -> Self {
        Self {
            event_id,
            name: name.into(),
            attributes: IndexMap::new(),
            duration_ns: None,
        }
    }

    #[inline]
    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    #[inline]
    pub fn with_enum(self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.with_attr(name, AttrValue::Enum(symbol.into()))
    }

    #[inline]
    pub fn with_int(self, name: impl Into<String>, value: i64) -> Self {
        self.with_attr(name, AttrValue::Int(value))
    }

    #[inline]
    pub fn with_bool(self, name: impl Into<String>, value: bool) -> Self {
        self.with_attr(name, AttrValue::Bool(value))
    }

    #[inline]
    pub fn with_float(self, name: impl Into<String>, value: f64) -> Self {
        self.with_attr(name, AttrValue::Float(value))
    }

    #[inline]
    pub fn with_resource(self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.with_attr(name, AttrValue::Resource(id.into()))
    }

    #[inline]
    pub fn with_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_attr(name, AttrValue::String(value.into()))
    }

    #[inline]
    pub fn with_duration(mut self, duration_ns: u64) -> Self {
        self.duration_ns = Some(duration_ns);
        self
    }
}

// getter
impl Event {
    #[inline]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    #[inline]
    pub fn enum_value(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::as_symbol)
    }

    #[inline]
    pub fn int_value(&self, name: &str) -> Option<i64> {
        self.attr(name).and_then(AttrValue::as_int)
    }

    #[inline]
    pub fn float_value(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(AttrValue::as_float)
    }

    #[inline]
    pub fn bool_value(&self, name: &str) -> Option<bool> {
        self.attr(name).and_then(AttrValue::as_bool)
    }

    #[inline]
    pub fn resource_value(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::as_resource)
    }

    #[inline]
    pub fn string_value(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(AttrValue::as_str)
    }

    /// 依次尝试多个属性名，返回第一个能读出的整数
    ///
    /// 不同 API 版本对同一参数的命名不同（`instancecount` / `primcount`）。
    pub fn first_int(&self, names: &[&str]) -> Option<i64> {
        names.iter().find_map(|name| self.int_value(name))
    }

    pub fn first_enum(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.enum_value(name))
    }

    pub fn first_string(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.string_value(name))
    }

    pub fn first_resource(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.resource_value(name))
    }
}

/// 捕获文件头信息
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureHeader {
    /// 图形 API / 驱动类型，例如 `OpenGL`
    pub driver: Option<String>,
    pub gpu_name: Option<String>,
    /// 例如 `1920x1080`
    pub resolution: Option<String>,
}

/// 事件日志
///
/// 由外部转换工具从二进制捕获生成，分析开始前完整加载，分析过程中只读。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    #[serde(default)]
    pub header: CaptureHeader,
    pub events: Vec<Event>,
}

// new & load
impl EventLog {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            header: CaptureHeader::default(),
            events,
        }
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        serde_json::from_str(content).context("解析事件日志 JSON 失败")
    }

    /// 从 JSON 文件加载事件日志
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("读取事件日志失败: {:?}", path))?;
        let log = Self::from_json_str(&content).with_context(|| format!("加载事件日志失败: {:?}", path))?;

        log::debug!("loaded {} events from {:?}", log.events.len(), path);
        Ok(log)
    }
}

// getter
impl EventLog {
    #[inline]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// 判断资源 ID 是否为空资源（解绑）
///
/// 捕获中空资源通常序列化为 `0` 或 `ResourceId::0`。
pub fn is_null_resource(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id == "0" || id.rsplit("::").next() == Some("0")
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s) }
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
