//! 纹理单元绑定与采样参数追踪

use std::collections::BTreeMap;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use truvis_capture::call::{ApiCall, Binding, SamplerParameter, SamplerTarget, classify};
use truvis_capture::enums::{CompareFunc, CompareMode, FilterMode, WrapMode};
use truvis_capture::event::Event;

/// 一个 sampler 对象（或直接在纹理上设置的采样参数）
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SamplerDescriptor {
    pub id: String,
    /// 参数是通过纹理设置时，对应的纹理 ID
    pub bound_texture_id: Option<String>,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub wrap_r: WrapMode,
    pub anisotropy: f32,
    pub lod_min: f32,
    pub lod_max: f32,
    pub lod_bias: f32,
    pub compare_mode: CompareMode,
    pub compare_func: CompareFunc,
}

impl SamplerDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            bound_texture_id: None,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            wrap_r: WrapMode::Repeat,
            anisotropy: 1.0,
            lod_min: -1000.0,
            lod_max: 1000.0,
            lod_bias: 0.0,
            compare_mode: CompareMode::None,
            compare_func: CompareFunc::LessEqual,
        }
    }

    fn update(&mut self, parameter: SamplerParameter) {
        match parameter {
            SamplerParameter::MinFilter(v) => self.min_filter = v,
            SamplerParameter::MagFilter(v) => self.mag_filter = v,
            SamplerParameter::WrapS(v) => self.wrap_s = v,
            SamplerParameter::WrapT(v) => self.wrap_t = v,
            SamplerParameter::WrapR(v) => self.wrap_r = v,
            SamplerParameter::MaxAnisotropy(v) => self.anisotropy = v,
            SamplerParameter::MinLod(v) => self.lod_min = v,
            SamplerParameter::MaxLod(v) => self.lod_max = v,
            SamplerParameter::LodBias(v) => self.lod_bias = v,
            SamplerParameter::CompareMode(v) => self.compare_mode = v,
            SamplerParameter::CompareFunc(v) => self.compare_func = v,
        }
    }

    /// 是否启用了 mipmap 过滤
    #[inline]
    pub fn uses_mipmaps(&self) -> bool {
        !matches!(self.min_filter, FilterMode::Nearest | FilterMode::Linear)
    }
}

/// 追踪激活纹理单元、各单元上绑定的纹理，以及每个对象的采样参数
#[derive(Debug, Default)]
pub struct SamplerTracker {
    /// 按首次触及的顺序保存
    samplers: IndexMap<String, SamplerDescriptor>,
    active_unit: u32,
    unit_bindings: BTreeMap<u32, String>,
}

// new & init
impl SamplerTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

// update
impl SamplerTracker {
    pub fn process_event(&mut self, event: &Event) {
        self.apply(&classify(event));
    }

    pub fn apply(&mut self, call: &ApiCall) {
        match call {
            ApiCall::ActiveTexture(unit) => {
                if let Some(unit) = unit {
                    self.active_unit = *unit;
                }
            }
            ApiCall::BindTexture(binding) => {
                if let Some(binding) = binding {
                    self.bind(self.active_unit, *binding);
                }
            }
            ApiCall::BindTextureUnit { unit, texture } => {
                if let (Some(unit), Some(texture)) = (unit, texture) {
                    self.bind(*unit, *texture);
                }
            }
            ApiCall::SamplerParameter { target, update } => self.update_parameter(*target, *update),
            _ => {}
        }
    }

    fn bind(&mut self, unit: u32, binding: Binding) {
        match binding {
            Binding::Bind(texture) => {
                self.unit_bindings.insert(unit, texture.to_string());
            }
            Binding::Unbind => {
                self.unit_bindings.remove(&unit);
            }
        }
    }

    fn update_parameter(&mut self, target: Option<SamplerTarget>, update: Option<SamplerParameter>) {
        let (key, bound_texture) = match target {
            Some(SamplerTarget::Explicit(id)) => (id.to_string(), None),
            Some(SamplerTarget::ActiveUnit) => match self.unit_bindings.get(&self.active_unit) {
                Some(texture) => (texture.clone(), Some(texture.clone())),
                None => {
                    log::trace!("drop sampler update: nothing bound to unit {}", self.active_unit);
                    return;
                }
            },
            None => {
                log::trace!("drop sampler update: no sampler object named");
                return;
            }
        };

        let descriptor = self.samplers.entry(key).or_insert_with_key(|key| SamplerDescriptor::new(key.as_str()));
        if descriptor.bound_texture_id.is_none() {
            descriptor.bound_texture_id = bound_texture;
        }
        if let Some(update) = update {
            descriptor.update(update);
        }
    }
}

// getter
impl SamplerTracker {
    #[inline]
    pub fn active_unit(&self) -> u32 {
        self.active_unit
    }

    #[inline]
    pub fn bound_texture(&self, unit: u32) -> Option<&str> {
        self.unit_bindings.get(&unit).map(String::as_str)
    }

    /// 各单元上绑定的纹理，按单元号升序、去重
    pub fn bound_textures(&self) -> Vec<String> {
        self.unit_bindings.values().unique().cloned().collect()
    }

    #[inline]
    pub fn sampler(&self, id: &str) -> Option<&SamplerDescriptor> {
        self.samplers.get(id)
    }

    /// 所有被触及过的采样描述，按首次触及的顺序
    pub fn all_samplers(&self) -> Vec<SamplerDescriptor> {
        self.samplers.values().cloned().collect()
    }

    pub fn into_samplers(self) -> Vec<SamplerDescriptor> {
        self.samplers.into_values().collect()
    }
}
